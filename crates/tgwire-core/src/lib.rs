//! Typed model and decoder for the Telegram Bot API wire format.
//!
//! Raw JSON goes through [`decode`] into strongly-typed entities
//! ([`model`]), with every issue reported against a field path. Values go back
//! out through `serde::Serialize` ([`encode`]). HTTP stays outside: adapters
//! implement [`ports::UpdateSource`].

pub mod config;
pub mod decode;
pub mod domain;
pub mod encode;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod model;
pub mod ports;
pub mod report;
pub mod text;

pub use config::{DecodeMode, DecodeOptions};
pub use decode::{decode, decode_str, decode_value, decode_with, Decode};
pub use errors::{Error, Result};
pub use model::{
    response::decode_response,
    update::{decode_update_batch, UpdateBatch, UpdateOutcome},
};
pub use report::{DecodeError, DecodeErrorKind, DecodeReport, Decoded};
