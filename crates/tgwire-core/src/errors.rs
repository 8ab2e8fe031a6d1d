use crate::{model::response::ApiError, report::DecodeReport};

/// Crate-level error type.
///
/// Decode problems stay structured (`DecodeReport`); transport adapters map
/// their own failures into `Transport` so callers can tell payload issues
/// apart from retryable I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeReport),

    #[error("telegram api error: {0}")]
    Api(ApiError),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, Error>;
