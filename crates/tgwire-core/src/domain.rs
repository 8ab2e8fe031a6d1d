//! Identifier newtypes and time helpers shared by the model.
//!
//! Every identifier is a fixed 64-bit integer on purpose: Telegram ids exceed
//! 32 bits and must never be narrowed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::decode::{Decode, Decoder, Step};

/// Telegram user id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Telegram chat id (negative for groups and channels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

/// Message id, unique inside a chat.
///
/// `0` is not "no id": the server returns it for messages that were scheduled
/// instead of sent, which stay unusable until actually delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn is_scheduled(self) -> bool {
        self.0 == 0
    }
}

macro_rules! decode_id {
    ($($ty:ident),*) => {
        $(
            impl Decode for $ty {
                fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
                    i64::decode(d, value).map($ty)
                }
            }
        )*
    };
}

decode_id!(UserId, ChatId, MessageId);

/// Unix seconds → UTC timestamp. `None` for values chrono cannot represent.
pub fn unix_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
