//! Strongly-typed Bot API entities and their assemblers.
//!
//! Each entity implements [`Decode`](crate::decode::Decode) (wire JSON → value,
//! with cross-field checks) and `serde::Serialize` (value → wire JSON, the
//! outbound side of the same conventions).

pub mod chat;
pub mod entity;
pub mod message;
pub mod origin;
pub mod reply;
pub mod response;
pub mod update;
pub mod user;

pub use chat::{Chat, ChatType};
pub use entity::{EntityKind, MessageEntity, TextQuote};
pub use message::{InaccessibleMessage, MaybeInaccessibleMessage, Message, SentMessageId};
pub use origin::MessageOrigin;
pub use reply::{ParseMode, ReplyChatId, ReplyParameters};
pub use response::{ApiError, ApiResponse, ResponseParameters};
pub use update::{CallbackQuery, Update, UpdateKind};
pub use user::User;
