use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::{
    decode::{
        union::{Variant, VariantTable},
        Decode, Decoder, Object, Step,
    },
    domain::{unix_to_utc, MessageId},
};

use super::{chat::Chat, user::User};

/// Where a forwarded message originally came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOrigin {
    /// Sent by a known user.
    User { date: i64, sender_user: User },
    /// Sent by a user who hides their account in forwards.
    HiddenUser { date: i64, sender_user_name: String },
    /// Sent on behalf of a chat (anonymous group admin, linked channel).
    Chat {
        date: i64,
        sender_chat: Chat,
        #[serde(skip_serializing_if = "Option::is_none")]
        author_signature: Option<String>,
    },
    /// Posted in a channel.
    Channel {
        date: i64,
        chat: Chat,
        message_id: MessageId,
        #[serde(skip_serializing_if = "Option::is_none")]
        author_signature: Option<String>,
    },
}

impl MessageOrigin {
    /// Unix time the message was originally sent.
    pub fn date(&self) -> i64 {
        match self {
            MessageOrigin::User { date, .. }
            | MessageOrigin::HiddenUser { date, .. }
            | MessageOrigin::Chat { date, .. }
            | MessageOrigin::Channel { date, .. } => *date,
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.date())
    }

    /// Display name of whoever sent the original message.
    pub fn sender_name(&self) -> String {
        match self {
            MessageOrigin::User { sender_user, .. } => sender_user.full_name(),
            MessageOrigin::HiddenUser {
                sender_user_name, ..
            } => sender_user_name.clone(),
            MessageOrigin::Chat { sender_chat, .. } => chat_name(sender_chat),
            MessageOrigin::Channel { chat, .. } => chat_name(chat),
        }
    }
}

fn chat_name(chat: &Chat) -> String {
    chat.title
        .clone()
        .or_else(|| chat.username.clone())
        .unwrap_or_else(|| chat.id.0.to_string())
}

fn user(d: &mut Decoder, obj: &Object<'_>) -> Step<MessageOrigin> {
    let date = obj.required(d, "date", i64::decode);
    let sender_user = obj.required(d, "sender_user", User::decode);
    Ok(MessageOrigin::User {
        date: date?,
        sender_user: sender_user?,
    })
}

fn hidden_user(d: &mut Decoder, obj: &Object<'_>) -> Step<MessageOrigin> {
    let date = obj.required(d, "date", i64::decode);
    let sender_user_name = obj.required(d, "sender_user_name", String::decode);
    Ok(MessageOrigin::HiddenUser {
        date: date?,
        sender_user_name: sender_user_name?,
    })
}

fn chat(d: &mut Decoder, obj: &Object<'_>) -> Step<MessageOrigin> {
    let date = obj.required(d, "date", i64::decode);
    let sender_chat = obj.required(d, "sender_chat", Chat::decode);
    let author_signature = obj.optional(d, "author_signature", String::decode);
    Ok(MessageOrigin::Chat {
        date: date?,
        sender_chat: sender_chat?,
        author_signature: author_signature?,
    })
}

fn channel(d: &mut Decoder, obj: &Object<'_>) -> Step<MessageOrigin> {
    let date = obj.required(d, "date", i64::decode);
    let chat = obj.required(d, "chat", Chat::decode);
    let message_id = obj.required(d, "message_id", MessageId::decode);
    let author_signature = obj.optional(d, "author_signature", String::decode);
    Ok(MessageOrigin::Channel {
        date: date?,
        chat: chat?,
        message_id: message_id?,
        author_signature: author_signature?,
    })
}

static ORIGINS: VariantTable<MessageOrigin> = VariantTable {
    union: "MessageOrigin",
    structural: None,
    tag_field: Some("type"),
    exclusive: &[],
    variants: &[
        Variant::new("user", user),
        Variant::new("hidden_user", hidden_user),
        Variant::new("chat", chat),
        Variant::new("channel", channel),
    ],
};

impl Decode for MessageOrigin {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        ORIGINS.resolve(d, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DecodeOptions, decode::decode_value, model::chat::ChatType,
        report::DecodeErrorKind,
    };
    use serde_json::json;

    fn strict(v: Value) -> Result<MessageOrigin, crate::report::DecodeReport> {
        decode_value::<MessageOrigin>(&v, &DecodeOptions::strict()).map(|d| d.value)
    }

    #[test]
    fn hidden_user_decodes_its_two_fields() {
        let origin = strict(json!({
            "type": "hidden_user", "date": 1700000000, "sender_user_name": "Anon"
        }))
        .unwrap();
        assert_eq!(
            origin,
            MessageOrigin::HiddenUser {
                date: 1_700_000_000,
                sender_user_name: "Anon".into()
            }
        );
        assert_eq!(origin.sender_name(), "Anon");
        assert_eq!(origin.sent_at().unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn unknown_origin_type_is_rejected() {
        let err = strict(json!({"type": "alien", "date": 1})).unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::UnknownVariant {
                union: "MessageOrigin",
                tag: "alien".into()
            }
        );
    }

    #[test]
    fn channel_origin_round_trips() {
        let v = json!({
            "type": "channel",
            "date": 1,
            "chat": {"id": -1001, "type": "channel", "title": "News"},
            "message_id": 77,
            "author_signature": "Ed"
        });
        let origin = strict(v.clone()).unwrap();
        match &origin {
            MessageOrigin::Channel {
                chat, message_id, ..
            } => {
                assert_eq!(chat.kind, ChatType::Channel);
                assert_eq!(*message_id, MessageId(77));
            }
            other => panic!("expected channel origin, got {other:?}"),
        }
        assert_eq!(origin.sender_name(), "News");
        assert_eq!(serde_json::to_value(&origin).unwrap(), v);
    }

    #[test]
    fn user_origin_needs_sender_user() {
        let err = strict(json!({"type": "user", "date": 5})).unwrap_err();
        assert_eq!(err.errors[0].path.to_string(), "sender_user");
    }
}
