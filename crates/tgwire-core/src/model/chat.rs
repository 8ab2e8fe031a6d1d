use serde::Serialize;
use serde_json::Value;

use crate::{
    decode::{Decode, Decoder, Object, Step},
    domain::ChatId,
    report::DecodeErrorKind,
};

/// Chat kind. A closed set: anything else fails the decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatType {
    pub const TAGS: &'static [&'static str] = &["private", "group", "supergroup", "channel"];

    pub fn as_str(self) -> &'static str {
        match self {
            ChatType::Private => "private",
            ChatType::Group => "group",
            ChatType::Supergroup => "supergroup",
            ChatType::Channel => "channel",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "private" => Some(ChatType::Private),
            "group" => Some(ChatType::Group),
            "supergroup" => Some(ChatType::Supergroup),
            "channel" => Some(ChatType::Channel),
            _ => None,
        }
    }
}

impl Decode for ChatType {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let tag = String::decode(d, value)?;
        match ChatType::from_tag(&tag) {
            Some(kind) => Ok(kind),
            None => d.fail(
                DecodeErrorKind::ClosedSetViolation {
                    value: tag,
                    allowed: ChatType::TAGS,
                },
                Some(value),
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub kind: ChatType,
    /// Supergroups, channels and group chats.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Other party of a private chat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Supergroup with topics enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_forum: Option<bool>,
}

impl Chat {
    pub fn new(id: i64, kind: ChatType) -> Self {
        Self {
            id: ChatId(id),
            kind,
            title: None,
            username: None,
            first_name: None,
            last_name: None,
            is_forum: None,
        }
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatType::Private
    }
}

impl Decode for Chat {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let id = obj.required(d, "id", ChatId::decode);
        // Essential: an unknown kind is never downgraded to a warning.
        let kind = obj.required(d, "type", ChatType::decode);
        let title = obj.optional(d, "title", String::decode);
        let username = obj.optional(d, "username", String::decode);
        let first_name = obj.optional(d, "first_name", String::decode);
        let last_name = obj.optional(d, "last_name", String::decode);
        let is_forum = obj.optional(d, "is_forum", bool::decode);

        Ok(Self {
            id: id?,
            kind: kind?,
            title: title?,
            username: username?,
            first_name: first_name?,
            last_name: last_name?,
            is_forum: is_forum?,
        })
    }
}
