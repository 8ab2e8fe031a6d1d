use serde::Serialize;
use serde_json::Value;

use crate::{
    decode::{Decode, Decoder, Object, Step},
    domain::UserId,
};

/// A Telegram user or bot.
///
/// `can_join_groups`, `can_read_all_group_messages`, `supports_inline_queries`,
/// `can_connect_to_business` and `has_main_web_app` are only filled in on the
/// bot's own `getMe` result. Nothing enforces that here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// IETF language tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_to_attachment_menu: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_join_groups: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_read_all_group_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_inline_queries: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_connect_to_business: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_main_web_app: Option<bool>,
}

impl User {
    /// Minimal user with only the required fields set.
    pub fn new(id: i64, is_bot: bool, first_name: impl Into<String>) -> Self {
        Self {
            id: UserId(id),
            is_bot,
            first_name: first_name.into(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: None,
            added_to_attachment_menu: None,
            can_join_groups: None,
            can_read_all_group_messages: None,
            supports_inline_queries: None,
            can_connect_to_business: None,
            has_main_web_app: None,
        }
    }

    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    pub fn is_premium(&self) -> bool {
        self.is_premium.unwrap_or(false)
    }
}

impl Decode for User {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let id = obj.required(d, "id", UserId::decode);
        let is_bot = obj.required(d, "is_bot", bool::decode);
        let first_name = obj.required(d, "first_name", String::decode);
        let last_name = obj.optional(d, "last_name", String::decode);
        let username = obj.optional(d, "username", String::decode);
        let language_code = obj.optional(d, "language_code", String::decode);
        let is_premium = obj.optional(d, "is_premium", bool::decode);
        let added_to_attachment_menu = obj.optional(d, "added_to_attachment_menu", bool::decode);
        let can_join_groups = obj.optional(d, "can_join_groups", bool::decode);
        let can_read_all_group_messages =
            obj.optional(d, "can_read_all_group_messages", bool::decode);
        let supports_inline_queries = obj.optional(d, "supports_inline_queries", bool::decode);
        let can_connect_to_business = obj.optional(d, "can_connect_to_business", bool::decode);
        let has_main_web_app = obj.optional(d, "has_main_web_app", bool::decode);

        Ok(Self {
            id: id?,
            is_bot: is_bot?,
            first_name: first_name?,
            last_name: last_name?,
            username: username?,
            language_code: language_code?,
            is_premium: is_premium?,
            added_to_attachment_menu: added_to_attachment_menu?,
            can_join_groups: can_join_groups?,
            can_read_all_group_messages: can_read_all_group_messages?,
            supports_inline_queries: supports_inline_queries?,
            can_connect_to_business: can_connect_to_business?,
            has_main_web_app: has_main_web_app?,
        })
    }
}
