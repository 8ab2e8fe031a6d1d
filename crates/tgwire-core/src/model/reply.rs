use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::{
    decode::{Decode, Decoder, Object, Segment, Step},
    domain::{ChatId, MessageId},
    formatting::plain_text,
    report::DecodeErrorKind,
    text::{check_spans, utf16_len, MAX_QUOTE_UNITS, MAX_TEXT_UNITS},
};

use super::entity::MessageEntity;

/// Markup dialect for message text and quotes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ParseMode {
    MarkdownV2,
    #[serde(rename = "HTML")]
    Html,
    /// Legacy Markdown, kept for backward compatibility.
    Markdown,
}

impl ParseMode {
    pub const TAGS: &'static [&'static str] = &["MarkdownV2", "HTML", "Markdown"];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "MarkdownV2" => Some(ParseMode::MarkdownV2),
            "HTML" => Some(ParseMode::Html),
            "Markdown" => Some(ParseMode::Markdown),
            _ => None,
        }
    }

    /// Decode a parse mode that is not essential to its parent.
    ///
    /// An unknown value is a `ClosedSetViolation`; best-effort mode downgrades it
    /// to a warning and substitutes `None` (no parse mode).
    fn decode_lenient(d: &mut Decoder, value: &Value) -> Step<Option<Self>> {
        let tag = String::decode(d, value)?;
        if let Some(mode) = ParseMode::from_tag(&tag) {
            return Ok(Some(mode));
        }
        d.soft(
            DecodeErrorKind::ClosedSetViolation {
                value: tag,
                allowed: ParseMode::TAGS,
            },
            Some(value),
        )?;
        Ok(None)
    }
}

/// A chat reference that is either a numeric id or a public `@username`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ReplyChatId {
    Id(ChatId),
    /// Build through [`ReplyChatId::username`] or [`ReplyChatId::parse`]; an
    /// unchecked value may not decode back to the same variant.
    Username(String),
}

fn username_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^@[A-Za-z][A-Za-z0-9_]{3,31}$").expect("valid regex"))
}

impl ReplyChatId {
    /// Parse the string form: a numeric id (`"-1001234"`) or `@channelusername`.
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(id) = s.trim().parse::<i64>() {
            return Some(ReplyChatId::Id(ChatId(id)));
        }
        Self::username(s)
    }

    /// Checked `@channelusername`. Numeric strings and names without the
    /// leading `@` are rejected.
    pub fn username(name: &str) -> Option<Self> {
        username_re()
            .is_match(name)
            .then(|| ReplyChatId::Username(name.to_string()))
    }
}

impl From<ChatId> for ReplyChatId {
    fn from(id: ChatId) -> Self {
        ReplyChatId::Id(id)
    }
}

impl Decode for ReplyChatId {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        match value {
            Value::Number(_) => ChatId::decode(d, value).map(ReplyChatId::Id),
            Value::String(s) => match ReplyChatId::parse(s) {
                Some(id) => Ok(id),
                None => d.fail(
                    DecodeErrorKind::InvalidFormat {
                        expected: "integer chat id or @channelusername",
                    },
                    Some(value),
                ),
            },
            other => d.mismatch("integer or string", other),
        }
    }
}

/// Describes the message a sent message replies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyParameters {
    /// In the current chat, or in `chat_id` when set.
    pub message_id: MessageId,
    /// Set when the replied-to message lives in another chat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ReplyChatId>,
    /// Send even if the replied-to message is gone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sending_without_reply: Option<bool>,
    /// Exact substring of the replied-to message; 0-1024 units after entity parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_parse_mode: Option<ParseMode>,
    /// Alternative to `quote_parse_mode`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_entities: Option<Vec<MessageEntity>>,
    /// UTF-16 position of the quote in the original message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_position: Option<i64>,
}

impl ReplyParameters {
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            chat_id: None,
            allow_sending_without_reply: None,
            quote: None,
            quote_parse_mode: None,
            quote_entities: None,
            quote_position: None,
        }
    }

    pub fn in_chat(mut self, chat_id: impl Into<ReplyChatId>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_quote(mut self, quote: impl Into<String>, position: Option<i64>) -> Self {
        self.quote = Some(quote.into());
        self.quote_position = position;
        self
    }

    /// The quote as the server will see it once markup is parsed.
    pub fn plain_quote(&self) -> Option<String> {
        let quote = self.quote.as_deref()?;
        Some(match self.quote_parse_mode {
            Some(mode) => plain_text(quote, mode),
            None => quote.to_string(),
        })
    }
}

impl Decode for ReplyParameters {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let message_id = obj.required(d, "message_id", MessageId::decode);
        let chat_id = obj.optional(d, "chat_id", ReplyChatId::decode);
        let allow_sending_without_reply =
            obj.optional(d, "allow_sending_without_reply", bool::decode);
        let quote = obj.optional(d, "quote", String::decode);
        let quote_parse_mode = obj
            .optional(d, "quote_parse_mode", ParseMode::decode_lenient)
            .map(Option::flatten);
        let quote_entities = obj.optional(d, "quote_entities", Vec::<MessageEntity>::decode);
        let quote_position = obj.optional(d, "quote_position", i64::decode);

        let params = Self {
            message_id: message_id?,
            chat_id: chat_id?,
            allow_sending_without_reply: allow_sending_without_reply?,
            quote: quote?,
            quote_parse_mode: quote_parse_mode?,
            quote_entities: quote_entities?,
            quote_position: quote_position?,
        };
        check_quote(d, &obj, &params)?;
        Ok(params)
    }
}

fn check_quote(d: &mut Decoder, obj: &Object<'_>, params: &ReplyParameters) -> Step<()> {
    let Some(plain) = params.plain_quote() else {
        return Ok(());
    };
    let len = utf16_len(&plain);

    let length_ok = if len > MAX_QUOTE_UNITS {
        let raw = obj.field("quote").value();
        d.enter(Segment::Key("quote"), |d| {
            d.fail(
                DecodeErrorKind::QuoteTooLong {
                    len,
                    max: MAX_QUOTE_UNITS,
                },
                raw,
            )
        })
    } else {
        Ok(())
    };

    let spans_ok = match &params.quote_entities {
        Some(ents) => check_spans(
            d,
            "quote_entities",
            &plain,
            ents,
            obj.field("quote_entities").value(),
        ),
        None => Ok(()),
    };

    let position_ok = match params.quote_position {
        Some(position) if !fits(position, len, MAX_TEXT_UNITS) => {
            let raw = obj.field("quote_position").value();
            d.enter(Segment::Key("quote_position"), |d| {
                d.soft(
                    DecodeErrorKind::InconsistentQuotePosition {
                        position,
                        quote_len: len,
                        limit: MAX_TEXT_UNITS,
                    },
                    raw,
                )
            })
        }
        _ => Ok(()),
    };

    length_ok?;
    spans_ok?;
    position_ok
}

/// `position..position + len` lies inside `0..limit`.
pub(crate) fn fits(position: i64, len: usize, limit: usize) -> bool {
    let Ok(start) = usize::try_from(position) else {
        return false;
    };
    start.checked_add(len).is_some_and(|end| end <= limit)
}
