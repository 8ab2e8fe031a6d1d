use serde::Serialize;
use serde_json::Value;

use crate::{
    decode::{
        union::{Variant, VariantTable},
        Decode, Decoder, Object, Segment, Step,
    },
    report::DecodeErrorKind,
    text::{check_spans, utf16_len, MAX_QUOTE_UNITS},
};

use super::user::User;

/// Formatting or semantic span kind. Payload fields live on their variant only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    /// `@username`
    Mention,
    /// `#hashtag` or `#hashtag@chatusername`
    Hashtag,
    /// `$USD` or `$USD@chatusername`
    Cashtag,
    /// `/start@jobs_bot`
    BotCommand,
    Url,
    Email,
    PhoneNumber,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Spoiler,
    Blockquote,
    /// Collapsed-by-default block quotation.
    ExpandableBlockquote,
    Code,
    /// Monowidth block.
    Pre {
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// Clickable text URL.
    TextLink { url: String },
    /// Mention of a user without a username.
    TextMention { user: User },
    /// Inline custom emoji sticker; fetch details with `getCustomEmojiStickers`.
    CustomEmoji { custom_emoji_id: String },
}

impl EntityKind {
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Mention => "mention",
            EntityKind::Hashtag => "hashtag",
            EntityKind::Cashtag => "cashtag",
            EntityKind::BotCommand => "bot_command",
            EntityKind::Url => "url",
            EntityKind::Email => "email",
            EntityKind::PhoneNumber => "phone_number",
            EntityKind::Bold => "bold",
            EntityKind::Italic => "italic",
            EntityKind::Underline => "underline",
            EntityKind::Strikethrough => "strikethrough",
            EntityKind::Spoiler => "spoiler",
            EntityKind::Blockquote => "blockquote",
            EntityKind::ExpandableBlockquote => "expandable_blockquote",
            EntityKind::Code => "code",
            EntityKind::Pre { .. } => "pre",
            EntityKind::TextLink { .. } => "text_link",
            EntityKind::TextMention { .. } => "text_mention",
            EntityKind::CustomEmoji { .. } => "custom_emoji",
        }
    }
}

/// One special span in a text. `offset` and `length` are UTF-16 code units.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageEntity {
    #[serde(flatten)]
    pub kind: EntityKind,
    pub offset: i64,
    pub length: i64,
}

impl MessageEntity {
    pub fn new(kind: EntityKind, offset: i64, length: i64) -> Self {
        Self {
            kind,
            offset,
            length,
        }
    }
}

fn pre(d: &mut Decoder, obj: &Object<'_>) -> Step<EntityKind> {
    let language = obj.optional(d, "language", String::decode)?;
    Ok(EntityKind::Pre { language })
}

fn text_link(d: &mut Decoder, obj: &Object<'_>) -> Step<EntityKind> {
    let url = obj.required(d, "url", String::decode)?;
    Ok(EntityKind::TextLink { url })
}

fn text_mention(d: &mut Decoder, obj: &Object<'_>) -> Step<EntityKind> {
    let user = obj.required(d, "user", User::decode)?;
    Ok(EntityKind::TextMention { user })
}

fn custom_emoji(d: &mut Decoder, obj: &Object<'_>) -> Step<EntityKind> {
    let custom_emoji_id = obj.required(d, "custom_emoji_id", String::decode)?;
    Ok(EntityKind::CustomEmoji { custom_emoji_id })
}

static ENTITY_KINDS: VariantTable<EntityKind> = VariantTable {
    union: "MessageEntity",
    structural: None,
    tag_field: Some("type"),
    exclusive: &["url", "user", "language", "custom_emoji_id"],
    variants: &[
        Variant::new("mention", |_, _| Ok(EntityKind::Mention)),
        Variant::new("hashtag", |_, _| Ok(EntityKind::Hashtag)),
        Variant::new("cashtag", |_, _| Ok(EntityKind::Cashtag)),
        Variant::new("bot_command", |_, _| Ok(EntityKind::BotCommand)),
        Variant::new("url", |_, _| Ok(EntityKind::Url)),
        Variant::new("email", |_, _| Ok(EntityKind::Email)),
        Variant::new("phone_number", |_, _| Ok(EntityKind::PhoneNumber)),
        Variant::new("bold", |_, _| Ok(EntityKind::Bold)),
        Variant::new("italic", |_, _| Ok(EntityKind::Italic)),
        Variant::new("underline", |_, _| Ok(EntityKind::Underline)),
        Variant::new("strikethrough", |_, _| Ok(EntityKind::Strikethrough)),
        Variant::new("spoiler", |_, _| Ok(EntityKind::Spoiler)),
        Variant::new("blockquote", |_, _| Ok(EntityKind::Blockquote)),
        Variant::new("expandable_blockquote", |_, _| {
            Ok(EntityKind::ExpandableBlockquote)
        }),
        Variant::new("code", |_, _| Ok(EntityKind::Code)),
        Variant::owning("pre", &["language"], pre),
        Variant::owning("text_link", &["url"], text_link),
        Variant::owning("text_mention", &["user"], text_mention),
        Variant::owning("custom_emoji", &["custom_emoji_id"], custom_emoji),
    ],
};

impl Decode for MessageEntity {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let kind = ENTITY_KINDS.resolve(d, value);
        let offset = obj.required(d, "offset", i64::decode);
        let length = obj.required(d, "length", i64::decode);
        Ok(Self {
            kind: kind?,
            offset: offset?,
            length: length?,
        })
    }
}

/// The quoted part of the message a message replies to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextQuote {
    /// Plain text of the quote, at most 1024 UTF-16 units.
    pub text: String,
    /// Only bold, italic, underline, strikethrough, spoiler and custom_emoji survive in quotes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
    /// Approximate position in the original message, UTF-16 units.
    pub position: i64,
    /// Chosen by the sender rather than added by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_manual: Option<bool>,
}

impl TextQuote {
    pub fn is_manual(&self) -> bool {
        self.is_manual.unwrap_or(false)
    }

    pub fn len_utf16(&self) -> usize {
        utf16_len(&self.text)
    }
}

impl Decode for TextQuote {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let text = obj.required(d, "text", String::decode);
        let entities = obj.optional(d, "entities", Vec::<MessageEntity>::decode);
        let position = obj.required(d, "position", i64::decode);
        let is_manual = obj.optional(d, "is_manual", bool::decode);

        let (text, entities) = (text?, entities?);

        let len = utf16_len(&text);
        let length_ok = if len > MAX_QUOTE_UNITS {
            let raw = obj.field("text").value();
            d.enter(Segment::Key("text"), |d| {
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
        let spans_ok = match &entities {
            Some(ents) => check_spans(d, "entities", &text, ents, obj.field("entities").value()),
            None => Ok(()),
        };

        length_ok?;
        spans_ok?;
        Ok(Self {
            text,
            entities,
            position: position?,
            is_manual: is_manual?,
        })
    }
}
