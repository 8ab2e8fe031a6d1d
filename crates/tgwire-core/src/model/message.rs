use chrono::{DateTime, Utc};
use serde::{ser::SerializeStruct, Serialize, Serializer};
use serde_json::Value;

use crate::{
    decode::{
        union::{Variant, VariantTable},
        Decode, Decoder, Object, Segment, Step,
    },
    domain::{unix_to_utc, MessageId},
    report::DecodeErrorKind,
    text::{check_spans, resolve, utf16_len, ResolvedEntity, SpanError},
};

use super::{
    chat::Chat,
    entity::{MessageEntity, TextQuote},
    origin::MessageOrigin,
    reply::fits,
    user::User,
};

// ============== Message ==============

/// A live message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message_id: MessageId,
    /// Forum topic the message belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    /// Empty for messages sent to channels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    /// Set when the message was sent on behalf of a chat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_chat: Option<Chat>,
    /// Unix time; never 0 for an accessible message.
    pub date: i64,
    pub chat: Chat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_origin: Option<MessageOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_topic_message: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_automatic_forward: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
    /// The part of `reply_to_message` being quoted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<TextQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_message: Option<Box<MaybeInaccessibleMessage>>,
}

impl Message {
    /// A bare message with only the required fields set.
    ///
    /// `date` must be non-zero: a zero date marks an inaccessible message on
    /// the wire, so such a value will not decode back as a `Message`.
    pub fn new(message_id: MessageId, date: i64, chat: Chat) -> Self {
        Self {
            message_id,
            message_thread_id: None,
            from: None,
            sender_chat: None,
            date,
            chat,
            forward_origin: None,
            is_topic_message: None,
            is_automatic_forward: None,
            reply_to_message: None,
            quote: None,
            edit_date: None,
            media_group_id: None,
            author_signature: None,
            text: None,
            entities: None,
            caption: None,
            caption_entities: None,
            pinned_message: None,
        }
    }

    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        unix_to_utc(self.date)
    }

    pub fn edited_at(&self) -> Option<DateTime<Utc>> {
        self.edit_date.and_then(unix_to_utc)
    }

    pub fn is_forwarded(&self) -> bool {
        self.forward_origin.is_some()
    }

    /// Text for text messages, caption for media.
    pub fn text_or_caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// `entities` mapped onto `text`.
    pub fn resolved_text_entities(&self) -> Result<Vec<ResolvedEntity<'_>>, SpanError> {
        resolve_opt(self.text.as_deref(), self.entities.as_deref())
    }

    /// `caption_entities` mapped onto `caption`.
    pub fn resolved_caption_entities(&self) -> Result<Vec<ResolvedEntity<'_>>, SpanError> {
        resolve_opt(self.caption.as_deref(), self.caption_entities.as_deref())
    }
}

fn resolve_opt<'a>(
    text: Option<&'a str>,
    entities: Option<&'a [MessageEntity]>,
) -> Result<Vec<ResolvedEntity<'a>>, SpanError> {
    match entities {
        Some(ents) => resolve(text.unwrap_or_default(), ents),
        None => Ok(Vec::new()),
    }
}

impl Decode for Message {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        message_fields(d, &obj)
    }
}

fn message_fields(d: &mut Decoder, obj: &Object<'_>) -> Step<Message> {
    let message_id = obj.required(d, "message_id", MessageId::decode);
    let message_thread_id = obj.optional(d, "message_thread_id", i64::decode);
    let from = obj.optional(d, "from", User::decode);
    let sender_chat = obj.optional(d, "sender_chat", Chat::decode);
    let date = obj.required(d, "date", live_date);
    let chat = obj.required(d, "chat", Chat::decode);
    let forward_origin = obj.optional(d, "forward_origin", MessageOrigin::decode);
    let is_topic_message = obj.optional(d, "is_topic_message", bool::decode);
    let is_automatic_forward = obj.optional(d, "is_automatic_forward", bool::decode);
    let reply_to_message = obj.optional(d, "reply_to_message", Box::<Message>::decode);
    let quote = obj.optional(d, "quote", TextQuote::decode);
    let edit_date = obj.optional(d, "edit_date", i64::decode);
    let media_group_id = obj.optional(d, "media_group_id", String::decode);
    let author_signature = obj.optional(d, "author_signature", String::decode);
    let text = obj.optional(d, "text", String::decode);
    let entities = obj.optional(d, "entities", Vec::<MessageEntity>::decode);
    let caption = obj.optional(d, "caption", String::decode);
    let caption_entities = obj.optional(d, "caption_entities", Vec::<MessageEntity>::decode);
    let pinned_message = obj.optional(
        d,
        "pinned_message",
        Box::<MaybeInaccessibleMessage>::decode,
    );

    let msg = Message {
        message_id: message_id?,
        message_thread_id: message_thread_id?,
        from: from?,
        sender_chat: sender_chat?,
        date: date?,
        chat: chat?,
        forward_origin: forward_origin?,
        is_topic_message: is_topic_message?,
        is_automatic_forward: is_automatic_forward?,
        reply_to_message: reply_to_message?,
        quote: quote?,
        edit_date: edit_date?,
        media_group_id: media_group_id?,
        author_signature: author_signature?,
        text: text?,
        entities: entities?,
        caption: caption?,
        caption_entities: caption_entities?,
        pinned_message: pinned_message?,
    };

    let text_ok = match &msg.entities {
        Some(ents) => check_spans(
            d,
            "entities",
            msg.text.as_deref().unwrap_or_default(),
            ents,
            obj.field("entities").value(),
        ),
        None => Ok(()),
    };
    let caption_ok = match &msg.caption_entities {
        Some(ents) => check_spans(
            d,
            "caption_entities",
            msg.caption.as_deref().unwrap_or_default(),
            ents,
            obj.field("caption_entities").value(),
        ),
        None => Ok(()),
    };
    let quote_ok = check_quote_position(d, obj, &msg);

    text_ok?;
    caption_ok?;
    quote_ok?;
    Ok(msg)
}

fn live_date(d: &mut Decoder, value: &Value) -> Step<i64> {
    match i64::decode(d, value)? {
        0 => d.fail(
            DecodeErrorKind::InvalidFormat {
                expected: "non-zero unix time",
            },
            Some(value),
        ),
        date => Ok(date),
    }
}

/// The quote has to sit inside the text of the message it quotes.
fn check_quote_position(d: &mut Decoder, obj: &Object<'_>, msg: &Message) -> Step<()> {
    let (Some(quote), Some(replied)) = (&msg.quote, &msg.reply_to_message) else {
        return Ok(());
    };
    let Some(source) = replied.text_or_caption() else {
        return Ok(());
    };
    let limit = utf16_len(source);
    let quote_len = quote.len_utf16();
    if fits(quote.position, quote_len, limit) {
        return Ok(());
    }
    let raw = obj.field("quote").value().and_then(|q| q.get("position"));
    d.enter(Segment::Key("quote"), |d| {
        d.enter(Segment::Key("position"), |d| {
            d.soft(
                DecodeErrorKind::InconsistentQuotePosition {
                    position: quote.position,
                    quote_len,
                    limit,
                },
                raw,
            )
        })
    })
}

// ============== Inaccessible messages ==============

/// A message that was deleted or is otherwise out of the bot's reach.
///
/// Only the chat and id survive. On the wire it carries `"date": 0`, which is
/// what tells it apart from a live [`Message`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InaccessibleMessage {
    pub chat: Chat,
    pub message_id: MessageId,
}

impl Serialize for InaccessibleMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("InaccessibleMessage", 3)?;
        s.serialize_field("chat", &self.chat)?;
        s.serialize_field("message_id", &self.message_id)?;
        s.serialize_field("date", &0)?;
        s.end()
    }
}

impl Decode for InaccessibleMessage {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let date = obj.required(d, "date", |d, v| match i64::decode(d, v)? {
            0 => Ok(()),
            _ => d.fail(
                DecodeErrorKind::InvalidFormat {
                    expected: "date 0 for an inaccessible message",
                },
                Some(v),
            ),
        });
        let msg = inaccessible_fields(d, &obj);
        date?;
        msg
    }
}

fn inaccessible_fields(d: &mut Decoder, obj: &Object<'_>) -> Step<InaccessibleMessage> {
    let chat = obj.required(d, "chat", Chat::decode);
    let message_id = obj.required(d, "message_id", MessageId::decode);
    Ok(InaccessibleMessage {
        chat: chat?,
        message_id: message_id?,
    })
}

/// Either a live message or the stub left of an inaccessible one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MaybeInaccessibleMessage {
    Message(Box<Message>),
    Inaccessible(InaccessibleMessage),
}

impl MaybeInaccessibleMessage {
    pub fn chat(&self) -> &Chat {
        match self {
            MaybeInaccessibleMessage::Message(m) => &m.chat,
            MaybeInaccessibleMessage::Inaccessible(m) => &m.chat,
        }
    }

    pub fn message_id(&self) -> MessageId {
        match self {
            MaybeInaccessibleMessage::Message(m) => m.message_id,
            MaybeInaccessibleMessage::Inaccessible(m) => m.message_id,
        }
    }

    pub fn accessible(&self) -> Option<&Message> {
        match self {
            MaybeInaccessibleMessage::Message(m) => Some(m),
            MaybeInaccessibleMessage::Inaccessible(_) => None,
        }
    }
}

impl From<Message> for MaybeInaccessibleMessage {
    fn from(msg: Message) -> Self {
        MaybeInaccessibleMessage::Message(Box::new(msg))
    }
}

impl From<InaccessibleMessage> for MaybeInaccessibleMessage {
    fn from(msg: InaccessibleMessage) -> Self {
        MaybeInaccessibleMessage::Inaccessible(msg)
    }
}

/// `date == 0` marks an inaccessible message, any other integer a live one.
fn zero_date(d: &mut Decoder, obj: &Object<'_>) -> Step<Option<String>> {
    let Some(raw) = obj.field("date").value() else {
        return d.fail(
            DecodeErrorKind::MissingDiscriminator {
                union: "MaybeInaccessibleMessage",
                field: "date",
            },
            None,
        );
    };
    let date = d.enter(Segment::Key("date"), |d| i64::decode(d, raw))?;
    let tag = if date == 0 { "inaccessible" } else { "message" };
    Ok(Some(tag.to_string()))
}

fn live(d: &mut Decoder, obj: &Object<'_>) -> Step<MaybeInaccessibleMessage> {
    message_fields(d, obj).map(MaybeInaccessibleMessage::from)
}

fn inaccessible(d: &mut Decoder, obj: &Object<'_>) -> Step<MaybeInaccessibleMessage> {
    inaccessible_fields(d, obj).map(MaybeInaccessibleMessage::Inaccessible)
}

static MAYBE_INACCESSIBLE: VariantTable<MaybeInaccessibleMessage> = VariantTable {
    union: "MaybeInaccessibleMessage",
    structural: Some(zero_date),
    tag_field: None,
    exclusive: &[],
    variants: &[
        Variant::new("message", live),
        Variant::new("inaccessible", inaccessible),
    ],
};

impl Decode for MaybeInaccessibleMessage {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        MAYBE_INACCESSIBLE.resolve(d, value)
    }
}

// ============== MessageId object ==============

/// The `MessageId` object returned by `copyMessage` and friends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SentMessageId {
    pub message_id: MessageId,
}

impl SentMessageId {
    /// 0 until a scheduled message is actually sent.
    pub fn is_scheduled(&self) -> bool {
        self.message_id.is_scheduled()
    }
}

impl Decode for SentMessageId {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let obj = Object::expect(d, value)?;
        let message_id = obj.required(d, "message_id", MessageId::decode)?;
        Ok(Self { message_id })
    }
}
