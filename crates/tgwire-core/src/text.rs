//! UTF-16 span handling for message entities.
//!
//! Telegram counts entity offsets and lengths in UTF-16 code units. Rust
//! strings are UTF-8, so spans go through [`Utf16Map`] before they can slice
//! the text.

use std::ops::Range;

use serde_json::Value;

use crate::{
    decode::{Decoder, Segment, Step},
    model::entity::MessageEntity,
    report::DecodeErrorKind,
};

/// Max length of a reply quote after entity parsing.
pub const MAX_QUOTE_UNITS: usize = 1024;

/// Max length of a message text.
pub const MAX_TEXT_UNITS: usize = 4096;

pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// UTF-16 offset → UTF-8 byte offset lookup for one text.
#[derive(Clone, Debug)]
pub struct Utf16Map {
    // One slot per UTF-16 position, `None` inside a surrogate pair.
    byte_at: Vec<Option<usize>>,
}

impl Utf16Map {
    pub fn new(text: &str) -> Self {
        let mut byte_at = Vec::with_capacity(text.len() + 1);
        for (byte, ch) in text.char_indices() {
            byte_at.push(Some(byte));
            if ch.len_utf16() == 2 {
                byte_at.push(None);
            }
        }
        byte_at.push(Some(text.len()));
        Self { byte_at }
    }

    /// Text length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.byte_at.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte range for a UTF-16 span, if it is in bounds and on char boundaries.
    pub fn byte_range(&self, offset: i64, length: i64) -> Option<Range<usize>> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(length).ok()?)?;
        let start_byte = (*self.byte_at.get(start)?)?;
        let end_byte = (*self.byte_at.get(end)?)?;
        Some(start_byte..end_byte)
    }
}

/// An entity span that does not fit its text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpanError {
    pub index: usize,
    pub offset: i64,
    pub length: i64,
    pub text_len: usize,
}

impl From<SpanError> for DecodeErrorKind {
    fn from(e: SpanError) -> Self {
        DecodeErrorKind::EntitySpanOutOfRange {
            index: e.index,
            offset: e.offset,
            length: e.length,
            text_len: e.text_len,
        }
    }
}

/// An entity together with the slice of text it covers.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedEntity<'a> {
    pub index: usize,
    pub entity: &'a MessageEntity,
    /// Byte range into the original text.
    pub range: Range<usize>,
    pub text: &'a str,
}

/// Resolve every entity against `text`, in the given order.
///
/// Overlapping and nested spans are legal and are returned as-is.
pub fn resolve<'a>(
    text: &'a str,
    entities: &'a [MessageEntity],
) -> Result<Vec<ResolvedEntity<'a>>, SpanError> {
    let map = Utf16Map::new(text);
    entities
        .iter()
        .enumerate()
        .map(|(index, entity)| {
            let range = span(&map, index, entity)?;
            Ok(ResolvedEntity {
                index,
                entity,
                text: &text[range.clone()],
                range,
            })
        })
        .collect()
}

fn span(map: &Utf16Map, index: usize, entity: &MessageEntity) -> Result<Range<usize>, SpanError> {
    map.byte_range(entity.offset, entity.length)
        .ok_or(SpanError {
            index,
            offset: entity.offset,
            length: entity.length,
            text_len: map.len(),
        })
}

/// Record an `EntitySpanOutOfRange` for each entity that does not fit `text`.
///
/// `raw` is the wire array the entities came from, used for error previews.
pub(crate) fn check_spans(
    d: &mut Decoder,
    field: &'static str,
    text: &str,
    entities: &[MessageEntity],
    raw: Option<&Value>,
) -> Step<()> {
    let map = Utf16Map::new(text);
    let mut out = Ok(());
    for (index, entity) in entities.iter().enumerate() {
        let Err(err) = span(&map, index, entity) else {
            continue;
        };
        let item = raw.and_then(|v| v.get(index));
        out = d.enter(Segment::Key(field), |d| {
            d.enter(Segment::Index(index), |d| d.fail(err.into(), item))
        });
        if d.halted() {
            break;
        }
    }
    out
}
