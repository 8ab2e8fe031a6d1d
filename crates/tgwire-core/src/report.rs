//! Decode issues, reports, and the success wrapper.
//!
//! Every issue carries the field path it was raised at and a bounded preview of
//! the offending JSON, so a malformed payload can be debugged from a log line.

use std::fmt;

use serde_json::Value;

use crate::decode::path::FieldPath;

/// JSON kind of a value, as seen by the decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JsonKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonKind::Integer,
            Value::Number(_) => JsonKind::Float,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "boolean",
            JsonKind::Integer => "integer",
            JsonKind::Float => "float",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong while decoding one node.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("missing required field")]
    MissingRequiredField,

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: JsonKind,
    },

    #[error("unknown {union} variant {tag:?}")]
    UnknownVariant { union: &'static str, tag: String },

    #[error("{union} is missing its discriminator `{field}`")]
    MissingDiscriminator {
        union: &'static str,
        field: &'static str,
    },

    #[error("{union} carries more than one variant key: {keys:?}")]
    AmbiguousVariant {
        union: &'static str,
        keys: Vec<String>,
    },

    #[error(
        "entity #{index} spans [{offset}, {offset}+{length}) outside a text of {text_len} UTF-16 units"
    )]
    EntitySpanOutOfRange {
        index: usize,
        offset: i64,
        length: i64,
        text_len: usize,
    },

    #[error("`{field}` is not allowed on `{entity_type}` entities")]
    MisplacedEntityField {
        entity_type: &'static str,
        field: &'static str,
    },

    #[error("quote is {len} UTF-16 units long, limit is {max}")]
    QuoteTooLong { len: usize, max: usize },

    #[error("quote at position {position} with length {quote_len} does not fit in {limit} UTF-16 units")]
    InconsistentQuotePosition {
        position: i64,
        quote_len: usize,
        limit: usize,
    },

    #[error("{value:?} is not one of {allowed:?}")]
    ClosedSetViolation {
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("invalid value, expected {expected}")]
    InvalidFormat { expected: &'static str },

    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },
}

impl DecodeErrorKind {
    /// Kinds that abort the decode in every mode: continuing would fabricate data.
    pub fn is_always_fatal(&self) -> bool {
        matches!(
            self,
            DecodeErrorKind::MissingRequiredField
                | DecodeErrorKind::UnknownVariant { .. }
                | DecodeErrorKind::EntitySpanOutOfRange { .. }
                | DecodeErrorKind::AmbiguousVariant { .. }
                | DecodeErrorKind::InvalidJson { .. }
        )
    }

    /// Stable snake_case name, handy for log fields and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            DecodeErrorKind::MissingRequiredField => "missing_required_field",
            DecodeErrorKind::TypeMismatch { .. } => "type_mismatch",
            DecodeErrorKind::UnknownVariant { .. } => "unknown_variant",
            DecodeErrorKind::MissingDiscriminator { .. } => "missing_discriminator",
            DecodeErrorKind::AmbiguousVariant { .. } => "ambiguous_variant",
            DecodeErrorKind::EntitySpanOutOfRange { .. } => "entity_span_out_of_range",
            DecodeErrorKind::MisplacedEntityField { .. } => "misplaced_entity_field",
            DecodeErrorKind::QuoteTooLong { .. } => "quote_too_long",
            DecodeErrorKind::InconsistentQuotePosition { .. } => "inconsistent_quote_position",
            DecodeErrorKind::ClosedSetViolation { .. } => "closed_set_violation",
            DecodeErrorKind::InvalidFormat { .. } => "invalid_format",
            DecodeErrorKind::InvalidJson { .. } => "invalid_json",
        }
    }
}

/// One issue raised during decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    pub path: FieldPath,
    /// Compact JSON of the offending value, truncated to the configured preview length.
    pub received: Option<String>,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind, path: FieldPath, received: Option<String>) -> Self {
        Self {
            kind,
            path,
            received,
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)?;
        if let Some(received) = &self.received {
            write!(f, " (received {received})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

/// A failed decode: every error collected, plus warnings raised on the way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub errors: Vec<DecodeError>,
    pub warnings: Vec<DecodeError>,
    /// Decoding stopped at the error limit; later fields were not inspected.
    pub truncated: bool,
}

impl DecodeReport {
    pub fn single(error: DecodeError) -> Self {
        Self {
            errors: vec![error],
            warnings: Vec::new(),
            truncated: false,
        }
    }

    pub fn first(&self) -> Option<&DecodeError> {
        self.errors.first()
    }

    pub fn kinds(&self) -> Vec<&DecodeErrorKind> {
        self.errors.iter().map(|e| &e.kind).collect()
    }
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.errors.first() else {
            return f.write_str("decode failed");
        };
        write!(f, "{first}")?;
        let rest = self.errors.len() - 1;
        if rest > 0 {
            write!(f, " (+{rest} more)")?;
        }
        if self.truncated {
            f.write_str(" [truncated]")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeReport {}

/// A successfully decoded value and the warnings accepted on the way.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub warnings: Vec<DecodeError>,
}

impl<T> Decoded<T> {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            warnings: self.warnings,
        }
    }
}

/// Compact JSON of `value`, cut to at most `max_chars` characters.
pub fn preview(value: &Value, max_chars: usize) -> String {
    let raw = value.to_string();
    if raw.chars().count() <= max_chars {
        return raw;
    }
    let mut out: String = raw.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::path::Segment;
    use serde_json::json;

    #[test]
    fn preview_truncates_long_values() {
        let v = json!("x".repeat(200));
        let p = preview(&v, 10);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), 13);
        assert_eq!(preview(&json!(42), 10), "42");
    }

    #[test]
    fn kinds_classify_fatality() {
        assert!(DecodeErrorKind::MissingRequiredField.is_always_fatal());
        assert!(DecodeErrorKind::UnknownVariant {
            union: "MessageOrigin",
            tag: "alien".into()
        }
        .is_always_fatal());
        assert!(!DecodeErrorKind::QuoteTooLong { len: 1025, max: 1024 }.is_always_fatal());
        assert!(!DecodeErrorKind::ClosedSetViolation {
            value: "x".into(),
            allowed: &["a"]
        }
        .is_always_fatal());
    }

    #[test]
    fn error_display_includes_path_and_preview() {
        let path = FieldPath::from_segments(vec![
            Segment::Key("message"),
            Segment::Key("entities"),
            Segment::Index(2),
            Segment::Key("offset"),
        ]);
        let err = DecodeError::new(
            DecodeErrorKind::TypeMismatch {
                expected: "integer",
                found: JsonKind::String,
            },
            path,
            Some("\"5\"".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "message.entities[2].offset: expected integer, found string (received \"5\")"
        );
    }

    #[test]
    fn report_display_counts_remaining_errors() {
        let e = DecodeError::new(DecodeErrorKind::MissingRequiredField, FieldPath::root(), None);
        let report = DecodeReport {
            errors: vec![e.clone(), e],
            warnings: vec![],
            truncated: true,
        };
        assert_eq!(
            report.to_string(),
            "<root>: missing required field (+1 more) [truncated]"
        );
    }
}
