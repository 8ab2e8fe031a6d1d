//! The decode engine: a per-call [`Decoder`] context plus the [`Decode`] trait
//! every model type implements.
//!
//! Decoders return [`Step`]. `Err(Failed)` means "this node failed and the
//! issue is already recorded in the decoder"; callers never re-wrap it.
//! Composite decoders evaluate all of their fields before combining results,
//! so best-effort mode sees sibling errors while strict mode short-circuits
//! through the `halted` flag.

pub mod object;
pub mod path;
pub mod union;

use serde_json::Value;

use crate::{
    config::{DecodeMode, DecodeOptions},
    report::{preview, DecodeError, DecodeErrorKind},
};

pub use crate::report::{DecodeReport, Decoded};
pub use object::{Field, Object};
pub use path::{FieldPath, Segment};

/// Marker for a node whose failure has already been recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Failed;

pub type Step<T> = std::result::Result<T, Failed>;

/// Types that can be built from a JSON value under a [`Decoder`].
pub trait Decode: Sized {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self>;
}

/// State for one decode call: options, current path, and collected issues.
///
/// A `Decoder` is never shared between calls; concurrent decodes each own one.
#[derive(Debug)]
pub struct Decoder {
    opts: DecodeOptions,
    path: FieldPath,
    errors: Vec<DecodeError>,
    warnings: Vec<DecodeError>,
    halted: bool,
    truncated: bool,
}

impl Decoder {
    pub fn new(opts: &DecodeOptions) -> Self {
        Self {
            opts: opts.clone(),
            path: FieldPath::root(),
            errors: Vec::new(),
            warnings: Vec::new(),
            halted: false,
            truncated: false,
        }
    }

    pub fn mode(&self) -> DecodeMode {
        self.opts.mode
    }

    /// No further work should be done: strict mode hit an error, or the error limit was reached.
    pub fn halted(&self) -> bool {
        self.halted
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Run `f` one level deeper in the path.
    pub fn enter<T>(&mut self, segment: Segment, f: impl FnOnce(&mut Self) -> Step<T>) -> Step<T> {
        if self.halted {
            return Err(Failed);
        }
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    /// Record an error at the current path and fail the node.
    pub fn fail<T>(&mut self, kind: DecodeErrorKind, raw: Option<&Value>) -> Step<T> {
        self.record_error(kind, raw);
        Err(Failed)
    }

    /// Record an issue that best-effort mode accepts as a warning.
    ///
    /// Strict mode treats it like any other error.
    pub fn soft(&mut self, kind: DecodeErrorKind, raw: Option<&Value>) -> Step<()> {
        match self.opts.mode {
            DecodeMode::Strict => self.fail(kind, raw),
            DecodeMode::BestEffort => {
                let issue = self.issue(kind, raw);
                self.warnings.push(issue);
                Ok(())
            }
        }
    }

    /// Type mismatch helper for leaf decoders.
    pub fn mismatch<T>(&mut self, expected: &'static str, raw: &Value) -> Step<T> {
        self.fail(
            DecodeErrorKind::TypeMismatch {
                expected,
                found: crate::report::JsonKind::of(raw),
            },
            Some(raw),
        )
    }

    /// Turn a failed optional field into `None` when best-effort mode allows it.
    ///
    /// Only possible when every error raised since `mark` is recoverable; those
    /// errors are moved to the warnings list.
    pub(crate) fn salvage<T>(&mut self, mark: usize, out: Step<T>) -> Step<Option<T>> {
        if let Ok(value) = out {
            return Ok(Some(value));
        }
        if self.opts.mode == DecodeMode::Strict || self.halted {
            return Err(Failed);
        }
        let raised = &self.errors[mark..];
        if raised.is_empty() || raised.iter().any(|e| e.kind.is_always_fatal()) {
            return Err(Failed);
        }
        let salvaged: Vec<DecodeError> = self.errors.drain(mark..).collect();
        tracing::debug!(
            path = %self.path,
            issues = salvaged.len(),
            "dropped optional field after recoverable decode errors"
        );
        self.warnings.extend(salvaged);
        Ok(None)
    }

    pub(crate) fn error_mark(&self) -> usize {
        self.errors.len()
    }

    fn issue(&self, kind: DecodeErrorKind, raw: Option<&Value>) -> DecodeError {
        DecodeError::new(
            kind,
            self.path.clone(),
            raw.map(|v| preview(v, self.opts.preview_len)),
        )
    }

    fn record_error(&mut self, kind: DecodeErrorKind, raw: Option<&Value>) {
        if self.halted {
            return;
        }
        let issue = self.issue(kind, raw);
        self.errors.push(issue);
        match self.opts.mode {
            DecodeMode::Strict => self.halted = true,
            DecodeMode::BestEffort => {
                if self.errors.len() >= self.opts.max_errors {
                    self.halted = true;
                    self.truncated = true;
                }
            }
        }
    }

    /// Close the decode: a value with warnings, or a report of every error.
    pub fn finish<T>(self, out: Step<T>) -> std::result::Result<Decoded<T>, DecodeReport> {
        tracing::debug!(
            mode = ?self.opts.mode,
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            "decode finished"
        );
        match out {
            Ok(value) if self.errors.is_empty() => Ok(Decoded {
                value,
                warnings: self.warnings,
            }),
            _ => Err(DecodeReport {
                errors: self.errors,
                warnings: self.warnings,
                truncated: self.truncated,
            }),
        }
    }
}

// ============== Entry points ==============

/// Decode `T` from JSON bytes in strict mode.
pub fn decode<T: Decode>(bytes: &[u8]) -> std::result::Result<Decoded<T>, DecodeReport> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decode `T` from JSON bytes with explicit options.
pub fn decode_with<T: Decode>(
    bytes: &[u8],
    opts: &DecodeOptions,
) -> std::result::Result<Decoded<T>, DecodeReport> {
    let value = parse_json(bytes)?;
    decode_value(&value, opts)
}

pub fn decode_str<T: Decode>(
    json: &str,
    opts: &DecodeOptions,
) -> std::result::Result<Decoded<T>, DecodeReport> {
    decode_with(json.as_bytes(), opts)
}

/// Decode `T` from an already parsed JSON value.
pub fn decode_value<T: Decode>(
    value: &Value,
    opts: &DecodeOptions,
) -> std::result::Result<Decoded<T>, DecodeReport> {
    let mut d = Decoder::new(opts);
    let out = T::decode(&mut d, value);
    d.finish(out)
}

pub(crate) fn parse_json(bytes: &[u8]) -> std::result::Result<Value, DecodeReport> {
    serde_json::from_slice(bytes).map_err(|e| {
        DecodeReport::single(DecodeError::new(
            DecodeErrorKind::InvalidJson {
                message: e.to_string(),
            },
            FieldPath::root(),
            None,
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Pair {
        a: i64,
        b: String,
        c: Option<bool>,
    }

    impl Decode for Pair {
        fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
            let obj = Object::expect(d, value)?;
            let a = obj.required(d, "a", i64::decode);
            let b = obj.required(d, "b", String::decode);
            let c = obj.optional(d, "c", bool::decode);
            Ok(Pair {
                a: a?,
                b: b?,
                c: c?,
            })
        }
    }

    #[test]
    fn strict_stops_at_first_error() {
        let err = decode_value::<Pair>(&json!({"b": 1}), &DecodeOptions::strict()).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].kind, DecodeErrorKind::MissingRequiredField);
        assert_eq!(err.errors[0].path.to_string(), "a");
    }

    #[test]
    fn best_effort_collects_sibling_errors() {
        let err =
            decode_value::<Pair>(&json!({"b": 1}), &DecodeOptions::best_effort()).unwrap_err();
        let paths: Vec<String> = err.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["a", "b"]);
        assert!(!err.truncated);
    }

    #[test]
    fn best_effort_salvages_bad_optional_field() {
        let ok = decode_value::<Pair>(
            &json!({"a": 1, "b": "x", "c": "yes"}),
            &DecodeOptions::best_effort(),
        )
        .unwrap();
        assert_eq!(ok.value.c, None);
        assert_eq!(ok.warnings.len(), 1);
        assert_eq!(ok.warnings[0].path.to_string(), "c");
        assert_eq!(ok.warnings[0].received.as_deref(), Some("\"yes\""));
    }

    #[test]
    fn strict_rejects_bad_optional_field() {
        let err = decode_value::<Pair>(
            &json!({"a": 1, "b": "x", "c": "yes"}),
            &DecodeOptions::strict(),
        )
        .unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            DecodeErrorKind::TypeMismatch { expected: "boolean", .. }
        ));
    }

    #[test]
    fn error_limit_truncates_report() {
        let opts = DecodeOptions::best_effort().with_max_errors(1);
        let err = decode_value::<Pair>(&json!({}), &opts).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert!(err.truncated);
    }

    #[test]
    fn invalid_json_is_reported_at_root() {
        let err = decode::<Pair>(b"{not json").unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            DecodeErrorKind::InvalidJson { .. }
        ));
        assert!(err.errors[0].path.is_root());
    }
}
