//! The optional-field model and leaf decoders.
//!
//! A field lookup has three outcomes ([`Field`]). Optional model fields map
//! `Absent` and `Null` to `None`; any present value is decoded, so `Some(0)`,
//! `Some(false)` and `Some("")` stay distinct from "not sent".

use serde_json::{Map, Value};

use super::{Decode, Decoder, Failed, Segment, Step};
use crate::report::DecodeErrorKind;

/// Raw result of looking a key up in a JSON object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Field<'v> {
    Absent,
    Null,
    Present(&'v Value),
}

impl<'v> Field<'v> {
    pub fn value(self) -> Option<&'v Value> {
        match self {
            Field::Present(v) => Some(v),
            Field::Absent | Field::Null => None,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Field::Present(_))
    }
}

/// A JSON object being decoded.
#[derive(Clone, Copy, Debug)]
pub struct Object<'v> {
    map: &'v Map<String, Value>,
    raw: &'v Value,
}

impl<'v> Object<'v> {
    /// View `value` as an object, or record a type mismatch.
    pub fn expect(d: &mut Decoder, value: &'v Value) -> Step<Self> {
        match value {
            Value::Object(map) => Ok(Self { map, raw: value }),
            other => d.mismatch("object", other),
        }
    }

    pub fn raw(&self) -> &'v Value {
        self.raw
    }

    pub fn field(&self, name: &str) -> Field<'v> {
        match self.map.get(name) {
            None => Field::Absent,
            Some(Value::Null) => Field::Null,
            Some(v) => Field::Present(v),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'v str> {
        self.map.keys().map(String::as_str)
    }

    /// Decode a field that must be present.
    pub fn required<T>(
        &self,
        d: &mut Decoder,
        name: &'static str,
        f: impl FnOnce(&mut Decoder, &'v Value) -> Step<T>,
    ) -> Step<T> {
        let field = self.field(name);
        d.enter(Segment::Key(name), |d| match field {
            Field::Present(v) => f(d, v),
            Field::Absent | Field::Null => d.fail(DecodeErrorKind::MissingRequiredField, None),
        })
    }

    /// Decode a field that may be absent.
    ///
    /// In best-effort mode a field that fails with recoverable errors only is
    /// dropped to `None` and its errors become warnings.
    pub fn optional<T>(
        &self,
        d: &mut Decoder,
        name: &'static str,
        f: impl FnOnce(&mut Decoder, &'v Value) -> Step<T>,
    ) -> Step<Option<T>> {
        if d.halted() {
            return Err(Failed);
        }
        let Field::Present(v) = self.field(name) else {
            return Ok(None);
        };
        let mark = d.error_mark();
        let out = d.enter(Segment::Key(name), |d| f(d, v));
        d.salvage(mark, out)
    }
}

// ============== Leaf decoders ==============

impl Decode for bool {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => d.mismatch("boolean", other),
        }
    }
}

impl Decode for i64 {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        match value.as_i64() {
            Some(n) => Ok(n),
            None => d.mismatch("64-bit integer", value),
        }
    }
}

impl Decode for String {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => d.mismatch("string", other),
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        let Value::Array(items) = value else {
            return d.mismatch("array", value);
        };
        let mut out = Vec::with_capacity(items.len());
        let mut failed = false;
        for (idx, item) in items.iter().enumerate() {
            if d.halted() {
                return Err(Failed);
            }
            match d.enter(Segment::Index(idx), |d| T::decode(d, item)) {
                Ok(v) => out.push(v),
                Err(Failed) => failed = true,
            }
        }
        if failed {
            Err(Failed)
        } else {
            Ok(out)
        }
    }
}

/// Raw pass-through, for payloads decoded later (a `getUpdates` result array).
impl Decode for Value {
    fn decode(_: &mut Decoder, value: &Value) -> Step<Self> {
        Ok(value.clone())
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
        T::decode(d, value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DecodeOptions, decode::decode_value, report::JsonKind};
    use serde_json::json;

    #[test]
    fn field_lookup_distinguishes_absent_null_and_zero() {
        let v = json!({"zero": 0, "empty": "", "nothing": null});
        let mut d = Decoder::new(&DecodeOptions::default());
        let obj = Object::expect(&mut d, &v).unwrap();
        assert_eq!(obj.field("missing"), Field::Absent);
        assert_eq!(obj.field("nothing"), Field::Null);
        assert_eq!(obj.field("zero"), Field::Present(&json!(0)));
        assert_eq!(obj.optional(&mut d, "zero", i64::decode), Ok(Some(0)));
        assert_eq!(
            obj.optional(&mut d, "empty", String::decode),
            Ok(Some(String::new()))
        );
        assert_eq!(obj.optional(&mut d, "missing", i64::decode), Ok(None));
        assert_eq!(obj.optional(&mut d, "nothing", i64::decode), Ok(None));
    }

    #[test]
    fn integers_keep_full_width() {
        let big = 1i64 << 40;
        let out = decode_value::<i64>(&json!(big), &DecodeOptions::default()).unwrap();
        assert_eq!(out.value, big);

        let err = decode_value::<i64>(&json!(1.5), &DecodeOptions::default()).unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::TypeMismatch {
                expected: "64-bit integer",
                found: JsonKind::Float
            }
        );
        let err = decode_value::<i64>(&json!(u64::MAX), &DecodeOptions::default()).unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            DecodeErrorKind::TypeMismatch { .. }
        ));
    }

    #[test]
    fn vec_reports_every_bad_element_in_best_effort() {
        let err = decode_value::<Vec<i64>>(&json!([1, "a", 3, true]), &DecodeOptions::best_effort())
            .unwrap_err();
        let paths: Vec<String> = err.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(paths, vec!["[1]", "[3]"]);
    }

    #[test]
    fn non_object_is_a_mismatch() {
        let mut d = Decoder::new(&DecodeOptions::default());
        assert!(Object::expect(&mut d, &json!([1])).is_err());
        assert!(d.halted());
    }
}
