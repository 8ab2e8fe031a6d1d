//! Union resolution: one flat wire object → exactly one variant of a closed set.
//!
//! The discriminator is read before anything else. A structural rule (such as
//! "date == 0 means inaccessible") runs first and wins when it yields a tag;
//! the string tag field is consulted only after that. Field-shape inference is
//! never used.

use serde_json::Value;

use super::{Decoder, Object, Segment, Step};
use crate::report::DecodeErrorKind;

/// Computes a variant tag from the object itself. `Ok(None)` defers to the tag field.
pub type StructuralRule = fn(&mut Decoder, &Object<'_>) -> Step<Option<String>>;

pub type VariantDecode<T> = fn(&mut Decoder, &Object<'_>) -> Step<T>;

pub struct Variant<T: 'static> {
    pub tag: &'static str,
    /// Exclusive payload fields this variant is allowed to carry.
    pub owns: &'static [&'static str],
    pub decode: VariantDecode<T>,
}

impl<T> Variant<T> {
    pub const fn new(tag: &'static str, decode: VariantDecode<T>) -> Self {
        Self {
            tag,
            owns: &[],
            decode,
        }
    }

    pub const fn owning(
        tag: &'static str,
        owns: &'static [&'static str],
        decode: VariantDecode<T>,
    ) -> Self {
        Self { tag, owns, decode }
    }
}

/// Declaration of a closed union.
pub struct VariantTable<T: 'static> {
    pub union: &'static str,
    pub structural: Option<StructuralRule>,
    pub tag_field: Option<&'static str>,
    /// Payload fields that only their owning variants may carry.
    pub exclusive: &'static [&'static str],
    pub variants: &'static [Variant<T>],
}

impl<T> VariantTable<T> {
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.variants.iter().map(|v| v.tag)
    }

    pub fn resolve(&self, d: &mut Decoder, value: &Value) -> Step<T> {
        let obj = Object::expect(d, value)?;
        let tag = self.discriminate(d, &obj)?;

        let Some(variant) = self.variants.iter().find(|v| v.tag == tag) else {
            let raw = self.tag_field.and_then(|f| obj.field(f).value());
            let kind = DecodeErrorKind::UnknownVariant {
                union: self.union,
                tag,
            };
            return match self.tag_field {
                Some(field) if raw.is_some() => {
                    d.enter(Segment::Key(field), |d| d.fail(kind, raw))
                }
                _ => d.fail(kind, None),
            };
        };

        for &field in self.exclusive {
            if variant.owns.contains(&field) {
                continue;
            }
            let Some(raw) = obj.field(field).value() else {
                continue;
            };
            d.enter(Segment::Key(field), |d| {
                d.soft(
                    DecodeErrorKind::MisplacedEntityField {
                        entity_type: variant.tag,
                        field,
                    },
                    Some(raw),
                )
            })?;
        }

        (variant.decode)(d, &obj)
    }

    fn discriminate(&self, d: &mut Decoder, obj: &Object<'_>) -> Step<String> {
        if let Some(rule) = self.structural {
            if let Some(tag) = rule(d, obj)? {
                return Ok(tag);
            }
        }

        let Some(field) = self.tag_field else {
            return d.fail(
                DecodeErrorKind::MissingDiscriminator {
                    union: self.union,
                    field: "<structural>",
                },
                Some(obj.raw()),
            );
        };

        match obj.field(field).value() {
            Some(Value::String(tag)) => Ok(tag.clone()),
            Some(other) => d.enter(Segment::Key(field), |d| d.mismatch("string", other)),
            None => d.fail(
                DecodeErrorKind::MissingDiscriminator {
                    union: self.union,
                    field,
                },
                None,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::DecodeOptions,
        decode::{decode_value, Decode},
    };
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    enum Shape {
        Circle { r: i64 },
        Square { side: i64 },
        Dot,
    }

    fn circle(d: &mut Decoder, obj: &Object<'_>) -> Step<Shape> {
        let r = obj.required(d, "r", i64::decode)?;
        Ok(Shape::Circle { r })
    }

    fn square(d: &mut Decoder, obj: &Object<'_>) -> Step<Shape> {
        let side = obj.required(d, "side", i64::decode)?;
        Ok(Shape::Square { side })
    }

    fn dot(_: &mut Decoder, _: &Object<'_>) -> Step<Shape> {
        Ok(Shape::Dot)
    }

    fn zero_size_is_dot(d: &mut Decoder, obj: &Object<'_>) -> Step<Option<String>> {
        match obj.field("size").value() {
            Some(v) => {
                let size = d.enter(Segment::Key("size"), |d| i64::decode(d, v))?;
                Ok((size == 0).then(|| "dot".to_string()))
            }
            None => Ok(None),
        }
    }

    static SHAPES: VariantTable<Shape> = VariantTable {
        union: "Shape",
        structural: Some(zero_size_is_dot),
        tag_field: Some("kind"),
        exclusive: &["r", "side"],
        variants: &[
            Variant::owning("circle", &["r"], circle),
            Variant::owning("square", &["side"], square),
            Variant::new("dot", dot),
        ],
    };

    impl Decode for Shape {
        fn decode(d: &mut Decoder, value: &Value) -> Step<Self> {
            SHAPES.resolve(d, value)
        }
    }

    fn strict(v: Value) -> Result<Shape, crate::report::DecodeReport> {
        decode_value::<Shape>(&v, &DecodeOptions::strict()).map(|d| d.value)
    }

    #[test]
    fn dispatches_on_tag_field() {
        assert_eq!(
            strict(json!({"kind": "circle", "r": 2})).unwrap(),
            Shape::Circle { r: 2 }
        );
        assert_eq!(
            strict(json!({"kind": "square", "side": 3})).unwrap(),
            Shape::Square { side: 3 }
        );
    }

    #[test]
    fn structural_rule_wins_over_tag() {
        assert_eq!(
            strict(json!({"kind": "circle", "size": 0})).unwrap(),
            Shape::Dot
        );
    }

    #[test]
    fn unknown_and_missing_discriminators_fail() {
        let err = strict(json!({"kind": "hexagon"})).unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::UnknownVariant {
                union: "Shape",
                tag: "hexagon".into()
            }
        );
        assert_eq!(err.errors[0].path.to_string(), "kind");

        let err = strict(json!({"r": 1})).unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::MissingDiscriminator {
                union: "Shape",
                field: "kind"
            }
        );
    }

    #[test]
    fn no_shape_inference_fallback() {
        // Looks exactly like a circle, but carries no discriminator.
        assert!(strict(json!({"r": 5})).is_err());
    }

    #[test]
    fn non_string_tag_is_a_mismatch() {
        let err = strict(json!({"kind": 7})).unwrap_err();
        assert!(matches!(
            err.errors[0].kind,
            DecodeErrorKind::TypeMismatch { expected: "string", .. }
        ));
    }

    #[test]
    fn exclusive_fields_are_checked_before_payload() {
        let err = strict(json!({"kind": "square", "r": 1})).unwrap_err();
        assert_eq!(
            err.errors[0].kind,
            DecodeErrorKind::MisplacedEntityField {
                entity_type: "square",
                field: "r"
            }
        );
        assert_eq!(err.errors[0].path.to_string(), "r");

        let ok = decode_value::<Shape>(
            &json!({"kind": "square", "side": 2, "r": 1}),
            &DecodeOptions::best_effort(),
        )
        .unwrap();
        assert_eq!(ok.value, Shape::Square { side: 2 });
        assert_eq!(ok.warnings.len(), 1);
    }
}
