//! Rehydration: reverse a [`Codec`] against a document that conforms to the
//! converted schema, recovering a document shaped like the original schema
//! (spec.md §4.5).
//!
//! Transforms are undone in reverse application order. Most ops are schema-
//! only and have no data-side inverse (`InlineRef`, `DropFormat`,
//! `ExpandAnyOfToOneOf`, `SynthesizeAdditionalPropertiesFalse` all leave the
//! document untouched). `TruncateRecursion` lost real structure when it ran
//! and cannot be recovered; it is surfaced as a warning rather than an
//! error, since the document is still valid input, just possibly shallower
//! than the original schema allowed.

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::codec::{Codec, Transform, CODEC_SCHEMA_URI};
use crate::error::RehydrationError;
use crate::schema_utils::schema_pointer_to_data_pointer;

#[derive(Debug, Clone, Serialize)]
pub struct RehydrateResult {
    pub api_version: &'static str,
    pub data: Value,
    pub warnings: Vec<String>,
}

/// Reverse every transform in `codec` against `data`, most-recent-first.
#[instrument(skip(data, codec))]
pub fn rehydrate(data: &Value, codec: &Codec) -> Result<RehydrateResult, RehydrationError> {
    if codec.schema_uri != CODEC_SCHEMA_URI {
        return Err(RehydrationError::CodecVersionMismatch {
            expected: CODEC_SCHEMA_URI.to_string(),
            found: codec.schema_uri.clone(),
        });
    }

    let mut data = data.clone();
    let mut warnings = Vec::new();

    for transform in codec.transforms.iter().rev() {
        apply_inverse(&mut data, transform, &mut warnings)?;
    }

    Ok(RehydrateResult {
        api_version: crate::convert::API_VERSION,
        data,
        warnings,
    })
}

fn apply_inverse(data: &mut Value, transform: &Transform, warnings: &mut Vec<String>) -> Result<(), RehydrationError> {
    match transform {
        Transform::InlineRef { .. }
        | Transform::DropFormat { .. }
        | Transform::ExpandAnyOfToOneOf { .. }
        | Transform::SynthesizeAdditionalPropertiesFalse { .. } => Ok(()),

        Transform::WrapScalarAsString { at, original_type } => {
            let data_pointer = schema_pointer_to_data_pointer(at);
            let node = match pointer_mut(data, &data_pointer) {
                Some(n) => n,
                None => return Ok(()),
            };
            let Value::String(s) = node else { return Ok(()) };
            let coerced = coerce_scalar(s, original_type).ok_or_else(|| RehydrationError::TypeCoercionFailed {
                path: at.clone(),
                message: format!("cannot coerce {s:?} back to {original_type}"),
            })?;
            *node = coerced;
            Ok(())
        }

        Transform::TruncateRecursion { at, r#ref, .. } => {
            warnings.push(format!(
                "data at {at} was truncated during conversion (recursive ref {ref_}); original shape beyond this point could not be recovered",
                ref_ = r#ref
            ));
            Ok(())
        }

        Transform::PromoteOptionalToRequiredWithNull { at, key } => {
            let data_pointer = schema_pointer_to_data_pointer(at);
            let parent = match pointer_mut(data, &data_pointer) {
                Some(n) => n,
                None => return Ok(()),
            };
            if let Value::Object(map) = parent {
                if matches!(map.get(key), Some(Value::Null)) {
                    map.remove(key);
                }
            }
            Ok(())
        }

        Transform::RootObjectWrapper { wrapper_key, .. } => {
            let Value::Object(map) = &*data else {
                return Err(RehydrationError::MalformedCodec {
                    message: "root wrapper transform expects an object document".to_string(),
                });
            };
            let inner = map.get(wrapper_key).cloned().ok_or_else(|| RehydrationError::MalformedCodec {
                message: format!("document is missing wrapper key '{wrapper_key}'"),
            })?;
            *data = inner;
            Ok(())
        }
    }
}

/// Mutable access to the node at `pointer` (our `"#/..."` convention),
/// treating a bare `"#"` as the whole document.
fn pointer_mut<'a>(data: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    let trimmed = pointer.strip_prefix('#').unwrap_or(pointer);
    if trimmed.is_empty() {
        return Some(data);
    }
    data.pointer_mut(trimmed)
}

fn coerce_scalar(s: &str, original_type: &str) -> Option<Value> {
    match original_type {
        "number" => s.parse::<f64>().ok().map(|n| serde_json::json!(n)),
        "integer" => s.parse::<i64>().ok().map(|n| serde_json::json!(n)),
        "boolean" => s.parse::<bool>().ok().map(Value::Bool),
        "null" => (s == "null").then_some(Value::Null),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DroppedConstraint;
    use serde_json::json;

    #[test]
    fn rejects_mismatched_codec_version() {
        let mut codec = Codec::new();
        codec.schema_uri = "https://example.com/old".to_string();
        let err = rehydrate(&json!({}), &codec).unwrap_err();
        assert_eq!(err.code(), "rehydration_error");
        assert_eq!(err.sub_code(), "codec_version_mismatch");
    }

    #[test]
    fn unwraps_root_object_wrapper() {
        let mut codec = Codec::new();
        codec.push_transform(Transform::RootObjectWrapper {
            path: "#".to_string(),
            wrapper_key: "result".to_string(),
        });
        let data = json!({"result": ["a", "b"]});
        let r = rehydrate(&data, &codec).unwrap();
        assert_eq!(r.data, json!(["a", "b"]));
    }

    #[test]
    fn restores_omitted_optional_property() {
        let mut codec = Codec::new();
        codec.push_transform(Transform::PromoteOptionalToRequiredWithNull {
            at: "#".to_string(),
            key: "age".to_string(),
        });
        let data = json!({"name": "Ada", "age": null});
        let r = rehydrate(&data, &codec).unwrap();
        assert_eq!(r.data, json!({"name": "Ada"}));
    }

    #[test]
    fn keeps_genuinely_present_promoted_property() {
        let mut codec = Codec::new();
        codec.push_transform(Transform::PromoteOptionalToRequiredWithNull {
            at: "#".to_string(),
            key: "age".to_string(),
        });
        let data = json!({"name": "Ada", "age": 36});
        let r = rehydrate(&data, &codec).unwrap();
        assert_eq!(r.data, json!({"name": "Ada", "age": 36}));
    }

    #[test]
    fn truncate_recursion_warns_but_does_not_fail() {
        let mut codec = Codec::new();
        codec.push_transform(Transform::TruncateRecursion {
            at: "#/properties/next".to_string(),
            depth: 3,
            r#ref: "#/$defs/Node".to_string(),
        });
        let r = rehydrate(&json!({"value": "x", "next": {}}), &codec).unwrap();
        assert_eq!(r.warnings.len(), 1);
    }

    #[test]
    fn no_op_transforms_leave_data_untouched() {
        let mut codec = Codec::new();
        codec.push_transform(Transform::InlineRef {
            at: "#/properties/n".to_string(),
            r#ref: "#/$defs/Node".to_string(),
        });
        codec.push_dropped(DroppedConstraint {
            at: "#/properties/n/minimum".to_string(),
            constraint: "minimum".to_string(),
            value: json!(0),
            reason: "unsupported_by_target".to_string(),
        });
        let data = json!({"n": {"value": "x"}});
        let r = rehydrate(&data, &codec).unwrap();
        assert_eq!(r.data, data);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn reverses_transforms_in_reverse_application_order() {
        let mut codec = Codec::new();
        // p6 ran first against the pre-wrap schema, recording the root
        // object's own pointer ("#"); p9's wrap happened afterward and is
        // unrelated to this pointer.
        codec.push_transform(Transform::PromoteOptionalToRequiredWithNull {
            at: "#".to_string(),
            key: "nickname".to_string(),
        });
        codec.push_transform(Transform::RootObjectWrapper {
            path: "#".to_string(),
            wrapper_key: "result".to_string(),
        });
        // Forward order was: promote (inner), then wrap (outer). Reverse
        // must unwrap first, then restore optionality on the now-root object.
        let data = json!({"result": {"name": "Ada", "nickname": null}});
        let r = rehydrate(&data, &codec).unwrap();
        assert_eq!(r.data, json!({"name": "Ada"}));
    }

    #[test]
    fn nested_promoted_property_maps_schema_pointer_to_data_pointer() {
        let mut codec = Codec::new();
        codec.push_transform(Transform::PromoteOptionalToRequiredWithNull {
            at: "#/properties/address".to_string(),
            key: "unit".to_string(),
        });
        let data = json!({"address": {"street": "Main St", "unit": null}});
        let r = rehydrate(&data, &codec).unwrap();
        assert_eq!(r.data, json!({"address": {"street": "Main St"}}));
    }
}
