//! Pass 6: Seal object schemas for targets that require a fully strict
//! shape (spec.md §4.2 / §4.3 pass 6).
//!
//! `openai-strict` requires every object node to set
//! `additionalProperties: false` and to list every property in `required`
//! — optionality is instead expressed by widening the property's type (or
//! `enum`) to admit `null`. Both rewrites are recorded so rehydration can
//! tell a genuinely-required `null` apart from a promoted-optional one.

use serde_json::Value;

use crate::codec::{Codec, Transform};
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::schema_utils::build_path;
use crate::target_profile::TargetProfile;

pub struct StrictPassResult {
    pub schema: Value,
    pub codec: Codec,
}

pub fn apply_strict(
    schema: &Value,
    _config: &ConvertOptions,
    profile: &TargetProfile,
) -> Result<StrictPassResult, ConvertError> {
    let mut codec = Codec::new();
    let schema = walk(schema, profile, "#", &mut codec);
    Ok(StrictPassResult { schema, codec })
}

fn walk(node: &Value, profile: &TargetProfile, path: &str, codec: &mut Codec) -> Value {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return node.clone(),
    };

    let mut out = obj.clone();
    let is_object_schema = out.contains_key("properties")
        || out.get("type").and_then(|t| t.as_str()) == Some("object");

    if is_object_schema {
        if profile.require_additional_properties_false && out.get("additionalProperties") != Some(&Value::Bool(false))
        {
            out.insert("additionalProperties".to_string(), Value::Bool(false));
            codec.push_transform(Transform::SynthesizeAdditionalPropertiesFalse { at: path.to_string() });
        }

        if profile.require_all_properties_in_required {
            if let Some(Value::Object(props)) = out.get("properties").cloned() {
                let mut required: Vec<String> = out
                    .get("required")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                    .unwrap_or_default();

                let mut new_props = serde_json::Map::with_capacity(props.len());
                for (key, prop_schema) in props {
                    let already_required = required.contains(&key);
                    let prop_path = build_path(path, &["properties", &key]);
                    let widened = if already_required {
                        prop_schema
                    } else {
                        required.push(key.clone());
                        codec.push_transform(Transform::PromoteOptionalToRequiredWithNull {
                            at: path.to_string(),
                            key: key.clone(),
                        });
                        widen_to_nullable(&prop_schema)
                    };
                    new_props.insert(key, walk(&widened, profile, &prop_path, codec));
                }
                out.insert("properties".to_string(), Value::Object(new_props));
                out.insert(
                    "required".to_string(),
                    Value::Array(required.into_iter().map(Value::String).collect()),
                );
            }
        } else if let Some(Value::Object(props)) = out.get("properties").cloned() {
            let mut new_props = serde_json::Map::with_capacity(props.len());
            for (key, child) in props {
                let child_path = build_path(path, &["properties", &key]);
                new_props.insert(key, walk(&child, profile, &child_path, codec));
            }
            out.insert("properties".to_string(), Value::Object(new_props));
        }
    }

    if let Some(items) = out.get("items").cloned() {
        if items.is_object() {
            out.insert("items".to_string(), walk(&items, profile, &build_path(path, &["items"]), codec));
        }
    }

    if let Some(Value::Array(prefix)) = out.get("prefixItems").cloned() {
        let new_prefix: Vec<Value> = prefix
            .into_iter()
            .enumerate()
            .map(|(i, child)| walk(&child, profile, &build_path(path, &["prefixItems", &i.to_string()]), codec))
            .collect();
        out.insert("prefixItems".to_string(), Value::Array(new_prefix));
    }

    if let Some(ap) = out.get("additionalProperties").cloned() {
        if ap.is_object() {
            out.insert(
                "additionalProperties".to_string(),
                walk(&ap, profile, &build_path(path, &["additionalProperties"]), codec),
            );
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = out.get(keyword).cloned() {
            let new_variants: Vec<Value> = variants
                .into_iter()
                .enumerate()
                .map(|(i, child)| walk(&child, profile, &build_path(path, &[keyword, &i.to_string()]), codec))
                .collect();
            out.insert(keyword.to_string(), Value::Array(new_variants));
        }
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = out.get(keyword).cloned() {
            let mut new_defs = serde_json::Map::with_capacity(defs.len());
            for (name, child) in defs {
                new_defs.insert(name.clone(), walk(&child, profile, &build_path(path, &[keyword, &name]), codec));
            }
            out.insert(keyword.to_string(), Value::Object(new_defs));
        }
    }

    Value::Object(out)
}

/// Widen a property schema to also accept `null`, so promoting it into
/// `required` does not change what a conformant document may omit in
/// spirit (an absent key becomes an explicit `null`).
fn widen_to_nullable(schema: &Value) -> Value {
    let mut obj = match schema.as_object() {
        Some(o) => o.clone(),
        None => return schema.clone(),
    };

    match obj.get("type").cloned() {
        Some(Value::String(t)) if t != "null" => {
            obj.insert("type".to_string(), Value::Array(vec![Value::String(t), Value::String("null".to_string())]));
        }
        Some(Value::Array(mut types)) => {
            if !types.iter().any(|t| t == "null") {
                types.push(Value::String("null".to_string()));
            }
            obj.insert("type".to_string(), Value::Array(types));
        }
        None => {
            if let Some(Value::Array(mut variants)) = obj.get("enum").cloned() {
                if !variants.iter().any(|v| v.is_null()) {
                    variants.push(Value::Null);
                }
                obj.insert("enum".to_string(), Value::Array(variants));
            }
        }
        _ => {}
    }

    Value::Object(obj)
}
