//! Pass 3: Reconcile `oneOf`/`anyOf` with the target's polymorphism policy
//! (spec.md §4.2 / §4.3 pass 3).
//!
//! `openai-strict` requires mutually exclusive branches expressed as
//! `oneOf`; `gemini` and `claude` read `anyOf` natively. A node using the
//! keyword the profile disfavors is rewritten to the preferred one and the
//! rewrite is recorded as `Transform::ExpandAnyOfToOneOf` regardless of
//! which direction it ran, since the op carries no direction-specific
//! payload — rehydration only needs to know the location changed shape.

use serde_json::Value;

use crate::codec::{Codec, Transform};
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::schema_utils::build_path;
use crate::target_profile::TargetProfile;

pub struct PolymorphismPassResult {
    pub schema: Value,
    pub codec: Codec,
}

pub fn reconcile_polymorphism(
    schema: &Value,
    _config: &ConvertOptions,
    profile: &TargetProfile,
) -> Result<PolymorphismPassResult, ConvertError> {
    let mut codec = Codec::new();
    let schema = walk(schema, profile, "#", &mut codec);
    Ok(PolymorphismPassResult { schema, codec })
}

fn walk(node: &Value, profile: &TargetProfile, path: &str, codec: &mut Codec) -> Value {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return node.clone(),
    };

    let mut out = obj.clone();

    use crate::config::Polymorphism;
    match profile.polymorphism {
        Polymorphism::OneOf => {
            if let Some(variants) = out.remove("anyOf") {
                if !out.contains_key("oneOf") {
                    out.insert("oneOf".to_string(), variants);
                    codec.push_transform(Transform::ExpandAnyOfToOneOf { at: path.to_string() });
                } else {
                    out.insert("anyOf".to_string(), variants);
                }
            }
        }
        Polymorphism::AnyOf => {
            if let Some(variants) = out.remove("oneOf") {
                if !out.contains_key("anyOf") {
                    out.insert("anyOf".to_string(), variants);
                    codec.push_transform(Transform::ExpandAnyOfToOneOf { at: path.to_string() });
                } else {
                    out.insert("oneOf".to_string(), variants);
                }
            }
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

    for key in ["properties", "patternProperties"] {
        if let Some(Value::Object(props)) = out.get(key).cloned() {
            let mut new_props = serde_json::Map::with_capacity(props.len());
            for (k, child) in props {
                let child_path = build_path(path, &[key, &k]);
                new_props.insert(k, walk(&child, profile, &child_path, codec));
            }
            out.insert(key.to_string(), Value::Object(new_props));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use crate::target_profile;
    use serde_json::json;

    #[test]
    fn openai_rewrites_anyof_to_oneof() {
        let schema = json!({"anyOf": [{"type": "string"}, {"type": "integer"}]});
        let profile = target_profile::profile_for(Target::OpenaiStrict);
        let r = reconcile_polymorphism(&schema, &ConvertOptions::default(), &profile).unwrap();
        assert!(r.schema.get("anyOf").is_none());
        assert_eq!(r.schema["oneOf"].as_array().unwrap().len(), 2);
        assert_eq!(r.codec.transforms.len(), 1);
        assert!(matches!(r.codec.transforms[0], Transform::ExpandAnyOfToOneOf { .. }));
    }

    #[test]
    fn claude_rewrites_oneof_to_anyof() {
        let schema = json!({"oneOf": [{"type": "string"}, {"type": "integer"}]});
        let profile = target_profile::profile_for(Target::Claude);
        let r = reconcile_polymorphism(&schema, &ConvertOptions::default(), &profile).unwrap();
        assert!(r.schema.get("oneOf").is_none());
        assert_eq!(r.schema["anyOf"].as_array().unwrap().len(), 2);
        assert_eq!(r.codec.transforms.len(), 1);
    }

    #[test]
    fn already_matching_keyword_is_untouched() {
        let schema = json!({"oneOf": [{"type": "string"}]});
        let profile = target_profile::profile_for(Target::OpenaiStrict);
        let r = reconcile_polymorphism(&schema, &ConvertOptions::default(), &profile).unwrap();
        assert!(r.schema.get("oneOf").is_some());
        assert!(r.codec.is_noop());
    }

    #[test]
    fn nested_variant_is_reconciled_recursively() {
        let schema = json!({
            "type": "object",
            "properties": {
                "x": {"anyOf": [{"type": "string"}, {"type": "null"}]}
            }
        });
        let profile = target_profile::profile_for(Target::OpenaiStrict);
        let r = reconcile_polymorphism(&schema, &ConvertOptions::default(), &profile).unwrap();
        assert!(r.schema["properties"]["x"].get("oneOf").is_some());
        assert_eq!(r.codec.transforms.len(), 1);
        assert_eq!(r.codec.transforms[0].at(), "#/properties/x");
    }
}
