//! Pass 8: Enforce `max-depth` on the converted schema (spec.md §4.1 /
//! §4.3 pass 8).
//!
//! Distinct from `p7_constraints`'s internal depth guard (which treats
//! exceeding its own recursion bound as a hard `recursion_depth_exceeded`
//! error — a safety net against pathological input, not a policy). This
//! pass enforces the target profile's `max-depth` as policy on the
//! already-inlined output tree: a subtree at the limit is truncated to an
//! empty, permissive schema (`{}`) rather than failing the conversion, and
//! the truncation is recorded as a dropped constraint.

use serde_json::Value;

use crate::codec::DroppedConstraint;
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::schema_utils::build_path;
use crate::target_profile::TargetProfile;

pub struct MaxDepthPassResult {
    pub schema: Value,
    pub dropped_constraints: Vec<DroppedConstraint>,
}

pub fn enforce_max_depth(
    schema: &Value,
    config: &ConvertOptions,
    profile: &TargetProfile,
) -> Result<MaxDepthPassResult, ConvertError> {
    let limit = config.max_depth.min(profile.max_depth);
    let mut dropped = Vec::new();
    let schema = walk(schema, limit, 0, "#", &mut dropped);
    Ok(MaxDepthPassResult {
        schema,
        dropped_constraints: dropped,
    })
}

fn walk(node: &Value, limit: usize, depth: usize, path: &str, dropped: &mut Vec<DroppedConstraint>) -> Value {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return node.clone(),
    };

    if depth > limit {
        dropped.push(DroppedConstraint {
            at: path.to_string(),
            constraint: "subtree".to_string(),
            value: node.clone(),
            reason: "max_depth_exceeded".to_string(),
        });
        return Value::Object(serde_json::Map::new());
    }

    let mut out = obj.clone();

    for key in ["properties", "patternProperties"] {
        if let Some(Value::Object(props)) = out.get(key).cloned() {
            let mut new_props = serde_json::Map::with_capacity(props.len());
            for (k, child) in props {
                let child_path = build_path(path, &[key, &k]);
                new_props.insert(k, walk(&child, limit, depth + 1, &child_path, dropped));
            }
            out.insert(key.to_string(), Value::Object(new_props));
        }
    }

    if let Some(items) = out.get("items").cloned() {
        if items.is_object() {
            out.insert("items".to_string(), walk(&items, limit, depth + 1, &build_path(path, &["items"]), dropped));
        }
    }

    if let Some(Value::Array(prefix)) = out.get("prefixItems").cloned() {
        let new_prefix: Vec<Value> = prefix
            .into_iter()
            .enumerate()
            .map(|(i, child)| walk(&child, limit, depth + 1, &build_path(path, &["prefixItems", &i.to_string()]), dropped))
            .collect();
        out.insert("prefixItems".to_string(), Value::Array(new_prefix));
    }

    if let Some(ap) = out.get("additionalProperties").cloned() {
        if ap.is_object() {
            out.insert(
                "additionalProperties".to_string(),
                walk(&ap, limit, depth + 1, &build_path(path, &["additionalProperties"]), dropped),
            );
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = out.get(keyword).cloned() {
            let new_variants: Vec<Value> = variants
                .into_iter()
                .enumerate()
                .map(|(i, child)| walk(&child, limit, depth + 1, &build_path(path, &[keyword, &i.to_string()]), dropped))
                .collect();
            out.insert(keyword.to_string(), Value::Array(new_variants));
        }
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = out.get(keyword).cloned() {
            let mut new_defs = serde_json::Map::with_capacity(defs.len());
            for (name, child) in defs {
                new_defs.insert(name.clone(), walk(&child, limit, depth + 1, &build_path(path, &[keyword, &name]), dropped));
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

    fn deep_schema(levels: usize) -> Value {
        let mut node = json!({"type": "string"});
        for _ in 0..levels {
            node = json!({"type": "object", "properties": {"child": node}});
        }
        node
    }

    #[test]
    fn shallow_schema_passes_through_untouched() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let profile = target_profile::profile_for(Target::Claude);
        let mut config = ConvertOptions::default();
        config.max_depth = 50;
        let r = enforce_max_depth(&schema, &config, &profile).unwrap();
        assert_eq!(r.schema, schema);
        assert!(r.dropped_constraints.is_empty());
    }

    #[test]
    fn deep_schema_is_truncated_at_limit() {
        let schema = deep_schema(10);
        let profile = target_profile::profile_for(Target::Claude);
        let mut config = ConvertOptions::default();
        config.max_depth = 3;
        let r = enforce_max_depth(&schema, &config, &profile).unwrap();
        assert!(!r.dropped_constraints.is_empty());
        assert_eq!(r.dropped_constraints[0].reason, "max_depth_exceeded");
    }

    #[test]
    fn effective_limit_is_tighter_of_config_and_profile() {
        let schema = deep_schema(8);
        let profile = target_profile::profile_for(Target::OpenaiStrict); // profile.max_depth == 5
        let mut config = ConvertOptions::default();
        config.max_depth = 50;
        let r = enforce_max_depth(&schema, &config, &profile).unwrap();
        assert!(!r.dropped_constraints.is_empty());
    }
}
