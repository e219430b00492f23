//! Pass 7: Constraint Pruning & Enum Sorting
//!
//! Removes constraints that the target provider doesn't support, normalizes
//! `const` → `enum`, and sorts enum arrays to place the default value first.
//!
//! Emits `DroppedConstraint` codec entries for every pruned keyword.

use serde_json::{json, Value};

use crate::codec::DroppedConstraint;
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::schema_utils::build_path;
use crate::target_profile::{self, TargetProfile};

/// Result of running the constraint pruning pass.
#[derive(Debug)]
pub struct ConstraintPassResult {
    /// The transformed schema with unsupported constraints removed.
    pub schema: Value,
    /// Constraints that were dropped during this pass.
    pub dropped_constraints: Vec<DroppedConstraint>,
}

/// Value-constraint keywords checked against `TargetProfile::supported_constraints`.
/// `format` is handled separately via `string_format_policy`.
const VALUE_CONSTRAINT_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "minProperties",
    "maxProperties",
    "contains",
    "minContains",
    "maxContains",
];

/// Conditional/negation applicators no current target can express in a
/// structured-output schema; dropped unconditionally.
const ALWAYS_DROPPED_APPLICATORS: &[&str] = &["not", "if", "then", "else"];

/// Prune unsupported constraints from a schema based on the target provider.
///
/// Recursively walks every node and:
/// 1. Normalizes `const` → `enum: [value]` (except Gemini, which supports `const`)
/// 2. Sorts `enum` to place `default` value first (before `default` is dropped)
/// 3. Drops unsupported constraints per target, emitting `DroppedConstraint` entries
pub fn prune_constraints(
    schema: &Value,
    config: &ConvertOptions,
) -> Result<ConstraintPassResult, ConvertError> {
    let profile = target_profile::profile_for(config.target);
    let mut dropped = Vec::new();
    let result = prune_node(schema, config, &profile, "#", 0, &mut dropped)?;
    Ok(ConstraintPassResult {
        schema: result,
        dropped_constraints: dropped,
    })
}

fn prune_node(
    node: &Value,
    config: &ConvertOptions,
    profile: &TargetProfile,
    path: &str,
    depth: usize,
    dropped: &mut Vec<DroppedConstraint>,
) -> Result<Value, ConvertError> {
    if depth > config.max_depth {
        return Err(ConvertError::RecursionDepthExceeded {
            path: path.to_string(),
            limit: config.max_depth,
        });
    }

    let obj = match node.as_object() {
        Some(o) => o,
        None => return Ok(node.clone()),
    };

    let mut out = obj.clone();

    normalize_const(&mut out, profile);
    sort_enum_default_first(&mut out, path, dropped);

    for keyword in VALUE_CONSTRAINT_KEYWORDS {
        if let Some(value) = out.get(*keyword).cloned() {
            if !profile.supported_constraints.contains(keyword) {
                out.remove(*keyword);
                dropped.push(DroppedConstraint {
                    at: build_path(path, &[keyword]),
                    constraint: keyword.to_string(),
                    value,
                    reason: "unsupported_by_target".to_string(),
                });
            }
        }
    }

    if let Some(format_value) = out.get("format").cloned() {
        let keep = format_value
            .as_str()
            .map(|f| profile.string_format_policy.contains(f))
            .unwrap_or(false);
        if !keep {
            out.remove("format");
            dropped.push(DroppedConstraint {
                at: build_path(path, &["format"]),
                constraint: "format".to_string(),
                value: format_value,
                reason: "unsupported_format_value".to_string(),
            });
        }
    }

    for keyword in ALWAYS_DROPPED_APPLICATORS {
        if let Some(value) = out.get(*keyword).cloned() {
            out.remove(*keyword);
            dropped.push(DroppedConstraint {
                at: build_path(path, &[keyword]),
                constraint: keyword.to_string(),
                value,
                reason: "conditional_schemas_unsupported".to_string(),
            });
        }
    }

    recurse_children(&mut out, config, profile, path, depth, dropped)?;

    Ok(Value::Object(out))
}

/// `const` → `enum: [value]` unless the target supports `const` natively.
fn normalize_const(obj: &mut serde_json::Map<String, Value>, profile: &TargetProfile) {
    if profile.supports_const {
        return;
    }
    if let Some(value) = obj.remove("const") {
        obj.insert("enum".to_string(), json!([value]));
    }
}

/// Move `default`'s value to the front of `enum` (if present among its
/// values), then drop `default` — no target preserves it.
fn sort_enum_default_first(
    obj: &mut serde_json::Map<String, Value>,
    path: &str,
    dropped: &mut Vec<DroppedConstraint>,
) {
    let default_value = match obj.remove("default") {
        Some(v) => v,
        None => return,
    };

    if let Some(Value::Array(values)) = obj.get_mut("enum") {
        if let Some(pos) = values.iter().position(|v| *v == default_value) {
            let v = values.remove(pos);
            values.insert(0, v);
        }
    }

    dropped.push(DroppedConstraint {
        at: build_path(path, &["default"]),
        constraint: "default".to_string(),
        value: default_value,
        reason: "unsupported_by_target".to_string(),
    });
}

fn recurse_children(
    obj: &mut serde_json::Map<String, Value>,
    config: &ConvertOptions,
    profile: &TargetProfile,
    path: &str,
    depth: usize,
    dropped: &mut Vec<DroppedConstraint>,
) -> Result<(), ConvertError> {
    if let Some(Value::Object(props)) = obj.get("properties").cloned() {
        let mut new_props = serde_json::Map::with_capacity(props.len());
        for (key, child) in props {
            let child_path = build_path(path, &["properties", &key]);
            let pruned = prune_node(&child, config, profile, &child_path, depth + 1, dropped)?;
            new_props.insert(key, pruned);
        }
        obj.insert("properties".to_string(), Value::Object(new_props));
    }

    if let Some(items) = obj.get("items").cloned() {
        if items.is_object() {
            let child_path = build_path(path, &["items"]);
            let pruned = prune_node(&items, config, profile, &child_path, depth + 1, dropped)?;
            obj.insert("items".to_string(), pruned);
        }
    }

    if let Some(Value::Array(prefix)) = obj.get("prefixItems").cloned() {
        let mut new_prefix = Vec::with_capacity(prefix.len());
        for (i, child) in prefix.into_iter().enumerate() {
            let child_path = build_path(path, &["prefixItems", &i.to_string()]);
            new_prefix.push(prune_node(&child, config, profile, &child_path, depth + 1, dropped)?);
        }
        obj.insert("prefixItems".to_string(), Value::Array(new_prefix));
    }

    if let Some(ap) = obj.get("additionalProperties").cloned() {
        if ap.is_object() {
            let child_path = build_path(path, &["additionalProperties"]);
            let pruned = prune_node(&ap, config, profile, &child_path, depth + 1, dropped)?;
            obj.insert("additionalProperties".to_string(), pruned);
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = obj.get(keyword).cloned() {
            let mut new_variants = Vec::with_capacity(variants.len());
            for (i, child) in variants.into_iter().enumerate() {
                let child_path = build_path(path, &[keyword, &i.to_string()]);
                new_variants.push(prune_node(&child, config, profile, &child_path, depth + 1, dropped)?);
            }
            obj.insert(keyword.to_string(), Value::Array(new_variants));
        }
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = obj.get(keyword).cloned() {
            let mut new_defs = serde_json::Map::with_capacity(defs.len());
            for (name, child) in defs {
                let child_path = build_path(path, &[keyword, &name]);
                new_defs.insert(name, prune_node(&child, config, profile, &child_path, depth + 1, dropped)?);
            }
            obj.insert(keyword.to_string(), Value::Object(new_defs));
        }
    }

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::config::{ConvertOptions, Target};

    fn run(schema: Value, target: Target) -> (Value, Vec<DroppedConstraint>) {
        let config = ConvertOptions {
            target,
            ..ConvertOptions::default()
        };
        let result = prune_constraints(&schema, &config).unwrap();
        (result.schema, result.dropped_constraints)
    }

    fn run_openai(schema: Value) -> (Value, Vec<DroppedConstraint>) {
        run(schema, Target::OpenaiStrict)
    }

    // -----------------------------------------------------------------------
    // Test 1: Drop minimum/maximum for OpenAI, preserve for Gemini
    // -----------------------------------------------------------------------
    #[test]
    fn test_drop_minmax_openai_preserve_gemini() {
        let input = json!({
            "type": "integer",
            "minimum": 0,
            "maximum": 100
        });

        // OpenAI: both dropped
        let (openai_out, openai_dropped) = run(input.clone(), Target::OpenaiStrict);
        assert!(openai_out.get("minimum").is_none(), "minimum should be dropped for OpenAI");
        assert!(openai_out.get("maximum").is_none(), "maximum should be dropped for OpenAI");
        assert_eq!(openai_dropped.len(), 2);

        // Gemini: both preserved
        let (gemini_out, gemini_dropped) = run(input, Target::Gemini);
        assert_eq!(gemini_out["minimum"], json!(0), "minimum should be preserved for Gemini");
        assert_eq!(gemini_out["maximum"], json!(100), "maximum should be preserved for Gemini");
        assert_eq!(gemini_dropped.len(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 2: const → enum normalization
    // -----------------------------------------------------------------------
    #[test]
    fn test_const_to_enum_normalization() {
        let input = json!({
            "type": "string",
            "const": "active"
        });

        // OpenAI: const → enum: ["active"], const removed
        let (openai_out, _) = run(input.clone(), Target::OpenaiStrict);
        assert_eq!(openai_out["enum"], json!(["active"]));
        assert!(openai_out.get("const").is_none());

        // Claude: same behavior
        let (claude_out, _) = run(input.clone(), Target::Claude);
        assert_eq!(claude_out["enum"], json!(["active"]));
        assert!(claude_out.get("const").is_none());

        // Gemini: const preserved as-is
        let (gemini_out, _) = run(input, Target::Gemini);
        assert_eq!(gemini_out["const"], json!("active"));
    }

    // -----------------------------------------------------------------------
    // Test 3: Enum default-first sorting
    // -----------------------------------------------------------------------
    #[test]
    fn test_enum_default_first_sorting() {
        let input = json!({
            "type": "string",
            "enum": ["alpha", "beta", "gamma"],
            "default": "beta"
        });

        let (out, dropped) = run_openai(input);

        // beta should be first
        assert_eq!(out["enum"], json!(["beta", "alpha", "gamma"]));

        // default should be dropped (unsupported by all providers)
        assert!(out.get("default").is_none());

        // default should appear in dropped_constraints
        let default_dropped = dropped.iter().find(|d| d.constraint == "default");
        assert!(default_dropped.is_some(), "default must be in dropped_constraints");
        assert_eq!(default_dropped.unwrap().value, json!("beta"));
    }

    // -----------------------------------------------------------------------
    // Test 4: Drop not / if-then-else with codec annotation
    // -----------------------------------------------------------------------
    #[test]
    fn test_drop_not_if_then_else() {
        let input = json!({
            "type": "string",
            "not": { "enum": ["bad"] },
            "if": { "minLength": 5 },
            "then": { "pattern": "^[A-Z]" },
            "else": { "pattern": "^[a-z]" }
        });

        let (out, dropped) = run_openai(input);

        assert!(out.get("not").is_none());
        assert!(out.get("if").is_none());
        assert!(out.get("then").is_none());
        assert!(out.get("else").is_none());

        // 4 dropped constraints: not, if, then, else
        assert_eq!(dropped.len(), 4);
        let dropped_names: Vec<&str> = dropped.iter().map(|d| d.constraint.as_str()).collect();
        assert!(dropped_names.contains(&"not"));
        assert!(dropped_names.contains(&"if"));
        assert!(dropped_names.contains(&"then"));
        assert!(dropped_names.contains(&"else"));
    }

    // -----------------------------------------------------------------------
    // Test 5: pattern preserved for OpenAI, dropped for Claude
    // -----------------------------------------------------------------------
    #[test]
    fn test_pattern_openai_vs_claude() {
        let input = json!({
            "type": "string",
            "pattern": "^[A-Z]+"
        });

        // OpenAI: preserved
        let (openai_out, openai_dropped) = run(input.clone(), Target::OpenaiStrict);
        assert_eq!(openai_out["pattern"], json!("^[A-Z]+"));
        assert_eq!(openai_dropped.len(), 0);

        // Claude: dropped
        let (claude_out, claude_dropped) = run(input, Target::Claude);
        assert!(claude_out.get("pattern").is_none());
        assert_eq!(claude_dropped.len(), 1);
        assert_eq!(claude_dropped[0].constraint, "pattern");
    }

    // -----------------------------------------------------------------------
    // Test 6: Multiple constraints on same node — all handled
    // -----------------------------------------------------------------------
    #[test]
    fn test_multiple_constraints_same_node() {
        let input = json!({
            "type": "integer",
            "minimum": 0,
            "maximum": 100,
            "default": 50,
            "multipleOf": 5,
            "exclusiveMinimum": 0
        });

        let (out, dropped) = run_openai(input);

        // All should be dropped for OpenAI
        assert!(out.get("minimum").is_none());
        assert!(out.get("maximum").is_none());
        assert!(out.get("default").is_none());
        assert!(out.get("multipleOf").is_none());
        assert!(out.get("exclusiveMinimum").is_none());

        // type preserved
        assert_eq!(out["type"], json!("integer"));

        // 5 dropped constraints
        assert_eq!(dropped.len(), 5);
    }

    // -----------------------------------------------------------------------
    // Test 7: Nested structures — constraints pruned at all depths
    // -----------------------------------------------------------------------
    #[test]
    fn test_nested_recursion() {
        let input = json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "minLength": 1,
                    "maxLength": 100
                },
                "items": {
                    "type": "array",
                    "items": {
                        "type": "integer",
                        "minimum": 0
                    },
                    "minItems": 1
                }
            }
        });

        let (out, dropped) = run_openai(input);

        // name constraints dropped
        assert!(out["properties"]["name"].get("minLength").is_none());
        assert!(out["properties"]["name"].get("maxLength").is_none());

        // array item constraint dropped
        assert!(out["properties"]["items"]["items"].get("minimum").is_none());

        // array-level constraint dropped
        assert!(out["properties"]["items"].get("minItems").is_none());

        // 4 total dropped
        assert_eq!(dropped.len(), 4);
    }

    // -----------------------------------------------------------------------
    // Test 8: Depth guard triggers
    // -----------------------------------------------------------------------
    #[test]
    fn test_depth_guard() {
        let input = json!({
            "type": "object",
            "properties": {
                "nested": {
                    "type": "object",
                    "properties": {
                        "deep": { "type": "string", "minLength": 1 }
                    }
                }
            }
        });

        let config = ConvertOptions {
            max_depth: 1,
            ..ConvertOptions::default()
        };

        let result = prune_constraints(&input, &config);
        assert!(result.is_err(), "should fail on depth exceeded");
    }

    // -----------------------------------------------------------------------
    // Test 9: Non-object schemas pass through unchanged
    // -----------------------------------------------------------------------
    #[test]
    fn test_empty_schema_passthrough() {
        let input = json!("string");
        let (out, dropped) = run_openai(input.clone());
        assert_eq!(out, input);
        assert_eq!(dropped.len(), 0);

        let input_bool = json!(true);
        let (out_bool, dropped_bool) = run_openai(input_bool.clone());
        assert_eq!(out_bool, input_bool);
        assert_eq!(dropped_bool.len(), 0);
    }
}
