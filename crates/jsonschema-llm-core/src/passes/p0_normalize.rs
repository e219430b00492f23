//! Pass 0: Boolean-schema passthrough and unrecognized-keyword normalization.
//!
//! Boolean schemas (`true`/`false`) pass through untouched — every later
//! pass treats a boolean node as a leaf. Object schemas are walked once to
//! drop any keyword outside the 2020-12 set spec.md §3 names the engine
//! preserves; drops are informational (recorded, never silent).
//!
//! `definitions` is kept alongside `$defs` even though spec.md §3 only
//! names `$defs` literally: it is the draft-7 alias for the same construct
//! and every later pass that walks `$defs` (p1/p2/p3 recursion, the
//! component extractor, rehydration's pointer projection) already treats
//! the two uniformly, matching `tests/json_schema_test_suite.rs`'s kept
//! draft-7 `definitions.json` coverage. `default` is kept recognized here
//! but is not preserved to the output — `p7_constraints` drops it later
//! (see `reason: "unsupported_by_target"` there), so its presence in this
//! set never lets it silently survive unrecorded.

use serde_json::Value;

use crate::codec::DroppedConstraint;
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::schema_utils::build_path;

/// spec.md §3's literal preserved-keyword set, plus `definitions` and
/// `default` (see the module doc comment for why those two are kept).
/// Anything outside this set is dropped with an informational record.
const RECOGNIZED_KEYWORDS: &[&str] = &[
    "type",
    "properties",
    "required",
    "items",
    "prefixItems",
    "additionalProperties",
    "patternProperties",
    "$defs",
    "definitions",
    "$ref",
    "$schema",
    "$id",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "if",
    "then",
    "else",
    "dependentRequired",
    "const",
    "enum",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "pattern",
    "format",
    "minItems",
    "maxItems",
    "uniqueItems",
    "contains",
    "minContains",
    "maxContains",
    "minProperties",
    "maxProperties",
    "default",
];

#[derive(Debug)]
pub struct NormalizePassResult {
    pub schema: Value,
    pub dropped_constraints: Vec<DroppedConstraint>,
}

pub fn normalize(schema: &Value, _config: &ConvertOptions) -> Result<NormalizePassResult, ConvertError> {
    let mut dropped = Vec::new();
    let schema = normalize_node(schema, "#", &mut dropped);
    Ok(NormalizePassResult {
        schema,
        dropped_constraints: dropped,
    })
}

fn normalize_node(node: &Value, path: &str, dropped: &mut Vec<DroppedConstraint>) -> Value {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return node.clone(),
    };

    let mut out = serde_json::Map::with_capacity(obj.len());
    for (key, value) in obj {
        if !RECOGNIZED_KEYWORDS.contains(&key.as_str()) {
            dropped.push(DroppedConstraint {
                at: build_path(path, &[key]),
                constraint: key.clone(),
                value: value.clone(),
                reason: "unrecognized_keyword".to_string(),
            });
            continue;
        }
        out.insert(key.clone(), value.clone());
    }

    if let Some(Value::Object(props)) = out.get("properties").cloned() {
        let mut new_props = serde_json::Map::with_capacity(props.len());
        for (k, child) in props {
            let child_path = build_path(path, &["properties", &k]);
            new_props.insert(k, normalize_node(&child, &child_path, dropped));
        }
        out.insert("properties".to_string(), Value::Object(new_props));
    }

    if let Some(Value::Object(pp)) = out.get("patternProperties").cloned() {
        let mut new_pp = serde_json::Map::with_capacity(pp.len());
        for (k, child) in pp {
            let child_path = build_path(path, &["patternProperties", &k]);
            new_pp.insert(k, normalize_node(&child, &child_path, dropped));
        }
        out.insert("patternProperties".to_string(), Value::Object(new_pp));
    }

    if let Some(items) = out.get("items").cloned() {
        if items.is_object() || items.is_boolean() {
            let child_path = build_path(path, &["items"]);
            out.insert("items".to_string(), normalize_node(&items, &child_path, dropped));
        }
    }

    if let Some(Value::Array(prefix)) = out.get("prefixItems").cloned() {
        let new_prefix: Vec<Value> = prefix
            .into_iter()
            .enumerate()
            .map(|(i, child)| {
                let child_path = build_path(path, &["prefixItems", &i.to_string()]);
                normalize_node(&child, &child_path, dropped)
            })
            .collect();
        out.insert("prefixItems".to_string(), Value::Array(new_prefix));
    }

    if let Some(ap) = out.get("additionalProperties").cloned() {
        if ap.is_object() || ap.is_boolean() {
            let child_path = build_path(path, &["additionalProperties"]);
            out.insert(
                "additionalProperties".to_string(),
                normalize_node(&ap, &child_path, dropped),
            );
        }
    }

    for keyword in ["not", "if", "then", "else", "contains"] {
        if let Some(child) = out.get(keyword).cloned() {
            let child_path = build_path(path, &[keyword]);
            out.insert(keyword.to_string(), normalize_node(&child, &child_path, dropped));
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = out.get(keyword).cloned() {
            let new_variants: Vec<Value> = variants
                .into_iter()
                .enumerate()
                .map(|(i, child)| {
                    let child_path = build_path(path, &[keyword, &i.to_string()]);
                    normalize_node(&child, &child_path, dropped)
                })
                .collect();
            out.insert(keyword.to_string(), Value::Array(new_variants));
        }
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = out.get(keyword).cloned() {
            let mut new_defs = serde_json::Map::with_capacity(defs.len());
            for (name, child) in defs {
                let child_path = build_path(path, &[keyword, &name]);
                new_defs.insert(name, normalize_node(&child, &child_path, dropped));
            }
            out.insert(keyword.to_string(), Value::Object(new_defs));
        }
    }

    Value::Object(out)
}
