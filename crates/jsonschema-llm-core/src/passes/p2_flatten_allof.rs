//! Pass 2: Flatten `allOf` of object schemas (spec.md §4.3 pass 2).
//!
//! Deep-merges `properties` and unions `required` across branches. When two
//! branches constrain the same keyword, monotone numeric/length bounds
//! (`minimum`, `maximum`, `minLength`, ...) are intersected losslessly; for
//! keywords with no well-defined intersection (`type`, `pattern`,
//! `multipleOf`, `const`) the first branch's value is kept and the
//! remainder are dropped with a `droppedConstraints` record, per spec.md
//! "otherwise drop the looser side and record."
//!
//! Branches that are not a plain object-shaped schema (a bare `$ref`, a
//! boolean schema, a schema built only from `anyOf`/`oneOf`) cannot be
//! merged structurally; `allOf` is left untouched in that case and later
//! passes see it as an ordinary applicator.

use serde_json::Value;

use crate::codec::DroppedConstraint;
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::schema_utils::build_path;

/// Bounds merged by taking the tightest (most restrictive) value; no
/// information is lost, so these never produce a dropped-constraint entry.
const INTERSECT_TIGHTEST_MIN: &[&str] = &["minimum", "exclusiveMinimum", "minLength", "minItems", "minProperties"];
const INTERSECT_TIGHTEST_MAX: &[&str] = &["maximum", "exclusiveMaximum", "maxLength", "maxItems", "maxProperties"];

/// Keywords with no well-defined merge: first branch wins, rest are dropped.
const FIRST_WINS: &[&str] = &["type", "pattern", "multipleOf", "const", "format"];

pub struct FlattenAllOfResult {
    pub schema: Value,
    pub dropped_constraints: Vec<DroppedConstraint>,
}

pub fn flatten_allof(schema: &Value, _config: &ConvertOptions) -> Result<FlattenAllOfResult, ConvertError> {
    let mut dropped = Vec::new();
    let schema = walk(schema, "#", &mut dropped);
    Ok(FlattenAllOfResult {
        schema,
        dropped_constraints: dropped,
    })
}

fn walk(node: &Value, path: &str, dropped: &mut Vec<DroppedConstraint>) -> Value {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return node.clone(),
    };

    let mut out = obj.clone();

    if let Some(Value::Array(branches)) = out.get("allOf").cloned() {
        if branches.iter().all(is_mergeable_object) {
            out.remove("allOf");
            for (i, branch) in branches.iter().enumerate() {
                let branch_path = build_path(path, &["allOf", &i.to_string()]);
                merge_branch(&mut out, branch, &branch_path, dropped);
            }
        }
    }

    for key in ["properties", "patternProperties"] {
        if let Some(Value::Object(props)) = out.get(key).cloned() {
            let mut new_props = serde_json::Map::with_capacity(props.len());
            for (k, child) in props {
                let child_path = build_path(path, &[key, &k]);
                new_props.insert(k, walk(&child, &child_path, dropped));
            }
            out.insert(key.to_string(), Value::Object(new_props));
        }
    }

    if let Some(items) = out.get("items").cloned() {
        if items.is_object() {
            let child_path = build_path(path, &["items"]);
            out.insert("items".to_string(), walk(&items, &child_path, dropped));
        }
    }

    if let Some(Value::Array(prefix)) = out.get("prefixItems").cloned() {
        let new_prefix: Vec<Value> = prefix
            .into_iter()
            .enumerate()
            .map(|(i, child)| walk(&child, &build_path(path, &["prefixItems", &i.to_string()]), dropped))
            .collect();
        out.insert("prefixItems".to_string(), Value::Array(new_prefix));
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(Value::Array(variants)) = out.get(key).cloned() {
            let new_variants: Vec<Value> = variants
                .into_iter()
                .enumerate()
                .map(|(i, child)| walk(&child, &build_path(path, &[key, &i.to_string()]), dropped))
                .collect();
            out.insert(key.to_string(), Value::Array(new_variants));
        }
    }

    for key in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = out.get(key).cloned() {
            let mut new_defs = serde_json::Map::with_capacity(defs.len());
            for (name, child) in defs {
                new_defs.insert(name.clone(), walk(&child, &build_path(path, &[key, &name]), dropped));
            }
            out.insert(key.to_string(), Value::Object(new_defs));
        }
    }

    Value::Object(out)
}

/// A branch can be structurally merged if it is a plain object node without
/// a `$ref` or its own nested `anyOf`/`oneOf` (those need a real
/// polymorphism-aware merge this pass does not attempt).
fn is_mergeable_object(branch: &Value) -> bool {
    match branch.as_object() {
        Some(obj) => !obj.contains_key("$ref") && !obj.contains_key("anyOf") && !obj.contains_key("oneOf"),
        None => false,
    }
}

fn merge_branch(
    out: &mut serde_json::Map<String, Value>,
    branch: &Value,
    branch_path: &str,
    dropped: &mut Vec<DroppedConstraint>,
) {
    let branch_obj = match branch.as_object() {
        Some(o) => o,
        None => return,
    };

    if let Some(Value::Object(branch_props)) = branch_obj.get("properties") {
        let mut merged_props = match out.remove("properties") {
            Some(Value::Object(m)) => m,
            _ => serde_json::Map::new(),
        };
        for (k, v) in branch_props {
            merged_props.entry(k.clone()).or_insert_with(|| v.clone());
        }
        out.insert("properties".to_string(), Value::Object(merged_props));
    }

    if let Some(Value::Array(branch_required)) = branch_obj.get("required") {
        let mut merged: Vec<Value> = match out.remove("required") {
            Some(Value::Array(r)) => r,
            _ => Vec::new(),
        };
        for v in branch_required {
            if !merged.contains(v) {
                merged.push(v.clone());
            }
        }
        out.insert("required".to_string(), Value::Array(merged));
    }

    if branch_obj.get("additionalProperties") == Some(&Value::Bool(false)) {
        out.insert("additionalProperties".to_string(), Value::Bool(false));
    }

    for keyword in INTERSECT_TIGHTEST_MIN {
        intersect_numeric(out, branch_obj, keyword, f64::max);
    }
    for keyword in INTERSECT_TIGHTEST_MAX {
        intersect_numeric(out, branch_obj, keyword, f64::min);
    }

    for keyword in FIRST_WINS {
        if let Some(incoming) = branch_obj.get(*keyword) {
            match out.get(*keyword) {
                None => {
                    out.insert(keyword.to_string(), incoming.clone());
                }
                Some(existing) if existing == incoming => {}
                Some(_) => {
                    dropped.push(DroppedConstraint {
                        at: build_path(branch_path, &[keyword]),
                        constraint: keyword.to_string(),
                        value: incoming.clone(),
                        reason: "allof_conflict_first_branch_wins".to_string(),
                    });
                }
            }
        }
    }
}

fn intersect_numeric(
    out: &mut serde_json::Map<String, Value>,
    branch_obj: &serde_json::Map<String, Value>,
    keyword: &str,
    pick: impl Fn(f64, f64) -> f64,
) {
    let incoming = match branch_obj.get(keyword).and_then(|v| v.as_f64()) {
        Some(n) => n,
        None => return,
    };
    let combined = match out.get(keyword).and_then(|v| v.as_f64()) {
        Some(existing) => pick(existing, incoming),
        None => incoming,
    };
    out.insert(keyword.to_string(), serde_json::json!(combined));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(schema: Value) -> (Value, Vec<DroppedConstraint>) {
        let r = flatten_allof(&schema, &ConvertOptions::default()).unwrap();
        (r.schema, r.dropped_constraints)
    }

    #[test]
    fn merges_disjoint_properties_and_required() {
        let input = json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]},
                {"type": "object", "properties": {"b": {"type": "integer"}}, "required": ["b"]}
            ]
        });
        let (out, dropped) = run(input);
        assert!(out.get("allOf").is_none());
        assert_eq!(out["properties"]["a"]["type"], json!("string"));
        assert_eq!(out["properties"]["b"]["type"], json!("integer"));
        let mut req: Vec<&str> = out["required"].as_array().unwrap().iter().map(|v| v.as_str().unwrap()).collect();
        req.sort();
        assert_eq!(req, vec!["a", "b"]);
        assert!(dropped.is_empty());
    }

    #[test]
    fn intersects_numeric_bounds_losslessly() {
        let input = json!({
            "allOf": [
                {"type": "integer", "minimum": 0, "maximum": 100},
                {"type": "integer", "minimum": 10, "maximum": 50}
            ]
        });
        let (out, dropped) = run(input);
        assert_eq!(out["minimum"], json!(10.0));
        assert_eq!(out["maximum"], json!(50.0));
        assert!(dropped.is_empty());
    }

    #[test]
    fn conflicting_const_drops_second_branch() {
        let input = json!({
            "allOf": [
                {"const": "a"},
                {"const": "b"}
            ]
        });
        let (out, dropped) = run(input);
        assert_eq!(out["const"], json!("a"));
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].constraint, "const");
        assert_eq!(dropped[0].value, json!("b"));
    }

    #[test]
    fn ref_branch_is_left_unmerged() {
        let input = json!({"allOf": [{"$ref": "#/$defs/X"}, {"type": "object"}]});
        let (out, _) = run(input);
        assert!(out.get("allOf").is_some());
    }
}
