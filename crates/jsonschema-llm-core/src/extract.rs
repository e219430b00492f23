//! Component extraction: pull one `$defs`/`definitions` entry out of a
//! larger document as its own standalone, convertible schema (spec.md §4.6).
//!
//! Extraction walks the component for `$ref`s reachable from it and copies
//! each resolvable target into the extracted document's own `$defs`,
//! recursively, so the result needs nothing from the original document to
//! be converted on its own. A `$ref` that does not resolve is either
//! ignored (left dangling, the default) or reported, per
//! [`crate::config::OnMissingRef`].

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use serde_json::Value;

use crate::config::{ConvertOptions, ExtractOptions, OnMissingRef};
use crate::convert::{self, ConvertResult};
use crate::error::{ConvertError, ExtractError};
use crate::schema_utils::{build_path, resolve_pointer};

/// Canonical 2020-12 meta-schema URI stamped onto an extracted document's
/// `$schema` when the source document did not already carry one.
const JSON_SCHEMA_2020_12: &str = "https://json-schema.org/draft/2020-12/schema";

/// Enumerate every `$defs`/`definitions` entry reachable in `schema`, at any
/// nesting depth, as JSON Pointers into the document.
pub fn list_components(schema: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect(schema, "#", &mut out);
    out
}

fn collect(node: &Value, path: &str, out: &mut Vec<String>) {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return,
    };

    for keyword in ["$defs", "definitions"] {
        if let Some(defs) = obj.get(keyword).and_then(|v| v.as_object()) {
            for (name, child) in defs {
                let pointer = build_path(path, &[keyword, name]);
                out.push(pointer.clone());
                collect(child, &pointer, out);
            }
        }
    }

    for (key, child) in obj {
        if key == "$defs" || key == "definitions" {
            continue;
        }
        if child.is_object() {
            collect(child, &build_path(path, &[key]), out);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedComponent {
    pub schema: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_refs: Vec<String>,
}

/// Extract the component at `pointer` as a standalone schema document.
pub fn extract_component(
    schema: &Value,
    pointer: &str,
    options: &ExtractOptions,
) -> Result<ExtractedComponent, ExtractError> {
    let root = resolve_pointer(schema, pointer).ok_or_else(|| ExtractError::InvalidPointer {
        pointer: pointer.to_string(),
    })?;

    let mut component = root.clone();
    let mut missing_refs = Vec::new();

    if options.include_dependencies {
        let mut gathered: HashMap<String, Value> = HashMap::new();
        let mut queue: VecDeque<Value> = VecDeque::new();
        queue.push_back(component.clone());

        while let Some(node) = queue.pop_front() {
            let refs = find_refs(&node);
            for reference in refs {
                if gathered.contains_key(&reference) {
                    continue;
                }
                match resolve_pointer(schema, &reference) {
                    Some(target) => {
                        gathered.insert(reference.clone(), target.clone());
                        queue.push_back(target.clone());
                    }
                    None => {
                        if options.on_missing_ref == OnMissingRef::Error {
                            return Err(ExtractError::MissingRef {
                                pointer: pointer.to_string(),
                                reference,
                            });
                        }
                        missing_refs.push(reference);
                    }
                }
            }
        }

        if !gathered.is_empty() {
            let mut new_defs = serde_json::Map::new();
            for (reference, value) in &gathered {
                if let Some(name) = reference.rsplit('/').next() {
                    new_defs.insert(name.to_string(), rewrite_refs_to_local_defs(value));
                }
            }
            if let Value::Object(obj) = &mut component {
                let defs_entry = obj.entry("$defs".to_string()).or_insert_with(|| Value::Object(serde_json::Map::new()));
                if let Value::Object(existing) = defs_entry {
                    for (k, v) in new_defs {
                        existing.entry(k).or_insert(v);
                    }
                }
            }
            component = rewrite_refs_to_local_defs(&component);
        }
    }

    if let Value::Object(obj) = &mut component {
        obj.entry("$schema".to_string()).or_insert_with(|| Value::String(JSON_SCHEMA_2020_12.to_string()));
    }

    missing_refs.sort();
    missing_refs.dedup();

    Ok(ExtractedComponent {
        schema: component,
        missing_refs,
    })
}

/// Rewrite every `$ref` in `node` that points at `#/$defs/...` or
/// `#/definitions/...` to `#/$defs/<name>`, matching the flattened `$defs`
/// table an extracted document carries.
fn rewrite_refs_to_local_defs(node: &Value) -> Value {
    match node {
        Value::Object(obj) => {
            let mut out = serde_json::Map::with_capacity(obj.len());
            for (k, v) in obj {
                if k == "$ref" {
                    if let Value::String(r) = v {
                        if let Some(name) = r.rsplit('/').next() {
                            out.insert(k.clone(), Value::String(format!("#/$defs/{name}")));
                            continue;
                        }
                    }
                }
                out.insert(k.clone(), rewrite_refs_to_local_defs(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(rewrite_refs_to_local_defs).collect()),
        other => other.clone(),
    }
}

fn find_refs(node: &Value) -> Vec<String> {
    let mut out = Vec::new();
    find_refs_into(node, &mut out);
    out
}

fn find_refs_into(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::Object(obj) => {
            if let Some(Value::String(r)) = obj.get("$ref") {
                out.push(r.clone());
            }
            for (k, v) in obj {
                if k != "$ref" {
                    find_refs_into(v, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                find_refs_into(item, out);
            }
        }
        _ => {}
    }
}

/// One component's conversion outcome within [`convert_all_components`].
#[derive(Debug, Clone, Serialize)]
pub struct ComponentConvertResult {
    pub pointer: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_refs: Vec<String>,
    pub convert: Result<ConvertResult, ComponentError>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ComponentError {
    Extract { code: &'static str, message: String },
    Convert { code: &'static str, message: String },
}

/// Extract and convert every component listed by [`list_components`].
/// A failure on one component does not abort the others — each result
/// carries its own `Result`.
pub fn convert_all_components(
    schema: &Value,
    convert_options: &ConvertOptions,
    extract_options: &ExtractOptions,
) -> Vec<ComponentConvertResult> {
    list_components(schema)
        .into_iter()
        .map(|pointer| {
            match extract_component(schema, &pointer, extract_options) {
                Ok(extracted) => {
                    let convert = convert::convert(&extracted.schema, convert_options).map_err(|e: ConvertError| {
                        ComponentError::Convert {
                            code: e.code(),
                            message: e.to_string(),
                        }
                    });
                    ComponentConvertResult {
                        pointer,
                        missing_refs: extracted.missing_refs,
                        convert,
                    }
                }
                Err(e) => ComponentConvertResult {
                    pointer,
                    missing_refs: Vec::new(),
                    convert: Err(ComponentError::Extract {
                        code: e.code(),
                        message: e.to_string(),
                    }),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "$defs": {
                "Address": {
                    "type": "object",
                    "properties": {"city": {"type": "string"}}
                },
                "Person": {
                    "type": "object",
                    "properties": {
                        "name": {"type": "string"},
                        "address": {"$ref": "#/$defs/Address"}
                    }
                }
            },
            "type": "object",
            "properties": {"person": {"$ref": "#/$defs/Person"}}
        })
    }

    #[test]
    fn lists_every_def_pointer() {
        let pointers = list_components(&doc());
        assert!(pointers.contains(&"#/$defs/Address".to_string()));
        assert!(pointers.contains(&"#/$defs/Person".to_string()));
    }

    #[test]
    fn extract_pulls_in_transitive_dependency() {
        let d = doc();
        let options = ExtractOptions::default();
        let extracted = extract_component(&d, "#/$defs/Person", &options).unwrap();
        assert_eq!(extracted.schema["$defs"]["Address"]["type"], json!("object"));
        assert_eq!(extracted.schema["properties"]["address"]["$ref"], json!("#/$defs/Address"));
        assert!(extracted.missing_refs.is_empty());
    }

    #[test]
    fn extract_without_dependencies_leaves_dangling_ref() {
        let d = doc();
        let options = ExtractOptions {
            include_dependencies: false,
            on_missing_ref: OnMissingRef::Ignore,
        };
        let extracted = extract_component(&d, "#/$defs/Person", &options).unwrap();
        assert!(extracted.schema.get("$defs").is_none());
        assert_eq!(extracted.schema["properties"]["address"]["$ref"], json!("#/$defs/Address"));
    }

    #[test]
    fn invalid_pointer_is_an_error() {
        let d = doc();
        let err = extract_component(&d, "#/$defs/Missing", &ExtractOptions::default()).unwrap_err();
        assert_eq!(err.code(), "invalid_pointer");
    }

    #[test]
    fn missing_ref_errors_when_configured() {
        let broken = json!({
            "$defs": {"Broken": {"properties": {"x": {"$ref": "#/$defs/DoesNotExist"}}}}
        });
        let options = ExtractOptions {
            include_dependencies: true,
            on_missing_ref: OnMissingRef::Error,
        };
        let err = extract_component(&broken, "#/$defs/Broken", &options).unwrap_err();
        assert_eq!(err.code(), "unresolvable_ref");
    }

    #[test]
    fn missing_ref_is_ignored_and_reported_by_default() {
        let broken = json!({
            "$defs": {"Broken": {"properties": {"x": {"$ref": "#/$defs/DoesNotExist"}}}}
        });
        let extracted = extract_component(&broken, "#/$defs/Broken", &ExtractOptions::default()).unwrap();
        assert_eq!(extracted.missing_refs, vec!["#/$defs/DoesNotExist".to_string()]);
    }

    #[test]
    fn convert_all_components_runs_each_independently() {
        let d = doc();
        let results = convert_all_components(&d, &ConvertOptions::default(), &ExtractOptions::default());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.convert.is_ok()));
    }
}
