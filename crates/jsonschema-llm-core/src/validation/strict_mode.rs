//! Read-only strict-mode audit: reports what a schema's conversion would
//! change or drop, without performing the conversion.
//!
//! Useful ahead of a real `convert` call — e.g. a schema author checking
//! how much of their document survives a given target's restrictions
//! before committing to the rewrite, or a CI check that fails a PR when a
//! schema regresses past an acceptable drop budget.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::config::Target;
use crate::schema_utils::build_path;
use crate::target_profile::{self, TargetProfile};

/// One read-only observation produced by [`audit`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub code: &'static str,
    pub path: String,
    pub message: String,
}

/// Audit `schema` against `target`'s capability profile without mutating
/// it. Findings are advisory — they describe what `convert` would change
/// or drop, not an error in the input.
pub fn audit(schema: &Value, target: Target) -> Vec<Finding> {
    let profile = target_profile::profile_for(target);
    let mut findings = Vec::new();
    walk(schema, &profile, "#", &mut findings);
    findings
}

fn walk(node: &Value, profile: &TargetProfile, path: &str, findings: &mut Vec<Finding>) {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return,
    };

    if obj.contains_key("$ref") && !profile.allow_ref {
        findings.push(Finding {
            code: "ref_will_be_inlined",
            path: path.to_string(),
            message: "this $ref will be resolved and inlined; the converted schema will not contain it".to_string(),
        });
    }

    if obj.contains_key("const") && !profile.supports_const {
        findings.push(Finding {
            code: "const_will_become_enum",
            path: path.to_string(),
            message: "const will be rewritten to a single-value enum for this target".to_string(),
        });
    }

    for keyword in [
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
    ] {
        if obj.contains_key(keyword) && !profile.supported_constraints.contains(keyword) {
            findings.push(Finding {
                code: "constraint_unsupported_by_target",
                path: build_path(path, &[keyword]),
                message: format!("`{keyword}` is not supported by this target and will be dropped"),
            });
        }
    }

    if let Some(pattern) = obj.get("pattern").and_then(|v| v.as_str()) {
        if let Err(e) = Regex::new(pattern) {
            findings.push(Finding {
                code: "pattern_is_not_valid_regex",
                path: build_path(path, &["pattern"]),
                message: format!("`pattern` '{pattern}' does not compile as a regex: {e}"),
            });
        }
    }

    if let Some(pp) = obj.get("patternProperties").and_then(|v| v.as_object()) {
        for key in pp.keys() {
            if let Err(e) = Regex::new(key) {
                findings.push(Finding {
                    code: "pattern_is_not_valid_regex",
                    path: build_path(path, &["patternProperties", key]),
                    message: format!("patternProperties key '{key}' does not compile as a regex: {e}"),
                });
            }
        }
    }

    if let Some(format_value) = obj.get("format").and_then(|v| v.as_str()) {
        if !profile.string_format_policy.contains(format_value) {
            findings.push(Finding {
                code: "format_unsupported_by_target",
                path: build_path(path, &["format"]),
                message: format!("format '{format_value}' is not supported by this target and will be dropped"),
            });
        }
    }

    for keyword in ["not", "if", "then", "else"] {
        if obj.contains_key(keyword) {
            findings.push(Finding {
                code: "conditional_schema_unsupported",
                path: build_path(path, &[keyword]),
                message: format!("`{keyword}` has no structured-output equivalent and will be dropped"),
            });
        }
    }

    if obj.contains_key("default") {
        findings.push(Finding {
            code: "default_unsupported_by_target",
            path: build_path(path, &["default"]),
            message: "no structured-output target preserves `default`; it will be dropped".to_string(),
        });
    }

    let is_object_schema =
        obj.contains_key("properties") || obj.get("type").and_then(|t| t.as_str()) == Some("object");
    if is_object_schema {
        if profile.require_additional_properties_false
            && obj.get("additionalProperties") != Some(&Value::Bool(false))
        {
            findings.push(Finding {
                code: "additional_properties_will_be_sealed",
                path: path.to_string(),
                message: "additionalProperties: false will be synthesized for this target".to_string(),
            });
        }

        if profile.require_all_properties_in_required {
            if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
                let required: Vec<&str> = obj
                    .get("required")
                    .and_then(|v| v.as_array())
                    .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
                    .unwrap_or_default();
                for key in props.keys() {
                    if !required.contains(&key.as_str()) {
                        findings.push(Finding {
                            code: "optional_property_will_be_promoted",
                            path: build_path(path, &["properties", key]),
                            message: format!(
                                "'{key}' is optional but this target requires every property in `required`; it will be widened to accept null and promoted"
                            ),
                        });
                    }
                }
            }
        }
    }

    for key in ["properties", "patternProperties"] {
        if let Some(props) = obj.get(key).and_then(|v| v.as_object()) {
            for (k, child) in props {
                walk(child, profile, &build_path(path, &[key, k]), findings);
            }
        }
    }

    if let Some(items) = obj.get("items") {
        if items.is_object() {
            walk(items, profile, &build_path(path, &["items"]), findings);
        }
    }

    if let Some(prefix) = obj.get("prefixItems").and_then(|v| v.as_array()) {
        for (i, child) in prefix.iter().enumerate() {
            walk(child, profile, &build_path(path, &["prefixItems", &i.to_string()]), findings);
        }
    }

    if let Some(ap) = obj.get("additionalProperties") {
        if ap.is_object() {
            walk(ap, profile, &build_path(path, &["additionalProperties"]), findings);
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(variants) = obj.get(keyword).and_then(|v| v.as_array()) {
            for (i, child) in variants.iter().enumerate() {
                walk(child, profile, &build_path(path, &[keyword, &i.to_string()]), findings);
            }
        }
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(defs) = obj.get(keyword).and_then(|v| v.as_object()) {
            for (name, child) in defs {
                walk(child, profile, &build_path(path, &[keyword, name]), findings);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_ref_for_openai() {
        let schema = json!({"$defs": {"X": {"type": "string"}}, "$ref": "#/$defs/X"});
        let findings = audit(&schema, Target::OpenaiStrict);
        assert!(findings.iter().any(|f| f.code == "ref_will_be_inlined"));
    }

    #[test]
    fn claude_does_not_flag_ref() {
        let schema = json!({"$defs": {"X": {"type": "string"}}, "$ref": "#/$defs/X"});
        let findings = audit(&schema, Target::Claude);
        assert!(!findings.iter().any(|f| f.code == "ref_will_be_inlined"));
    }

    #[test]
    fn flags_unsealed_object_for_openai() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "string"}}});
        let findings = audit(&schema, Target::OpenaiStrict);
        assert!(findings.iter().any(|f| f.code == "additional_properties_will_be_sealed"));
        assert!(findings.iter().any(|f| f.code == "optional_property_will_be_promoted"));
    }

    #[test]
    fn flags_unsupported_constraint() {
        let schema = json!({"type": "integer", "minimum": 0});
        let findings = audit(&schema, Target::OpenaiStrict);
        assert!(findings.iter().any(|f| f.code == "constraint_unsupported_by_target" && f.path == "#/minimum"));
    }

    #[test]
    fn flags_invalid_pattern_regex() {
        let schema = json!({"type": "string", "pattern": "(unclosed"});
        let findings = audit(&schema, Target::Gemini);
        assert!(findings.iter().any(|f| f.code == "pattern_is_not_valid_regex" && f.path == "#/pattern"));
    }

    #[test]
    fn flags_invalid_pattern_properties_key() {
        let schema = json!({"type": "object", "patternProperties": {"[": {"type": "string"}}});
        let findings = audit(&schema, Target::Gemini);
        assert!(findings
            .iter()
            .any(|f| f.code == "pattern_is_not_valid_regex" && f.path == "#/patternProperties/["));
    }

    #[test]
    fn valid_pattern_is_not_flagged() {
        let schema = json!({"type": "string", "pattern": "^[a-z]+$"});
        let findings = audit(&schema, Target::Gemini);
        assert!(!findings.iter().any(|f| f.code == "pattern_is_not_valid_regex"));
    }

    #[test]
    fn clean_schema_for_gemini_has_no_findings() {
        let schema = json!({"type": "integer", "minimum": 0, "maximum": 10});
        let findings = audit(&schema, Target::Gemini);
        assert!(findings.is_empty());
    }
}
