//! Shared JSON Pointer helpers used across passes, the resolver, and the
//! component extractor.

use serde_json::Value;

/// Append one or more unescaped pointer segments to `base`, producing a new
/// JSON Pointer string. `base` is normally `"#"` at the root or an existing
/// pointer such as `"#/properties/name"`.
///
/// Segments are escaped per RFC 6901 (`~` → `~0`, `/` → `~1`).
pub fn build_path(base: &str, segments: &[&str]) -> String {
    let mut out = base.to_string();
    for seg in segments {
        out.push('/');
        out.push_str(&escape_segment(seg));
    }
    out
}

fn escape_segment(seg: &str) -> String {
    seg.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(seg: &str) -> String {
    seg.replace("~1", "/").replace("~0", "~")
}

/// Resolve a `"#/a/b/0"`-style pointer against `root`, treating a leading
/// `#` as the root marker (as emitted by [`build_path`]).
pub fn resolve_pointer<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    let trimmed = pointer.strip_prefix('#').unwrap_or(pointer);
    if trimmed.is_empty() {
        return Some(root);
    }
    root.pointer(trimmed)
}

/// Split a `"#/a/b"` pointer into its unescaped segments, ignoring the
/// leading `#` and empty segments produced by a trailing slash.
pub fn pointer_segments(pointer: &str) -> Vec<String> {
    let trimmed = pointer.strip_prefix('#').unwrap_or(pointer);
    trimmed
        .split('/')
        .filter(|s| !s.is_empty())
        .map(unescape_segment)
        .collect()
}

/// Schema-applicator keywords that appear in a schema's own JSON Pointer
/// path but have no counterpart in a document that merely conforms to that
/// schema (a property's value lives at `data/name`, not
/// `data/properties/name`).
const SCHEMA_ONLY_SEGMENTS: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "items",
    "prefixItems",
    "$defs",
    "definitions",
    "anyOf",
    "oneOf",
    "allOf",
];

/// Project a schema-node JSON Pointer (as recorded in a [`crate::codec::Transform`])
/// onto the corresponding pointer into a document that conforms to that
/// schema, by dropping the applicator keywords that only exist on the
/// schema side. Used by rehydration to locate the data a transform affected.
pub fn schema_pointer_to_data_pointer(pointer: &str) -> String {
    let segments = pointer_segments(pointer);
    let data_segments: Vec<String> = segments
        .into_iter()
        .filter(|s| !SCHEMA_ONLY_SEGMENTS.contains(&s.as_str()))
        .collect();
    build_path("#", &data_segments.iter().map(String::as_str).collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_path_escapes_tilde_and_slash() {
        assert_eq!(build_path("#", &["a/b", "c~d"]), "#/a~1b/c~0d");
    }

    #[test]
    fn resolve_pointer_root() {
        let v = json!({"type": "object"});
        assert_eq!(resolve_pointer(&v, "#"), Some(&v));
    }

    #[test]
    fn resolve_pointer_nested() {
        let v = json!({"properties": {"name": {"type": "string"}}});
        let resolved = resolve_pointer(&v, "#/properties/name").unwrap();
        assert_eq!(resolved["type"], json!("string"));
    }

    #[test]
    fn pointer_segments_round_trip_escapes() {
        let p = build_path("#", &["$defs", "Foo/Bar"]);
        assert_eq!(pointer_segments(&p), vec!["$defs", "Foo/Bar"]);
    }

    #[test]
    fn schema_pointer_projects_onto_data_pointer() {
        assert_eq!(schema_pointer_to_data_pointer("#/properties/address/properties/city"), "#/address/city");
        assert_eq!(schema_pointer_to_data_pointer("#"), "#");
    }
}
