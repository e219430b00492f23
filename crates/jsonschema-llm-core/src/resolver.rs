//! Reference resolver (spec.md §4.1).
//!
//! Indexes every `$defs`/`definitions` entry and every `$id`-bearing
//! subtree into a flat table keyed by absolute reference string on first
//! encounter of the root. Resolution after that pre-pass is table lookup.
//! Cycle detection is a resolution-stack membership test keyed by
//! reference string — no pointer-identity semantics on schema nodes
//! (spec.md §9 "Cyclic schema graph").

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ConvertError;
use crate::schema_utils::resolve_pointer;

/// Lifecycle state of a single reference within one resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefState {
    Unresolved,
    InProgress,
    Resolved,
}

/// Outcome of resolving one `$ref` string.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The pointer this reference resolves to, relative to the document
    /// root (`"#/..."`).
    Node(String),
    /// Resolving this reference would re-enter a reference already on the
    /// active resolution stack — a cycle. `back_edge` is the pointer the
    /// cyclic reference targets.
    Cycle { back_edge: String },
}

/// Indexes a schema document once and answers `$ref` resolution and cycle
/// queries against it for the lifetime of a single conversion request.
pub struct RefResolver<'a> {
    root: &'a Value,
    /// Absolute reference string (either a JSON Pointer fragment such as
    /// `"#/$defs/Node"` or an `$id` URI) → JSON Pointer into `root`.
    table: HashMap<String, String>,
    /// Resolution stack: reference strings currently IN-PROGRESS.
    stack: Vec<String>,
}

impl<'a> RefResolver<'a> {
    /// Build the resolver and run the indexing pre-pass over `root`.
    pub fn new(root: &'a Value) -> Self {
        let mut table = HashMap::new();
        index(root, "#", None, &mut table);
        RefResolver {
            root,
            table,
            stack: Vec::new(),
        }
    }

    /// Resolve a `$ref` string to the pointer it names, classify it as a
    /// cycle if it re-enters the active resolution stack, or report
    /// `unresolvable_ref`.
    ///
    /// `at` is the JSON Pointer of the node carrying this `$ref`, used only
    /// for the error payload.
    pub fn resolve(&self, reference: &str, at: &str) -> Result<Resolution, ConvertError> {
        let pointer = self.locate(reference).ok_or_else(|| ConvertError::UnresolvableRef {
            path: at.to_string(),
            reference: reference.to_string(),
        })?;

        // Confirm the pointer actually resolves to a node; a stale table
        // entry (should not happen, but the table is itself a cache) is
        // still reported as unresolvable rather than panicking.
        if resolve_pointer(self.root, &pointer).is_none() {
            return Err(ConvertError::UnresolvableRef {
                path: at.to_string(),
                reference: reference.to_string(),
            });
        }

        if self.stack.iter().any(|r| r == reference) {
            return Ok(Resolution::Cycle { back_edge: pointer });
        }

        Ok(Resolution::Node(pointer))
    }

    /// Fetch the node at a previously resolved pointer.
    pub fn node_at(&self, pointer: &str) -> Option<&'a Value> {
        resolve_pointer(self.root, pointer)
    }

    /// Push `reference` onto the active resolution stack. Call before
    /// descending into the resolved target; pair with [`Self::exit`].
    pub fn enter(&mut self, reference: &str) {
        self.stack.push(reference.to_string());
    }

    /// Pop the most recently entered reference. Must be called exactly once
    /// per [`Self::enter`], in reverse order (stack discipline).
    pub fn exit(&mut self) {
        self.stack.pop();
    }

    /// Current depth of the resolution stack (number of refs in progress).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of times `reference` already appears on the active
    /// resolution stack. Used to bound repeated re-entry into the same
    /// reference (a co-recursive cycle) independent of overall tree depth.
    pub fn occurrences(&self, reference: &str) -> usize {
        self.stack.iter().filter(|r| r.as_str() == reference).count()
    }

    fn locate(&self, reference: &str) -> Option<String> {
        if let Some(p) = self.table.get(reference) {
            return Some(p.clone());
        }
        // A bare JSON-Pointer-shaped ref (`#/...` or `#`) that was not
        // captured by the index (e.g. points into a plain nested object,
        // not a $defs/$id subtree) still resolves directly.
        if reference == "#" || reference.starts_with("#/") {
            if resolve_pointer(self.root, reference).is_some() {
                return Some(reference.to_string());
            }
        }
        None
    }
}

/// Recursively index `$defs`/`definitions` entries and `$id`-qualified
/// subtrees into `table`. `base_id` tracks the nearest enclosing `$id` for
/// resolving relative `$id`s, per 2020-12 base URI change semantics.
fn index(node: &Value, path: &str, base_id: Option<&str>, table: &mut HashMap<String, String>) {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return,
    };

    let mut current_base = base_id.map(|s| s.to_string());
    if let Some(id) = obj.get("$id").and_then(|v| v.as_str()) {
        let absolute = match &current_base {
            Some(base) => join_id(base, id),
            None => id.to_string(),
        };
        table.insert(absolute.clone(), path.to_string());
        current_base = Some(absolute);
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(defs) = obj.get(keyword).and_then(|v| v.as_object()) {
            for (name, child) in defs {
                let child_path = format!("{path}/{keyword}/{}", escape(name));
                table.insert(format!("#/{keyword}/{name}"), child_path.clone());
                index(child, &child_path, current_base.as_deref(), table);
            }
        }
    }

    for (key, child) in obj {
        if key == "$defs" || key == "definitions" || key == "$id" {
            continue;
        }
        match child {
            Value::Object(_) => {
                let child_path = format!("{path}/{}", escape(key));
                index(child, &child_path, current_base.as_deref(), table);
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let child_path = format!("{path}/{}/{i}", escape(key));
                    index(item, &child_path, current_base.as_deref(), table);
                }
            }
            _ => {}
        }
    }
}

fn escape(seg: &str) -> String {
    seg.replace('~', "~0").replace('/', "~1")
}

/// Join a relative `$id` against a base URI, falling back to the raw
/// relative value if `url` cannot parse the base (e.g. a bare pointer was
/// used as `$id`, which is non-conformant but should not panic).
fn join_id(base: &str, relative: &str) -> String {
    if let Ok(base_url) = url::Url::parse(base) {
        if let Ok(joined) = base_url.join(relative) {
            return joined.to_string();
        }
    }
    relative.to_string()
}
