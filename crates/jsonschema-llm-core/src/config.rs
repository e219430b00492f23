//! Request-scoped configuration for conversion and extraction.
//!
//! All options are optional on the wire and kebab-case; a pre-pass in
//! [`ConvertOptions::from_json`] / [`ExtractOptions::from_json`] accepts the
//! legacy snake_case spelling from older callers and canonicalizes it before
//! `serde` ever sees the document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConvertError;

/// Structured-output backend a schema is being converted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    OpenaiStrict,
    Gemini,
    Claude,
}

impl Default for Target {
    fn default() -> Self {
        Target::OpenaiStrict
    }
}

/// Whether provider-compat violations are surfaced or suppressed.
///
/// Per spec.md §9 Open Questions: `mode` never changes the output schema
/// bytes, only whether `p9_provider_compat` emits advisory errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    Strict,
    Lenient,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Strict
    }
}

/// How `oneOf`/`anyOf` polymorphism is expressed in the converted schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Polymorphism {
    AnyOf,
    OneOf,
}

/// Options accepted by [`crate::convert::convert`].
///
/// Every field has a documented default; missing fields on the wire fall
/// back to `Default::default()`. `polymorphism` defaults per-target when
/// unset (`Claude`/`Gemini` favor `any-of`, `openai-strict` favors
/// `one-of`) — see [`ConvertOptions::resolved_polymorphism`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct ConvertOptions {
    pub target: Target,
    pub mode: Mode,
    pub max_depth: usize,
    pub recursion_limit: usize,
    pub polymorphism: Option<Polymorphism>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            target: Target::default(),
            mode: Mode::default(),
            max_depth: 50,
            recursion_limit: 3,
            polymorphism: None,
        }
    }
}

impl ConvertOptions {
    /// Parse an options document from wire JSON, canonicalizing snake_case
    /// keys to kebab-case and rejecting unknown keys with `invalid_input`.
    pub fn from_json(value: &Value) -> Result<Self, ConvertError> {
        let canonical = canonicalize_keys(value, &Self::known_keys());
        serde_json::from_value(canonical).map_err(|e| ConvertError::InvalidInput {
            message: format!("invalid convert options: {e}"),
        })
    }

    fn known_keys() -> [&'static str; 5] {
        ["target", "mode", "max-depth", "recursion-limit", "polymorphism"]
    }

    /// Resolve the effective polymorphism style, applying the per-target
    /// default when the caller left it unset.
    pub fn resolved_polymorphism(&self) -> Polymorphism {
        self.polymorphism.unwrap_or(match self.target {
            Target::OpenaiStrict => Polymorphism::OneOf,
            Target::Gemini | Target::Claude => Polymorphism::AnyOf,
        })
    }
}

/// How the component extractor handles a dependency reference that does
/// not resolve within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnMissingRef {
    Ignore,
    Error,
}

impl Default for OnMissingRef {
    fn default() -> Self {
        OnMissingRef::Ignore
    }
}

/// Options accepted by [`crate::extract::extract_component`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct ExtractOptions {
    pub include_dependencies: bool,
    pub on_missing_ref: OnMissingRef,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            include_dependencies: true,
            on_missing_ref: OnMissingRef::default(),
        }
    }
}

impl ExtractOptions {
    pub fn from_json(value: &Value) -> Result<Self, ConvertError> {
        let canonical = canonicalize_keys(value, &["include-dependencies", "on-missing-ref"]);
        serde_json::from_value(canonical).map_err(|e| ConvertError::InvalidInput {
            message: format!("invalid extract options: {e}"),
        })
    }
}

/// Rewrite every top-level snake_case key in `value` to its kebab-case
/// equivalent when that equivalent is a member of `known`. Unrecognized
/// keys (under either spelling) are left untouched so `deny_unknown_fields`
/// can reject them with a precise error.
fn canonicalize_keys(value: &Value, known: &[&str]) -> Value {
    let obj = match value.as_object() {
        Some(o) => o,
        None => return value.clone(),
    };
    let mut out = serde_json::Map::with_capacity(obj.len());
    for (k, v) in obj {
        let kebab = k.replace('_', "-");
        if known.contains(&kebab.as_str()) {
            out.insert(kebab, v.clone());
        } else {
            out.insert(k.clone(), v.clone());
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_spec() {
        let o = ConvertOptions::default();
        assert_eq!(o.target, Target::OpenaiStrict);
        assert_eq!(o.mode, Mode::Strict);
        assert_eq!(o.max_depth, 50);
        assert_eq!(o.recursion_limit, 3);
    }

    #[test]
    fn accepts_kebab_case() {
        let v = json!({"target": "gemini", "max-depth": 10});
        let o = ConvertOptions::from_json(&v).unwrap();
        assert_eq!(o.target, Target::Gemini);
        assert_eq!(o.max_depth, 10);
    }

    #[test]
    fn accepts_snake_case_legacy() {
        let v = json!({"target": "claude", "max_depth": 12, "recursion_limit": 2});
        let o = ConvertOptions::from_json(&v).unwrap();
        assert_eq!(o.target, Target::Claude);
        assert_eq!(o.max_depth, 12);
        assert_eq!(o.recursion_limit, 2);
    }

    #[test]
    fn rejects_unknown_keys() {
        let v = json!({"target": "gemini", "bogus-key": true});
        assert!(ConvertOptions::from_json(&v).is_err());
    }

    #[test]
    fn polymorphism_defaults_per_target() {
        let mut o = ConvertOptions::default();
        o.target = Target::OpenaiStrict;
        assert_eq!(o.resolved_polymorphism(), Polymorphism::OneOf);
        o.target = Target::Gemini;
        assert_eq!(o.resolved_polymorphism(), Polymorphism::AnyOf);
    }
}
