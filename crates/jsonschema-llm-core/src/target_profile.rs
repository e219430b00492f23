//! Target profile: a pure data table of what each LLM backend accepts
//! (spec.md §4.2). The converter reads only this table; adding a target is
//! a matter of adding a row, never a new branch scattered across passes.

use std::collections::HashSet;

use crate::config::{Polymorphism, Target};

/// Declarative capability record for one structured-output backend.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub allow_ref: bool,
    pub require_additional_properties_false: bool,
    pub require_all_properties_in_required: bool,
    pub supported_constraints: HashSet<&'static str>,
    pub polymorphism: Polymorphism,
    pub max_depth: usize,
    pub string_format_policy: HashSet<&'static str>,
    /// Whether `const` is accepted as-is (Gemini) or must be normalized to
    /// a single-value `enum` (OpenAI, Claude) — grounded in
    /// `passes::p7_constraints`.
    pub supports_const: bool,
}

// OpenAI Strict Mode supports regex `pattern` but drops every numeric and
// length constraint (verified by `passes::p7_constraints` tests).
const OPENAI_CONSTRAINTS: &[&str] = &["pattern"];
const GEMINI_CONSTRAINTS: &[&str] = &[
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
];
// Claude's tool-use schema is largely unvalidated by the model, but regex
// `pattern` is dropped (verified by `passes::p7_constraints` tests) while
// numeric/length bounds are preserved as hints.
const CLAUDE_CONSTRAINTS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
    "minLength",
    "maxLength",
    "minItems",
    "maxItems",
    "minProperties",
    "maxProperties",
];

const GEMINI_FORMATS: &[&str] = &["date-time", "date", "enum"];
const CLAUDE_FORMATS: &[&str] = &["date-time", "uuid", "email"];

/// Look up the capability record for `target`. Pure function over static
/// data — never mutated at runtime.
pub fn profile_for(target: Target) -> TargetProfile {
    match target {
        Target::OpenaiStrict => TargetProfile {
            allow_ref: false,
            require_additional_properties_false: true,
            require_all_properties_in_required: true,
            supported_constraints: OPENAI_CONSTRAINTS.iter().copied().collect(),
            polymorphism: Polymorphism::OneOf,
            max_depth: 5,
            string_format_policy: HashSet::new(),
            supports_const: false,
        },
        Target::Gemini => TargetProfile {
            allow_ref: false,
            require_additional_properties_false: false,
            require_all_properties_in_required: false,
            supported_constraints: GEMINI_CONSTRAINTS.iter().copied().collect(),
            polymorphism: Polymorphism::AnyOf,
            max_depth: 10,
            string_format_policy: GEMINI_FORMATS.iter().copied().collect(),
            supports_const: true,
        },
        Target::Claude => TargetProfile {
            allow_ref: true,
            require_additional_properties_false: false,
            require_all_properties_in_required: false,
            supported_constraints: CLAUDE_CONSTRAINTS.iter().copied().collect(),
            polymorphism: Polymorphism::AnyOf,
            max_depth: 20,
            string_format_policy: CLAUDE_FORMATS.iter().copied().collect(),
            supports_const: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_strict_seals_everything() {
        let p = profile_for(Target::OpenaiStrict);
        assert!(p.require_additional_properties_false);
        assert!(p.require_all_properties_in_required);
        assert!(!p.allow_ref);
        assert!(p.supported_constraints.contains("pattern"));
        assert!(!p.supported_constraints.contains("minimum"));
    }

    #[test]
    fn gemini_preserves_numeric_constraints_and_const() {
        let p = profile_for(Target::Gemini);
        assert!(p.supported_constraints.contains("minimum"));
        assert!(p.supports_const);
    }

    #[test]
    fn claude_allows_refs() {
        let p = profile_for(Target::Claude);
        assert!(p.allow_ref);
        assert!(p.supported_constraints.contains("minimum"));
        assert!(!p.supported_constraints.contains("pattern"));
    }
}
