//! The codec: a versioned, serializable log of every reversible transform a
//! conversion performed, plus the irreversibly dropped constraints.
//!
//! Applying `transforms` in order to the original schema yields the
//! converted schema; applying them in reverse to a conformant document
//! recovers a document equivalent to the original, up to
//! `dropped_constraints` (spec.md §3 "Codec" invariant).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire version tag for the codec document (spec.md §4.4).
pub const CODEC_SCHEMA_URI: &str = "https://jsonschema-llm.dev/codec/v1";

/// One reversible transformation applied at a JSON Pointer location.
///
/// Tagged on the wire as `{"op": "<op>", "at": "<pointer>", ...}` via
/// `#[serde(tag = "op", rename_all = "snake_case")]`. New variants are
/// additive; rehydration treats an op it does not recognize as
/// `RehydrationError::TransformOpUnknown` rather than a panic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    /// A `$ref` was resolved and inlined at `at`.
    InlineRef { at: String, r#ref: String },

    /// A scalar value was wrapped as a JSON string because the target
    /// cannot express its native type (e.g. a strict-mode-unsupported
    /// `number` forced through a `string` wrapper is not used today, but
    /// the op exists for numeric-as-string coercions required by some
    /// provider profiles).
    WrapScalarAsString { at: String, original_type: String },

    /// A value-constraint keyword was dropped because the target profile
    /// does not support it; paired with a `DroppedConstraint` entry.
    DropFormat { at: String, format: String },

    /// `anyOf` was rewritten to `oneOf` (or vice versa) to match the
    /// target's polymorphism policy.
    ExpandAnyOfToOneOf { at: String },

    /// A recursive `$ref` was inlined up to `depth` and then replaced with
    /// a permissive placeholder.
    TruncateRecursion {
        at: String,
        depth: usize,
        r#ref: String,
    },

    /// `additionalProperties: false` was synthesized for a strict target.
    SynthesizeAdditionalPropertiesFalse { at: String },

    /// An optional property was widened with `null` and moved into
    /// `required` because the target requires every property to be listed.
    PromoteOptionalToRequiredWithNull { at: String, key: String },

    /// A non-object schema root was wrapped as `{"result": <original>}`
    /// because the target requires an object root (teacher-grounded op,
    /// see `passes::p9_provider_compat`).
    RootObjectWrapper { path: String, wrapper_key: String },
}

impl Transform {
    /// The JSON Pointer this transform was recorded at.
    pub fn at(&self) -> &str {
        match self {
            Transform::InlineRef { at, .. } => at,
            Transform::WrapScalarAsString { at, .. } => at,
            Transform::DropFormat { at, .. } => at,
            Transform::ExpandAnyOfToOneOf { at } => at,
            Transform::TruncateRecursion { at, .. } => at,
            Transform::SynthesizeAdditionalPropertiesFalse { at } => at,
            Transform::PromoteOptionalToRequiredWithNull { at, .. } => at,
            Transform::RootObjectWrapper { path, .. } => path,
        }
    }
}

/// An irreversibly lost constraint: the target cannot enforce it and no
/// reversible encoding exists, so it is logged rather than silently
/// discarded (spec.md §1 Non-goals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedConstraint {
    pub at: String,
    pub constraint: String,
    pub value: Value,
    pub reason: String,
}

/// The codec document, as produced by [`crate::convert::convert`] and
/// consumed by [`crate::rehydrate::rehydrate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Codec {
    #[serde(rename = "$schema", default = "default_codec_schema")]
    pub schema_uri: String,
    pub transforms: Vec<Transform>,
    pub dropped_constraints: Vec<DroppedConstraint>,
}

fn default_codec_schema() -> String {
    CODEC_SCHEMA_URI.to_string()
}

impl Codec {
    pub fn new() -> Self {
        Codec {
            schema_uri: CODEC_SCHEMA_URI.to_string(),
            transforms: Vec::new(),
            dropped_constraints: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.transforms.is_empty() && self.dropped_constraints.is_empty()
    }

    pub fn push_transform(&mut self, t: Transform) {
        self.transforms.push(t);
    }

    pub fn push_dropped(&mut self, d: DroppedConstraint) {
        self.dropped_constraints.push(d);
    }

    pub fn extend(&mut self, other: Codec) {
        self.transforms.extend(other.transforms);
        self.dropped_constraints.extend(other.dropped_constraints);
    }
}
