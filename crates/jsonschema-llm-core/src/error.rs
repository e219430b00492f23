//! Stable error taxonomy for conversion, rehydration, and extraction.
//!
//! Every variant carries the machine-readable `code` string named in
//! spec.md §4.3/§4.5/§7 via [`ConvertError::code`] / [`RehydrationError::code`]
//! / [`ExtractError::code`], so the ABI layer can build the `{code,
//! message, path?}` error envelope without re-deriving strings.

use thiserror::Error;

use crate::config::Target;

/// Errors raised by [`crate::convert::convert`] and the passes it drives.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error("input is not valid JSON: {message}")]
    JsonParseError { message: String },

    #[error("input is not valid UTF-8 at byte offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("unresolvable reference {reference} at {path}")]
    UnresolvableRef { path: String, reference: String },

    #[error("recursion depth exceeded at {path} (limit {limit})")]
    RecursionDepthExceeded { path: String, limit: usize },

    #[error("zero/non-zero pointer-length mismatch in ABI buffer argument")]
    InvalidPointer,

    #[error("internal invariant violation: {message}")]
    InternalError { message: String },
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            ConvertError::JsonParseError { .. } => "json_parse_error",
            ConvertError::InvalidUtf8 { .. } => "invalid_utf8",
            ConvertError::InvalidInput { .. } => "invalid_input",
            ConvertError::UnresolvableRef { .. } => "unresolvable_ref",
            ConvertError::RecursionDepthExceeded { .. } => "recursion_depth_exceeded",
            ConvertError::InvalidPointer => "invalid_pointer",
            ConvertError::InternalError { .. } => "internal_error",
        }
    }

    /// JSON Pointer of the offending node, when one is meaningful.
    pub fn path(&self) -> Option<&str> {
        match self {
            ConvertError::UnresolvableRef { path, .. } => Some(path),
            ConvertError::RecursionDepthExceeded { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Errors raised by [`crate::rehydrate::rehydrate`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RehydrationError {
    #[error("codec version mismatch: expected {expected}, found {found}")]
    CodecVersionMismatch { expected: String, found: String },

    #[error("unknown transform op {op} at {path}")]
    TransformOpUnknown { path: String, op: String },

    #[error("type coercion failed at {path}: {message}")]
    TypeCoercionFailed { path: String, message: String },

    #[error("malformed codec: {message}")]
    MalformedCodec { message: String },
}

impl RehydrationError {
    pub fn code(&self) -> &'static str {
        "rehydration_error"
    }

    pub fn sub_code(&self) -> &'static str {
        match self {
            RehydrationError::CodecVersionMismatch { .. } => "codec_version_mismatch",
            RehydrationError::TransformOpUnknown { .. } => "transform_op_unknown",
            RehydrationError::TypeCoercionFailed { .. } => "type_coercion_failed",
            RehydrationError::MalformedCodec { .. } => "malformed_codec",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            RehydrationError::CodecVersionMismatch { .. } => "#",
            RehydrationError::TransformOpUnknown { path, .. } => path,
            RehydrationError::TypeCoercionFailed { path, .. } => path,
            RehydrationError::MalformedCodec { .. } => "#",
        }
    }
}

/// Errors raised by [`crate::extract`] when `on-missing-ref: error`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    #[error("pointer {pointer} does not resolve in the document")]
    InvalidPointer { pointer: String },

    #[error("missing reference {reference} reachable from {pointer}")]
    MissingRef { pointer: String, reference: String },
}

impl ExtractError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::InvalidPointer { .. } => "invalid_pointer",
            ExtractError::MissingRef { .. } => "unresolvable_ref",
        }
    }
}

/// Advisory, non-fatal observations produced by `p9_provider_compat` after
/// the schema has already been converted. Never aborts conversion; reported
/// in `providerCompatErrors` on the success envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCompatError {
    RootTypeIncompatible {
        actual_type: String,
        target: Target,
        hint: String,
    },
    DepthBudgetExceeded {
        actual_depth: usize,
        max_depth: usize,
        target: Target,
        hint: String,
    },
    MixedEnumTypes {
        path: String,
        types_found: Vec<String>,
        target: Target,
        hint: String,
    },
    UnconstrainedSchema {
        path: String,
        schema_kind: String,
        target: Target,
        hint: String,
    },
}

impl ProviderCompatError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ProviderCompatError::RootTypeIncompatible { .. } => "root_type_incompatible",
            ProviderCompatError::DepthBudgetExceeded { .. } => "depth_budget_exceeded",
            ProviderCompatError::MixedEnumTypes { .. } => "mixed_enum_types",
            ProviderCompatError::UnconstrainedSchema { .. } => "unconstrained_schema",
        }
    }

    pub fn pointer(&self) -> Option<&str> {
        match self {
            ProviderCompatError::MixedEnumTypes { path, .. } => Some(path),
            ProviderCompatError::UnconstrainedSchema { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProviderCompatError::RootTypeIncompatible { hint, .. } => hint,
            ProviderCompatError::DepthBudgetExceeded { hint, .. } => hint,
            ProviderCompatError::MixedEnumTypes { hint, .. } => hint,
            ProviderCompatError::UnconstrainedSchema { hint, .. } => hint,
        }
    }
}
