//! Top-level `convert` orchestration (spec.md §4 "Pipeline").
//!
//! Drives the fixed pass order p0→p1→p2→p3→p6→p7→p8→p9, threading one
//! [`Codec`] through the reversible passes and a flat `Vec<DroppedConstraint>`
//! through the lossy ones, then assembles the `{apiVersion, schema, codec,
//! providerCompatErrors?}` envelope.

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::codec::{Codec, DroppedConstraint, Transform};
use crate::config::ConvertOptions;
use crate::error::{ConvertError, ProviderCompatError};
use crate::passes::{
    p0_normalize, p1_resolve_ref, p2_flatten_allof, p3_polymorphism, p6_strict, p7_constraints,
    p8_max_depth, p9_provider_compat,
};
use crate::target_profile;

/// Wire API version echoed on every envelope (spec.md §3 "ApiVersion",
/// §6 convert envelope).
pub const API_VERSION: &str = "1.0";

/// Successful result of [`convert`], mirroring the wire envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub api_version: &'static str,
    pub schema: Value,
    pub codec: Codec,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub provider_compat_errors: Vec<ProviderCompatErrorRecord>,
}

/// A wire-serializable view of [`ProviderCompatError`] (the internal enum
/// has no `Serialize` impl since it is advisory-only and never round-trips
/// through the codec).
#[derive(Debug, Clone, Serialize)]
pub struct ProviderCompatErrorRecord {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

impl From<&ProviderCompatError> for ProviderCompatErrorRecord {
    fn from(e: &ProviderCompatError) -> Self {
        ProviderCompatErrorRecord {
            code: e.error_code(),
            message: e.message().to_string(),
            pointer: e.pointer().map(str::to_string),
        }
    }
}

/// Convert a JSON Schema (draft 2020-12) document into the restricted
/// dialect `config.target` accepts, returning the converted schema and the
/// codec needed to rehydrate a conformant document back to the original
/// schema's shape.
#[instrument(skip(schema), fields(target = ?config.target, mode = ?config.mode))]
pub fn convert(schema: &Value, config: &ConvertOptions) -> Result<ConvertResult, ConvertError> {
    let profile = target_profile::profile_for(config.target);
    let mut codec = Codec::new();
    let mut dropped: Vec<DroppedConstraint> = Vec::new();

    let r = p0_normalize::normalize(schema, config)?;
    dropped.extend(r.dropped_constraints);
    let schema = r.schema;

    let r = p1_resolve_ref::resolve_refs(&schema, config, &profile)?;
    codec.extend(r.codec);
    let schema = r.schema;

    let r = p2_flatten_allof::flatten_allof(&schema, config)?;
    dropped.extend(r.dropped_constraints);
    let schema = r.schema;

    let r = p3_polymorphism::reconcile_polymorphism(&schema, config, &profile)?;
    codec.extend(r.codec);
    let schema = r.schema;

    let r = p6_strict::apply_strict(&schema, config, &profile)?;
    codec.extend(r.codec);
    let schema = r.schema;

    let r = p7_constraints::prune_constraints(&schema, config)?;
    for d in &r.dropped_constraints {
        if d.constraint == "format" {
            codec.push_transform(Transform::DropFormat {
                at: d.at.clone(),
                format: d.value.as_str().unwrap_or_default().to_string(),
            });
        }
    }
    dropped.extend(r.dropped_constraints);
    let schema = r.schema;

    let r = p8_max_depth::enforce_max_depth(&schema, config, &profile)?;
    dropped.extend(r.dropped_constraints);
    let schema = r.schema;

    let compat = p9_provider_compat::check_provider_compat(&schema, config);
    for t in compat.transforms {
        codec.push_transform(t);
    }
    let schema = compat.schema;

    codec.dropped_constraints.extend(dropped);

    let provider_compat_errors: Vec<ProviderCompatErrorRecord> =
        compat.errors.iter().map(ProviderCompatErrorRecord::from).collect();

    Ok(ConvertResult {
        api_version: API_VERSION,
        schema,
        codec,
        provider_compat_errors,
    })
}
