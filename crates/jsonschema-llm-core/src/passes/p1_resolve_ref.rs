//! Pass 1: Resolve and classify `$ref` (spec.md §4.1 / §4.3 pass 1).
//!
//! When the target profile allows `$ref` in output (`Claude`), a reference
//! is left untouched once confirmed resolvable — no inlining, no codec
//! entry, matching the codec-minimality property (spec.md §8) for targets
//! that need no rewriting here. When the profile disallows `$ref`
//! (`openai-strict`, `gemini`), the reference is inlined; a reference that
//! re-enters itself `recursion-limit` times is truncated to a permissive
//! placeholder instead of being followed further, guaranteeing termination.

use serde_json::{json, Value};

use crate::codec::{Codec, Transform};
use crate::config::ConvertOptions;
use crate::error::ConvertError;
use crate::resolver::{RefResolver, Resolution};
use crate::schema_utils::build_path;
use crate::target_profile::TargetProfile;

pub struct ResolveRefPassResult {
    pub schema: Value,
    pub codec: Codec,
}

pub fn resolve_refs(
    schema: &Value,
    config: &ConvertOptions,
    profile: &TargetProfile,
) -> Result<ResolveRefPassResult, ConvertError> {
    let mut resolver = RefResolver::new(schema);
    let mut codec = Codec::new();
    let resolved = walk(schema, schema, config, profile, &mut resolver, "#", &mut codec)?;
    Ok(ResolveRefPassResult {
        schema: resolved,
        codec,
    })
}

fn walk(
    root: &Value,
    node: &Value,
    config: &ConvertOptions,
    profile: &TargetProfile,
    resolver: &mut RefResolver,
    path: &str,
    codec: &mut Codec,
) -> Result<Value, ConvertError> {
    let obj = match node.as_object() {
        Some(o) => o,
        None => return Ok(node.clone()),
    };

    if let Some(Value::String(reference)) = obj.get("$ref") {
        let reference = reference.clone();
        let ref_path = build_path(path, &["$ref"]);

        if profile.allow_ref {
            // Confirm it resolves (unresolvable_ref is still fatal) but
            // keep the reference as-is — no codec entry for a no-op.
            resolver.resolve(&reference, &ref_path)?;
            return Ok(node.clone());
        }

        return inline_ref(root, node, config, profile, resolver, path, &reference, codec);
    }

    walk_children(root, obj, config, profile, resolver, path, codec)
}

fn inline_ref(
    root: &Value,
    node: &Value,
    config: &ConvertOptions,
    profile: &TargetProfile,
    resolver: &mut RefResolver,
    path: &str,
    reference: &str,
    codec: &mut Codec,
) -> Result<Value, ConvertError> {
    let ref_path = build_path(path, &["$ref"]);

    if resolver.occurrences(reference) >= config.recursion_limit {
        codec.push_transform(Transform::TruncateRecursion {
            at: path.to_string(),
            depth: config.recursion_limit,
            r#ref: reference.to_string(),
        });
        return Ok(placeholder_for(node));
    }

    match resolver.resolve(reference, &ref_path)? {
        Resolution::Cycle { .. } => {
            // Immediate self-re-entry below the occurrence limit: still a
            // cycle, but we have budget left — fall through to inline one
            // more level, same as any other resolution.
            inline_target(root, node, config, profile, resolver, path, reference, codec)
        }
        Resolution::Node(_) => {
            inline_target(root, node, config, profile, resolver, path, reference, codec)
        }
    }
}

fn inline_target(
    root: &Value,
    node: &Value,
    config: &ConvertOptions,
    profile: &TargetProfile,
    resolver: &mut RefResolver,
    path: &str,
    reference: &str,
    codec: &mut Codec,
) -> Result<Value, ConvertError> {
    let ref_path = build_path(path, &["$ref"]);
    let pointer = match resolver.resolve(reference, &ref_path)? {
        Resolution::Node(p) => p,
        Resolution::Cycle { back_edge } => back_edge,
    };
    let target_node = resolver
        .node_at(&pointer)
        .ok_or_else(|| ConvertError::UnresolvableRef {
            path: ref_path.clone(),
            reference: reference.to_string(),
        })?
        .clone();

    resolver.enter(reference);
    let inlined = walk(root, &target_node, config, profile, resolver, path, codec)?;
    resolver.exit();

    // `$ref` may coexist with sibling keywords in 2020-12; local keywords
    // take precedence over the resolved content.
    let merged = match (inlined, node.as_object()) {
        (Value::Object(mut base), Some(siblings)) => {
            for (k, v) in siblings {
                if k != "$ref" {
                    base.insert(k.clone(), v.clone());
                }
            }
            Value::Object(base)
        }
        (other, _) => other,
    };

    codec.push_transform(Transform::InlineRef {
        at: path.to_string(),
        r#ref: reference.to_string(),
    });

    Ok(merged)
}

/// A permissive placeholder for a truncated recursive subtree: `{}` for an
/// object-typed node, an unconstrained pass-through schema otherwise
/// (spec.md §4.1).
fn placeholder_for(node: &Value) -> Value {
    let is_object_typed = node
        .get("type")
        .and_then(|t| t.as_str())
        .map(|t| t == "object")
        .unwrap_or(false);
    if is_object_typed {
        json!({})
    } else {
        json!({})
    }
}

fn walk_children(
    root: &Value,
    obj: &serde_json::Map<String, Value>,
    config: &ConvertOptions,
    profile: &TargetProfile,
    resolver: &mut RefResolver,
    path: &str,
    codec: &mut Codec,
) -> Result<Value, ConvertError> {
    let mut out = obj.clone();

    if let Some(Value::Object(props)) = out.get("properties").cloned() {
        let mut new_props = serde_json::Map::with_capacity(props.len());
        for (k, child) in props {
            let child_path = build_path(path, &["properties", &k]);
            new_props.insert(k, walk(root, &child, config, profile, resolver, &child_path, codec)?);
        }
        out.insert("properties".to_string(), Value::Object(new_props));
    }

    if let Some(items) = out.get("items").cloned() {
        if items.is_object() {
            let child_path = build_path(path, &["items"]);
            out.insert("items".to_string(), walk(root, &items, config, profile, resolver, &child_path, codec)?);
        }
    }

    if let Some(Value::Array(prefix)) = out.get("prefixItems").cloned() {
        let mut new_prefix = Vec::with_capacity(prefix.len());
        for (i, child) in prefix.into_iter().enumerate() {
            let child_path = build_path(path, &["prefixItems", &i.to_string()]);
            new_prefix.push(walk(root, &child, config, profile, resolver, &child_path, codec)?);
        }
        out.insert("prefixItems".to_string(), Value::Array(new_prefix));
    }

    if let Some(ap) = out.get("additionalProperties").cloned() {
        if ap.is_object() {
            let child_path = build_path(path, &["additionalProperties"]);
            out.insert(
                "additionalProperties".to_string(),
                walk(root, &ap, config, profile, resolver, &child_path, codec)?,
            );
        }
    }

    for keyword in ["anyOf", "oneOf", "allOf"] {
        if let Some(Value::Array(variants)) = out.get(keyword).cloned() {
            let mut new_variants = Vec::with_capacity(variants.len());
            for (i, child) in variants.into_iter().enumerate() {
                let child_path = build_path(path, &[keyword, &i.to_string()]);
                new_variants.push(walk(root, &child, config, profile, resolver, &child_path, codec)?);
            }
            out.insert(keyword.to_string(), Value::Array(new_variants));
        }
    }

    for keyword in ["not", "if", "then", "else"] {
        if let Some(child) = out.get(keyword).cloned() {
            let child_path = build_path(path, &[keyword]);
            out.insert(keyword.to_string(), walk(root, &child, config, profile, resolver, &child_path, codec)?);
        }
    }

    for keyword in ["$defs", "definitions"] {
        if let Some(Value::Object(defs)) = out.get(keyword).cloned() {
            let mut new_defs = serde_json::Map::with_capacity(defs.len());
            for (name, child) in defs {
                let child_path = build_path(path, &[keyword, &name]);
                new_defs.insert(name, walk(root, &child, config, profile, resolver, &child_path, codec)?);
            }
            out.insert(keyword.to_string(), Value::Object(new_defs));
        }
    }

    Ok(Value::Object(out))
}
