//! Property-based coverage for the convert → rehydrate round trip on
//! randomly generated flat object schemas.

use jsonschema_llm_core::{convert, rehydrate, ConvertOptions, Target};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// A property name and whether the original schema marks it required.
#[derive(Debug, Clone)]
struct PropSpec {
    name: String,
    required: bool,
}

fn prop_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}".prop_map(|s| s)
}

fn schema_strategy() -> impl Strategy<Value = Vec<PropSpec>> {
    prop::collection::vec((prop_name_strategy(), any::<bool>()), 1..6).prop_map(|pairs| {
        let mut seen = std::collections::HashSet::new();
        pairs
            .into_iter()
            .filter(|(name, _)| seen.insert(name.clone()))
            .map(|(name, required)| PropSpec { name, required })
            .collect()
    })
}

fn build_schema(props: &[PropSpec]) -> Value {
    let mut properties = Map::new();
    for p in props {
        properties.insert(p.name.clone(), json!({"type": "string"}));
    }
    let required: Vec<&str> = props.iter().filter(|p| p.required).map(|p| p.name.as_str()).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Build a document that conforms to the *converted* (OpenAI-strict) schema:
/// every property present, optional ones set to `null`.
fn build_converted_conformant_data(props: &[PropSpec]) -> Value {
    let mut map = Map::new();
    for p in props {
        if p.required {
            map.insert(p.name.clone(), json!(format!("value-{}", p.name)));
        } else {
            map.insert(p.name.clone(), Value::Null);
        }
    }
    Value::Object(map)
}

proptest! {
    #[test]
    fn convert_never_panics_and_codec_serializes(props in schema_strategy()) {
        let schema = build_schema(&props);
        let config = ConvertOptions { target: Target::OpenaiStrict, ..ConvertOptions::default() };
        let result = convert(&schema, &config).expect("flat object schemas always convert");
        serde_json::to_string(&result.codec).expect("codec must serialize");

        // Strict sealing invariants always hold on the converted output.
        prop_assert_eq!(result.schema["additionalProperties"].as_bool(), Some(false));
        let required: Vec<&str> = result.schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        for p in &props {
            prop_assert!(required.contains(&p.name.as_str()));
        }
    }

    #[test]
    fn rehydrate_restores_exactly_the_originally_required_keys(props in schema_strategy()) {
        let schema = build_schema(&props);
        let config = ConvertOptions { target: Target::OpenaiStrict, ..ConvertOptions::default() };
        let result = convert(&schema, &config).unwrap();

        let data = build_converted_conformant_data(&props);
        let rehydrated = rehydrate(&data, &result.codec).unwrap();

        let obj = rehydrated.data.as_object().unwrap();
        for p in &props {
            if p.required {
                prop_assert!(obj.contains_key(&p.name));
            } else {
                prop_assert!(!obj.contains_key(&p.name));
            }
        }
    }
}
