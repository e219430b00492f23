//! Browser/Node WASM bindings.
//!
//! Each export takes and returns plain JS values (via `serde-wasm-bindgen`)
//! rather than raw JSON strings — callers on the JS side work with real
//! objects, not serialized text. Conversion errors are returned as
//! rejected promises through `wasm-bindgen`'s `Result<T, JsValue>`
//! convention rather than thrown exceptions, so callers can `.catch()`
//! them like any other async JS failure.

use jsonschema_llm_core::{
    convert, convert_all_components, extract_component, list_components, rehydrate,
    Codec, ConvertOptions, ExtractOptions,
};
use serde::Deserialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

/// Installs a panic hook that forwards Rust panics to the browser/Node
/// console instead of an opaque "unreachable executed" trap. Call once
/// from JS on module load.
#[wasm_bindgen(js_name = initPanicHook)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(to_js_error)
}

/// Converts a JSON Schema into a target's structured-output dialect.
/// `schema` is a plain JS object; `config` mirrors `ConvertOptions`
/// (e.g. `{target: "openai-strict"}`). Returns `ConvertResult`.
#[wasm_bindgen]
pub fn convert_schema(schema: JsValue, config: JsValue) -> Result<JsValue, JsValue> {
    let schema: Value = from_js(schema)?;
    let config: ConvertOptions = from_js(config)?;
    let result = convert(&schema, &config).map_err(to_js_error)?;
    to_js(&result)
}

/// Reverses a codec's transforms against a document produced by an LLM.
/// Returns `RehydrateResult`.
#[wasm_bindgen]
pub fn rehydrate_document(data: JsValue, codec: JsValue) -> Result<JsValue, JsValue> {
    let data: Value = from_js(data)?;
    let codec: Codec = from_js(codec)?;
    let result = rehydrate(&data, &codec).map_err(to_js_error)?;
    to_js(&result)
}

/// Lists every extractable `$defs`/`definitions` pointer in a schema.
#[wasm_bindgen(js_name = listComponents)]
pub fn list_components_js(schema: JsValue) -> Result<JsValue, JsValue> {
    let schema: Value = from_js(schema)?;
    let pointers = list_components(&schema);
    to_js(&pointers)
}

/// Extracts one component as a standalone schema.
#[wasm_bindgen(js_name = extractComponent)]
pub fn extract_component_js(
    schema: JsValue,
    pointer: String,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let schema: Value = from_js(schema)?;
    let options: ExtractOptions = from_js(options)?;
    let result = extract_component(&schema, &pointer, &options).map_err(to_js_error)?;
    to_js(&result)
}

/// Extracts and converts every component in one call.
#[wasm_bindgen(js_name = convertAllComponents)]
pub fn convert_all_components_js(
    schema: JsValue,
    convert_options: JsValue,
    extract_options: JsValue,
) -> Result<JsValue, JsValue> {
    let schema: Value = from_js(schema)?;
    let convert_options: ConvertOptions = from_js(convert_options)?;
    let extract_options: ExtractOptions = from_js(extract_options)?;
    let results = convert_all_components(&schema, &convert_options, &extract_options);
    to_js(&results)
}
