#![no_main]

use jsonschema_llm_core::{convert, ConvertOptions};
use libfuzzer_sys::fuzz_target;

// spec.md §8 "ABI robustness": convert() must never panic for any input
// byte sequence, including malformed UTF-8 and non-schema JSON.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(schema) = serde_json::from_str(text) else {
        return;
    };
    let _ = convert(&schema, &ConvertOptions::default());
});
