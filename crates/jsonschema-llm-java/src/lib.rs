//! Java interop: two calling conventions over the same operations.
//!
//! - `extern "C"` exports (`jsl_java_*`) are null-terminated UTF-8 C
//!   strings, consumed by Java's Panama FFM (`java.lang.foreign`) without
//!   any JVM-side native compilation. `build.rs` emits a matching C header
//!   via `cbindgen` for callers that prefer a descriptor file over manual
//!   `FunctionDescriptor`s.
//! - JNI exports (`Java_*`, behind the `jni` crate) are for projects still
//!   on the classic `System.loadLibrary` + `native` method path.
//!
//! Both wrap the same request/response JSON shape as the other bindings
//! crates: a JSON request in, a JSON result (`{"ok": ...}` or
//! `{"err": "..."}`) out.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};

use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use serde_json::Value;

use jsonschema_llm_core::{
    convert, convert_all_components, extract_component, list_components, rehydrate,
    Codec, ConvertOptions, ExtractOptions,
};

fn ok_envelope(value: Value) -> String {
    serde_json::json!({"ok": value}).to_string()
}

fn err_envelope(message: impl std::fmt::Display) -> String {
    serde_json::json!({"err": message.to_string()}).to_string()
}

/// Runs `body` against a parsed request, catching both parse failures and
/// panics so neither can escape across the FFI boundary. Always returns a
/// well-formed `{"ok": ...}` / `{"err": ...}` envelope.
fn dispatch(request_json: &str, body: impl FnOnce(Value) -> Result<Value, String>) -> String {
    let parsed: Value = match serde_json::from_str(request_json) {
        Ok(v) => v,
        Err(e) => return err_envelope(format!("invalid request JSON: {e}")),
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| body(parsed)));
    match result {
        Ok(Ok(value)) => ok_envelope(value),
        Ok(Err(message)) => err_envelope(message),
        Err(_) => err_envelope("internal panic during native call"),
    }
}

fn do_convert(request: Value) -> Result<Value, String> {
    let schema = request.get("schema").cloned().unwrap_or(Value::Null);
    let config: ConvertOptions = request
        .get("config")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    convert(&schema, &config)
        .map(|r| serde_json::to_value(r).expect("ConvertResult serializes"))
        .map_err(|e| e.to_string())
}

fn do_rehydrate(request: Value) -> Result<Value, String> {
    let data = request.get("data").cloned().unwrap_or(Value::Null);
    let codec: Codec = request
        .get("codec")
        .cloned()
        .ok_or_else(|| "missing 'codec'".to_string())
        .and_then(|v| serde_json::from_value(v).map_err(|e| e.to_string()))?;
    rehydrate(&data, &codec)
        .map(|r| serde_json::to_value(r).expect("RehydrateResult serializes"))
        .map_err(|e| e.to_string())
}

fn do_list_components(request: Value) -> Result<Value, String> {
    let schema = request.get("schema").cloned().unwrap_or(Value::Null);
    Ok(serde_json::to_value(list_components(&schema)).expect("Vec<String> serializes"))
}

fn do_extract_component(request: Value) -> Result<Value, String> {
    let schema = request.get("schema").cloned().unwrap_or(Value::Null);
    let pointer = request
        .get("pointer")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "missing 'pointer'".to_string())?
        .to_string();
    let options: ExtractOptions = request
        .get("options")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    extract_component(&schema, &pointer, &options)
        .map(|r| serde_json::to_value(r).expect("ExtractedComponent serializes"))
        .map_err(|e| e.to_string())
}

fn do_convert_all_components(request: Value) -> Result<Value, String> {
    let schema = request.get("schema").cloned().unwrap_or(Value::Null);
    let convert_options: ConvertOptions = request
        .get("convert_options")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    let extract_options: ExtractOptions = request
        .get("extract_options")
        .cloned()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    let results = convert_all_components(&schema, &convert_options, &extract_options);
    Ok(serde_json::to_value(results).expect("Vec<ComponentConvertResult> serializes"))
}

// ---------------------------------------------------------------------------
// Panama FFM (extern "C") exports
// ---------------------------------------------------------------------------

/// Reads a null-terminated UTF-8 C string.
///
/// # Safety
/// `ptr` must be non-null and point at a valid null-terminated C string.
unsafe fn c_str_to_string(ptr: *const c_char) -> String {
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

/// Converts a Rust `String` into an owned, null-terminated C string the
/// caller must release via [`jsl_java_free_string`].
fn string_to_c_string(s: String) -> *mut c_char {
    CString::new(s).expect("response JSON must not contain NUL bytes").into_raw()
}

/// Frees a string returned by any `jsl_java_*` export.
///
/// # Safety
/// `ptr` must have been returned by one of this crate's exports and not
/// already freed.
#[no_mangle]
pub unsafe extern "C" fn jsl_java_free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(CString::from_raw(ptr));
}

/// Converts a schema. `request` is `{"schema": ..., "config": ConvertOptions}`.
///
/// # Safety
/// `request` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn jsl_java_convert(request: *const c_char) -> *mut c_char {
    let request_json = c_str_to_string(request);
    string_to_c_string(dispatch(&request_json, do_convert))
}

/// Rehydrates a document. `request` is `{"data": ..., "codec": Codec}`.
///
/// # Safety
/// `request` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn jsl_java_rehydrate(request: *const c_char) -> *mut c_char {
    let request_json = c_str_to_string(request);
    string_to_c_string(dispatch(&request_json, do_rehydrate))
}

/// Lists component pointers. `request` is `{"schema": ...}`.
///
/// # Safety
/// `request` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn jsl_java_list_components(request: *const c_char) -> *mut c_char {
    let request_json = c_str_to_string(request);
    string_to_c_string(dispatch(&request_json, do_list_components))
}

/// Extracts one component. `request` is
/// `{"schema": ..., "pointer": "...", "options": ExtractOptions}`.
///
/// # Safety
/// `request` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn jsl_java_extract_component(request: *const c_char) -> *mut c_char {
    let request_json = c_str_to_string(request);
    string_to_c_string(dispatch(&request_json, do_extract_component))
}

/// Extracts and converts every component. `request` is
/// `{"schema": ..., "convert_options": ConvertOptions, "extract_options": ExtractOptions}`.
///
/// # Safety
/// `request` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn jsl_java_convert_all_components(request: *const c_char) -> *mut c_char {
    let request_json = c_str_to_string(request);
    string_to_c_string(dispatch(&request_json, do_convert_all_components))
}

// ---------------------------------------------------------------------------
// JNI exports
// ---------------------------------------------------------------------------

fn jni_dispatch(
    mut env: JNIEnv,
    request: JString,
    body: impl FnOnce(Value) -> Result<Value, String>,
) -> jstring {
    let request_json: String = match env.get_string(&request) {
        Ok(s) => s.into(),
        Err(_) => {
            return env
                .new_string(err_envelope("invalid JNI string argument"))
                .expect("JVM string allocation")
                .into_raw();
        }
    };
    let response = dispatch(&request_json, body);
    env.new_string(response).expect("JVM string allocation").into_raw()
}

#[no_mangle]
pub extern "system" fn Java_dev_jsonschemallm_NativeBridge_convert(
    env: JNIEnv,
    _class: JClass,
    request: JString,
) -> jstring {
    jni_dispatch(env, request, do_convert)
}

#[no_mangle]
pub extern "system" fn Java_dev_jsonschemallm_NativeBridge_rehydrate(
    env: JNIEnv,
    _class: JClass,
    request: JString,
) -> jstring {
    jni_dispatch(env, request, do_rehydrate)
}

#[no_mangle]
pub extern "system" fn Java_dev_jsonschemallm_NativeBridge_listComponents(
    env: JNIEnv,
    _class: JClass,
    request: JString,
) -> jstring {
    jni_dispatch(env, request, do_list_components)
}

#[no_mangle]
pub extern "system" fn Java_dev_jsonschemallm_NativeBridge_extractComponent(
    env: JNIEnv,
    _class: JClass,
    request: JString,
) -> jstring {
    jni_dispatch(env, request, do_extract_component)
}

#[no_mangle]
pub extern "system" fn Java_dev_jsonschemallm_NativeBridge_convertAllComponents(
    env: JNIEnv,
    _class: JClass,
    request: JString,
) -> jstring {
    jni_dispatch(env, request, do_convert_all_components)
}
