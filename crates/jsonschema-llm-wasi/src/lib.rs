//! WASI universal binary entry points.
//!
//! A host (wasmtime, wazero, wasmer, ...) loads this module and calls the
//! `jsl_*` exports below. All data in and out crosses the boundary as UTF-8
//! JSON living in linear memory the host allocates through [`jsl_alloc`] and
//! frees through [`jsl_free`]. Every call returns a 12-byte little-endian
//! envelope `{status: u32, payload_ptr: u32, payload_len: u32}` written at
//! the address the host passes in; the payload itself is a second buffer
//! the host must release with [`jsl_result_free`].
//!
//! No call is allowed to unwind across the boundary: a panicking pass would
//! otherwise corrupt the host's linear memory assumptions, so every export
//! wraps its body in [`std::panic::catch_unwind`] and reports panics as a
//! normal `status = STATUS_PANIC` result instead.

use std::alloc::{alloc, dealloc, Layout};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use serde::Serialize;
use serde_json::Value;

use jsonschema_llm_core::{
    convert, convert_all_components, extract_component, list_components, rehydrate, Codec,
    ConvertOptions, ExtractOptions,
};

const STATUS_OK: u32 = 0;
const STATUS_INVALID_UTF8: u32 = 1;
const STATUS_INVALID_JSON: u32 = 2;
const STATUS_APPLICATION_ERROR: u32 = 3;
const STATUS_PANIC: u32 = 4;

const ABI_VERSION: u32 = 1;

/// Layout of the 12-byte result envelope: three little-endian `u32`s.
const ENVELOPE_LEN: usize = 12;

/// Returns the ABI version this binary implements. Hosts should check this
/// before relying on the shape of any other export.
#[no_mangle]
pub extern "C" fn jsl_abi_version() -> u32 {
    ABI_VERSION
}

/// Allocates `len` bytes in linear memory for the host to write request
/// payloads into, and returns a pointer to them. Paired with [`jsl_free`].
#[no_mangle]
pub extern "C" fn jsl_alloc(len: u32) -> u32 {
    if len == 0 {
        return 0;
    }
    let layout = Layout::array::<u8>(len as usize).expect("allocation length overflow");
    // SAFETY: layout is non-zero size, checked above.
    let ptr = unsafe { alloc(layout) };
    ptr as u32
}

/// Frees a buffer previously returned by [`jsl_alloc`]. `len` must match the
/// length originally requested.
#[no_mangle]
pub extern "C" fn jsl_free(ptr: u32, len: u32) {
    if ptr == 0 || len == 0 {
        return;
    }
    let layout = Layout::array::<u8>(len as usize).expect("allocation length overflow");
    // SAFETY: caller guarantees ptr/len match a live jsl_alloc allocation.
    unsafe { dealloc(ptr as *mut u8, layout) };
}

/// Frees a payload buffer referenced by a result envelope. `len` must match
/// the `payload_len` the envelope reported.
#[no_mangle]
pub extern "C" fn jsl_result_free(ptr: u32, len: u32) {
    jsl_free(ptr, len);
}

/// Reads a UTF-8 JSON request buffer from linear memory and parses it.
///
/// # Safety
/// `ptr`/`len` must describe a live, readable buffer written by the host.
unsafe fn read_request(ptr: u32, len: u32) -> Result<Value, u32> {
    let bytes = slice::from_raw_parts(ptr as *const u8, len as usize);
    let text = std::str::from_utf8(bytes).map_err(|_| STATUS_INVALID_UTF8)?;
    serde_json::from_str(text).map_err(|_| STATUS_INVALID_JSON)
}

/// Serializes `payload`, copies it into a freshly allocated buffer, and
/// writes the 12-byte envelope at `envelope_ptr`.
fn emit<T: Serialize>(envelope_ptr: u32, status: u32, payload: &T) {
    let bytes = serde_json::to_vec(payload).expect("response payload must serialize");
    write_envelope(envelope_ptr, status, &bytes);
}

/// Writes an envelope with no payload (used for early-exit error statuses
/// where the host need not allocate anything to read).
fn emit_empty(envelope_ptr: u32, status: u32) {
    write_envelope(envelope_ptr, status, &[]);
}

fn write_envelope(envelope_ptr: u32, status: u32, bytes: &[u8]) {
    let (payload_ptr, payload_len) = if bytes.is_empty() {
        (0u32, 0u32)
    } else {
        let layout = Layout::array::<u8>(bytes.len()).expect("payload length overflow");
        // SAFETY: layout is non-zero size.
        let ptr = unsafe { alloc(layout) };
        assert!(!ptr.is_null(), "payload allocation failed");
        // SAFETY: ptr is freshly allocated with exactly bytes.len() capacity.
        unsafe { std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len()) };
        (ptr as u32, bytes.len() as u32)
    };

    let mut envelope = [0u8; ENVELOPE_LEN];
    envelope[0..4].copy_from_slice(&status.to_le_bytes());
    envelope[4..8].copy_from_slice(&payload_ptr.to_le_bytes());
    envelope[8..12].copy_from_slice(&payload_len.to_le_bytes());

    // SAFETY: envelope_ptr is a host-provided buffer of at least ENVELOPE_LEN bytes.
    unsafe {
        std::ptr::copy_nonoverlapping(
            envelope.as_ptr(),
            envelope_ptr as *mut u8,
            ENVELOPE_LEN,
        );
    }
}

/// Runs `body`, catching panics so they surface as `STATUS_PANIC` instead of
/// unwinding across the FFI boundary.
fn guarded<F>(envelope_ptr: u32, body: F)
where
    F: FnOnce() -> Result<(), ()> + panic::UnwindSafe,
{
    let prev_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = panic::catch_unwind(AssertUnwindSafe(body));
    panic::set_hook(prev_hook);

    match result {
        Ok(_) => {}
        Err(_) => emit_empty(envelope_ptr, STATUS_PANIC),
    }
}

#[derive(Serialize)]
struct ErrorPayload {
    message: String,
}

fn application_error(envelope_ptr: u32, message: impl std::fmt::Display) {
    emit(
        envelope_ptr,
        STATUS_APPLICATION_ERROR,
        &ErrorPayload {
            message: message.to_string(),
        },
    );
}

#[derive(serde::Deserialize)]
struct ConvertRequest {
    schema: Value,
    config: ConvertOptions,
}

/// Converts a schema. Request: `{"schema": ..., "config": ConvertOptions}`.
/// Response payload on success: `ConvertResult`.
///
/// # Safety
/// `request_ptr`/`request_len` must describe a live buffer written by the
/// host; `envelope_ptr` must point at a writable 12-byte buffer.
#[no_mangle]
pub unsafe extern "C" fn jsl_convert(request_ptr: u32, request_len: u32, envelope_ptr: u32) {
    guarded(envelope_ptr, move || {
        let request: Value = match read_request(request_ptr, request_len) {
            Ok(v) => v,
            Err(status) => {
                emit_empty(envelope_ptr, status);
                return Ok(());
            }
        };
        let req: ConvertRequest = match serde_json::from_value(request) {
            Ok(r) => r,
            Err(_) => {
                emit_empty(envelope_ptr, STATUS_INVALID_JSON);
                return Ok(());
            }
        };
        match convert(&req.schema, &req.config) {
            Ok(result) => emit(envelope_ptr, STATUS_OK, &result),
            Err(e) => application_error(envelope_ptr, e),
        }
        Ok(())
    });
}

#[derive(serde::Deserialize)]
struct RehydrateRequest {
    data: Value,
    codec: Codec,
}

/// Rehydrates a document through a codec. Request:
/// `{"data": ..., "codec": Codec}`. Response payload on success:
/// `RehydrateResult`.
///
/// # Safety
/// Same buffer requirements as [`jsl_convert`].
#[no_mangle]
pub unsafe extern "C" fn jsl_rehydrate(request_ptr: u32, request_len: u32, envelope_ptr: u32) {
    guarded(envelope_ptr, move || {
        let request: Value = match read_request(request_ptr, request_len) {
            Ok(v) => v,
            Err(status) => {
                emit_empty(envelope_ptr, status);
                return Ok(());
            }
        };
        let req: RehydrateRequest = match serde_json::from_value(request) {
            Ok(r) => r,
            Err(_) => {
                emit_empty(envelope_ptr, STATUS_INVALID_JSON);
                return Ok(());
            }
        };
        match rehydrate(&req.data, &req.codec) {
            Ok(result) => emit(envelope_ptr, STATUS_OK, &result),
            Err(e) => application_error(envelope_ptr, e),
        }
        Ok(())
    });
}

/// Lists every extractable component pointer in a schema. Request: the
/// schema itself (a bare JSON value). Response payload on success: a JSON
/// array of pointer strings.
///
/// # Safety
/// Same buffer requirements as [`jsl_convert`].
#[no_mangle]
pub unsafe extern "C" fn jsl_list_components(request_ptr: u32, request_len: u32, envelope_ptr: u32) {
    guarded(envelope_ptr, move || {
        let schema: Value = match read_request(request_ptr, request_len) {
            Ok(v) => v,
            Err(status) => {
                emit_empty(envelope_ptr, status);
                return Ok(());
            }
        };
        let components = list_components(&schema);
        emit(envelope_ptr, STATUS_OK, &components);
        Ok(())
    });
}

#[derive(serde::Deserialize)]
struct ExtractRequest {
    schema: Value,
    pointer: String,
    options: ExtractOptions,
}

/// Extracts one component as a standalone schema. Request:
/// `{"schema": ..., "pointer": "#/$defs/Foo", "options": ExtractOptions}`.
/// Response payload on success: `ExtractedComponent`.
///
/// # Safety
/// Same buffer requirements as [`jsl_convert`].
#[no_mangle]
pub unsafe extern "C" fn jsl_extract_component(request_ptr: u32, request_len: u32, envelope_ptr: u32) {
    guarded(envelope_ptr, move || {
        let request: Value = match read_request(request_ptr, request_len) {
            Ok(v) => v,
            Err(status) => {
                emit_empty(envelope_ptr, status);
                return Ok(());
            }
        };
        let req: ExtractRequest = match serde_json::from_value(request) {
            Ok(r) => r,
            Err(_) => {
                emit_empty(envelope_ptr, STATUS_INVALID_JSON);
                return Ok(());
            }
        };
        match extract_component(&req.schema, &req.pointer, &req.options) {
            Ok(result) => emit(envelope_ptr, STATUS_OK, &result),
            Err(e) => application_error(envelope_ptr, e),
        }
        Ok(())
    });
}

#[derive(serde::Deserialize)]
struct ConvertAllComponentsRequest {
    schema: Value,
    convert_options: ConvertOptions,
    extract_options: ExtractOptions,
}

/// Extracts and converts every component in one pass. Request:
/// `{"schema": ..., "convert_options": ConvertOptions, "extract_options": ExtractOptions}`.
/// Response payload on success: a JSON array of `ComponentConvertResult`.
/// Individual per-component failures are carried inside that array, not as
/// an application error — this call only fails the envelope on malformed
/// input.
///
/// # Safety
/// Same buffer requirements as [`jsl_convert`].
#[no_mangle]
pub unsafe extern "C" fn jsl_convert_all_components(
    request_ptr: u32,
    request_len: u32,
    envelope_ptr: u32,
) {
    guarded(envelope_ptr, move || {
        let request: Value = match read_request(request_ptr, request_len) {
            Ok(v) => v,
            Err(status) => {
                emit_empty(envelope_ptr, status);
                return Ok(());
            }
        };
        let req: ConvertAllComponentsRequest = match serde_json::from_value(request) {
            Ok(r) => r,
            Err(_) => {
                emit_empty(envelope_ptr, STATUS_INVALID_JSON);
                return Ok(());
            }
        };
        let results = convert_all_components(&req.schema, &req.convert_options, &req.extract_options);
        emit(envelope_ptr, STATUS_OK, &results);
        Ok(())
    });
}

// Referenced only to keep `mem`/envelope-size invariants honest if the
// envelope layout ever changes.
const _: () = assert!(ENVELOPE_LEN == 3 * mem::size_of::<u32>());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_version_is_stable() {
        assert_eq!(jsl_abi_version(), 1);
    }

    #[test]
    fn alloc_and_free_round_trip() {
        let ptr = jsl_alloc(16);
        assert_ne!(ptr, 0);
        jsl_free(ptr, 16);
    }

    #[test]
    fn alloc_zero_len_returns_null() {
        assert_eq!(jsl_alloc(0), 0);
    }

    #[test]
    fn convert_round_trip_through_abi() {
        let request = serde_json::json!({
            "schema": {"type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"]},
            "config": {"target": "openai-strict"}
        });
        let request_bytes = serde_json::to_vec(&request).unwrap();
        let request_ptr = jsl_alloc(request_bytes.len() as u32);
        unsafe {
            std::ptr::copy_nonoverlapping(
                request_bytes.as_ptr(),
                request_ptr as *mut u8,
                request_bytes.len(),
            );
        }

        let mut envelope = [0u8; ENVELOPE_LEN];
        let envelope_ptr = envelope.as_mut_ptr() as u32;

        unsafe {
            jsl_convert(request_ptr, request_bytes.len() as u32, envelope_ptr);
        }

        let status = u32::from_le_bytes(envelope[0..4].try_into().unwrap());
        let payload_ptr = u32::from_le_bytes(envelope[4..8].try_into().unwrap());
        let payload_len = u32::from_le_bytes(envelope[8..12].try_into().unwrap());
        assert_eq!(status, STATUS_OK);
        assert!(payload_ptr != 0 && payload_len > 0);

        let payload_bytes =
            unsafe { slice::from_raw_parts(payload_ptr as *const u8, payload_len as usize) };
        let payload: Value = serde_json::from_slice(payload_bytes).unwrap();
        assert_eq!(payload["schema"]["additionalProperties"], Value::Bool(false));

        jsl_free(request_ptr, request_bytes.len() as u32);
        jsl_result_free(payload_ptr, payload_len);
    }

    #[test]
    fn invalid_utf8_request_reports_status() {
        let bad_bytes: &[u8] = &[0xff, 0xfe, 0xfd];
        let request_ptr = jsl_alloc(bad_bytes.len() as u32);
        unsafe {
            std::ptr::copy_nonoverlapping(bad_bytes.as_ptr(), request_ptr as *mut u8, bad_bytes.len());
        }
        let mut envelope = [0u8; ENVELOPE_LEN];
        let envelope_ptr = envelope.as_mut_ptr() as u32;

        unsafe {
            jsl_convert(request_ptr, bad_bytes.len() as u32, envelope_ptr);
        }

        let status = u32::from_le_bytes(envelope[0..4].try_into().unwrap());
        assert_eq!(status, STATUS_INVALID_UTF8);
        jsl_free(request_ptr, bad_bytes.len() as u32);
    }

    #[test]
    fn list_components_round_trip_through_abi() {
        let schema = serde_json::json!({"$defs": {"Foo": {"type": "string"}}});
        let request_bytes = serde_json::to_vec(&schema).unwrap();
        let request_ptr = jsl_alloc(request_bytes.len() as u32);
        unsafe {
            std::ptr::copy_nonoverlapping(
                request_bytes.as_ptr(),
                request_ptr as *mut u8,
                request_bytes.len(),
            );
        }
        let mut envelope = [0u8; ENVELOPE_LEN];
        let envelope_ptr = envelope.as_mut_ptr() as u32;

        unsafe {
            jsl_list_components(request_ptr, request_bytes.len() as u32, envelope_ptr);
        }

        let status = u32::from_le_bytes(envelope[0..4].try_into().unwrap());
        let payload_ptr = u32::from_le_bytes(envelope[4..8].try_into().unwrap());
        let payload_len = u32::from_le_bytes(envelope[8..12].try_into().unwrap());
        assert_eq!(status, STATUS_OK);

        let payload_bytes =
            unsafe { slice::from_raw_parts(payload_ptr as *const u8, payload_len as usize) };
        let payload: Vec<String> = serde_json::from_slice(payload_bytes).unwrap();
        assert_eq!(payload, vec!["#/$defs/Foo".to_string()]);

        jsl_free(request_ptr, request_bytes.len() as u32);
        jsl_result_free(payload_ptr, payload_len);
    }
}
