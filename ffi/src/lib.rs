//! C-ABI wrapper around `epoint-core`.
//!
//! # Overview
//! Exposes the gateway's host-does-IO surface through `extern "C"` functions
//! so any language with a C FFI can build signed requests, classify
//! responses and authenticate callbacks without reimplementing the
//! signature scheme.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Payloads go in and come out as JSON text; the core keeps key order.
//! - A single `FfiEpointResult` envelope conveys decoded payloads and errors
//!   uniformly.
//! - The C caller owns all returned pointers and must call the matching
//!   `epoint_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::catch_unwind;

use epoint_core::{ClientConfig, Gateway, HttpResponse, Payload};

use types::*;

/// Borrow a C string as UTF-8. `None` for null or invalid UTF-8.
fn str_arg<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Gateway lifecycle
// ---------------------------------------------------------------------------

/// Create a gateway handle for one merchant account.
///
/// `base_url` may be null to use the production API root. Returns null if
/// either key is null or not UTF-8. The caller must free the returned
/// pointer with `epoint_gateway_free`.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_gateway_new(
    public_key: *const c_char,
    private_key: *const c_char,
    base_url: *const c_char,
    test_mode: bool,
) -> *mut FfiGateway {
    catch_unwind(|| {
        let (Some(public_key), Some(private_key)) = (str_arg(public_key), str_arg(private_key))
        else {
            return std::ptr::null_mut();
        };
        let mut config = ClientConfig::new(public_key, private_key).with_test_mode(test_mode);
        if let Some(url) = str_arg(base_url) {
            config = config.with_base_url(url);
        }
        Box::into_raw(Box::new(FfiGateway {
            inner: Gateway::new(config),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a gateway created by `epoint_gateway_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_gateway_free(gateway: *mut FfiGateway) {
    if !gateway.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(gateway) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a signed POST for `endpoint` from a JSON object payload.
///
/// `public_key` is added when the payload lacks it. Returns null if any
/// argument is null, `payload_json` is not a JSON object, or encoding fails.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_build_post(
    gateway: *const FfiGateway,
    endpoint: *const c_char,
    payload_json: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if gateway.is_null() {
            return std::ptr::null_mut();
        }
        let gateway = unsafe { &*gateway };
        let (Some(endpoint), Some(json)) = (str_arg(endpoint), str_arg(payload_json)) else {
            return std::ptr::null_mut();
        };
        let Ok(payload) = serde_json::from_str::<Payload>(json) else {
            return std::ptr::null_mut();
        };
        match gateway.inner.build_post(endpoint, payload) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build an unsigned GET for `endpoint`, e.g. `/heartbeat`.
///
/// Returns null if `gateway` or `endpoint` is null.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_build_get(
    gateway: *const FfiGateway,
    endpoint: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if gateway.is_null() {
            return std::ptr::null_mut();
        }
        let gateway = unsafe { &*gateway };
        let Some(endpoint) = str_arg(endpoint) else {
            return std::ptr::null_mut();
        };
        match gateway.inner.build_get(endpoint, &[]) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Parse and verify functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`.
///
/// A null body reads as empty; invalid UTF-8 is replaced lossily so the
/// core reports it as a decoding failure.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }
            .to_string_lossy()
            .into_owned()
    };
    HttpResponse {
        status: resp.status,
        headers: Vec::new(),
        body,
    }
}

/// Classify the response to a request sent to `endpoint`.
///
/// On success `data_json` holds the response object.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_parse_response(
    gateway: *const FfiGateway,
    endpoint: *const c_char,
    response: *const FfiHttpResponse,
) -> *mut FfiEpointResult {
    catch_unwind(|| {
        if gateway.is_null() {
            return FfiEpointResult::null_arg("gateway");
        }
        if endpoint.is_null() {
            return FfiEpointResult::null_arg("endpoint");
        }
        if response.is_null() {
            return FfiEpointResult::null_arg("response");
        }
        let gateway = unsafe { &*gateway };
        let Some(endpoint) = str_arg(endpoint) else {
            return FfiEpointResult::invalid_arg("endpoint");
        };
        let resp = ffi_response_to_core(unsafe { &*response });
        match gateway.inner.parse_response(endpoint, resp) {
            Ok(payload) => FfiEpointResult::ok(&payload),
            Err(e) => FfiEpointResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiEpointResult::panic("panic in epoint_parse_response"))
}

/// Authenticate a callback envelope and decode its payload.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_verify_callback(
    gateway: *const FfiGateway,
    data: *const c_char,
    signature: *const c_char,
) -> *mut FfiEpointResult {
    catch_unwind(|| {
        if gateway.is_null() {
            return FfiEpointResult::null_arg("gateway");
        }
        if data.is_null() {
            return FfiEpointResult::null_arg("data");
        }
        if signature.is_null() {
            return FfiEpointResult::null_arg("signature");
        }
        let gateway = unsafe { &*gateway };
        let (Some(data), Some(signature)) = (str_arg(data), str_arg(signature)) else {
            return FfiEpointResult::invalid_arg("data or signature");
        };
        match gateway.inner.verify_callback(data, signature) {
            Ok(payload) => FfiEpointResult::ok(&payload),
            Err(e) => FfiEpointResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiEpointResult::panic("panic in epoint_verify_callback"))
}

/// Compute the gateway signature for already-encoded `data`.
///
/// Returns null if an argument is null. Free with `epoint_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_sign(gateway: *const FfiGateway, data: *const c_char) -> *mut c_char {
    catch_unwind(|| {
        if gateway.is_null() {
            return std::ptr::null_mut();
        }
        let gateway = unsafe { &*gateway };
        match str_arg(data) {
            Some(data) => c_string(&gateway.inner.sign(data)),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `epoint_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        if !req.url.is_null() {
            drop(unsafe { CString::from_raw(req.url) });
        }
        if !req.body.is_null() {
            drop(unsafe { CString::from_raw(req.body) });
        }
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
    });
}

/// Free an `FfiEpointResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_free_result(result: *mut FfiEpointResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data_json.is_null() {
            drop(unsafe { CString::from_raw(result.data_json) });
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn epoint_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { CString::from_raw(s) });
        });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
