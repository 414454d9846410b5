//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Decoded gateway payloads cross the
//! boundary as JSON text, since their shape is open-ended. Conversion
//! functions live here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use epoint_core::{EpointError, HttpMethod, Payload};

/// Opaque handle to a `Gateway`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiGateway {
    pub(crate) inner: epoint_core::Gateway,
}

/// Copy `s` into a heap C string. Interior NUL bytes are dropped.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `epoint_build_*` functions. The C caller executes the request,
/// honoring `timeout_secs` and `verify_tls`, and passes the response back
/// through `epoint_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_secs: u64,
    pub verify_tls: bool,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: epoint_core::HttpRequest) -> *mut Self {
        let url = c_string(&req.url);
        let body = match req.body {
            Some(b) => c_string(&b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url,
            headers,
            headers_len,
            body,
            timeout_secs: req.timeout.as_secs(),
            verify_tls: req.verify_tls,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing a request and
/// passes a pointer to `epoint_parse_response`. The FFI layer reads but
/// does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiEpointResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Validation = 1,
    GatewayRequest = 2,
    GatewayDecoding = 3,
    SignatureVerification = 4,
    Encoding = 5,
    Decoding = 6,
    Config = 7,
    Panic = 8,
    NullArg = 9,
    InvalidArg = 10,
}

/// Result envelope for parse and verify operations.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data_json`
/// holds the decoded payload as a JSON object. On failure `error_code`
/// describes the category, `error_message` is a human-readable C string and
/// `data_json` is null. `http_status` is set only for HTTP-level failures.
#[repr(C)]
pub struct FfiEpointResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_json: *mut c_char,
}

impl FfiEpointResult {
    fn boxed(error_code: FfiErrorCode, message: Option<&str>, http_status: u16) -> *mut Self {
        Box::into_raw(Box::new(FfiEpointResult {
            error_code,
            error_message: message.map_or(std::ptr::null_mut(), c_string),
            http_status,
            data_json: std::ptr::null_mut(),
        }))
    }

    /// Build a success result carrying `payload` as JSON text.
    pub(crate) fn ok(payload: &Payload) -> *mut Self {
        match serde_json::to_string(payload) {
            Ok(json) => Box::into_raw(Box::new(FfiEpointResult {
                error_code: FfiErrorCode::Ok,
                error_message: std::ptr::null_mut(),
                http_status: 0,
                data_json: c_string(&json),
            })),
            Err(e) => Self::boxed(FfiErrorCode::Encoding, Some(&e.to_string()), 0),
        }
    }

    /// Build an error result from an `EpointError`.
    pub(crate) fn from_error(err: EpointError) -> *mut Self {
        let error_code = match &err {
            EpointError::Validation { .. } => FfiErrorCode::Validation,
            EpointError::GatewayRequest { .. } => FfiErrorCode::GatewayRequest,
            EpointError::GatewayDecoding { .. } => FfiErrorCode::GatewayDecoding,
            EpointError::SignatureVerification => FfiErrorCode::SignatureVerification,
            EpointError::Encoding(_) => FfiErrorCode::Encoding,
            EpointError::Decoding(_) => FfiErrorCode::Decoding,
            EpointError::Config(_) => FfiErrorCode::Config,
        };
        let http_status = err.http_status().unwrap_or(0);
        Self::boxed(error_code, Some(&err.to_string()), http_status)
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::NullArg, Some(&format!("null argument: {name}")), 0)
    }

    /// Build an error result for an argument that is not valid UTF-8 or JSON.
    pub(crate) fn invalid_arg(name: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::InvalidArg, Some(&format!("invalid argument: {name}")), 0)
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, Some(msg), 0)
    }
}
