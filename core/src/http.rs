//! HTTP transport types and the transport capability.
//!
//! # Design
//! Requests and responses are plain data. `Gateway` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network; a
//! `Transport` implementation (supplied by the host) performs the actual
//! round trip. `EpointClient` wires the two together for callers that want a
//! single call per operation.
//!
//! All fields use owned types so values can cross FFI boundaries without
//! lifetime concerns.

use std::time::Duration;

use thiserror::Error;

/// HTTP method for a request. The gateway only speaks GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `timeout` and `verify_tls` carry the client's transport policy so that
/// every `Transport` applies the same connect/read budget and honours test
/// mode (certificate verification off for sandbox endpoints).
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Failure to complete a round trip: DNS, connect, TLS, timeout, I/O.
#[derive(Debug, Clone, Error)]
#[error("transport error: {message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The HTTP I/O capability the client depends on but does not implement.
///
/// Implementations perform exactly one attempt per call; retries, if any,
/// belong to the caller. Non-2xx statuses are returned as data, not as
/// `Err`, so the client can classify them.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
