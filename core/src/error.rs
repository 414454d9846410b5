//! Error types for the Epoint client.
//!
//! # Design
//! Local failures (`Validation`, `Encoding`, `Decoding`, `Config`) never touch
//! the network. Remote failures are split by what went wrong: the round trip
//! itself (`GatewayRequest`, transport fault or HTTP >= 400) versus a 2xx
//! response whose body breaks the JSON contract (`GatewayDecoding`).
//! `SignatureVerification` is kept separate from both because a forged
//! callback is a security event, not a transient fault.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by the gateway client, request builders and codec.
#[derive(Debug, Error)]
pub enum EpointError {
    /// A required field was absent before any I/O took place.
    #[error("missing required field: {field}")]
    Validation { field: &'static str },

    /// The request could not be delivered or the gateway answered with HTTP >= 400.
    #[error("request to {endpoint} failed: {cause}")]
    GatewayRequest {
        endpoint: String,
        cause: RequestFailure,
    },

    /// The gateway answered 2xx but the body was not a JSON object.
    #[error("failed to decode JSON response from {endpoint}: {reason}")]
    GatewayDecoding { endpoint: String, reason: String },

    /// A callback envelope did not carry a valid signature.
    #[error("invalid callback signature")]
    SignatureVerification,

    /// The payload could not be serialized for the wire.
    #[error("failed to encode payload: {0}")]
    Encoding(String),

    /// Base64 or JSON decoding of an envelope failed.
    #[error("failed to decode data: {0}")]
    Decoding(String),

    /// Client configuration was missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Why a gateway round trip failed.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl EpointError {
    /// HTTP status of a rejected request, if the gateway produced one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            EpointError::GatewayRequest {
                cause: RequestFailure::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}
