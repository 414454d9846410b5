//! Synchronous client core for the Epoint payment gateway.
//!
//! # Overview
//! Every gateway call is a form POST of `data` (base64 JSON payload) and
//! `signature` (base64 SHA-1 over the private key, the data and the private
//! key again). The same envelope arrives on merchant callbacks.
//! `Gateway` builds and parses `HttpRequest`/`HttpResponse` values without
//! touching the network; `EpointClient` drives a `Transport` supplied by the
//! host and exposes one typed builder per operation.
//!
//! # Design
//! - `Gateway` and `EpointClient` are immutable after construction and safe
//!   to share between threads.
//! - Builders validate required fields before any I/O and are consumed by
//!   `send`.
//! - Responses stay open maps; typed accessors return `None` for absent or
//!   mistyped fields.
//! - The mock-server crate implements the gateway side independently;
//!   integration tests catch drift between the two.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod signature;
pub mod types;

pub use client::{EpointClient, Gateway};
pub use config::{ClientConfig, PrivateKey};
pub use error::{EpointError, RequestFailure};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use request::{Invoices, RequestBuilder, Wallet};
pub use response::*;
pub use signature::Envelope;
pub use types::{Currency, Language, Payload, PaymentStatus};
