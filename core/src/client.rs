//! Request signing, response parsing, and the transport-driven client.
//!
//! # Design
//! `Gateway` holds only configuration and never touches the network. It
//! turns a payload into a signed `HttpRequest` (`build_post`), builds plain
//! GETs (`build_get`), classifies an `HttpResponse` (`parse_response`) and
//! authenticates inbound callbacks. `EpointClient` pairs a `Gateway` with a
//! `Transport` and performs exactly one round trip per call. Both are
//! immutable after construction, so one instance can serve any number of
//! concurrent request flows.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{EpointError, RequestFailure};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::request::{operation, Invoices, RequestBuilder, Wallet};
use crate::response::HeartbeatResponse;
use crate::signature::{self, Envelope};
use crate::types::Payload;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Stateless signer and parser for the gateway's wire protocol.
#[derive(Debug, Clone)]
pub struct Gateway {
    config: ClientConfig,
}

impl Gateway {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn public_key(&self) -> &str {
        &self.config.public_key
    }

    /// Encode and sign `payload`, injecting the public key when it is absent.
    pub fn seal(&self, mut payload: Payload) -> Result<Envelope, EpointError> {
        if !is_present(&payload, "public_key") {
            payload.insert(
                "public_key".to_string(),
                Value::String(self.config.public_key.clone()),
            );
        }
        Envelope::seal(&payload, self.config.private_key.expose())
    }

    /// Compute the signature for already-encoded `data`.
    pub fn sign(&self, data: &str) -> String {
        signature::sign(data, self.config.private_key.expose())
    }

    /// Build a signed, form-encoded POST to `endpoint`.
    pub fn build_post(&self, endpoint: &str, payload: Payload) -> Result<HttpRequest, EpointError> {
        let envelope = self.seal(payload)?;
        let body = serde_urlencoded::to_string(&envelope)
            .map_err(|e| EpointError::Encoding(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.url(endpoint),
            headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
            body: Some(body),
            timeout: self.config.timeout,
            verify_tls: !self.config.test_mode,
        })
    }

    /// Build an unsigned GET to `endpoint` with an optional query string.
    pub fn build_get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<HttpRequest, EpointError> {
        let mut url = self.url(endpoint);
        if !query.is_empty() {
            let qs = serde_urlencoded::to_string(query)
                .map_err(|e| EpointError::Encoding(e.to_string()))?;
            url.push('?');
            url.push_str(&qs);
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: vec![("accept".to_string(), "application/json".to_string())],
            body: None,
            timeout: self.config.timeout,
            verify_tls: !self.config.test_mode,
        })
    }

    /// Classify a gateway response: HTTP >= 400 is a request failure, any
    /// other status must carry a JSON object.
    pub fn parse_response(&self, endpoint: &str, response: HttpResponse) -> Result<Payload, EpointError> {
        if response.status >= 400 {
            return Err(EpointError::GatewayRequest {
                endpoint: endpoint.to_string(),
                cause: RequestFailure::Status {
                    status: response.status,
                    body: response.body,
                },
            });
        }
        match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(EpointError::GatewayDecoding {
                endpoint: endpoint.to_string(),
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
            Err(e) => Err(EpointError::GatewayDecoding {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Authenticate a callback envelope and return its decoded payload.
    pub fn verify_callback(&self, data: &str, signature: &str) -> Result<Payload, EpointError> {
        if !signature::verify(data, signature, self.config.private_key.expose()) {
            warn!("rejected callback with invalid signature");
            return Err(EpointError::SignatureVerification);
        }
        signature::decode(data)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url)
    }
}

/// Gateway client bound to a transport.
#[derive(Clone)]
pub struct EpointClient {
    gateway: Gateway,
    transport: Arc<dyn Transport>,
}

impl EpointClient {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::with_transport(config, Arc::new(transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            gateway: Gateway::new(config),
            transport,
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn public_key(&self) -> &str {
        self.gateway.public_key()
    }

    /// Sign `payload` and POST it to `endpoint`.
    pub fn post(&self, endpoint: &str, payload: Payload) -> Result<Payload, EpointError> {
        let request = self.gateway.build_post(endpoint, payload)?;
        self.execute(endpoint, &request)
    }

    /// GET `endpoint` without a signature.
    pub fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Payload, EpointError> {
        let request = self.gateway.build_get(endpoint, query)?;
        self.execute(endpoint, &request)
    }

    pub fn heartbeat(&self) -> Result<HeartbeatResponse, EpointError> {
        self.get("/heartbeat", &[]).map(HeartbeatResponse::new)
    }

    pub fn verify_callback(&self, data: &str, signature: &str) -> Result<Payload, EpointError> {
        self.gateway.verify_callback(data, signature)
    }

    pub fn payment(&self) -> RequestBuilder<'_, operation::Payment> {
        RequestBuilder::new(self)
    }

    pub fn check_status(&self) -> RequestBuilder<'_, operation::StatusCheck> {
        RequestBuilder::new(self)
    }

    pub fn register_card(&self) -> RequestBuilder<'_, operation::CardRegistration> {
        RequestBuilder::new(self)
    }

    pub fn register_card_with_pay(&self) -> RequestBuilder<'_, operation::CardRegistrationWithPay> {
        RequestBuilder::new(self)
    }

    pub fn saved_card_payment(&self) -> RequestBuilder<'_, operation::SavedCardPayment> {
        RequestBuilder::new(self)
    }

    pub fn split_card_payment(&self) -> RequestBuilder<'_, operation::SplitCardPayment> {
        RequestBuilder::new(self)
    }

    pub fn split_payment(&self) -> RequestBuilder<'_, operation::SplitPayment> {
        RequestBuilder::new(self)
    }

    pub fn refund(&self) -> RequestBuilder<'_, operation::Refund> {
        RequestBuilder::new(self)
    }

    pub fn reverse(&self) -> RequestBuilder<'_, operation::Reverse> {
        RequestBuilder::new(self)
    }

    pub fn preauth(&self) -> RequestBuilder<'_, operation::Preauth> {
        RequestBuilder::new(self)
    }

    pub fn widget(&self) -> RequestBuilder<'_, operation::Widget> {
        RequestBuilder::new(self)
    }

    pub fn wallet(&self) -> Wallet<'_> {
        Wallet::new(self)
    }

    pub fn invoice(&self) -> Invoices<'_> {
        Invoices::new(self)
    }

    fn execute(&self, endpoint: &str, request: &HttpRequest) -> Result<Payload, EpointError> {
        debug!(method = request.method.as_str(), endpoint, "sending gateway request");
        let response = self
            .transport
            .send(request)
            .map_err(|e| EpointError::GatewayRequest {
                endpoint: endpoint.to_string(),
                cause: e.into(),
            })?;
        debug!(endpoint, status = response.status, "gateway responded");
        self.gateway.parse_response(endpoint, response)
    }
}

impl fmt::Debug for EpointClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpointClient")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

/// A field counts as present when it exists and is not `null`.
pub(crate) fn is_present(payload: &Payload, key: &str) -> bool {
    payload.get(key).is_some_and(|v| !v.is_null())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
