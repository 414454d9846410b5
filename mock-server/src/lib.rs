//! In-memory stand-in for the Epoint gateway.
//!
//! Every POST endpoint takes the form-encoded `data`/`signature` envelope,
//! checks it against the configured merchant keys and answers with the JSON
//! shapes the real gateway returns. Transactions live in a process-local
//! ledger so status checks, reversals and captures see earlier calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Merchant credentials the mock accepts.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub public_key: String,
    pub private_key: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            public_key: "i000000001".to_string(),
            private_key: "test-private-key".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub data: String,
    pub signature: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction: String,
    pub order_id: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: String,
}

pub type Ledger = Arc<RwLock<HashMap<String, Transaction>>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    ledger: Ledger,
    invoice_seq: Arc<AtomicU64>,
}

type Fields = Map<String, Value>;

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
        ledger: Arc::new(RwLock::new(HashMap::new())),
        invoice_seq: Arc::new(AtomicU64::new(0)),
    };
    Router::new()
        .route("/heartbeat", get(heartbeat))
        .route("/request", post(hosted_payment))
        .route("/split-request", post(split_payment))
        .route("/pre-auth-request", post(hosted_payment))
        .route("/wallet/payment", post(wallet_payment))
        .route("/pre-auth-complete", post(preauth_complete))
        .route("/card-registration", post(card_registration))
        .route("/card-registration-with-pay", post(card_registration_with_pay))
        .route("/execute-pay", post(execute_pay))
        .route("/split-execute-pay", post(split_execute_pay))
        .route("/refund-request", post(refund))
        .route("/reverse", post(reverse))
        .route("/get-status", post(get_status))
        .route("/token/widget", post(widget))
        .route("/wallet/status", post(wallet_status))
        .route("/invoices/{action}", post(invoice))
        .route("/mock/callback/{transaction}", get(callback))
        .with_state(state)
}

pub async fn run(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

/// base64(SHA1(key || data || key)), computed independently of the client crate.
pub fn sign(data: &str, private_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(private_key.as_bytes());
    hasher.update(data.as_bytes());
    hasher.update(private_key.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// Encode and sign a JSON payload.
pub fn seal(payload: &Value, private_key: &str) -> Envelope {
    let data = STANDARD.encode(payload.to_string());
    let signature = sign(&data, private_key);
    Envelope { data, signature }
}

/// Rejection sent as HTTP 400 with the gateway's error body.
#[derive(Debug)]
struct Rejected(&'static str);

impl IntoResponse for Rejected {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "error", "message": self.0})),
        )
            .into_response()
    }
}

impl AppState {
    fn open(&self, envelope: &Envelope) -> Result<Fields, Rejected> {
        if sign(&envelope.data, &self.config.private_key) != envelope.signature {
            warn!("request with invalid signature");
            return Err(Rejected("Invalid signature"));
        }
        let bytes = STANDARD
            .decode(&envelope.data)
            .map_err(|_| Rejected("Malformed data"))?;
        let fields: Fields = serde_json::from_slice(&bytes).map_err(|_| Rejected("Malformed data"))?;
        if fields.get("public_key").and_then(Value::as_str) != Some(self.config.public_key.as_str()) {
            warn!("request for unknown merchant");
            return Err(Rejected("Unknown merchant"));
        }
        Ok(fields)
    }

    async fn record(&self, fields: &Fields, status: &str) -> Transaction {
        let tx = Transaction {
            transaction: new_transaction_id(),
            order_id: text(fields, "order_id").map(str::to_string),
            amount: amount(fields).unwrap_or(0.0),
            currency: text(fields, "currency").unwrap_or("AZN").to_string(),
            status: status.to_string(),
        };
        self.ledger
            .write()
            .await
            .insert(tx.transaction.clone(), tx.clone());
        info!(transaction = %tx.transaction, status, "recorded transaction");
        tx
    }
}

fn new_transaction_id() -> String {
    format!("te{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn text<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn amount(fields: &Fields) -> Option<f64> {
    match fields.get("amount")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Gateway-level failure: HTTP 200 with `status: error`.
fn failure(message: &str) -> Json<Value> {
    Json(json!({"status": "error", "message": message}))
}

fn missing(fields: &Fields, required: &[&'static str]) -> Option<Json<Value>> {
    required
        .iter()
        .find(|key| fields.get(**key).filter(|v| !v.is_null()).is_none())
        .map(|key| failure(&format!("{key} is required")))
}

fn redirect_url(transaction: &str) -> String {
    format!("https://mock.epoint.az/pay/{transaction}")
}

fn bank_details(tx: &Transaction) -> Value {
    json!({
        "order_id": tx.order_id,
        "status": tx.status,
        "code": "000",
        "message": "Approved",
        "transaction": tx.transaction,
        "bank_transaction": format!("bt{}", &tx.transaction[2..]),
        "bank_response": "Approved",
        "operation_code": "001",
        "rrn": "123456789012",
        "card_name": "MOCK HOLDER",
        "card_mask": "411111******1111",
        "amount": tx.amount,
        "currency": tx.currency,
    })
}

async fn heartbeat() -> Json<Value> {
    Json(json!({"status": "success", "message": "Gateway is up"}))
}

async fn hosted_payment(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    open_payment_page(&state, &envelope, &["amount", "order_id"]).await
}

async fn split_payment(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    open_payment_page(
        &state,
        &envelope,
        &["amount", "order_id", "split_user", "split_amount"],
    )
    .await
}

async fn open_payment_page(
    state: &AppState,
    envelope: &Envelope,
    required: &[&'static str],
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(envelope)?;
    if let Some(err) = missing(&fields, required) {
        return Ok(err);
    }
    let tx = state.record(&fields, "new").await;
    Ok(Json(json!({
        "status": "success",
        "transaction": tx.transaction,
        "redirect_url": redirect_url(&tx.transaction),
    })))
}

async fn wallet_payment(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    if let Some(err) = missing(&fields, &["wallet_id", "amount", "order_id"]) {
        return Ok(err);
    }
    let tx = state.record(&fields, "new").await;
    Ok(Json(json!({
        "status": "success",
        "transaction": tx.transaction,
        "redirect_url": redirect_url(&tx.transaction),
    })))
}

async fn card_registration(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    state.open(&envelope)?;
    let card_id = format!("ce{}", Uuid::new_v4().simple());
    Ok(Json(json!({
        "status": "success",
        "card_id": card_id,
        "redirect_url": format!("https://mock.epoint.az/card/{card_id}"),
    })))
}

async fn card_registration_with_pay(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    if let Some(err) = missing(&fields, &["amount", "order_id"]) {
        return Ok(err);
    }
    let tx = state.record(&fields, "new").await;
    Ok(Json(json!({
        "status": "success",
        "transaction": tx.transaction,
        "card_id": format!("ce{}", Uuid::new_v4().simple()),
        "order_id": tx.order_id,
        "redirect_url": redirect_url(&tx.transaction),
    })))
}

async fn execute_pay(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    charge_saved_card(&state, &envelope, &["card_id", "amount", "order_id"]).await
}

async fn split_execute_pay(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    charge_saved_card(
        &state,
        &envelope,
        &["card_id", "amount", "order_id", "split_user", "split_amount"],
    )
    .await
}

async fn charge_saved_card(
    state: &AppState,
    envelope: &Envelope,
    required: &[&'static str],
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(envelope)?;
    if let Some(err) = missing(&fields, required) {
        return Ok(err);
    }
    let tx = state.record(&fields, "success").await;
    Ok(Json(bank_details(&tx)))
}

async fn refund(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    if let Some(err) = missing(&fields, &["card_id", "order_id", "amount"]) {
        return Ok(err);
    }
    let tx = state.record(&fields, "success").await;
    Ok(Json(bank_details(&tx)))
}

async fn reverse(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    let Some(id) = text(&fields, "transaction") else {
        return Ok(failure("transaction is required"));
    };
    let mut ledger = state.ledger.write().await;
    let Some(tx) = ledger.get_mut(id) else {
        return Ok(failure("Transaction not found"));
    };
    match amount(&fields) {
        Some(partial) if partial < tx.amount => tx.amount -= partial,
        _ => tx.status = "returned".to_string(),
    }
    debug!(transaction = %tx.transaction, status = %tx.status, "reversed");
    Ok(Json(json!({
        "status": "success",
        "message": "Reversed",
        "transaction": tx.transaction,
    })))
}

async fn preauth_complete(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    if let Some(err) = missing(&fields, &["transaction", "amount"]) {
        return Ok(err);
    }
    let captured = amount(&fields).unwrap_or(0.0);
    let mut ledger = state.ledger.write().await;
    let Some(tx) = text(&fields, "transaction").and_then(|id| ledger.get_mut(id)) else {
        return Ok(failure("Transaction not found"));
    };
    tx.status = "success".to_string();
    tx.amount = captured;
    Ok(Json(json!({
        "status": "success",
        "transaction": tx.transaction,
        "amount": tx.amount,
        "code": "000",
    })))
}

async fn get_status(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    let ledger = state.ledger.read().await;
    match text(&fields, "transaction").and_then(|id| ledger.get(id)) {
        Some(tx) => Ok(Json(bank_details(tx))),
        None => Ok(failure("Transaction not found")),
    }
}

async fn widget(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    if let Some(err) = missing(&fields, &["amount", "order_id", "description"]) {
        return Ok(err);
    }
    Ok(Json(json!({
        "status": "success",
        "widget_url": format!("https://mock.epoint.az/widget/{}", Uuid::new_v4().simple()),
    })))
}

async fn wallet_status(
    State(state): State<AppState>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    state.open(&envelope)?;
    Ok(Json(json!({
        "status": "success",
        "wallets": [
            {"id": "m10", "name": "m10"},
            {"id": "birbank", "name": "Birbank"},
        ],
    })))
}

async fn invoice(
    State(state): State<AppState>,
    Path(action): Path<String>,
    Form(envelope): Form<Envelope>,
) -> Result<Json<Value>, Rejected> {
    let fields = state.open(&envelope)?;
    let body = match action.as_str() {
        "create" => {
            let id = state.invoice_seq.fetch_add(1, Ordering::Relaxed) + 1;
            json!({"status": "success", "id": id})
        }
        "update" | "view" | "send-sms" | "send-email" => match fields.get("id") {
            Some(id) => json!({"status": "success", "id": id}),
            None => return Ok(failure("id is required")),
        },
        "list" => json!({"status": "success", "list": []}),
        _ => return Ok(failure("Unknown invoice action")),
    };
    Ok(Json(body))
}

/// Signed callback for `transaction`, as the gateway would POST it to the
/// merchant. A pending transaction is settled first.
async fn callback(
    State(state): State<AppState>,
    Path(transaction): Path<String>,
) -> Result<Json<Envelope>, StatusCode> {
    let mut ledger = state.ledger.write().await;
    let tx = ledger.get_mut(&transaction).ok_or(StatusCode::NOT_FOUND)?;
    if tx.status == "new" {
        tx.status = "success".to_string();
    }
    Ok(Json(seal(&bank_details(tx), &state.config.private_key)))
}
