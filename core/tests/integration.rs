//! End-to-end flows against the live mock gateway.
//!
//! # Design
//! Starts the mock server on a random port, then drives `EpointClient` over
//! real HTTP through a ureq-backed `Transport`. Validates that signing,
//! form encoding and response classification agree with an independent
//! gateway implementation.

use std::net::SocketAddr;

use epoint_core::{
    ClientConfig, EpointClient, EpointError, Envelope, HttpMethod, HttpRequest, HttpResponse,
    PaymentStatus, RequestFailure, Transport, TransportError,
};
use mock_server::MockConfig;

const PUBLIC_KEY: &str = "i000000001";
const PRIVATE_KEY: &str = "test-private-key";

/// Blocking transport over ureq.
///
/// Disables ureq's status-code-as-error behavior so 4xx/5xx responses come
/// back as data and the client classifies them.
struct UreqTransport;

impl Transport for UreqTransport {
    fn send(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(req.timeout))
            .build()
            .new_agent();

        let result = match (req.method, &req.body) {
            (HttpMethod::Post, body) => {
                let mut builder = agent.post(&req.url);
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                builder.send(body.as_deref().unwrap_or_default().as_bytes())
            }
            (HttpMethod::Get, _) => {
                let mut builder = agent.get(&req.url);
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
        };
        let mut response = result.map_err(|e| TransportError::new(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::new(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

fn start_server(config: MockConfig) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, config).await
        })
        .unwrap();
    });

    addr
}

fn client_for(addr: SocketAddr, private_key: &str) -> EpointClient {
    let config = ClientConfig::new(PUBLIC_KEY, private_key)
        .with_base_url(&format!("http://{addr}"))
        .with_test_mode(true);
    EpointClient::new(config, UreqTransport)
}

fn fetch_callback(addr: SocketAddr, transaction: &str) -> Envelope {
    let req = HttpRequest {
        method: HttpMethod::Get,
        url: format!("http://{addr}/mock/callback/{transaction}"),
        headers: Vec::new(),
        body: None,
        timeout: std::time::Duration::from_secs(5),
        verify_tls: false,
    };
    let resp = UreqTransport.send(&req).unwrap();
    assert_eq!(resp.status, 200);
    serde_json::from_str(&resp.body).unwrap()
}

#[test]
fn payment_lifecycle() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);

    // Step 1: hosted payment.
    let payment = client
        .payment()
        .amount(100.50)
        .order_id("ORDER-123")
        .description("Integration test")
        .send()
        .unwrap();
    assert!(payment.is_success());
    let tx = payment.transaction().unwrap().to_string();
    assert!(payment.redirect_url().unwrap().ends_with(&tx));

    // Step 2: not yet paid.
    let status = client.check_status().transaction(&tx).get().unwrap();
    assert_eq!(status.payment_status(), Some(PaymentStatus::New));
    assert_eq!(status.amount(), Some(100.5));

    // Step 3: gateway callback settles the payment.
    let envelope = fetch_callback(addr, &tx);
    let callback = client
        .verify_callback(&envelope.data, &envelope.signature)
        .unwrap();
    assert_eq!(callback["transaction"], tx.as_str());
    assert_eq!(callback["status"], "success");

    let status = client.check_status().transaction(&tx).get().unwrap();
    assert_eq!(status.payment_status(), Some(PaymentStatus::Success));
    assert_eq!(status.card_mask(), Some("411111******1111"));

    // Step 4: full reversal.
    let reversed = client.reverse().transaction(&tx).send().unwrap();
    assert!(reversed.is_success());

    let status = client.check_status().transaction(&tx).get().unwrap();
    assert_eq!(status.payment_status(), Some(PaymentStatus::Returned));
    assert!(status.payment_status().unwrap().is_final());
}

#[test]
fn saved_card_split_and_refund() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);

    let card = client.register_card().for_refund(true).send().unwrap();
    let card_id = card.card_id().unwrap().to_string();

    let charged = client
        .saved_card_payment()
        .card_id(&card_id)
        .amount(25.0)
        .order_id("SAVED-1")
        .execute()
        .unwrap();
    assert!(charged.is_success());
    assert!(charged.rrn().is_some());

    let split = client
        .split_card_payment()
        .card_id(&card_id)
        .amount(30.0)
        .order_id("SPLIT-1")
        .split_user("i000000002")
        .split_amount(10.0)
        .execute()
        .unwrap();
    assert!(split.is_success());

    let refund = client
        .refund()
        .card_id(&card_id)
        .order_id("REFUND-1")
        .amount(5.0)
        .send()
        .unwrap();
    assert!(refund.is_success());
    assert!(refund.transaction().is_some());
    assert_eq!(refund.amount(), Some(5.0));
}

#[test]
fn preauth_capture() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);

    let hold = client
        .preauth()
        .amount(50.0)
        .order_id("HOLD-1")
        .send()
        .unwrap();
    let tx = hold.transaction().unwrap().to_string();

    let captured = client
        .preauth()
        .complete(&tx, 40.0)
        .unwrap();
    assert!(captured.is_success());
    assert_eq!(captured.amount(), Some(40.0));

    let status = client.check_status().transaction(&tx).get().unwrap();
    assert_eq!(status.payment_status(), Some(PaymentStatus::Success));
}

#[test]
fn wallet_widget_and_invoices() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);

    let wallets = client.wallet().list().unwrap();
    assert!(!wallets.wallets().is_empty());

    let paid = client
        .wallet()
        .payment()
        .wallet_id("m10")
        .amount(3.0)
        .order_id("WALLET-1")
        .send()
        .unwrap();
    assert!(paid.redirect_url().is_some());

    let widget = client
        .widget()
        .amount(1.0)
        .order_id("W-1")
        .description("Widget")
        .create()
        .unwrap();
    assert!(widget.widget_url().is_some());

    let invoice = client
        .invoice()
        .create(&serde_json::json!({"sum": 12.5, "description": "Invoice"}))
        .unwrap();
    assert!(invoice.is_success());
    assert_eq!(invoice.fields()["id"], 1);

    let sent = client.invoice().send_email(1, "buyer@example.az").unwrap();
    assert!(sent.is_success());
}

#[test]
fn heartbeat() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);
    assert!(client.heartbeat().unwrap().is_success());
}

#[test]
fn unknown_transaction_is_gateway_error_not_failure() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);

    let status = client.check_status().transaction("te000000000000").get().unwrap();
    assert!(status.is_error());
    assert_eq!(status.payment_status(), Some(PaymentStatus::Error));
}

#[test]
fn wrong_private_key_is_rejected_with_400() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, "not-the-key");

    let err = client
        .payment()
        .amount(1.0)
        .order_id("O-1")
        .send()
        .unwrap_err();
    assert_eq!(err.http_status(), Some(400));
    assert!(matches!(err, EpointError::GatewayRequest { ref endpoint, .. } if endpoint == "/request"));
}

#[test]
fn tampered_callback_is_rejected() {
    let addr = start_server(MockConfig::default());
    let client = client_for(addr, PRIVATE_KEY);

    let tx = client
        .payment()
        .amount(9.99)
        .order_id("ORDER-9")
        .send()
        .unwrap()
        .transaction()
        .unwrap()
        .to_string();
    let mut envelope = fetch_callback(addr, &tx);
    envelope.signature = "invalid-signature".to_string();

    let err = client
        .verify_callback(&envelope.data, &envelope.signature)
        .unwrap_err();
    assert!(matches!(err, EpointError::SignatureVerification));
}

#[test]
fn unreachable_gateway_is_transport_failure() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr, PRIVATE_KEY);

    let err = client.heartbeat().unwrap_err();
    assert!(matches!(
        err,
        EpointError::GatewayRequest { cause: RequestFailure::Transport(_), .. }
    ));
    assert_eq!(err.http_status(), None);
}
