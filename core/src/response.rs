//! Read-only views over decoded gateway responses.
//!
//! # Design
//! Every response is the same thing on the wire: a JSON object with at least
//! a `status`. `Response<K>` wraps that object once and never mutates it; the
//! marker `K` decides which accessors are offered. Accessor groups shared by
//! several operations hang off small marker traits in [`kind`] rather than
//! being repeated per operation.
//!
//! Accessors return `None` when a field is absent or has an unexpected JSON
//! type. They never fail.

use std::marker::PhantomData;

use serde_json::Value;

use crate::types::{Payload, PaymentStatus};

/// Response kinds and the accessor groups each one exposes.
pub mod kind {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Payment;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CardRegistration;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CardRegistrationWithPay;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Refund;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Reverse;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PreauthComplete;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Widget;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WalletList;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WalletPayment;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Invoice;
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Heartbeat;

    /// Carries a gateway `transaction` identifier.
    pub trait Transactional {}
    /// Carries an `amount`.
    pub trait Priced {}
    /// Carries a `redirect_url` for the hosted page.
    pub trait Redirecting {}
    /// Carries a saved `card_id`.
    pub trait CardIssuing {}
    /// Echoes the merchant `order_id`.
    pub trait Ordered {}
    /// Carries acquiring-bank metadata (RRN, masked PAN, bank codes).
    pub trait BankDetails {}

    impl Transactional for Payment {}
    impl Transactional for CardRegistrationWithPay {}
    impl Transactional for Refund {}
    impl Transactional for Reverse {}
    impl Transactional for Status {}
    impl Transactional for PreauthComplete {}
    impl Transactional for WalletPayment {}

    impl Priced for Payment {}
    impl Priced for Refund {}
    impl Priced for Status {}
    impl Priced for PreauthComplete {}

    impl Redirecting for Payment {}
    impl Redirecting for CardRegistration {}
    impl Redirecting for CardRegistrationWithPay {}
    impl Redirecting for WalletPayment {}

    impl CardIssuing for Payment {}
    impl CardIssuing for CardRegistration {}
    impl CardIssuing for CardRegistrationWithPay {}

    impl Ordered for Payment {}
    impl Ordered for CardRegistrationWithPay {}

    impl BankDetails for Payment {}
    impl BankDetails for CardRegistration {}
    impl BankDetails for Refund {}
    impl BankDetails for Status {}
}

pub type PaymentResponse = Response<kind::Payment>;
pub type CardRegistrationResponse = Response<kind::CardRegistration>;
pub type CardRegistrationWithPayResponse = Response<kind::CardRegistrationWithPay>;
pub type RefundResponse = Response<kind::Refund>;
pub type ReverseResponse = Response<kind::Reverse>;
pub type StatusResponse = Response<kind::Status>;
pub type PreauthCompleteResponse = Response<kind::PreauthComplete>;
pub type WidgetResponse = Response<kind::Widget>;
pub type WalletListResponse = Response<kind::WalletList>;
pub type WalletPaymentResponse = Response<kind::WalletPayment>;
pub type InvoiceResponse = Response<kind::Invoice>;
pub type HeartbeatResponse = Response<kind::Heartbeat>;

/// Immutable view over one decoded response object.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<K> {
    fields: Payload,
    kind: PhantomData<K>,
}

impl<K> Response<K> {
    pub fn new(fields: Payload) -> Self {
        Self {
            fields,
            kind: PhantomData,
        }
    }

    /// True iff `status` is exactly `"success"`.
    pub fn is_success(&self) -> bool {
        self.status() == Some("success")
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    pub fn status(&self) -> Option<&str> {
        self.text("status")
    }

    pub fn message(&self) -> Option<&str> {
        self.text("message")
    }

    pub fn code(&self) -> Option<&str> {
        self.text("code")
    }

    /// A string field by name.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// A numeric field by name; numeric strings such as `"50.00"` are parsed.
    /// `"NaN"` and `"inf"` are not numbers here.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// The raw decoded object.
    pub fn fields(&self) -> &Payload {
        &self.fields
    }

    pub fn into_fields(self) -> Payload {
        self.fields
    }
}

impl<K> From<Payload> for Response<K> {
    fn from(fields: Payload) -> Self {
        Self::new(fields)
    }
}

impl<K: kind::Transactional> Response<K> {
    pub fn transaction(&self) -> Option<&str> {
        self.text("transaction")
    }
}

impl<K: kind::Priced> Response<K> {
    pub fn amount(&self) -> Option<f64> {
        self.number("amount")
    }
}

impl<K: kind::Redirecting> Response<K> {
    pub fn redirect_url(&self) -> Option<&str> {
        self.text("redirect_url")
    }
}

impl<K: kind::CardIssuing> Response<K> {
    pub fn card_id(&self) -> Option<&str> {
        self.text("card_id")
    }
}

impl<K: kind::Ordered> Response<K> {
    pub fn order_id(&self) -> Option<&str> {
        self.text("order_id")
    }
}

impl<K: kind::BankDetails> Response<K> {
    pub fn bank_transaction(&self) -> Option<&str> {
        self.text("bank_transaction")
    }

    pub fn bank_response(&self) -> Option<&str> {
        self.text("bank_response")
    }

    pub fn operation_code(&self) -> Option<&str> {
        self.text("operation_code")
    }

    pub fn rrn(&self) -> Option<&str> {
        self.text("rrn")
    }

    pub fn card_mask(&self) -> Option<&str> {
        self.text("card_mask")
    }

    pub fn card_name(&self) -> Option<&str> {
        self.text("card_name")
    }
}

impl Response<kind::Payment> {
    /// Merchant attributes echoed back from the request's `other_attr`.
    pub fn other_attributes(&self) -> Option<&Value> {
        self.fields.get("other_attr").filter(|v| !v.is_null())
    }
}

impl Response<kind::Status> {
    /// The `status` field classified; `None` when absent or unrecognized.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.status().and_then(PaymentStatus::parse)
    }
}

impl Response<kind::Widget> {
    pub fn widget_url(&self) -> Option<&str> {
        self.text("widget_url")
    }
}

impl Response<kind::WalletList> {
    /// Wallets available to the merchant; empty when the field is missing.
    pub fn wallets(&self) -> &[Value] {
        self.fields
            .get("wallets")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn is_success_only_for_literal_success() {
        assert!(PaymentResponse::new(fields(json!({"status": "success"}))).is_success());
        assert!(!PaymentResponse::new(Payload::new()).is_success());
        assert!(!PaymentResponse::new(fields(json!({"status": "error"}))).is_success());
        assert!(!PaymentResponse::new(fields(json!({"status": "Success"}))).is_success());
        assert!(PaymentResponse::new(fields(json!({"status": "error"}))).is_error());
    }

    #[test]
    fn common_accessors_read_strings() {
        let resp = RefundResponse::new(fields(json!({
            "status": "error",
            "message": "Insufficient funds",
            "code": "51",
        })));
        assert_eq!(resp.status(), Some("error"));
        assert_eq!(resp.message(), Some("Insufficient funds"));
        assert_eq!(resp.code(), Some("51"));
    }

    #[test]
    fn amount_parses_numbers_and_numeric_strings() {
        let resp = PaymentResponse::new(fields(json!({"amount": "50.00"})));
        assert_eq!(resp.amount(), Some(50.0));

        let resp = PaymentResponse::new(fields(json!({"amount": 100.5})));
        assert_eq!(resp.amount(), Some(100.5));

        let resp = PaymentResponse::new(fields(json!({"amount": "n/a"})));
        assert_eq!(resp.amount(), None);

        assert_eq!(PaymentResponse::new(Payload::new()).amount(), None);
    }

    #[test]
    fn non_finite_amount_strings_are_not_numbers() {
        for raw in ["NaN", "inf", "-infinity", " Infinity "] {
            let resp = PaymentResponse::new(fields(json!({ "amount": raw })));
            assert_eq!(resp.amount(), None, "{raw}");
        }
    }

    #[test]
    fn payment_accessors_return_none_when_missing() {
        let resp = PaymentResponse::new(fields(json!({"status": "success"})));
        assert_eq!(resp.transaction(), None);
        assert_eq!(resp.redirect_url(), None);
        assert_eq!(resp.card_id(), None);
        assert_eq!(resp.order_id(), None);
        assert_eq!(resp.bank_transaction(), None);
        assert_eq!(resp.rrn(), None);
        assert_eq!(resp.card_mask(), None);
        assert_eq!(resp.card_name(), None);
        assert_eq!(resp.other_attributes(), None);
    }

    #[test]
    fn payment_accessors_read_gateway_fields() {
        let resp = PaymentResponse::new(fields(json!({
            "status": "success",
            "transaction": "te001234567",
            "redirect_url": "https://epoint.az/payment",
            "card_id": "card-123",
            "order_id": "ORDER-001",
            "bank_transaction": "BANK-123",
            "rrn": "RRN123456",
            "card_mask": "123456******1234",
            "card_name": "JOHN DOE",
            "other_attr": {"customer": "42"},
        })));
        assert_eq!(resp.transaction(), Some("te001234567"));
        assert_eq!(resp.redirect_url(), Some("https://epoint.az/payment"));
        assert_eq!(resp.card_id(), Some("card-123"));
        assert_eq!(resp.order_id(), Some("ORDER-001"));
        assert_eq!(resp.bank_transaction(), Some("BANK-123"));
        assert_eq!(resp.rrn(), Some("RRN123456"));
        assert_eq!(resp.card_mask(), Some("123456******1234"));
        assert_eq!(resp.card_name(), Some("JOHN DOE"));
        assert_eq!(resp.other_attributes(), Some(&json!({"customer": "42"})));
    }

    #[test]
    fn status_response_classifies_payment_status() {
        let resp = StatusResponse::new(fields(json!({"status": "success"})));
        assert_eq!(resp.payment_status(), Some(PaymentStatus::Success));

        let resp = StatusResponse::new(fields(json!({"status": "returned"})));
        assert_eq!(resp.payment_status(), Some(PaymentStatus::Returned));

        let resp = StatusResponse::new(fields(json!({"status": "invalid_status"})));
        assert_eq!(resp.payment_status(), None);

        assert_eq!(StatusResponse::new(Payload::new()).payment_status(), None);
    }

    #[test]
    fn status_response_reads_card_metadata() {
        let resp = StatusResponse::new(fields(json!({
            "status": "success",
            "transaction": "te001234567",
            "operation_code": "100",
            "card_mask": "****1234",
            "amount": "50.00",
        })));
        assert_eq!(resp.transaction(), Some("te001234567"));
        assert_eq!(resp.operation_code(), Some("100"));
        assert_eq!(resp.card_mask(), Some("****1234"));
        assert_eq!(resp.amount(), Some(50.0));
    }

    #[test]
    fn wallets_default_to_empty() {
        let resp = WalletListResponse::new(Payload::new());
        assert!(resp.wallets().is_empty());

        let resp = WalletListResponse::new(fields(json!({
            "status": "success",
            "wallets": [{"id": "wallet1"}, {"id": "wallet2"}],
        })));
        assert_eq!(resp.wallets().len(), 2);
        assert_eq!(resp.wallets()[1]["id"], "wallet2");
    }

    #[test]
    fn widget_url_is_exposed() {
        let resp = WidgetResponse::new(fields(json!({
            "status": "success",
            "widget_url": "https://epoint.az/widget/abc",
        })));
        assert_eq!(resp.widget_url(), Some("https://epoint.az/widget/abc"));
    }

    #[test]
    fn raw_fields_are_returned_unchanged() {
        let raw = fields(json!({"status": "success", "message": "Transaction reversed"}));
        let resp = ReverseResponse::new(raw.clone());
        assert_eq!(resp.fields(), &raw);
        assert_eq!(resp.into_fields(), raw);
    }
}
