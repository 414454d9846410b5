//! Typed request builders for every gateway operation.
//!
//! # Design
//! One generic `RequestBuilder<O>` serves all operations. Each operation is a
//! zero-sized marker implementing `Operation`, which carries the endpoint,
//! the required fields in the order they are checked, and the defaults seeded
//! into a fresh payload. Setters are gated by the marker traits in `accepts`,
//! so a builder only exposes the fields its operation takes. `send` consumes
//! the builder; a builder is used at most once.

use std::marker::PhantomData;

use serde::Serialize;
use serde_json::{Number, Value};

use crate::client::{is_present, EpointClient};
use crate::error::EpointError;
use crate::response::{
    kind, InvoiceResponse, PreauthCompleteResponse, Response, StatusResponse, WalletListResponse,
    WidgetResponse,
};
use crate::types::{Currency, Language, Payload};

/// A value seeded into the payload before any setter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Text(&'static str),
    Int(i64),
}

impl FieldDefault {
    fn to_value(self) -> Value {
        match self {
            FieldDefault::Text(s) => Value::String(s.to_string()),
            FieldDefault::Int(n) => Value::from(n),
        }
    }
}

/// Static description of one gateway operation.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub endpoint: &'static str,
    pub required: &'static [&'static str],
    pub defaults: &'static [(&'static str, FieldDefault)],
}

pub trait Operation {
    const SCHEMA: Schema;
    /// Response kind returned by `send`.
    type Output;
}

/// Marker traits enabling field setters on `RequestBuilder`.
pub mod accepts {
    pub trait Amount {}
    pub trait OrderId {}
    pub trait Description {}
    pub trait Language {}
    pub trait Currency {}
    pub trait RedirectUrls {}
    pub trait CardId {}
    pub trait SplitTarget {}
    pub trait Transaction {}
    pub trait RefundFlag {}
    pub trait OtherAttributes {}
}

pub mod operation {
    use super::accepts;
    use super::FieldDefault::{Int, Text};
    use super::{Operation, Schema};
    use crate::response::kind;

    /// Hosted payment page charge.
    #[derive(Debug, Clone, Copy)]
    pub struct Payment;
    #[derive(Debug, Clone, Copy)]
    pub struct StatusCheck;
    #[derive(Debug, Clone, Copy)]
    pub struct CardRegistration;
    #[derive(Debug, Clone, Copy)]
    pub struct CardRegistrationWithPay;
    /// Charge against a previously registered card.
    #[derive(Debug, Clone, Copy)]
    pub struct SavedCardPayment;
    #[derive(Debug, Clone, Copy)]
    pub struct SplitCardPayment;
    /// Hosted page charge shared with a second merchant.
    #[derive(Debug, Clone, Copy)]
    pub struct SplitPayment;
    /// Payout to a registered card.
    #[derive(Debug, Clone, Copy)]
    pub struct Refund;
    /// Full or partial cancellation of a transaction.
    #[derive(Debug, Clone, Copy)]
    pub struct Reverse;
    /// Authorization hold, captured later with `complete`.
    #[derive(Debug, Clone, Copy)]
    pub struct Preauth;
    #[derive(Debug, Clone, Copy)]
    pub struct PreauthComplete;
    #[derive(Debug, Clone, Copy)]
    pub struct Widget;
    #[derive(Debug, Clone, Copy)]
    pub struct WalletStatus;
    #[derive(Debug, Clone, Copy)]
    pub struct WalletPayment;

    impl Operation for Payment {
        const SCHEMA: Schema = Schema {
            endpoint: "/request",
            required: &["amount", "order_id"],
            defaults: &[("currency", Text("AZN")), ("language", Text("az"))],
        };
        type Output = kind::Payment;
    }

    impl Operation for StatusCheck {
        const SCHEMA: Schema = Schema {
            endpoint: "/get-status",
            required: &["transaction"],
            defaults: &[],
        };
        type Output = kind::Status;
    }

    impl Operation for CardRegistration {
        const SCHEMA: Schema = Schema {
            endpoint: "/card-registration",
            required: &[],
            defaults: &[("language", Text("az")), ("refund", Int(0))],
        };
        type Output = kind::CardRegistration;
    }

    impl Operation for CardRegistrationWithPay {
        const SCHEMA: Schema = Schema {
            endpoint: "/card-registration-with-pay",
            required: &["amount", "order_id"],
            defaults: &[
                ("currency", Text("AZN")),
                ("language", Text("az")),
                ("refund", Int(0)),
            ],
        };
        type Output = kind::CardRegistrationWithPay;
    }

    impl Operation for SavedCardPayment {
        const SCHEMA: Schema = Schema {
            endpoint: "/execute-pay",
            required: &["card_id", "amount", "order_id"],
            defaults: &[("language", Text("az")), ("currency", Text("AZN"))],
        };
        type Output = kind::Payment;
    }

    impl Operation for SplitCardPayment {
        const SCHEMA: Schema = Schema {
            endpoint: "/split-execute-pay",
            required: &["card_id", "amount", "order_id", "split_user", "split_amount"],
            defaults: &[("language", Text("az")), ("currency", Text("AZN"))],
        };
        type Output = kind::Payment;
    }

    impl Operation for SplitPayment {
        const SCHEMA: Schema = Schema {
            endpoint: "/split-request",
            required: &["amount", "order_id", "split_user", "split_amount"],
            defaults: &[("currency", Text("AZN")), ("language", Text("az"))],
        };
        type Output = kind::Payment;
    }

    impl Operation for Refund {
        const SCHEMA: Schema = Schema {
            endpoint: "/refund-request",
            required: &["card_id", "order_id", "amount"],
            defaults: &[("language", Text("az")), ("currency", Text("AZN"))],
        };
        type Output = kind::Refund;
    }

    impl Operation for Reverse {
        const SCHEMA: Schema = Schema {
            endpoint: "/reverse",
            required: &["transaction"],
            defaults: &[("language", Text("az")), ("currency", Text("AZN"))],
        };
        type Output = kind::Reverse;
    }

    impl Operation for Preauth {
        const SCHEMA: Schema = Schema {
            endpoint: "/pre-auth-request",
            required: &["amount", "order_id"],
            defaults: &[("currency", Text("AZN")), ("language", Text("az"))],
        };
        type Output = kind::Payment;
    }

    impl Operation for PreauthComplete {
        const SCHEMA: Schema = Schema {
            endpoint: "/pre-auth-complete",
            required: &["transaction", "amount"],
            defaults: &[],
        };
        type Output = kind::PreauthComplete;
    }

    impl Operation for Widget {
        const SCHEMA: Schema = Schema {
            endpoint: "/token/widget",
            required: &["amount", "order_id", "description"],
            defaults: &[],
        };
        type Output = kind::Widget;
    }

    impl Operation for WalletStatus {
        const SCHEMA: Schema = Schema {
            endpoint: "/wallet/status",
            required: &[],
            defaults: &[],
        };
        type Output = kind::WalletList;
    }

    impl Operation for WalletPayment {
        const SCHEMA: Schema = Schema {
            endpoint: "/wallet/payment",
            required: &["wallet_id", "amount", "order_id"],
            defaults: &[("currency", Text("AZN")), ("language", Text("az"))],
        };
        type Output = kind::WalletPayment;
    }

    impl accepts::Amount for Payment {}
    impl accepts::OrderId for Payment {}
    impl accepts::Description for Payment {}
    impl accepts::Language for Payment {}
    impl accepts::Currency for Payment {}
    impl accepts::RedirectUrls for Payment {}
    impl accepts::OtherAttributes for Payment {}

    impl accepts::Transaction for StatusCheck {}

    impl accepts::Language for CardRegistration {}
    impl accepts::Description for CardRegistration {}
    impl accepts::RedirectUrls for CardRegistration {}
    impl accepts::RefundFlag for CardRegistration {}

    impl accepts::Amount for CardRegistrationWithPay {}
    impl accepts::OrderId for CardRegistrationWithPay {}
    impl accepts::Description for CardRegistrationWithPay {}
    impl accepts::Language for CardRegistrationWithPay {}
    impl accepts::Currency for CardRegistrationWithPay {}
    impl accepts::RedirectUrls for CardRegistrationWithPay {}
    impl accepts::RefundFlag for CardRegistrationWithPay {}

    impl accepts::CardId for SavedCardPayment {}
    impl accepts::Amount for SavedCardPayment {}
    impl accepts::OrderId for SavedCardPayment {}
    impl accepts::Description for SavedCardPayment {}
    impl accepts::Language for SavedCardPayment {}
    impl accepts::Currency for SavedCardPayment {}

    impl accepts::CardId for SplitCardPayment {}
    impl accepts::Amount for SplitCardPayment {}
    impl accepts::OrderId for SplitCardPayment {}
    impl accepts::Description for SplitCardPayment {}
    impl accepts::Language for SplitCardPayment {}
    impl accepts::Currency for SplitCardPayment {}
    impl accepts::SplitTarget for SplitCardPayment {}

    impl accepts::Amount for SplitPayment {}
    impl accepts::OrderId for SplitPayment {}
    impl accepts::Description for SplitPayment {}
    impl accepts::Language for SplitPayment {}
    impl accepts::Currency for SplitPayment {}
    impl accepts::RedirectUrls for SplitPayment {}
    impl accepts::SplitTarget for SplitPayment {}
    impl accepts::OtherAttributes for SplitPayment {}

    impl accepts::CardId for Refund {}
    impl accepts::Amount for Refund {}
    impl accepts::OrderId for Refund {}
    impl accepts::Description for Refund {}
    impl accepts::Language for Refund {}
    impl accepts::Currency for Refund {}

    impl accepts::Transaction for Reverse {}
    impl accepts::Amount for Reverse {}
    impl accepts::Language for Reverse {}
    impl accepts::Currency for Reverse {}

    impl accepts::Amount for Preauth {}
    impl accepts::OrderId for Preauth {}
    impl accepts::Description for Preauth {}
    impl accepts::Language for Preauth {}
    impl accepts::Currency for Preauth {}
    impl accepts::RedirectUrls for Preauth {}

    impl accepts::Transaction for PreauthComplete {}
    impl accepts::Amount for PreauthComplete {}

    impl accepts::Amount for Widget {}
    impl accepts::OrderId for Widget {}
    impl accepts::Description for Widget {}

    impl accepts::Amount for WalletPayment {}
    impl accepts::OrderId for WalletPayment {}
    impl accepts::Description for WalletPayment {}
    impl accepts::Language for WalletPayment {}
    impl accepts::Currency for WalletPayment {}
    impl accepts::RedirectUrls for WalletPayment {}
}

/// Accumulates fields for one gateway call.
#[must_use = "a request builder does nothing until `send` is called"]
pub struct RequestBuilder<'a, O> {
    client: &'a EpointClient,
    payload: Payload,
    rejected: Option<String>,
    operation: PhantomData<O>,
}

impl<'a, O: Operation> RequestBuilder<'a, O> {
    pub(crate) fn new(client: &'a EpointClient) -> Self {
        let mut payload = Payload::new();
        payload.insert(
            "public_key".to_string(),
            Value::String(client.public_key().to_string()),
        );
        for (key, default) in O::SCHEMA.defaults {
            payload.insert(key.to_string(), default.to_value());
        }
        Self {
            client,
            payload,
            rejected: None,
            operation: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        O::SCHEMA.endpoint
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Set an arbitrary field; the last write for a key wins.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        if self.rejected.as_deref() == Some(key) {
            self.rejected = None;
        }
        self.payload.insert(key.to_string(), value.into());
        self
    }

    fn number(mut self, key: &str, value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => self.field(key, Value::Number(n)),
            None => {
                self.payload.remove(key);
                self.rejected = Some(key.to_string());
                self
            }
        }
    }

    /// Check required fields without sending anything.
    pub fn validate(&self) -> Result<(), EpointError> {
        if let Some(key) = &self.rejected {
            return Err(EpointError::Encoding(format!(
                "{key} must be a finite number"
            )));
        }
        match O::SCHEMA
            .required
            .iter()
            .copied()
            .find(|field| !is_present(&self.payload, field))
        {
            Some(field) => Err(EpointError::Validation { field }),
            None => Ok(()),
        }
    }

    /// Validate, sign and POST the request.
    pub fn send(self) -> Result<Response<O::Output>, EpointError> {
        self.validate()?;
        let fields = self.client.post(O::SCHEMA.endpoint, self.payload)?;
        Ok(Response::new(fields))
    }
}

impl<O: Operation + accepts::Amount> RequestBuilder<'_, O> {
    pub fn amount(self, amount: f64) -> Self {
        self.number("amount", amount)
    }
}

impl<O: Operation + accepts::OrderId> RequestBuilder<'_, O> {
    pub fn order_id(self, order_id: impl Into<String>) -> Self {
        self.field("order_id", order_id.into())
    }
}

impl<O: Operation + accepts::Description> RequestBuilder<'_, O> {
    pub fn description(self, description: impl Into<String>) -> Self {
        self.field("description", description.into())
    }
}

impl<O: Operation + accepts::Language> RequestBuilder<'_, O> {
    pub fn language(self, language: impl Into<Language>) -> Self {
        self.field("language", language.into().as_str())
    }
}

impl<O: Operation + accepts::Currency> RequestBuilder<'_, O> {
    pub fn currency(self, currency: impl Into<Currency>) -> Self {
        self.field("currency", currency.into().as_str())
    }
}

impl<O: Operation + accepts::RedirectUrls> RequestBuilder<'_, O> {
    pub fn success_url(self, url: impl Into<String>) -> Self {
        self.field("success_redirect_url", url.into())
    }

    pub fn error_url(self, url: impl Into<String>) -> Self {
        self.field("error_redirect_url", url.into())
    }
}

impl<O: Operation + accepts::CardId> RequestBuilder<'_, O> {
    pub fn card_id(self, card_id: impl Into<String>) -> Self {
        self.field("card_id", card_id.into())
    }
}

impl<O: Operation + accepts::SplitTarget> RequestBuilder<'_, O> {
    /// Merchant receiving the split share.
    pub fn split_user(self, user: impl Into<String>) -> Self {
        self.field("split_user", user.into())
    }

    pub fn split_amount(self, amount: f64) -> Self {
        self.number("split_amount", amount)
    }
}

impl<O: Operation + accepts::Transaction> RequestBuilder<'_, O> {
    pub fn transaction(self, transaction: impl Into<String>) -> Self {
        self.field("transaction", transaction.into())
    }
}

impl<O: Operation + accepts::RefundFlag> RequestBuilder<'_, O> {
    /// Register the card for payouts rather than charges.
    pub fn for_refund(self, for_refund: bool) -> Self {
        self.field("refund", i64::from(for_refund))
    }
}

impl<O: Operation + accepts::OtherAttributes> RequestBuilder<'_, O> {
    pub fn other_attributes(self, attributes: impl Into<Value>) -> Self {
        self.field("other_attr", attributes)
    }
}

impl RequestBuilder<'_, operation::Payment> {
    pub fn installment(self, installment: bool) -> Self {
        self.field("is_installment", i64::from(installment))
    }
}

impl RequestBuilder<'_, operation::SavedCardPayment> {
    pub fn execute(self) -> Result<Response<kind::Payment>, EpointError> {
        self.send()
    }
}

impl RequestBuilder<'_, operation::SplitCardPayment> {
    pub fn execute(self) -> Result<Response<kind::Payment>, EpointError> {
        self.send()
    }
}

impl RequestBuilder<'_, operation::StatusCheck> {
    pub fn get(self) -> Result<StatusResponse, EpointError> {
        self.send()
    }
}

impl RequestBuilder<'_, operation::Widget> {
    pub fn create(self) -> Result<WidgetResponse, EpointError> {
        self.send()
    }
}

impl RequestBuilder<'_, operation::Preauth> {
    /// Capture a held authorization.
    ///
    /// Fields already set on this builder are not sent.
    pub fn complete(
        self,
        transaction: impl Into<String>,
        amount: f64,
    ) -> Result<PreauthCompleteResponse, EpointError> {
        RequestBuilder::<operation::PreauthComplete>::new(self.client)
            .transaction(transaction)
            .amount(amount)
            .send()
    }
}

impl RequestBuilder<'_, operation::WalletPayment> {
    pub fn wallet_id(self, wallet_id: impl Into<String>) -> Self {
        self.field("wallet_id", wallet_id.into())
    }
}

/// Wallet operations.
#[derive(Debug, Clone, Copy)]
pub struct Wallet<'a> {
    client: &'a EpointClient,
}

impl<'a> Wallet<'a> {
    pub(crate) fn new(client: &'a EpointClient) -> Self {
        Self { client }
    }

    /// Wallets available to the merchant.
    pub fn list(&self) -> Result<WalletListResponse, EpointError> {
        RequestBuilder::<operation::WalletStatus>::new(self.client).send()
    }

    pub fn payment(&self) -> RequestBuilder<'a, operation::WalletPayment> {
        RequestBuilder::new(self.client)
    }
}

/// Invoice management. Request bodies are caller-shaped JSON objects.
#[derive(Debug, Clone, Copy)]
pub struct Invoices<'a> {
    client: &'a EpointClient,
}

impl<'a> Invoices<'a> {
    pub(crate) fn new(client: &'a EpointClient) -> Self {
        Self { client }
    }

    pub fn create<T: Serialize + ?Sized>(&self, data: &T) -> Result<InvoiceResponse, EpointError> {
        self.call("/invoices/create", to_object(data)?)
    }

    pub fn update<T: Serialize + ?Sized>(
        &self,
        id: u64,
        data: &T,
    ) -> Result<InvoiceResponse, EpointError> {
        let mut payload = to_object(data)?;
        payload.insert("id".to_string(), Value::from(id));
        self.call("/invoices/update", payload)
    }

    pub fn view(&self, id: u64) -> Result<InvoiceResponse, EpointError> {
        let mut payload = Payload::new();
        payload.insert("id".to_string(), Value::from(id));
        self.call("/invoices/view", payload)
    }

    pub fn list<T: Serialize + ?Sized>(&self, filters: &T) -> Result<InvoiceResponse, EpointError> {
        self.call("/invoices/list", to_object(filters)?)
    }

    pub fn send_sms(&self, id: u64, phone: &str) -> Result<InvoiceResponse, EpointError> {
        let mut payload = Payload::new();
        payload.insert("id".to_string(), Value::from(id));
        payload.insert("phone".to_string(), Value::from(phone));
        self.call("/invoices/send-sms", payload)
    }

    pub fn send_email(&self, id: u64, email: &str) -> Result<InvoiceResponse, EpointError> {
        let mut payload = Payload::new();
        payload.insert("id".to_string(), Value::from(id));
        payload.insert("email".to_string(), Value::from(email));
        self.call("/invoices/send-email", payload)
    }

    fn call(&self, endpoint: &str, mut payload: Payload) -> Result<InvoiceResponse, EpointError> {
        payload.insert(
            "public_key".to_string(),
            Value::String(self.client.public_key().to_string()),
        );
        self.client.post(endpoint, payload).map(InvoiceResponse::new)
    }
}

fn to_object<T: Serialize + ?Sized>(data: &T) -> Result<Payload, EpointError> {
    match serde_json::to_value(data).map_err(|e| EpointError::Encoding(e.to_string()))? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Payload::new()),
        _ => Err(EpointError::Encoding(
            "invoice data must serialize to a JSON object".to_string(),
        )),
    }
}
