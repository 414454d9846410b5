//! Payload alias and the gateway's enumerations.
//!
//! # Design
//! `Language` and `Currency` are inputs the gateway treats as open string
//! sets, so each carries an `Other` variant instead of rejecting codes this
//! crate does not list. `PaymentStatus` is only ever read back from a
//! status check; unknown strings map to `None` at the accessor.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ordered field-name → value mapping, as sent on and read off the wire.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Interface language of the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Az,
    En,
    Ru,
    Other(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Az => "az",
            Language::En => "en",
            Language::Ru => "ru",
            Language::Other(code) => code,
        }
    }
}

impl From<&str> for Language {
    fn from(code: &str) -> Self {
        match code {
            "az" => Language::Az,
            "en" => Language::En,
            "ru" => Language::Ru,
            other => Language::Other(other.to_string()),
        }
    }
}

/// ISO 4217 currency code for a charge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Azn,
    Usd,
    Eur,
    Other(String),
}

impl Currency {
    pub fn as_str(&self) -> &str {
        match self {
            Currency::Azn => "AZN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Other(code) => code,
        }
    }
}

impl From<&str> for Currency {
    fn from(code: &str) -> Self {
        match code {
            "AZN" => Currency::Azn,
            "USD" => Currency::Usd,
            "EUR" => Currency::Eur,
            other => Currency::Other(other.to_string()),
        }
    }
}

/// Outcome of a transaction as reported by `/get-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    New,
    Success,
    Returned,
    Error,
    ServerError,
    Failed,
}

impl PaymentStatus {
    /// Map a raw status string; `None` for anything the gateway has not defined.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(PaymentStatus::New),
            "success" => Some(PaymentStatus::Success),
            "returned" => Some(PaymentStatus::Returned),
            "error" => Some(PaymentStatus::Error),
            "server_error" => Some(PaymentStatus::ServerError),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::New => "new",
            PaymentStatus::Success => "success",
            PaymentStatus::Returned => "returned",
            PaymentStatus::Error => "error",
            PaymentStatus::ServerError => "server_error",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Whether the transaction has reached a state that will not change.
    pub fn is_final(&self) -> bool {
        !matches!(self, PaymentStatus::New)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Language::from(code.as_str()))
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Currency::from(code.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_defaults_to_az() {
        assert_eq!(Language::default().as_str(), "az");
    }

    #[test]
    fn unknown_language_is_kept_verbatim() {
        let lang = Language::from("tr");
        assert_eq!(lang, Language::Other("tr".to_string()));
        assert_eq!(lang.as_str(), "tr");
    }

    #[test]
    fn currency_round_trips_through_serde() {
        let json = serde_json::to_string(&Currency::Usd).unwrap();
        assert_eq!(json, "\"USD\"");
        let back: Currency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Currency::Usd);

        let other: Currency = serde_json::from_str("\"GBP\"").unwrap();
        assert_eq!(other, Currency::Other("GBP".to_string()));
    }

    #[test]
    fn payment_status_parses_every_known_value() {
        for status in [
            PaymentStatus::New,
            PaymentStatus::Success,
            PaymentStatus::Returned,
            PaymentStatus::Error,
            PaymentStatus::ServerError,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn payment_status_unknown_is_none() {
        assert_eq!(PaymentStatus::parse("pending"), None);
        assert_eq!(PaymentStatus::parse(""), None);
        assert_eq!(PaymentStatus::parse("SUCCESS"), None);
    }

    #[test]
    fn only_new_is_not_final() {
        assert!(!PaymentStatus::New.is_final());
        assert!(PaymentStatus::Returned.is_final());
    }
}
