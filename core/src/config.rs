//! Client configuration: credentials, API root, transport policy.

use std::fmt;
use std::time::Duration;

use crate::error::EpointError;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://epoint.az/api/1";

/// Connect/read budget applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Merchant private key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Everything the gateway client needs to talk to one merchant account.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub public_key: String,
    pub private_key: PrivateKey,
    pub base_url: String,
    /// Sandbox mode: TLS certificate verification is disabled.
    pub test_mode: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: PrivateKey::new(private_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            test_mode: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from `EPOINT_*` environment variables.
    pub fn from_env() -> Result<Self, EpointError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// `EPOINT_PUBLIC_KEY` and `EPOINT_PRIVATE_KEY` are required;
    /// `EPOINT_BASE_URL`, `EPOINT_TEST_MODE` and `EPOINT_TIMEOUT_SECS` are optional.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EpointError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| EpointError::Config(format!("{key} is not set")))
        };

        let mut config = Self::new(
            required("EPOINT_PUBLIC_KEY")?,
            required("EPOINT_PRIVATE_KEY")?,
        );

        if let Some(url) = lookup("EPOINT_BASE_URL") {
            config = config.with_base_url(&url);
        }
        if let Some(flag) = lookup("EPOINT_TEST_MODE") {
            config.test_mode = parse_flag(&flag).ok_or_else(|| {
                EpointError::Config(format!("EPOINT_TEST_MODE is not a boolean: {flag}"))
            })?;
        }
        if let Some(secs) = lookup("EPOINT_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                EpointError::Config(format!("EPOINT_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
