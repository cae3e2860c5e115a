//! Client configuration.
//!
//! # Design
//! `ClientConfig` carries everything fixed at construction: the base URL,
//! the optional authorization credential (handed to the client's credential
//! holder at construction), extra default headers, the default
//! per-call timeout and the paging field names. It deserializes from JSON so
//! a vendor client can ship its settings as data, and `from_env` covers the
//! usual deployment case of injecting the URL and credential through the
//! environment.

use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_TOKEN_FIELD: &str = "next_page_token";
pub const DEFAULT_METADATA_FIELDS: [&str; 5] = [
    "next_page_token",
    "page_count",
    "page_number",
    "page_size",
    "total_records",
];

/// Field names used by token-paginated list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Response field carrying the next page's token. Also used as the
    /// query parameter name when requesting that page.
    pub token_field: String,
    /// Top-level response fields that hold paging bookkeeping, not data.
    pub metadata_fields: Vec<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            token_field: DEFAULT_TOKEN_FIELD.to_string(),
            metadata_fields: DEFAULT_METADATA_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PaginationConfig {
    pub fn is_metadata(&self, field: &str) -> bool {
        field == self.token_field || self.metadata_fields.iter().any(|f| f == field)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub authorization: Option<String>,
    #[serde(default)]
    pub additional_headers: Vec<(String, String)>,
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,
    #[serde(default)]
    pub pagination: PaginationConfig,
}

// `authorization` is a secret; show only whether one is set.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let authorization = self.authorization.as_ref().map(|_| "<redacted>");
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("authorization", &authorization)
            .field("additional_headers", &self.additional_headers)
            .field("timeout", &self.timeout)
            .field("pagination", &self.pagination)
            .finish()
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            authorization: None,
            additional_headers: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            pagination: PaginationConfig::default(),
        }
    }

    pub fn with_authorization(mut self, credential: impl Into<String>) -> Self {
        self.authorization = Some(credential.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = pagination;
        self
    }

    /// Load from `<PREFIX>_BASE_URL` (required), `<PREFIX>_AUTHORIZATION`
    /// and `<PREFIX>_TIMEOUT_SECS`.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_key = format!("{prefix}_BASE_URL");
        let base_url = lookup(&base_key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{base_key} is not set")))?;

        let mut config = Self::new(base_url);
        if let Some(credential) = lookup(&format!("{prefix}_AUTHORIZATION")).filter(|v| !v.is_empty()) {
            config.authorization = Some(credential);
        }

        let timeout_key = format!("{prefix}_TIMEOUT_SECS");
        if let Some(raw) = lookup(&timeout_key) {
            let secs = raw
                .parse::<f64>()
                .ok()
                .filter(|s| s.is_finite() && *s > 0.0)
                .ok_or_else(|| Error::Config(format!("{timeout_key} must be a positive number, got {raw:?}")))?;
            config.timeout = Duration::from_secs_f64(secs);
        }

        Ok(config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(serde::de::Error::custom("timeout must be a positive number of seconds"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
