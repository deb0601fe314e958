//! Client configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const MAINNET_RPC_URL: &str = "https://rpc.mainnet.near.org";
pub const TESTNET_RPC_URL: &str = "https://rpc.testnet.near.org";
pub const BETANET_RPC_URL: &str = "https://rpc.betanet.near.org";
pub const LOCAL_RPC_URL: &str = "http://localhost:3030";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Everything a client needs to reach a node.
///
/// Deserializes from camelCase JSON or TOML; `timeout` is accepted as an
/// alias of `timeoutMs`:
///
/// ```
/// use near_jsonrpc_client::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(
///     r#"{ "endpoint": "https://rpc.testnet.near.org", "timeout": 5000, "retries": 2 }"#,
/// )?;
/// assert_eq!(config.timeout_ms, 5000);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub endpoint: String,
    /// Sent with every request, after `Content-Type`.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default = "default_timeout_ms", alias = "timeout")]
    pub timeout_ms: u64,
    /// Extra attempts after a transport failure. Other failures are never retried.
    #[serde(default)]
    pub retries: u32,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: 0,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Checks the invariants a client relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        for (name, value) in &self.headers {
            check_header(name, value)?;
        }
        Ok(())
    }
}

impl From<&str> for ClientConfig {
    fn from(endpoint: &str) -> Self {
        Self::new(endpoint)
    }
}

impl From<String> for ClientConfig {
    fn from(endpoint: String) -> Self {
        Self::new(endpoint)
    }
}

impl From<&String> for ClientConfig {
    fn from(endpoint: &String) -> Self {
        Self::new(endpoint.as_str())
    }
}

fn invalid_header(name: &str, reason: &'static str) -> ConfigError {
    ConfigError::InvalidHeader {
        name: name.to_owned(),
        reason,
    }
}

/// The header must be one reqwest accepts, and must not replace the JSON
/// content type.
#[cfg(feature = "client")]
fn check_header(name: &str, value: &str) -> Result<(), ConfigError> {
    use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};

    let header = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| invalid_header(name, "header name is not an HTTP token"))?;
    if header == CONTENT_TYPE {
        return Err(invalid_header(name, "the content type is always application/json"));
    }
    HeaderValue::from_str(value)
        .map_err(|_| invalid_header(name, "header value contains control or non-ASCII characters"))?;
    Ok(())
}

/// Without reqwest: names are HTTP tokens, values are visible ASCII, spaces
/// or tabs.
#[cfg(not(feature = "client"))]
fn check_header(name: &str, value: &str) -> Result<(), ConfigError> {
    let token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if name.is_empty() || !name.chars().all(token) {
        return Err(invalid_header(name, "header name is not an HTTP token"));
    }
    if name.eq_ignore_ascii_case("content-type") {
        return Err(invalid_header(name, "the content type is always application/json"));
    }
    if !value
        .chars()
        .all(|c| c == '\t' || c == ' ' || c.is_ascii_graphic())
    {
        return Err(invalid_header(name, "header value contains control or non-ASCII characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_endpoint_gets_defaults() {
        let config = ClientConfig::from("https://rpc.testnet.near.org");
        assert_eq!(config.endpoint, TESTNET_RPC_URL);
        assert!(config.headers.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.retries, 0);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn deserializes_camel_case_with_timeout_alias() {
        let config: ClientConfig = serde_json::from_value(json!({
            "endpoint": "http://localhost:3030",
            "headers": { "x-api-key": "secret" },
            "timeoutMs": 1000,
            "retries": 3
        }))
        .expect("valid config");
        assert_eq!(config.timeout_ms, 1000);
        assert_eq!(config.retries, 3);
        assert_eq!(config.headers["x-api-key"], "secret");

        let aliased: ClientConfig =
            serde_json::from_value(json!({ "endpoint": "http://localhost:3030", "timeout": 250 }))
                .expect("valid config");
        assert_eq!(aliased.timeout_ms, 250);
    }

    #[test]
    fn endpoint_is_required() {
        let err = serde_json::from_value::<ClientConfig>(json!({ "retries": 1 }))
            .expect_err("endpoint missing");
        assert!(err.to_string().contains("endpoint"));
        assert_eq!(ClientConfig::new("  ").validate(), Err(ConfigError::EmptyEndpoint));
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = ClientConfig::new(LOCAL_RPC_URL).with_timeout_ms(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn rejects_bad_headers() {
        let bad_name = ClientConfig::new(LOCAL_RPC_URL).with_header("x api key", "v");
        assert!(matches!(
            bad_name.validate(),
            Err(ConfigError::InvalidHeader { name, .. }) if name == "x api key"
        ));
        let bad_value = ClientConfig::new(LOCAL_RPC_URL).with_header("x-api-key", "a\r\nb");
        assert!(bad_value.validate().is_err());
        let content_type = ClientConfig::new(LOCAL_RPC_URL).with_header("Content-Type", "text/plain");
        assert!(content_type.validate().is_err());
        let good = ClientConfig::new(LOCAL_RPC_URL).with_header("Authorization", "Bearer abc.def");
        assert_eq!(good.validate(), Ok(()));
    }

    #[test]
    fn header_checks_cover_edge_cases() {
        let reason = |name: &str, value: &str| match ClientConfig::new(LOCAL_RPC_URL).with_header(name, value).validate() {
            Err(ConfigError::InvalidHeader { reason, .. }) => Some(reason),
            _ => None,
        };
        assert_eq!(reason("", "v"), Some("header name is not an HTTP token"));
        assert_eq!(reason("x-api-key:", "v"), Some("header name is not an HTTP token"));
        assert_eq!(reason("CONTENT-TYPE", "text/plain"), Some("the content type is always application/json"));
        assert_eq!(reason("x-api-key", "caf\u{e9}"), Some("header value contains control or non-ASCII characters"));
        assert_eq!(reason("x-api-key", "a\0b"), Some("header value contains control or non-ASCII characters"));
        assert_eq!(reason("X-Request-Id", "tab\tand space"), None);
        assert_eq!(reason("x-api-key", ""), None);
    }

    /// Whatever passes here is also accepted when the request is built.
    #[cfg(feature = "client")]
    #[test]
    fn accepted_headers_build_requests() {
        let config = ClientConfig::new(LOCAL_RPC_URL)
            .with_header("Authorization", "Bearer abc.def")
            .with_header("x-trace", "a\tb");
        assert_eq!(config.validate(), Ok(()));

        let mut builder = reqwest::Client::new().post(LOCAL_RPC_URL);
        for (name, value) in &config.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let request = builder.build().expect("headers accepted by reqwest");
        assert_eq!(request.headers()["authorization"], "Bearer abc.def");
    }
}
