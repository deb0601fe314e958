//! The boundary between the client and the network.
//!
//! [`Transport`] moves one already-encoded JSON-RPC envelope to an endpoint
//! and hands back the raw HTTP status and body. It knows nothing about
//! JSON-RPC: envelope parsing, error classification and retries all live in
//! [`RpcClient`](crate::RpcClient). The `client` feature provides
//! [`HttpTransport`], built on `reqwest`; tests and embedders can plug in
//! their own.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// One POST of an encoded envelope.
#[derive(Clone, Copy, Debug)]
pub struct TransportRequest<'a> {
    pub endpoint: &'a str,
    pub headers: &'a BTreeMap<String, String>,
    pub body: &'a [u8],
    /// Deadline for the whole exchange, connect to last body byte.
    pub timeout: Duration,
}

/// Whatever came back, before any JSON-RPC interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Failure to complete an exchange. Every variant is eligible for retry.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// A 5xx status whose body is not a JSON-RPC envelope.
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    /// Connection refused, reset, DNS failure and the like.
    #[error("HTTP transport error: {0}")]
    Http(String),
    #[error("{0}")]
    Other(String),
}

/// Sends encoded JSON-RPC envelopes.
///
/// Implementations must be safe to call concurrently; the client shares one
/// instance across all calls and all of its clones.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: TransportRequest<'_>) -> Result<TransportResponse, TransportError>;
}

/// A shared, dynamically dispatched transport.
pub type DynTransport = Arc<dyn Transport>;

#[cfg(feature = "client")]
pub use self::http::HttpTransport;

#[cfg(feature = "client")]
mod http {
    use async_trait::async_trait;
    use reqwest::header::CONTENT_TYPE;
    use tracing::trace;

    use super::{Transport, TransportError, TransportRequest, TransportResponse};

    /// A [`Transport`] over [`reqwest::Client`].
    ///
    /// Timeouts are applied per request from [`TransportRequest::timeout`];
    /// custom headers are attached to every request.
    #[derive(Clone, Debug)]
    pub struct HttpTransport {
        client: reqwest::Client,
    }

    impl HttpTransport {
        pub fn new() -> Result<Self, TransportError> {
            let client = reqwest::Client::builder()
                .build()
                .map_err(|err| TransportError::Http(err.to_string()))?;
            Ok(Self { client })
        }

        /// Reuses an existing `reqwest` client, e.g. one with a proxy configured.
        pub fn with_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn post(&self, request: TransportRequest<'_>) -> Result<TransportResponse, TransportError> {
            trace!(endpoint = request.endpoint, bytes = request.body.len(), "POST");
            let mut builder = self
                .client
                .post(request.endpoint)
                .timeout(request.timeout)
                .header(CONTENT_TYPE, "application/json")
                .body(request.body.to_vec());
            for (name, value) in request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }

            let classify = |err: reqwest::Error| {
                if err.is_timeout() {
                    TransportError::Timeout(request.timeout)
                } else {
                    TransportError::Http(err.to_string())
                }
            };
            let response = builder.send().await.map_err(classify)?;
            let status = response.status().as_u16();
            let body = response.bytes().await.map_err(classify)?;
            trace!(status, bytes = body.len(), "response");
            Ok(TransportResponse {
                status,
                body: body.to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses() {
        let response = |status| TransportResponse {
            status,
            body: Vec::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(404).is_success());
        assert!(!response(503).is_success());
        assert!(response(503).is_server_error());
        assert!(!response(429).is_server_error());
    }

    #[test]
    fn errors_describe_the_failure() {
        let err = TransportError::Status {
            status: 502,
            body: "Bad Gateway".to_owned(),
        };
        assert_eq!(err.to_string(), "HTTP status 502: Bad Gateway");
        assert_eq!(
            TransportError::Timeout(Duration::from_millis(1500)).to_string(),
            "request timed out after 1.5s"
        );
    }
}
