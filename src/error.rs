//! Error taxonomy shared by the dispatch primitive, every generated method and
//! the convenience helpers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::TransportError;

/// JSON-RPC code NEAR uses for handler errors.
pub const HANDLER_ERROR_CODE: i64 = -32000;

/// Result type alias for client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Client error type.
///
/// Only [`Error::Network`] is retried; every other kind surfaces on the first
/// occurrence.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid client configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("transport failed after {attempts} attempt(s): {source}")]
    Network {
        attempts: u32,
        #[source]
        source: TransportError,
    },
    #[error("malformed JSON-RPC response: {0}")]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// The server-reported error, if this is one.
    pub fn as_rpc(&self) -> Option<&RpcError> {
        match self {
            Self::Rpc(err) => Some(err),
            _ => None,
        }
    }

    /// The local schema mismatch, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Invalid or missing client configuration, reported at construction time.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("endpoint must not be empty")]
    EmptyEndpoint,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
    #[error("invalid header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: &'static str },
    #[error("failed to set up the HTTP transport: {0}")]
    Transport(String),
}

/// A response arrived but is not a JSON-RPC envelope.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("response carries neither `result` nor `error`")]
    MissingResultAndError,
    #[error("response `error` is not a JSON-RPC error object: {0}")]
    MalformedError(#[source] serde_json::Error),
    /// A failure status below 500 whose body is not a JSON-RPC envelope.
    #[error("HTTP status {status} without a JSON-RPC envelope: {body}")]
    Status { status: u16, body: String },
}

/// JSON-RPC error returned by the NEAR node.
///
/// NEAR's RPC extends the standard JSON-RPC error with `name` and `cause` fields
/// that carry structured, typed error information. The `data` field is deprecated
/// in nearcore and typically contains only a human-readable string.
///
/// # Error structure
///
/// For handler errors (most RPC failures), the response looks like:
///
/// ```json
/// {
///   "code": -32000,
///   "message": "Server error",
///   "data": "...",
///   "name": "HANDLER_ERROR",
///   "cause": { "name": "UNKNOWN_BLOCK", "info": { ... } }
/// }
/// ```
///
/// Some view calls instead answer with a `result` object carrying an `error`
/// string. Those are reported as handler errors too, with the message taken
/// verbatim and the whole `result` object in `data`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    /// Deprecated by nearcore. Prefer `cause` for structured error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Error category: `HANDLER_ERROR`, `REQUEST_VALIDATION_ERROR`, or `INTERNAL_ERROR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Structured error detail. For handler errors, contains `{"name": "...", "info": {...}}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<RpcErrorCause>,
}

/// Structured cause of an RPC error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorCause {
    /// The error variant name (e.g., `UNKNOWN_BLOCK`, `INVALID_ACCOUNT`).
    pub name: String,
    /// Additional structured information about the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Value>,
}

impl RpcError {
    /// A handler error built from a `result.error` string.
    pub(crate) fn from_result_error(message: String, result: Value) -> Self {
        Self {
            code: HANDLER_ERROR_CODE,
            message,
            data: Some(result),
            name: Some("HANDLER_ERROR".to_owned()),
            cause: None,
        }
    }

    /// Returns `true` if this is a handler error (a method-specific failure).
    pub fn is_handler_error(&self) -> bool {
        self.name.as_deref() == Some("HANDLER_ERROR")
    }

    /// Returns `true` if this is a request validation error.
    pub fn is_request_validation_error(&self) -> bool {
        self.name.as_deref() == Some("REQUEST_VALIDATION_ERROR")
    }

    /// Returns `true` if this is an internal error (timeout, connection closed, etc).
    pub fn is_internal_error(&self) -> bool {
        self.name.as_deref() == Some("INTERNAL_ERROR")
    }

    /// Returns the error cause name if available (e.g., `"UNKNOWN_BLOCK"`).
    pub fn cause_name(&self) -> Option<&str> {
        self.cause.as_ref().map(|c| c.name.as_str())
    }

    /// Returns the structured cause info if available.
    pub fn cause_info(&self) -> Option<&Value> {
        self.cause.as_ref().and_then(|c| c.info.as_ref())
    }
}

/// Which side of a call failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Params, checked before anything is sent.
    Request,
    /// The `result`, checked before it is returned.
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Request => "request",
            Self::Response => "response",
        })
    }
}

/// A local mismatch between a value and the shape the method declares.
///
/// Raised by the validation layer and by typed calls whose `result` cannot be
/// decoded into the declared Rust type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{direction} of `{method}` does not match its schema at `{path}`: expected {expected}, found {found}")]
pub struct ValidationError {
    pub direction: Direction,
    pub method: String,
    /// Dotted path of the offending value, rooted at `params` or `result`.
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl ValidationError {
    /// Params that cannot be turned into JSON at all.
    pub(crate) fn unencodable(method: &str, err: &serde_json::Error) -> Self {
        Self {
            direction: Direction::Request,
            method: method.to_owned(),
            path: "params".to_owned(),
            expected: "JSON-encodable params".to_owned(),
            found: err.to_string(),
        }
    }

    /// A `result` that does not decode into `expected`.
    pub(crate) fn undecodable(method: &str, expected: &str, err: &serde_json::Error) -> Self {
        Self {
            direction: Direction::Response,
            method: method.to_owned(),
            path: "result".to_owned(),
            expected: expected.to_owned(),
            found: err.to_string(),
        }
    }
}
