//! JSON-RPC 2.0 envelopes as NEAR nodes speak them.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ProtocolError, RpcError};

pub const JSONRPC_VERSION: &str = "2.0";

/// NEAR nodes echo the id but never look at it, so every request carries the
/// same one.
pub const REQUEST_ID: &str = "dontcare";

/// JSON-RPC request wrapper
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: &'static str,
    pub method: &'a str,
    /// `null` when the caller passes no params.
    pub params: &'a Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: REQUEST_ID,
            method,
            params,
        }
    }

    /// The envelope as sent on the wire.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "jsonrpc": self.jsonrpc,
            "id": self.id,
            "method": self.method,
            "params": self.params,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_value().to_string().into_bytes()
    }
}

/// What a well-formed response carries.
#[derive(Clone, Debug, PartialEq)]
pub enum RpcOutcome {
    Result(Value),
    Error(RpcError),
}

/// Interprets a response body.
///
/// A non-null `error` wins over `result`. A `result` object carrying an
/// `error` string is reported as an [`RpcError`] as well, so callers see one
/// shape for every application-level failure.
pub fn parse_response(body: &[u8]) -> Result<RpcOutcome, ProtocolError> {
    let value: Value = serde_json::from_slice(body).map_err(ProtocolError::InvalidJson)?;
    let Value::Object(mut object) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    if let Some(error) = object.remove("error").filter(|error| !error.is_null()) {
        let error = serde_json::from_value(error).map_err(ProtocolError::MalformedError)?;
        return Ok(RpcOutcome::Error(error));
    }
    let Some(result) = object.remove("result") else {
        return Err(ProtocolError::MissingResultAndError);
    };
    if let Some(message) = result.get("error").and_then(Value::as_str) {
        return Ok(RpcOutcome::Error(RpcError::from_result_error(
            message.to_owned(),
            result,
        )));
    }
    Ok(RpcOutcome::Result(result))
}
