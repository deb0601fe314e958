//! Opt-in request and response checks.
//!
//! Each snapshot generates its schemas as statics plus two lookups by method
//! name; `enable_validation()` bundles those lookups into a [`Validation`].
//! A client only reaches the statics once it is handed that value, and a
//! build without the `validation-mini` feature contains neither this module
//! nor any generated schema.

mod schema;

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

pub use self::schema::{Field, IntegerKind, Mismatch, Schema};
use crate::error::{Direction, ValidationError};

/// Finds the schema of one method's params or result.
pub type SchemaLookup = fn(&str) -> Option<&'static Schema>;

/// Validation hooks for one snapshot.
///
/// `V` is the snapshot's `Api` marker: only `enable_validation()` of that
/// snapshot builds one, and [`RpcClient::with_validation`] only takes the
/// hooks of the client's own snapshot.
///
/// Methods the lookups do not know pass unchecked, so dynamic calls to
/// methods outside the snapshot still go through.
///
/// [`RpcClient::with_validation`]: crate::RpcClient::with_validation
pub struct Validation<V = crate::snapshots::latest::Api> {
    request: SchemaLookup,
    response: SchemaLookup,
    snapshot: PhantomData<fn() -> V>,
}

impl<V> Clone for Validation<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Validation<V> {}

impl<V> Validation<V> {
    pub(crate) fn new(request: SchemaLookup, response: SchemaLookup) -> Self {
        Self {
            request,
            response,
            snapshot: PhantomData,
        }
    }

    pub fn request_schema(&self, method: &str) -> Option<&'static Schema> {
        (self.request)(method)
    }

    pub fn response_schema(&self, method: &str) -> Option<&'static Schema> {
        (self.response)(method)
    }

    /// Checks the `params` of a call before it is sent. Absent params are
    /// checked as `null`.
    pub fn validate_request(&self, method: &str, params: &Value) -> Result<(), ValidationError> {
        check(self.request_schema(method), Direction::Request, method, params, "params")
    }

    /// Checks the `result` of a call before it is returned.
    pub fn validate_response(&self, method: &str, result: &Value) -> Result<(), ValidationError> {
        check(self.response_schema(method), Direction::Response, method, result, "result")
    }
}

impl<V> fmt::Debug for Validation<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validation").finish_non_exhaustive()
    }
}

fn check(
    schema: Option<&'static Schema>,
    direction: Direction,
    method: &str,
    value: &Value,
    root: &str,
) -> Result<(), ValidationError> {
    let Some(schema) = schema else {
        return Ok(());
    };
    schema.check(value, root).map_err(|mismatch| ValidationError {
        direction,
        method: method.to_owned(),
        path: mismatch.path,
        expected: mismatch.expected,
        found: mismatch.found,
    })
}
