//! Reading OpenAPI documents into a [`SpecDocument`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{GenerationError, Result};

/// Prefix of every `$ref` that points into `components.schemas`.
pub(crate) const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// HTTP verbs that may carry an operation inside an OpenAPI path item, in the
/// order they are visited.
const HTTP_METHODS: [&str; 8] = [
    "post", "get", "put", "patch", "delete", "options", "head", "trace",
];

/// The parts of an OpenAPI 3.x document the generator consumes.
///
/// Both maps are ordered so that everything derived from a document is
/// independent of the key order in the source file.
#[derive(Clone, Debug, PartialEq)]
pub struct SpecDocument {
    pub title: Option<String>,
    pub version: Option<String>,
    pub paths: BTreeMap<String, Value>,
    pub schemas: BTreeMap<String, Value>,
}

/// One method-bearing operation of a path item.
#[derive(Clone, Copy, Debug)]
pub struct Operation<'a> {
    pub path: &'a str,
    pub http_method: &'static str,
    pub body: &'a Value,
}

impl<'a> Operation<'a> {
    pub fn operation_id(&self) -> Option<&'a str> {
        self.body.get("operationId").and_then(Value::as_str)
    }

    pub fn summary(&self) -> Option<&'a str> {
        self.body
            .get("summary")
            .or_else(|| self.body.get("description"))
            .and_then(Value::as_str)
    }
}

impl SpecDocument {
    /// Builds a document from already-parsed JSON.
    ///
    /// Fails with [`GenerationError::MissingSection`] when `paths` or
    /// `components.schemas` is absent.
    pub fn from_value(value: Value) -> Result<Self> {
        let paths = value
            .get("paths")
            .and_then(Value::as_object)
            .ok_or(GenerationError::MissingSection("paths"))?;
        let schemas = value
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .ok_or(GenerationError::MissingSection("components.schemas"))?;

        let info = value.get("info");
        let text = |key: &str| {
            info.and_then(|info| info.get(key))
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        Ok(Self {
            title: text("title"),
            version: text("version"),
            paths: paths.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            schemas: schemas.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    /// Parses a JSON document.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| GenerationError::io(path, err))?;
        Self::parse(&text)
    }

    /// Every operation of every path, ordered by path and then by HTTP verb.
    pub fn operations(&self) -> Vec<Operation<'_>> {
        let mut operations = Vec::new();
        for (path, item) in &self.paths {
            for http_method in HTTP_METHODS {
                if let Some(body) = item.get(http_method).filter(|body| body.is_object()) {
                    operations.push(Operation {
                        path,
                        http_method,
                        body,
                    });
                }
            }
        }
        operations
    }
}

/// Extracts the component name from a `#/components/schemas/<name>` reference.
pub(crate) fn component_name(reference: &str) -> Option<&str> {
    reference.strip_prefix(COMPONENT_PREFIX)
}
