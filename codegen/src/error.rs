use std::path::PathBuf;

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Everything that can make a generation run fail.
///
/// None of these ever reach a runtime client: `build.rs` turns them into a
/// failed build.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in OpenAPI document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse snapshot manifest: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid snapshot manifest: {0}")]
    Manifest(String),
    #[error("OpenAPI document has no `{0}` object")]
    MissingSection(&'static str),
    #[error("operation at `{path}` has no operationId")]
    MissingOperationId { path: String },
    #[error("operationId `{operation_id}` at `{path}` is not a valid method name")]
    InvalidMethodName { path: String, operation_id: String },
    #[error("method `{method}` is declared by both `{first}` and `{second}`")]
    DuplicateMethod {
        method: String,
        first: String,
        second: String,
    },
    #[error("methods `{first}` and `{second}` both map to accessor `{accessor}`")]
    AccessorCollision {
        accessor: String,
        first: String,
        second: String,
    },
    #[error("method `{method}` maps to accessor `{accessor}`, which the client already defines")]
    ReservedAccessor { method: String, accessor: String },
    #[error("`{reference}` (used by `{context}`) does not name a component schema")]
    DanglingReference { reference: String, context: String },
    #[error("unsupported reference `{reference}` in `{context}`")]
    UnsupportedReference { reference: String, context: String },
    #[error("schemas `{first}` and `{second}` both map to the type name `{name}`")]
    NameCollision {
        name: String,
        first: String,
        second: String,
    },
    #[error("schema `{name}`: {reason}")]
    InvalidSchema { name: String, reason: String },
    #[error("method `{method}`: {reason}")]
    InvalidOperation { method: String, reason: String },
    #[error("snapshot cannot carry the client helpers: `{name}` {reason}")]
    HelperType { name: String, reason: String },
}

impl GenerationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
