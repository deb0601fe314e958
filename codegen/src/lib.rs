//! Build-time generator for the NEAR JSON-RPC client.
//!
//! Reads OpenAPI 3.x documents and renders, per tracked API version, a Rust
//! module with:
//!
//! - `types`: one named item per component schema, with inline objects,
//!   unions and enums hoisted into named items of their own
//! - `methods`: a constant, a free `async fn` and a client accessor per
//!   JSON-RPC method, all going through `RpcClient::call_typed`
//! - `validators` (behind the client's `validation-mini` feature): static
//!   schemas and per-method lookups
//! - `METHODS`, the sorted method table, plus the `Api` surface marker
//!
//! The runtime crate drives this from its `build.rs`:
//!
//! ```no_run
//! use near_jsonrpc_codegen::{GeneratorOptions, SnapshotManifest};
//! use std::path::Path;
//!
//! let manifest = SnapshotManifest::from_path("openapi/snapshots.toml")?;
//! let out_dir = std::env::var("OUT_DIR").expect("set by cargo");
//! manifest.generate(Path::new("openapi"), Path::new(&out_dir), &GeneratorOptions::default())?;
//! # Ok::<(), near_jsonrpc_codegen::GenerationError>(())
//! ```

mod emit;
mod error;
mod loader;
mod methods;
mod naming;
mod schema;
mod snapshot;

#[cfg(test)]
mod fixtures;

pub use error::{GenerationError, Result};
pub use loader::{Operation, SpecDocument};
pub use methods::{GeneratorOptions, MethodDescriptor};
pub use schema::{Field, IntegerKind, SchemaDescriptor, SchemaKind, SchemaSet, TypeRef, UnionMember};
pub use snapshot::{GeneratedSnapshot, INDEX_FILE, SnapshotEntry, SnapshotManifest};

/// Everything derived from one document.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub title: Option<String>,
    pub version: Option<String>,
    pub schemas: SchemaSet,
    /// Sorted by method name.
    pub methods: Vec<MethodDescriptor>,
}

/// Builds the schema set and method table of a document.
///
/// Fails when a reference dangles, two schemas or methods map to the same
/// name, or an operation cannot be turned into a method.
pub fn analyze(doc: &SpecDocument, options: &GeneratorOptions) -> Result<Analysis> {
    let mut builder = schema::SchemaBuilder::new(doc)?;
    builder.build_components()?;
    let methods = methods::collect_methods(doc, &mut builder, options)?;
    Ok(Analysis {
        title: doc.title.clone(),
        version: doc.version.clone(),
        schemas: builder.finish()?,
        methods,
    })
}

/// Renders the source of one snapshot module for `doc`.
pub fn generate_snapshot(doc: &SpecDocument, version: &str, options: &GeneratorOptions) -> Result<String> {
    let analysis = analyze(doc, options)?;
    emit::render_snapshot(&analysis, version, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_covers_components_and_hoisted_schemas() {
        let analysis = analyze(&fixtures::near(), &GeneratorOptions::default()).expect("valid fixture");
        assert_eq!(analysis.title.as_deref(), Some("NEAR Protocol JSON RPC API"));
        for key in fixtures::near().schemas.keys() {
            assert!(analysis.schemas.get(key).is_some_and(|s| !s.synthetic), "{key}");
        }
        assert!(analysis.schemas.get("RpcBlockResponseHeader").is_some_and(|s| s.synthetic));
        assert!(analysis.schemas.get("GasPriceParams").is_some_and(|s| s.synthetic));
    }

    #[test]
    fn every_method_type_exists() {
        let analysis = analyze(&fixtures::near(), &GeneratorOptions::default()).expect("valid fixture");
        for method in &analysis.methods {
            for ty in [&method.params, &method.result] {
                let mut inner = ty;
                while let TypeRef::Nullable(t) | TypeRef::Array(t) | TypeRef::Map(t) = inner {
                    inner = &**t;
                }
                if let TypeRef::Named(name) = inner {
                    assert!(analysis.schemas.get(name).is_some(), "{} -> {name}", method.name);
                }
            }
        }
    }

    #[test]
    fn generate_snapshot_renders_source() {
        let code = generate_snapshot(&fixtures::near(), "2.6", &GeneratorOptions::default())
            .expect("valid fixture");
        assert!(code.contains("pub const VERSION: &str = \"2.6\";"));
    }
}
