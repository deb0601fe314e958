//! Tracked API versions. Each snapshot is generated into its own file and
//! module; nothing generated for one snapshot names another.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use quote::quote;
use serde::Deserialize;
use tracing::debug;

use crate::emit::{format_tokens, render_snapshot};
use crate::error::{GenerationError, Result};
use crate::loader::SpecDocument;
use crate::methods::GeneratorOptions;
use crate::{analyze, naming};

/// File name of the module index written next to the snapshot files.
pub const INDEX_FILE: &str = "snapshots.rs";

/// The parsed `snapshots.toml`.
///
/// ```toml
/// latest = "v2_7"
///
/// [[snapshot]]
/// version = "2.7"
/// module = "v2_7"
/// document = "openapi-2.7.json"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotManifest {
    /// Module that `snapshots::latest` re-exports.
    pub latest: String,
    #[serde(rename = "snapshot", default)]
    pub snapshots: Vec<SnapshotEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotEntry {
    pub version: String,
    pub module: String,
    /// OpenAPI document, relative to the manifest.
    pub document: PathBuf,
}

/// What one [`SnapshotManifest::generate`] run wrote for a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedSnapshot {
    pub module: String,
    pub version: String,
    pub document: PathBuf,
    pub output: PathBuf,
    pub methods: usize,
}

impl SnapshotManifest {
    pub fn parse(text: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(text)?;
        manifest.check()?;
        Ok(manifest)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| GenerationError::io(path, err))?;
        Self::parse(&text)
    }

    /// Module names must be plain identifiers and unique, versions must be
    /// unique, and `latest` must name one of the modules.
    pub fn check(&self) -> Result<()> {
        if self.snapshots.is_empty() {
            return Err(GenerationError::Manifest("no snapshots listed".to_owned()));
        }
        let mut modules = BTreeSet::new();
        let mut versions = BTreeSet::new();
        for entry in &self.snapshots {
            if !naming::is_plain_ident(&entry.module) || entry.module == "latest" {
                return Err(GenerationError::Manifest(format!(
                    "`{}` cannot be used as a module name",
                    entry.module
                )));
            }
            if !modules.insert(entry.module.as_str()) {
                return Err(GenerationError::Manifest(format!(
                    "module `{}` is listed twice",
                    entry.module
                )));
            }
            if !versions.insert(entry.version.as_str()) {
                return Err(GenerationError::Manifest(format!(
                    "version `{}` is listed twice",
                    entry.version
                )));
            }
        }
        if !modules.contains(self.latest.as_str()) {
            return Err(GenerationError::Manifest(format!(
                "latest module `{}` is not a listed snapshot",
                self.latest
            )));
        }
        Ok(())
    }

    pub fn latest_entry(&self) -> Option<&SnapshotEntry> {
        self.snapshots.iter().find(|entry| entry.module == self.latest)
    }

    /// Generates every snapshot into `out_dir/<module>.rs` and the module
    /// index into `out_dir/snapshots.rs`. Documents are resolved against
    /// `base_dir`.
    pub fn generate(
        &self,
        base_dir: &Path,
        out_dir: &Path,
        options: &GeneratorOptions,
    ) -> Result<Vec<GeneratedSnapshot>> {
        self.check()?;
        let mut generated = Vec::with_capacity(self.snapshots.len());
        for entry in &self.snapshots {
            let document = base_dir.join(&entry.document);
            let doc = SpecDocument::from_path(&document)?;
            let analysis = analyze(&doc, options)?;
            let code = render_snapshot(&analysis, &entry.version, options)?;

            let output = out_dir.join(format!("{}.rs", entry.module));
            fs::write(&output, code).map_err(|err| GenerationError::io(&output, err))?;
            debug!(
                module = %entry.module,
                version = %entry.version,
                methods = analysis.methods.len(),
                schemas = analysis.schemas.len(),
                "generated snapshot"
            );
            generated.push(GeneratedSnapshot {
                module: entry.module.clone(),
                version: entry.version.clone(),
                document,
                output,
                methods: analysis.methods.len(),
            });
        }

        let index = out_dir.join(INDEX_FILE);
        fs::write(&index, self.render_index()).map_err(|err| GenerationError::io(&index, err))?;
        Ok(generated)
    }

    /// One `pub mod` per snapshot wrapping its generated file, plus the
    /// `latest` re-export.
    pub fn render_index(&self) -> String {
        let modules = self.snapshots.iter().map(|entry| {
            let ident = naming::ident(&entry.module);
            let file = format!("/{}.rs", entry.module);
            let doc = format!(" NEAR JSON-RPC API version {}.", entry.version);
            quote! {
                #[doc = #doc]
                #[allow(non_camel_case_types, clippy::all)]
                pub mod #ident {
                    include!(concat!(env!("OUT_DIR"), #file));
                }
            }
        });
        let latest = naming::ident(&self.latest);
        format_tokens(quote! {
            #(#modules)*

            pub use self::#latest as latest;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    const MANIFEST: &str = r#"
latest = "v2_7"

[[snapshot]]
version = "2.6"
module = "v2_6"
document = "openapi-2.6.json"

[[snapshot]]
version = "2.7"
module = "v2_7"
document = "openapi-2.7.json"
"#;

    fn write_documents(dir: &Path) {
        let older = fixtures::near_document();
        let mut newer = fixtures::near_document();
        newer["paths"]["/EXPERIMENTAL_congestion_level"] = json!({
            "post": { "operationId": "EXPERIMENTAL_congestion_level" }
        });
        fs::write(dir.join("openapi-2.6.json"), older.to_string()).expect("write 2.6");
        fs::write(dir.join("openapi-2.7.json"), newer.to_string()).expect("write 2.7");
    }

    #[test]
    fn parses_manifest() {
        let manifest = SnapshotManifest::parse(MANIFEST).expect("valid manifest");
        assert_eq!(manifest.snapshots.len(), 2);
        assert_eq!(manifest.latest_entry().map(|e| e.version.as_str()), Some("2.7"));
        assert_eq!(manifest.snapshots[0].document, PathBuf::from("openapi-2.6.json"));
    }

    #[test]
    fn rejects_bad_manifests() {
        let unknown_latest = MANIFEST.replace("latest = \"v2_7\"", "latest = \"v3\"");
        assert!(matches!(
            SnapshotManifest::parse(&unknown_latest),
            Err(GenerationError::Manifest(_))
        ));

        let duplicate = MANIFEST.replace("module = \"v2_7\"", "module = \"v2_6\"");
        assert!(matches!(
            SnapshotManifest::parse(&duplicate),
            Err(GenerationError::Manifest(message)) if message.contains("listed twice")
        ));

        let bad_ident = MANIFEST.replace("\"v2_6\"", "\"2.6\"");
        assert!(matches!(
            SnapshotManifest::parse(&bad_ident),
            Err(GenerationError::Manifest(_))
        ));

        assert!(matches!(
            SnapshotManifest::parse("latest = 1"),
            Err(GenerationError::Toml(_))
        ));
        assert!(matches!(
            SnapshotManifest::parse("latest = \"v1\""),
            Err(GenerationError::Manifest(message)) if message == "no snapshots listed"
        ));
    }

    #[test]
    fn generates_isolated_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        write_documents(dir.path());
        let manifest = SnapshotManifest::parse(MANIFEST).expect("valid manifest");

        let generated = manifest
            .generate(dir.path(), out.path(), &GeneratorOptions::default())
            .expect("generation succeeds");
        assert_eq!(generated.len(), 2);
        assert_eq!(generated[0].methods, 4);
        assert_eq!(generated[1].methods, 5);

        let older = fs::read_to_string(out.path().join("v2_6.rs")).expect("v2_6 written");
        let newer = fs::read_to_string(out.path().join("v2_7.rs")).expect("v2_7 written");
        assert!(!older.contains("congestion_level"));
        assert!(newer.contains("EXPERIMENTAL_congestion_level"));
        assert!(!older.contains("v2_7") && !newer.contains("v2_6"));

        let index = fs::read_to_string(out.path().join(INDEX_FILE)).expect("index written");
        syn::parse_file(&index).expect("index parses");
        assert!(index.contains("pub mod v2_6"));
        assert!(index.contains("pub use self::v2_7 as latest;"));
        assert!(index.contains("\"/v2_7.rs\""));
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        write_documents(dir.path());
        let manifest = SnapshotManifest::parse(MANIFEST).expect("valid manifest");
        let options = GeneratorOptions::default();

        manifest.generate(dir.path(), first.path(), &options).expect("first run");
        manifest.generate(dir.path(), second.path(), &options).expect("second run");
        for file in ["v2_6.rs", "v2_7.rs", INDEX_FILE] {
            let a = fs::read(first.path().join(file)).expect("first output");
            let b = fs::read(second.path().join(file)).expect("second output");
            assert_eq!(a, b, "{file} differs between runs");
        }
    }

    #[test]
    fn every_snapshot_carries_its_own_helpers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        write_documents(dir.path());
        let newest = fixtures::near_with_helpers_document();
        fs::write(dir.path().join("openapi-2.8.json"), newest.to_string()).expect("write 2.8");
        let options = GeneratorOptions::default().with_client_helpers();

        let manifest = SnapshotManifest::parse(
            &format!("{MANIFEST}\n[[snapshot]]\nversion = \"2.8\"\nmodule = \"v2_8\"\ndocument = \"openapi-2.8.json\"\n")
                .replace("latest = \"v2_7\"", "latest = \"v2_8\""),
        )
        .expect("valid manifest");
        let err = manifest
            .generate(dir.path(), out.path(), &options)
            .expect_err("2.6 lacks the helper types");
        assert!(matches!(err, GenerationError::HelperType { name, .. } if name == "AccessKeyView"));

        let only_newest = SnapshotManifest::parse(
            "latest = \"v2_8\"\n[[snapshot]]\nversion = \"2.8\"\nmodule = \"v2_8\"\ndocument = \"openapi-2.8.json\"\n",
        )
        .expect("valid manifest");
        only_newest
            .generate(dir.path(), out.path(), &options)
            .expect("helper types present");
        let code = fs::read_to_string(out.path().join("v2_8.rs")).expect("v2_8 written");
        assert!(code.contains("crate::query_helpers::impl_query_surface!"));
        assert!(code.contains("crate::token_helpers::impl_token_helpers!(types);"));
    }

    #[test]
    fn missing_document_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = SnapshotManifest::parse(MANIFEST).expect("valid manifest");
        let err = manifest
            .generate(dir.path(), dir.path(), &GeneratorOptions::default())
            .expect_err("documents are missing");
        assert!(matches!(err, GenerationError::Io { path, .. } if path.ends_with("openapi-2.6.json")));
    }
}
