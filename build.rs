use std::path::{Path, PathBuf};

use near_jsonrpc_codegen::{GeneratorOptions, SnapshotManifest};

/// Names the hand-written client defines on `RpcClient`. A generated accessor
/// with one of these names would clash with them.
const RESERVED: [&str; 18] = [
    "new",
    "with_transport",
    "mainnet",
    "testnet",
    "betanet",
    "local",
    "config",
    "endpoint",
    "with_validation",
    "validation",
    "methods",
    "method",
    "call",
    "call_typed",
    "view_account",
    "view_access_key",
    "view_function",
    "view_function_json",
];

fn main() {
    let openapi_dir = Path::new("openapi");
    let manifest_path = openapi_dir.join("snapshots.toml");
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("cargo sets OUT_DIR"));

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed={}", manifest_path.display());

    let manifest = SnapshotManifest::from_path(&manifest_path)
        .unwrap_or_else(|err| panic!("{}: {err}", manifest_path.display()));
    for entry in &manifest.snapshots {
        println!("cargo:rerun-if-changed={}", openapi_dir.join(&entry.document).display());
    }

    let options = GeneratorOptions::default()
        .reserve(RESERVED)
        .with_client_helpers();
    manifest
        .generate(openapi_dir, &out_dir, &options)
        .unwrap_or_else(|err| panic!("failed to generate the NEAR RPC client: {err}"));
}
