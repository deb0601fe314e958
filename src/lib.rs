//! Typed async client for the NEAR Protocol JSON-RPC API.
//!
//! Types, per-method functions and client accessors are generated at build
//! time from the OpenAPI documents under `openapi/`, one module per tracked
//! API version. The newest one is re-exported as [`latest`], and its items as
//! [`types`] and [`methods`]. Each snapshot's `Finality`, `BlockId` and
//! `SyncCheckpoint` convert into a [`BlockReference`] for the `view_*`
//! shortcuts.
//!
//! # Features
//!
//! - **`client`** (default): the `reqwest` HTTP transport and the network
//!   presets. Without it, bring your own [`Transport`].
//! - **`validation`** (default): schema checks for params and results,
//!   including string patterns and date-time formats.
//! - **`validation-mini`**: the same checks without patterns and formats.
//!   A build with neither feature contains no validator code at all.
//! - **`near-primitives`**: conversions to and from `near-token` and
//!   `near-gas`.
//!
//! # Quick start
//!
//! ```no_run
//! use near_jsonrpc_client::{NearRpcClient, types::*};
//!
//! #[tokio::main]
//! async fn main() -> near_jsonrpc_client::Result<()> {
//!     let client = NearRpcClient::mainnet()?;
//!     let status = client.status().await?;
//!     println!("Chain: {} at block {}", status.chain_id, status.sync_info.latest_block_height);
//!
//!     let account = client.view_account("near", Finality::Final).await?;
//!     println!("Balance: {} yoctoNEAR", account.amount);
//!     Ok(())
//! }
//! ```
//!
//! Methods can also be looked up at runtime, by server name or camelCase
//! accessor:
//!
//! ```no_run
//! # async fn run(client: near_jsonrpc_client::NearRpcClient) -> near_jsonrpc_client::Result<()> {
//! if let Some(method) = client.method("gasPrice") {
//!     let price = method.call(None).await?;
//!     println!("{price}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod envelope;
mod error;
pub mod query_helpers;
mod surface;
mod token_helpers;
mod transport;
#[cfg(feature = "validation-mini")]
pub mod validation;

/// One module per tracked API version, plus `latest`.
pub mod snapshots {
    include!(concat!(env!("OUT_DIR"), "/snapshots.rs"));
}

pub use client::RpcClient;
pub use config::{
    BETANET_RPC_URL, ClientConfig, DEFAULT_TIMEOUT_MS, LOCAL_RPC_URL, MAINNET_RPC_URL, TESTNET_RPC_URL,
};
pub use envelope::{JSONRPC_VERSION, REQUEST_ID, RpcOutcome, RpcRequest, parse_response};
pub use error::{
    ConfigError, Direction, Error, HANDLER_ERROR_CODE, ProtocolError, Result, RpcError, RpcErrorCause,
    ValidationError,
};
pub use query_helpers::{BlockReference, BlockSelector, FunctionCallResult, QueryKind, QueryRequest, QuerySurface};
pub use snapshots::latest;
#[cfg(feature = "validation-mini")]
pub use snapshots::latest::enable_validation;
pub use snapshots::latest::{methods, types};
pub use surface::{ApiSurface, MethodDescriptor, MethodHandle};
pub use token_helpers::{GAS_PER_TGAS, YOCTO_PER_NEAR};
#[cfg(feature = "client")]
pub use transport::HttpTransport;
pub use transport::{DynTransport, Transport, TransportError, TransportRequest, TransportResponse};
#[cfg(feature = "validation-mini")]
pub use validation::Validation;

/// A client bound to the newest API snapshot.
pub type NearRpcClient = RpcClient<latest::Api>;
