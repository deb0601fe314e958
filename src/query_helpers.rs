//! Block references and `query` params that carry the right `request_type`,
//! plus typed `view_*` shortcuts on the client.
//!
//! The [`Finality`], [`BlockId`] and [`SyncCheckpoint`] here do not belong to
//! any API snapshot. Each generated snapshot converts its own versions of
//! them into these and into [`BlockReference`], and picks the typed results
//! of the shortcuts through [`QuerySurface`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::client::RpcClient;
use crate::error::{Error, Result, ValidationError};
use crate::surface::ApiSurface;

const QUERY: &str = "query";

/// Different types of finality.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finality {
    #[serde(rename = "optimistic")]
    Optimistic,
    #[serde(rename = "near-final")]
    NearFinal,
    #[default]
    #[serde(rename = "final")]
    Final,
}

/// A block height or a block hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockId {
    Height(u64),
    Hash(String),
}

impl From<u64> for BlockId {
    fn from(height: u64) -> Self {
        Self::Height(height)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCheckpoint {
    Genesis,
    EarliestAvailable,
}

/// How to reference a specific block for a query.
///
/// Serializes as the single field the node expects, e.g.
/// `{"finality": "final"}` or `{"block_id": 100}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockReference {
    /// Use a finality level (Final, Optimistic, NearFinal).
    Finality(Finality),
    /// Use a specific block height or hash.
    BlockId(BlockId),
    /// Use a sync checkpoint (Genesis, EarliestAvailable).
    SyncCheckpoint(SyncCheckpoint),
}

impl Default for BlockReference {
    fn default() -> Self {
        Self::Finality(Finality::Final)
    }
}

impl BlockReference {
    pub fn at_height(height: u64) -> Self {
        Self::BlockId(BlockId::Height(height))
    }

    pub fn at_hash(hash: impl Into<String>) -> Self {
        Self::BlockId(BlockId::Hash(hash.into()))
    }

    fn serialize_entry<M: SerializeMap>(&self, map: &mut M) -> std::result::Result<(), M::Error> {
        match self {
            Self::Finality(finality) => map.serialize_entry("finality", finality),
            Self::BlockId(block_id) => map.serialize_entry("block_id", block_id),
            Self::SyncCheckpoint(checkpoint) => map.serialize_entry("sync_checkpoint", checkpoint),
        }
    }
}

impl Serialize for BlockReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        self.serialize_entry(&mut map)?;
        map.end()
    }
}

impl From<Finality> for BlockReference {
    fn from(value: Finality) -> Self {
        Self::Finality(value)
    }
}

impl From<BlockId> for BlockReference {
    fn from(value: BlockId) -> Self {
        Self::BlockId(value)
    }
}

impl From<SyncCheckpoint> for BlockReference {
    fn from(value: SyncCheckpoint) -> Self {
        Self::SyncCheckpoint(value)
    }
}

/// A block chosen by optional id and optional finality.
///
/// The id wins when both are set; with neither the block is `final`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct BlockSelector {
    #[serde(default)]
    pub block_id: Option<BlockId>,
    #[serde(default)]
    pub finality: Option<Finality>,
}

impl From<BlockSelector> for BlockReference {
    fn from(selector: BlockSelector) -> Self {
        match (selector.block_id, selector.finality) {
            (Some(block_id), _) => Self::BlockId(block_id),
            (None, Some(finality)) => Self::Finality(finality),
            (None, None) => Self::default(),
        }
    }
}

/// What a `query` call asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryKind {
    ViewAccount,
    ViewCode,
    ViewState {
        prefix_base64: String,
        include_proof: Option<bool>,
    },
    ViewAccessKey {
        public_key: String,
    },
    ViewAccessKeyList,
    CallFunction {
        method_name: String,
        args_base64: String,
    },
}

impl QueryKind {
    /// The `request_type` sent on the wire.
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::ViewAccount => "view_account",
            Self::ViewCode => "view_code",
            Self::ViewState { .. } => "view_state",
            Self::ViewAccessKey { .. } => "view_access_key",
            Self::ViewAccessKeyList => "view_access_key_list",
            Self::CallFunction { .. } => "call_function",
        }
    }
}

/// Params of a `query` call, serialized flat:
/// `{"request_type": .., "account_id": .., <kind fields>, <block field>}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRequest {
    pub account_id: String,
    pub kind: QueryKind,
    pub block: BlockReference,
}

impl QueryRequest {
    fn new(account_id: impl Into<String>, kind: QueryKind, block: impl Into<BlockReference>) -> Self {
        Self {
            account_id: account_id.into(),
            kind,
            block: block.into(),
        }
    }

    pub fn view_account(account_id: impl Into<String>, block: impl Into<BlockReference>) -> Self {
        Self::new(account_id, QueryKind::ViewAccount, block)
    }

    pub fn view_code(account_id: impl Into<String>, block: impl Into<BlockReference>) -> Self {
        Self::new(account_id, QueryKind::ViewCode, block)
    }

    /// `include_proof` is left unset; change [`QueryRequest::kind`] to ask
    /// for a proof.
    pub fn view_state(
        account_id: impl Into<String>,
        prefix_base64: impl Into<String>,
        block: impl Into<BlockReference>,
    ) -> Self {
        let kind = QueryKind::ViewState {
            prefix_base64: prefix_base64.into(),
            include_proof: None,
        };
        Self::new(account_id, kind, block)
    }

    pub fn view_access_key(
        account_id: impl Into<String>,
        public_key: impl Into<String>,
        block: impl Into<BlockReference>,
    ) -> Self {
        let kind = QueryKind::ViewAccessKey {
            public_key: public_key.into(),
        };
        Self::new(account_id, kind, block)
    }

    pub fn view_access_key_list(account_id: impl Into<String>, block: impl Into<BlockReference>) -> Self {
        Self::new(account_id, QueryKind::ViewAccessKeyList, block)
    }

    /// `args_base64` must already be base64; see [`RpcClient::view_function`]
    /// for raw bytes.
    pub fn call_function(
        account_id: impl Into<String>,
        method_name: impl Into<String>,
        args_base64: impl Into<String>,
        block: impl Into<BlockReference>,
    ) -> Self {
        let kind = QueryKind::CallFunction {
            method_name: method_name.into(),
            args_base64: args_base64.into(),
        };
        Self::new(account_id, kind, block)
    }
}

impl Serialize for QueryRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("request_type", self.kind.request_type())?;
        map.serialize_entry("account_id", &self.account_id)?;
        match &self.kind {
            QueryKind::ViewAccount | QueryKind::ViewCode | QueryKind::ViewAccessKeyList => {}
            QueryKind::ViewState {
                prefix_base64,
                include_proof,
            } => {
                map.serialize_entry("prefix_base64", prefix_base64)?;
                if let Some(include_proof) = include_proof {
                    map.serialize_entry("include_proof", include_proof)?;
                }
            }
            QueryKind::ViewAccessKey { public_key } => {
                map.serialize_entry("public_key", public_key)?;
            }
            QueryKind::CallFunction {
                method_name,
                args_base64,
            } => {
                map.serialize_entry("method_name", method_name)?;
                map.serialize_entry("args_base64", args_base64)?;
            }
        }
        self.block.serialize_entry(&mut map)?;
        map.end()
    }
}

/// The parts of a `call_function` result every snapshot agrees on.
pub trait FunctionCallResult {
    fn result_bytes(&self) -> &[u8];
    fn logs(&self) -> &[String];
}

/// Snapshot types the `view_*` shortcuts decode into.
pub trait QuerySurface: ApiSurface {
    type AccountView: DeserializeOwned;
    type AccessKeyView: DeserializeOwned;
    type CallResult: FunctionCallResult + DeserializeOwned;
}

/// Invoked by each generated snapshot module with its own `types`, its `Api`
/// marker and the variant names of its `BlockId`.
macro_rules! impl_query_surface {
    ($types:ident, $api:ident, BlockId { height: $height:ident, hash: $hash:ident }) => {
        impl $crate::query_helpers::QuerySurface for $api {
            type AccountView = $types::AccountView;
            type AccessKeyView = $types::AccessKeyView;
            type CallResult = $types::CallResult;
        }

        impl $crate::query_helpers::FunctionCallResult for $types::CallResult {
            fn result_bytes(&self) -> &[u8] {
                &self.result
            }

            fn logs(&self) -> &[::std::string::String] {
                &self.logs
            }
        }

        impl ::std::convert::From<$types::AccountId> for ::std::string::String {
            fn from(account_id: $types::AccountId) -> Self {
                account_id.0
            }
        }

        impl ::std::convert::From<$types::PublicKey> for ::std::string::String {
            fn from(public_key: $types::PublicKey) -> Self {
                public_key.0
            }
        }

        impl ::std::convert::From<$types::Finality> for $crate::query_helpers::Finality {
            fn from(value: $types::Finality) -> Self {
                match value.as_str() {
                    "optimistic" => Self::Optimistic,
                    "near-final" => Self::NearFinal,
                    _ => Self::Final,
                }
            }
        }

        impl ::std::convert::From<$types::SyncCheckpoint> for $crate::query_helpers::SyncCheckpoint {
            fn from(value: $types::SyncCheckpoint) -> Self {
                match value.as_str() {
                    "genesis" => Self::Genesis,
                    _ => Self::EarliestAvailable,
                }
            }
        }

        impl ::std::convert::From<$types::BlockId> for $crate::query_helpers::BlockId {
            fn from(value: $types::BlockId) -> Self {
                match value {
                    $types::BlockId::$height(height) => Self::Height(height),
                    $types::BlockId::$hash(hash) => Self::Hash(hash.0),
                }
            }
        }

        impl ::std::convert::From<$types::Finality> for $crate::query_helpers::BlockReference {
            fn from(value: $types::Finality) -> Self {
                Self::Finality(value.into())
            }
        }

        impl ::std::convert::From<$types::SyncCheckpoint> for $crate::query_helpers::BlockReference {
            fn from(value: $types::SyncCheckpoint) -> Self {
                Self::SyncCheckpoint(value.into())
            }
        }

        impl ::std::convert::From<$types::BlockId> for $crate::query_helpers::BlockReference {
            fn from(value: $types::BlockId) -> Self {
                Self::BlockId(value.into())
            }
        }
    };
}

pub(crate) use impl_query_surface;

impl<V: QuerySurface> RpcClient<V> {
    /// Account balance, storage and code hash.
    pub async fn view_account(
        &self,
        account_id: impl Into<String>,
        block: impl Into<BlockReference>,
    ) -> Result<V::AccountView> {
        self.call_typed(QUERY, Some(QueryRequest::view_account(account_id, block)))
            .await
    }

    /// Nonce and permission of one access key.
    pub async fn view_access_key(
        &self,
        account_id: impl Into<String>,
        public_key: impl Into<String>,
        block: impl Into<BlockReference>,
    ) -> Result<V::AccessKeyView> {
        let request = QueryRequest::view_access_key(account_id, public_key, block);
        self.call_typed(QUERY, Some(request)).await
    }

    /// Calls a view function with raw argument bytes. The result carries the
    /// returned bytes and the logs.
    pub async fn view_function(
        &self,
        account_id: impl Into<String>,
        method_name: impl Into<String>,
        args: &[u8],
        block: impl Into<BlockReference>,
    ) -> Result<V::CallResult> {
        let request = QueryRequest::call_function(account_id, method_name, STANDARD.encode(args), block);
        self.call_typed(QUERY, Some(request)).await
    }

    /// Calls a view function with JSON arguments and decodes its JSON result.
    ///
    /// ```no_run
    /// use near_jsonrpc_client::NearRpcClient;
    /// use near_jsonrpc_client::types::Finality;
    /// use serde_json::json;
    ///
    /// # async fn run() -> near_jsonrpc_client::Result<()> {
    /// let client = NearRpcClient::testnet()?;
    /// let greeting: String = client
    ///     .view_function_json("guestbook.testnet", "get_greeting", &json!({}), Finality::Final)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn view_function_json<T: DeserializeOwned>(
        &self,
        account_id: impl Into<String>,
        method_name: impl Into<String>,
        args: &impl Serialize,
        block: impl Into<BlockReference>,
    ) -> Result<T> {
        let args = serde_json::to_vec(args).map_err(|err| ValidationError::unencodable(QUERY, &err))?;
        let output = self.view_function(account_id, method_name, &args, block).await?;
        serde_json::from_slice(output.result_bytes()).map_err(|err| {
            Error::Validation(ValidationError::undecodable(
                QUERY,
                std::any::type_name::<T>(),
                &err,
            ))
        })
    }
}
