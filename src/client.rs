//! Async JSON-RPC client for NEAR Protocol.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
#[cfg(feature = "client")]
use crate::config::{BETANET_RPC_URL, LOCAL_RPC_URL, MAINNET_RPC_URL, TESTNET_RPC_URL};
use crate::envelope::{RpcOutcome, RpcRequest, parse_response};
#[cfg(feature = "client")]
use crate::error::ConfigError;
use crate::error::{Error, ProtocolError, Result, ValidationError};
use crate::surface::{ApiSurface, MethodDescriptor, MethodHandle};
use crate::transport::{DynTransport, Transport, TransportError, TransportRequest};
#[cfg(feature = "validation-mini")]
use crate::validation::Validation;

/// Async client for the NEAR Protocol JSON-RPC API.
///
/// `V` is the API snapshot the client is bound to; it decides which generated
/// accessors exist and what [`RpcClient::method`] resolves. Every call, typed
/// or not, goes through [`RpcClient::call`].
///
/// The client holds nothing mutable, so clones and concurrent calls share it
/// freely.
///
/// # Example
///
/// ```no_run
/// use near_jsonrpc_client::NearRpcClient;
///
/// #[tokio::main]
/// async fn main() -> near_jsonrpc_client::Result<()> {
///     let client = NearRpcClient::mainnet()?;
///     let status = client.status().await?;
///     println!("Chain ID: {}", status.chain_id);
///     Ok(())
/// }
/// ```
pub struct RpcClient<V = crate::snapshots::latest::Api> {
    config: Arc<ClientConfig>,
    transport: DynTransport,
    #[cfg(feature = "validation-mini")]
    validation: Option<Validation<V>>,
    surface: PhantomData<fn() -> V>,
}

impl<V> Clone for RpcClient<V> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            transport: Arc::clone(&self.transport),
            #[cfg(feature = "validation-mini")]
            validation: self.validation,
            surface: PhantomData,
        }
    }
}

impl<V: ApiSurface> fmt::Debug for RpcClient<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("version", &V::VERSION)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "client")]
impl<V: ApiSurface> RpcClient<V> {
    /// Create a client over HTTP. A bare endpoint string is accepted.
    pub fn new(config: impl Into<ClientConfig>) -> Result<Self> {
        let config = config.into();
        config.validate()?;
        let transport = crate::transport::HttpTransport::new()
            .map_err(|err| ConfigError::Transport(err.to_string()))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client for NEAR Mainnet.
    pub fn mainnet() -> Result<Self> {
        Self::new(MAINNET_RPC_URL)
    }

    /// Create a client for NEAR Testnet.
    pub fn testnet() -> Result<Self> {
        Self::new(TESTNET_RPC_URL)
    }

    /// Create a client for NEAR Betanet.
    pub fn betanet() -> Result<Self> {
        Self::new(BETANET_RPC_URL)
    }

    /// Create a client for local development (localhost:3030).
    pub fn local() -> Result<Self> {
        Self::new(LOCAL_RPC_URL)
    }
}

impl<V: ApiSurface> RpcClient<V> {
    /// Create a client over any transport.
    pub fn with_transport(
        config: impl Into<ClientConfig>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let config = config.into();
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            transport,
            #[cfg(feature = "validation-mini")]
            validation: None,
            surface: PhantomData,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// A client that validates params before sending and results before
    /// returning them. `self` is left unchanged.
    ///
    /// ```no_run
    /// use near_jsonrpc_client::{NearRpcClient, latest};
    ///
    /// let client = NearRpcClient::testnet()?.with_validation(latest::enable_validation());
    /// # Ok::<(), near_jsonrpc_client::Error>(())
    /// ```
    ///
    /// The hooks must come from the client's own snapshot:
    ///
    /// ```compile_fail
    /// use near_jsonrpc_client::RpcClient;
    /// use near_jsonrpc_client::snapshots::{v2_6, v2_7};
    ///
    /// let client = RpcClient::<v2_6::Api>::local()?.with_validation(v2_7::enable_validation());
    /// # Ok::<(), near_jsonrpc_client::Error>(())
    /// ```
    #[cfg(feature = "validation-mini")]
    pub fn with_validation(&self, validation: Validation<V>) -> Self {
        Self {
            validation: Some(validation),
            ..self.clone()
        }
    }

    /// The hooks set by [`RpcClient::with_validation`], if any.
    #[cfg(feature = "validation-mini")]
    pub fn validation(&self) -> Option<&Validation<V>> {
        self.validation.as_ref()
    }

    /// Every method of the snapshot, sorted by name.
    pub fn methods(&self) -> &'static [MethodDescriptor] {
        V::methods()
    }

    /// Looks a method up by server name (`EXPERIMENTAL_view_account`) or
    /// camelCase accessor (`experimentalViewAccount`).
    pub fn method(&self, name: &str) -> Option<MethodHandle<'_, V>> {
        V::find(name).map(|descriptor| MethodHandle::new(self, descriptor))
    }

    /// Sends one JSON-RPC call and returns its `result`.
    ///
    /// `None` params are sent as `null`. Transport failures, including 5xx
    /// statuses without an envelope, are retried up to `retries` times;
    /// everything else surfaces at once.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let params = params.unwrap_or(Value::Null);
        #[cfg(feature = "validation-mini")]
        if let Some(validation) = &self.validation {
            validation.validate_request(method, &params)?;
        }

        let body = RpcRequest::new(method, &params).to_bytes();
        match dispatch(&self.config, self.transport.as_ref(), method, &body).await? {
            RpcOutcome::Error(err) => Err(Error::Rpc(err)),
            RpcOutcome::Result(result) => {
                #[cfg(feature = "validation-mini")]
                if let Some(validation) = &self.validation {
                    validation.validate_response(method, &result)?;
                }
                Ok(result)
            }
        }
    }

    /// [`RpcClient::call`] with typed params and result. A result that does
    /// not decode into `R` is a response [`ValidationError`].
    pub async fn call_typed<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| ValidationError::unencodable(method, &err))?;
        let result = self.call(method, params).await?;
        serde_json::from_value(result).map_err(|err| {
            Error::Validation(ValidationError::undecodable(
                method,
                std::any::type_name::<R>(),
                &err,
            ))
        })
    }
}

/// Posts `body` until a JSON-RPC envelope comes back or the attempts run out.
async fn dispatch(
    config: &ClientConfig,
    transport: &dyn Transport,
    method: &str,
    body: &[u8],
) -> Result<RpcOutcome> {
    let attempts = config.retries.saturating_add(1);
    let request = TransportRequest {
        endpoint: &config.endpoint,
        headers: &config.headers,
        body,
        timeout: config.timeout(),
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        debug!(method, attempt, endpoint = %config.endpoint, "dispatching JSON-RPC call");
        let failure = match transport.post(request).await {
            Ok(response) => match parse_response(&response.body) {
                Ok(outcome) => return Ok(outcome),
                Err(_) if response.is_server_error() => TransportError::Status {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                },
                Err(_) if !response.is_success() => {
                    return Err(ProtocolError::Status {
                        status: response.status,
                        body: String::from_utf8_lossy(&response.body).into_owned(),
                    }
                    .into());
                }
                Err(err) => return Err(err.into()),
            },
            Err(err) => err,
        };
        if attempt >= attempts {
            return Err(Error::Network {
                attempts: attempt,
                source: failure,
            });
        }
        warn!(method, attempt, error = %failure, "transport failure, retrying");
    }
}
