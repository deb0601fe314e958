//! The per-snapshot method table and lookups over it.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::RpcClient;
use crate::error::Result;

/// One JSON-RPC method, as generated into a snapshot's `METHODS` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Server-side name, sent in the envelope.
    pub name: &'static str,
    /// OpenAPI path the method was declared under.
    pub path: &'static str,
    /// camelCase lookup name, e.g. `experimentalViewAccount`.
    pub accessor: &'static str,
    /// Rust type of the params, e.g. `RpcBlockRequest`.
    pub params: &'static str,
    /// Rust type of the result.
    pub result: &'static str,
    /// The method can be called without params.
    pub params_optional: bool,
}

/// The methods one API version exposes.
///
/// Implemented by each snapshot's generated `Api` marker. The table is a
/// `static`, built at compile time and never mutated.
pub trait ApiSurface: Send + Sync + 'static {
    const VERSION: &'static str;

    /// Sorted by [`MethodDescriptor::name`].
    fn methods() -> &'static [MethodDescriptor];

    /// Resolves a server name or a camelCase accessor.
    fn find(name: &str) -> Option<&'static MethodDescriptor> {
        let methods = Self::methods();
        match methods.binary_search_by(|method| method.name.cmp(name)) {
            Ok(index) => Some(&methods[index]),
            Err(_) => methods.iter().find(|method| method.accessor == name),
        }
    }
}

/// A method looked up at runtime, bound to a client.
///
/// Calls go through [`RpcClient::call`], exactly like the generated
/// accessors.
pub struct MethodHandle<'a, V> {
    client: &'a RpcClient<V>,
    descriptor: &'static MethodDescriptor,
}

impl<'a, V: ApiSurface> MethodHandle<'a, V> {
    pub(crate) fn new(client: &'a RpcClient<V>, descriptor: &'static MethodDescriptor) -> Self {
        Self { client, descriptor }
    }

    pub fn descriptor(&self) -> &'static MethodDescriptor {
        self.descriptor
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub async fn call(&self, params: Option<Value>) -> Result<Value> {
        self.client.call(self.descriptor.name, params).await
    }

    pub async fn call_typed<P, R>(&self, params: Option<P>) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        self.client.call_typed(self.descriptor.name, params).await
    }
}

impl<V> Clone for MethodHandle<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for MethodHandle<'_, V> {}

impl<V> std::fmt::Debug for MethodHandle<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandle")
            .field("method", &self.descriptor.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture;

    static METHODS: [MethodDescriptor; 3] = [
        MethodDescriptor {
            name: "EXPERIMENTAL_view_account",
            path: "/EXPERIMENTAL_view_account",
            accessor: "experimentalViewAccount",
            params: "RpcViewAccountRequest",
            result: "AccountView",
            params_optional: false,
        },
        MethodDescriptor {
            name: "block",
            path: "/block",
            accessor: "block",
            params: "RpcBlockRequest",
            result: "RpcBlockResponse",
            params_optional: false,
        },
        MethodDescriptor {
            name: "gas_price",
            path: "/gas_price",
            accessor: "gasPrice",
            params: "RpcGasPriceRequest",
            result: "RpcGasPriceResponse",
            params_optional: true,
        },
    ];

    impl ApiSurface for Fixture {
        const VERSION: &'static str = "test";

        fn methods() -> &'static [MethodDescriptor] {
            &METHODS
        }
    }

    #[test]
    fn finds_by_name_and_accessor() {
        assert_eq!(Fixture::find("gas_price").map(|m| m.path), Some("/gas_price"));
        assert_eq!(Fixture::find("gasPrice").map(|m| m.name), Some("gas_price"));
        assert_eq!(
            Fixture::find("experimentalViewAccount").map(|m| m.name),
            Some("EXPERIMENTAL_view_account")
        );
        assert_eq!(Fixture::find("block").map(|m| m.accessor), Some("block"));
        assert!(Fixture::find("chunk").is_none());
    }
}
