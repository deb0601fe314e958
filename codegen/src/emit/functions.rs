//! Per-method functions, client accessors and the method table.

use proc_macro2::TokenStream;
use quote::quote;

use super::{doc_attrs, rust_type};
use crate::methods::MethodDescriptor;
use crate::naming;

/// Contents of the `methods` module.
pub(super) fn emit_methods(methods: &[MethodDescriptor]) -> TokenStream {
    let consts = methods.iter().map(|method| {
        let ident = naming::ident(&method.const_name);
        let name = &method.name;
        let doc = format!(" `{name}`");
        quote! {
            #[doc = #doc]
            pub const #ident: &str = #name;
        }
    });

    let functions = methods.iter().map(|method| {
        let doc = doc_attrs(method.summary.as_deref());
        let fn_ident = naming::ident(&method.fn_name);
        let const_ident = naming::ident(&method.const_name);
        let result = rust_type(&method.result);
        let params = rust_type(&method.params);

        let (arg, call) = if method.params_empty {
            (
                quote!(),
                quote!(client.call_typed(#const_ident, ::core::option::Option::<()>::None)),
            )
        } else if method.params_optional {
            (
                quote!(params: ::core::option::Option<#params>),
                quote!(client.call_typed(#const_ident, params)),
            )
        } else {
            (
                quote!(params: #params),
                quote!(client.call_typed(#const_ident, ::core::option::Option::Some(params))),
            )
        };
        let forward = if method.params_empty {
            quote!(#fn_ident(self).await)
        } else {
            quote!(#fn_ident(self, params).await)
        };
        let self_args = if method.params_empty {
            quote!(&self)
        } else {
            quote!(&self, #arg)
        };
        let free_args = if method.params_empty {
            quote!(client: &Client)
        } else {
            quote!(client: &Client, #arg)
        };

        let function = quote! {
            #doc
            pub async fn #fn_ident(#free_args) -> crate::Result<#result> {
                #call.await
            }
        };
        let accessor = quote! {
            #doc
            pub async fn #fn_ident(#self_args) -> crate::Result<#result> {
                #forward
            }
        };
        (function, accessor)
    });
    let (functions, accessors): (Vec<_>, Vec<_>) = functions.unzip();

    quote! {
        #[allow(unused_imports)]
        use super::types::*;
        use super::Client;

        #(#consts)*

        #(#functions)*

        impl Client {
            #(#accessors)*
        }
    }
}

/// The method table, the surface marker type and the client alias.
pub(super) fn emit_surface(methods: &[MethodDescriptor]) -> TokenStream {
    let len = methods.len();
    let entries = methods.iter().map(|method| {
        let name = &method.name;
        let path = &method.path;
        let accessor = &method.accessor;
        let params = method.params.to_string();
        let result = method.result.to_string();
        let optional = method.params_optional;
        quote! {
            crate::MethodDescriptor {
                name: #name,
                path: #path,
                accessor: #accessor,
                params: #params,
                result: #result,
                params_optional: #optional,
            }
        }
    });

    quote! {
        /// Every method of this snapshot, sorted by name.
        pub static METHODS: [crate::MethodDescriptor; #len] = [#(#entries),*];

        /// Marker for this snapshot's method surface.
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct Api;

        impl crate::ApiSurface for Api {
            const VERSION: &'static str = VERSION;

            fn methods() -> &'static [crate::MethodDescriptor] {
                &METHODS
            }
        }

        /// A client bound to this snapshot.
        pub type Client = crate::RpcClient<Api>;
    }
}
