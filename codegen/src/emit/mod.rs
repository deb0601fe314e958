//! Rendering an [`Analysis`] into the Rust source of one snapshot module.

mod functions;
mod helpers;
mod types;
mod validators;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::Analysis;
use crate::error::Result;
use crate::methods::GeneratorOptions;
use crate::naming;
use crate::schema::TypeRef;

/// Renders the complete contents of one snapshot file.
///
/// The output has no inner attributes so it can be pulled in with
/// `include!` inside a `mod` block.
pub(crate) fn render_snapshot(analysis: &Analysis, version: &str, options: &GeneratorOptions) -> Result<String> {
    let types = types::emit(&analysis.schemas);
    let helpers = if options.client_helpers {
        helpers::emit(&analysis.schemas)?
    } else {
        TokenStream::new()
    };
    let methods = functions::emit_methods(&analysis.methods);
    let surface = functions::emit_surface(&analysis.methods);
    let validators = validators::emit(&analysis.schemas, &analysis.methods);

    let tokens = quote! {
        pub const VERSION: &str = #version;

        pub mod types {
            #types
        }

        pub mod methods {
            #methods
        }

        #[cfg(feature = "validation-mini")]
        pub mod validators {
            #validators
        }

        /// Validation hooks for this snapshot's methods.
        #[cfg(feature = "validation-mini")]
        pub fn enable_validation() -> crate::Validation<Api> {
            crate::Validation::new(validators::request_schema, validators::response_schema)
        }

        #surface

        #helpers
    };

    let source = match &analysis.title {
        Some(title) => format!("{title} {version}"),
        None => version.to_owned(),
    };
    Ok(format!(
        "// @generated by near-jsonrpc-codegen from {source}. Do not edit.\n\n{}",
        format_tokens(tokens)
    ))
}

pub(crate) fn format_tokens(tokens: TokenStream) -> String {
    let code = tokens.to_string();
    prettyplease_format(&code).unwrap_or(code)
}

fn prettyplease_format(code: &str) -> Option<String> {
    let syntax_tree = syn::parse_file(code).ok()?;
    Some(prettyplease::unparse(&syntax_tree))
}

/// `#[doc]` attributes for an optional description.
pub(crate) fn doc_attrs(doc: Option<&str>) -> TokenStream {
    let Some(doc) = doc.map(str::trim).filter(|doc| !doc.is_empty()) else {
        return TokenStream::new();
    };
    let lines = doc.lines().map(|line| match line.trim_end() {
        "" => String::new(),
        line => format!(" {line}"),
    });
    quote! { #( #[doc = #lines] )* }
}

/// The Rust type a [`TypeRef`] maps to inside the `types` module.
pub(crate) fn rust_type(ty: &TypeRef) -> TokenStream {
    match ty {
        TypeRef::Named(name) => {
            let ident = naming::ident(name);
            quote!(#ident)
        }
        TypeRef::String { .. } => quote!(::std::string::String),
        TypeRef::Integer(kind) => {
            let ident = format_ident!("{}", kind.rust_name());
            quote!(#ident)
        }
        TypeRef::Number => quote!(f64),
        TypeRef::Boolean => quote!(bool),
        TypeRef::Null => quote!(()),
        TypeRef::Any => quote!(::serde_json::Value),
        TypeRef::Array(item) => {
            let item = rust_type(item);
            quote!(::std::vec::Vec<#item>)
        }
        TypeRef::Map(value) => {
            let value = rust_type(value);
            quote!(::std::collections::BTreeMap<::std::string::String, #value>)
        }
        TypeRef::Nullable(inner) => {
            let inner = rust_type(inner);
            quote!(::std::option::Option<#inner>)
        }
    }
}

/// Drops all whitespace so assertions do not depend on line breaking.
#[cfg(test)]
pub(crate) fn compact(code: &str) -> String {
    code.split_whitespace().collect()
}
