//! Static validation schemas, one `pub static` per type plus lookups by
//! method name.

use std::collections::{BTreeMap, BTreeSet};

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::methods::MethodDescriptor;
use crate::naming;
use crate::schema::{IntegerKind, SchemaKind, SchemaSet, TypeRef};

/// Static names handed out for one snapshot.
struct Statics {
    used: BTreeSet<String>,
    schemas: BTreeMap<String, Ident>,
    anonymous: BTreeMap<TypeRef, Ident>,
}

impl Statics {
    fn new(set: &SchemaSet, anonymous: BTreeSet<TypeRef>) -> Self {
        let mut used = BTreeSet::new();
        let schemas = set
            .iter()
            .map(|desc| {
                let name = naming::claim(&mut used, naming::static_name(&desc.name));
                (desc.name.clone(), format_ident!("{}", name))
            })
            .collect();
        let anonymous = anonymous
            .into_iter()
            .enumerate()
            .map(|(index, ty)| {
                let name = naming::claim(&mut used, format!("TYPE_{index}"));
                (ty, format_ident!("{}", name))
            })
            .collect();
        Self {
            used,
            schemas,
            anonymous,
        }
    }

    fn aux(&mut self, owner: &Ident, suffix: &str) -> Ident {
        format_ident!("{}", naming::claim(&mut self.used, format!("{owner}_{suffix}")))
    }

    /// The static that describes `ty`.
    fn of(&self, ty: &TypeRef) -> &Ident {
        match ty {
            TypeRef::Named(name) => &self.schemas[name],
            other => &self.anonymous[other],
        }
    }
}

/// Collects every anonymous type reachable from `ty`.
fn collect(ty: &TypeRef, out: &mut BTreeSet<TypeRef>) {
    match ty {
        TypeRef::Named(_) => return,
        TypeRef::Array(inner) | TypeRef::Map(inner) | TypeRef::Nullable(inner) => collect(inner, out),
        _ => {}
    }
    out.insert(ty.clone());
}

/// The lookup type for a method's params.
fn request_type(method: &MethodDescriptor) -> TypeRef {
    if method.params_empty {
        TypeRef::Any
    } else if method.params_optional {
        method.params.clone().nullable()
    } else {
        method.params.clone()
    }
}

pub(super) fn emit(set: &SchemaSet, methods: &[MethodDescriptor]) -> TokenStream {
    let mut anonymous = BTreeSet::new();
    for desc in set.iter() {
        match &desc.kind {
            SchemaKind::Object { fields, .. } => {
                fields.iter().for_each(|field| collect(&field.ty, &mut anonymous));
            }
            SchemaKind::Union { members } => {
                members.iter().for_each(|member| collect(&member.ty, &mut anonymous));
            }
            SchemaKind::Alias(target) => collect(target, &mut anonymous),
            SchemaKind::StringEnum { .. } => {}
        }
    }
    for method in methods {
        collect(&request_type(method), &mut anonymous);
        collect(&method.result, &mut anonymous);
    }

    let mut statics = Statics::new(set, anonymous);
    let mut items = Vec::new();

    for desc in set.iter() {
        let ident = statics.schemas[&desc.name].clone();
        let name = &desc.name;
        let value = match &desc.kind {
            SchemaKind::Object { fields, closed } => {
                let fields_ident = statics.aux(&ident, "FIELDS");
                let len = fields.len();
                let entries = fields.iter().map(|field| {
                    let wire = &field.wire_name;
                    let schema = statics.of(&field.ty);
                    let required = field.required;
                    quote! { Field { name: #wire, schema: &#schema, required: #required } }
                });
                items.push(quote! {
                    static #fields_ident: [Field; #len] = [#(#entries),*];
                });
                quote! { Schema::Object { name: #name, fields: &#fields_ident, closed: #closed } }
            }
            SchemaKind::Union { members } => {
                let members_ident = statics.aux(&ident, "MEMBERS");
                let len = members.len();
                let entries = members.iter().map(|member| statics.of(&member.ty));
                items.push(quote! {
                    static #members_ident: [&Schema; #len] = [#(&#entries),*];
                });
                quote! { Schema::Union { name: #name, members: &#members_ident } }
            }
            SchemaKind::StringEnum { values } => {
                quote! { Schema::Enum { name: #name, values: &[#(#values),*] } }
            }
            SchemaKind::Alias(target) => {
                let target = statics.of(target);
                quote! { Schema::Alias { name: #name, target: &#target } }
            }
        };
        let doc = format!(" Validation schema of `{name}`.");
        items.push(quote! {
            #[doc = #doc]
            pub static #ident: Schema = #value;
        });
    }

    for (ty, ident) in &statics.anonymous {
        let value = anonymous_schema(&statics, ty);
        items.push(quote! { static #ident: Schema = #value; });
    }

    let request_arms = methods.iter().map(|method| {
        let name = &method.name;
        let schema = statics.of(&request_type(method));
        quote! { #name => ::core::option::Option::Some(&#schema), }
    });
    let response_arms = methods.iter().map(|method| {
        let name = &method.name;
        let schema = statics.of(&method.result);
        quote! { #name => ::core::option::Option::Some(&#schema), }
    });

    quote! {
        #[allow(unused_imports)]
        use crate::validation::{Field, IntegerKind, Schema};

        /// Schema of the `params` a method accepts.
        pub fn request_schema(method: &str) -> ::core::option::Option<&'static Schema> {
            match method {
                #(#request_arms)*
                _ => ::core::option::Option::None,
            }
        }

        /// Schema of the `result` a method returns.
        pub fn response_schema(method: &str) -> ::core::option::Option<&'static Schema> {
            match method {
                #(#response_arms)*
                _ => ::core::option::Option::None,
            }
        }

        #(#items)*
    }
}

fn anonymous_schema(statics: &Statics, ty: &TypeRef) -> TokenStream {
    let some = |value: &Option<String>| match value {
        Some(value) => quote!(::core::option::Option::Some(#value)),
        None => quote!(::core::option::Option::None),
    };
    match ty {
        TypeRef::String { pattern, format } => {
            let pattern = some(pattern);
            let format = some(format);
            quote! { Schema::String { pattern: #pattern, format: #format } }
        }
        TypeRef::Integer(kind) => {
            let kind = integer_kind(*kind);
            quote! { Schema::Integer(IntegerKind::#kind) }
        }
        TypeRef::Number => quote!(Schema::Number),
        TypeRef::Boolean => quote!(Schema::Boolean),
        TypeRef::Null => quote!(Schema::Null),
        TypeRef::Any => quote!(Schema::Any),
        TypeRef::Array(inner) => {
            let inner = statics.of(inner);
            quote!(Schema::Array(&#inner))
        }
        TypeRef::Map(inner) => {
            let inner = statics.of(inner);
            quote!(Schema::Map(&#inner))
        }
        TypeRef::Nullable(inner) => {
            let inner = statics.of(inner);
            quote!(Schema::Nullable(&#inner))
        }
        TypeRef::Named(_) => unreachable!("named types have their own static"),
    }
}

fn integer_kind(kind: IntegerKind) -> Ident {
    format_ident!("{}", kind.variant())
}
