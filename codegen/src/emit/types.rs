use std::collections::{BTreeMap, BTreeSet};

use proc_macro2::TokenStream;
use quote::quote;

use super::{doc_attrs, rust_type};
use crate::naming;
use crate::schema::{Field, SchemaDescriptor, SchemaKind, SchemaSet, TypeRef, UnionMember};

/// Every schema of the set as a Rust item, in name order.
pub(super) fn emit(set: &SchemaSet) -> TokenStream {
    let recursion = Recursion::new(set);
    let items = set.iter().map(|desc| emit_schema(set, &recursion, desc));
    quote! { #(#items)* }
}

/// Which named types each schema reaches by value. `Vec` and map edges add
/// indirection of their own and are not followed.
#[derive(Default)]
struct Recursion {
    reach: BTreeMap<String, BTreeSet<String>>,
}

impl Recursion {
    fn new(set: &SchemaSet) -> Self {
        let mut reach = BTreeMap::new();
        for desc in set.iter() {
            let mut seen = BTreeSet::new();
            let mut stack: Vec<String> = inline_edges(desc).into_iter().collect();
            while let Some(name) = stack.pop() {
                if let Some(next) = set.get(&name)
                    && seen.insert(name)
                {
                    stack.extend(inline_edges(next));
                }
            }
            reach.insert(desc.name.clone(), seen);
        }
        Self { reach }
    }

    /// `true` when `owner` holding `ty` by value would make it infinitely
    /// sized.
    fn needs_box(&self, owner: &str, ty: &TypeRef) -> bool {
        let mut targets = BTreeSet::new();
        held_by_value(ty, &mut targets);
        targets
            .iter()
            .any(|target| target == owner || self.reach.get(target).is_some_and(|r| r.contains(owner)))
    }

    /// The field or variant type, boxed where it closes a cycle.
    fn member_type(&self, owner: &str, ty: &TypeRef) -> TokenStream {
        if self.needs_box(owner, ty) {
            boxed_type(ty)
        } else {
            rust_type(ty)
        }
    }
}

fn held_by_value(ty: &TypeRef, out: &mut BTreeSet<String>) {
    match ty {
        TypeRef::Named(name) => {
            out.insert(name.clone());
        }
        TypeRef::Nullable(inner) => held_by_value(inner, out),
        _ => {}
    }
}

fn inline_edges(desc: &SchemaDescriptor) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    match &desc.kind {
        SchemaKind::Object { fields, .. } => fields.iter().for_each(|f| held_by_value(&f.ty, &mut out)),
        SchemaKind::Union { members } => members.iter().for_each(|m| held_by_value(&m.ty, &mut out)),
        SchemaKind::Alias(target) => held_by_value(target, &mut out),
        SchemaKind::StringEnum { .. } => {}
    }
    out
}

fn boxed_type(ty: &TypeRef) -> TokenStream {
    match ty {
        TypeRef::Named(_) => {
            let inner = rust_type(ty);
            quote!(::std::boxed::Box<#inner>)
        }
        TypeRef::Nullable(inner) => {
            let inner = boxed_type(inner);
            quote!(::std::option::Option<#inner>)
        }
        other => rust_type(other),
    }
}

fn emit_schema(set: &SchemaSet, recursion: &Recursion, desc: &SchemaDescriptor) -> TokenStream {
    let doc = doc_attrs(desc.doc.as_deref());
    let name = naming::ident(&desc.name);
    let body = match &desc.kind {
        SchemaKind::Object { fields, closed } => emit_object(&name, fields, *closed, |ty| {
            recursion.member_type(&desc.name, ty)
        }),
        SchemaKind::Union { members } => emit_union(set, &name, members, |ty| {
            recursion.needs_box(&desc.name, ty)
        }),
        SchemaKind::StringEnum { values } => emit_string_enum(&name, values),
        SchemaKind::Alias(TypeRef::Named(target)) => {
            let target = naming::ident(target);
            quote! { pub type #name = #target; }
        }
        SchemaKind::Alias(TypeRef::Null) => quote! { pub type #name = (); },
        SchemaKind::Alias(inner) => emit_newtype(&name, inner, recursion.member_type(&desc.name, inner)),
    };
    quote! {
        #doc
        #body
    }
}

fn emit_object(
    name: &proc_macro2::Ident,
    fields: &[Field],
    closed: bool,
    field_type: impl Fn(&TypeRef) -> TokenStream,
) -> TokenStream {
    let mut used = BTreeSet::new();
    let mut all_optional = true;
    let fields: Vec<TokenStream> = fields
        .iter()
        .map(|field| {
            let rust_name = naming::claim(&mut used, naming::field_name(&field.wire_name));
            let ident = naming::ident(&rust_name);
            let doc = doc_attrs(field.doc.as_deref());
            let rename = (ident != field.wire_name.as_str()).then(|| {
                let wire = &field.wire_name;
                quote! { #[serde(rename = #wire)] }
            });

            let (ty, optional_attr) = if field.required {
                (field_type(&field.ty), None)
            } else {
                let ty = match &field.ty {
                    TypeRef::Nullable(_) => field_type(&field.ty),
                    other => {
                        let inner = field_type(other);
                        quote!(::std::option::Option<#inner>)
                    }
                };
                let attr = quote! {
                    #[serde(default, skip_serializing_if = "::std::option::Option::is_none")]
                };
                (ty, Some(attr))
            };
            all_optional &= !field.required || matches!(field.ty, TypeRef::Nullable(_));

            quote! {
                #doc
                #rename
                #optional_attr
                pub #ident: #ty,
            }
        })
        .collect();

    let default = all_optional.then(|| quote!(Default,));
    let deny = closed.then(|| quote! { #[serde(deny_unknown_fields)] });
    quote! {
        #[derive(Clone, Debug, #default PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #deny
        pub struct #name {
            #(#fields)*
        }
    }
}

fn emit_union(
    set: &SchemaSet,
    name: &proc_macro2::Ident,
    members: &[UnionMember],
    boxed: impl Fn(&TypeRef) -> bool,
) -> TokenStream {
    let variants = members.iter().map(|member| {
        let variant = naming::ident(&member.variant);
        match &member.ty {
            TypeRef::Null => quote! { #variant, },
            ty if boxed(ty) => {
                let ty = boxed_type(ty);
                quote! { #variant(#ty), }
            }
            ty => {
                let ty = rust_type(ty);
                quote! { #variant(#ty), }
            }
        }
    });

    // A `From` impl per member type that no other member shares.
    let key = |ty: &TypeRef| rust_type(&resolve_alias(set, ty)).to_string();
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for member in members {
        *seen.entry(key(&member.ty)).or_default() += 1;
    }
    let conversions = members.iter().filter_map(|member| {
        let ty = rust_type(&member.ty);
        let canonical = key(&member.ty);
        if resolve_alias(set, &member.ty) == TypeRef::Null
            || seen[&canonical] > 1
            || canonical == name.to_string()
        {
            return None;
        }
        let variant = naming::ident(&member.variant);
        let value = match &member.ty {
            TypeRef::Named(_) if boxed(&member.ty) => quote!(::std::boxed::Box::new(value)),
            other if boxed(other) => return None,
            _ => quote!(value),
        };
        Some(quote! {
            impl ::std::convert::From<#ty> for #name {
                fn from(value: #ty) -> Self {
                    Self::#variant(#value)
                }
            }
        })
    });

    quote! {
        #[derive(Clone, Debug, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(untagged)]
        pub enum #name {
            #(#variants)*
        }

        #(#conversions)*
    }
}

/// Follows `pub type` aliases to the type they name.
fn resolve_alias(set: &SchemaSet, ty: &TypeRef) -> TypeRef {
    let mut current = ty.clone();
    for _ in 0..32 {
        let TypeRef::Named(name) = &current else {
            break;
        };
        match set.get(name).map(|desc| &desc.kind) {
            Some(SchemaKind::Alias(target @ (TypeRef::Named(_) | TypeRef::Null))) => {
                current = target.clone();
            }
            _ => break,
        }
    }
    current
}

fn emit_string_enum(name: &proc_macro2::Ident, values: &[String]) -> TokenStream {
    let mut used = BTreeSet::new();
    let variants: Vec<_> = values
        .iter()
        .map(|value| naming::ident(&naming::claim(&mut used, naming::variant_name(value))))
        .collect();

    let single = values.len() == 1;
    let default = single.then(|| quote!(Default,));
    let default_attr = single.then(|| quote!(#[default]));
    let decls = variants.iter().zip(values).map(|(variant, value)| {
        quote! {
            #default_attr
            #[serde(rename = #value)]
            #variant,
        }
    });
    let arms = variants.iter().zip(values).map(|(variant, value)| {
        quote! { Self::#variant => #value, }
    });

    quote! {
        #[derive(
            Clone, Copy, Debug, #default PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize
        )]
        pub enum #name {
            #(#decls)*
        }

        impl #name {
            /// The wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    #(#arms)*
                }
            }
        }

        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    }
}

fn emit_newtype(name: &proc_macro2::Ident, inner: &TypeRef, ty: TokenStream) -> TokenStream {
    let scalar = matches!(
        inner,
        TypeRef::String { .. } | TypeRef::Integer(_) | TypeRef::Boolean
    );
    let ordered = scalar.then(|| quote!(Eq, Hash, PartialOrd, Ord,));

    let display = scalar.then(|| {
        quote! {
            impl ::std::fmt::Display for #name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::fmt::Display::fmt(&self.0, f)
                }
            }
        }
    });
    let from_str = matches!(inner, TypeRef::String { .. }).then(|| {
        quote! {
            impl ::std::convert::From<&str> for #name {
                fn from(value: &str) -> Self {
                    Self(value.to_owned())
                }
            }
        }
    });

    quote! {
        #[derive(Clone, Debug, PartialEq, #ordered ::serde::Serialize, ::serde::Deserialize)]
        #[serde(transparent)]
        pub struct #name(pub #ty);

        impl ::std::convert::From<#ty> for #name {
            fn from(value: #ty) -> Self {
                Self(value)
            }
        }

        #from_str
        #display
    }
}
