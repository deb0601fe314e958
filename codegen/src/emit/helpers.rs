//! Hooks a snapshot into the client's hand-written query and token helpers.
//!
//! The helper bodies live in the runtime crate as macros. Each snapshot
//! invokes them with its own `types`, once the types they touch have the
//! shape the bodies expect.

use proc_macro2::TokenStream;
use quote::quote;

use crate::error::{GenerationError, Result};
use crate::naming;
use crate::schema::{Field, IntegerKind, SchemaKind, SchemaSet, TypeRef};

/// Wire values the client's own `Finality` understands.
const FINALITY: [&str; 3] = ["optimistic", "near-final", "final"];
const SYNC_CHECKPOINT: [&str; 2] = ["genesis", "earliest_available"];

fn unusable(name: &str, reason: impl Into<String>) -> GenerationError {
    GenerationError::HelperType {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

fn kind<'s>(set: &'s SchemaSet, name: &str) -> Result<&'s SchemaKind> {
    set.get(name)
        .map(|desc| &desc.kind)
        .ok_or_else(|| unusable(name, "is not defined"))
}

fn object<'s>(set: &'s SchemaSet, name: &str) -> Result<&'s [Field]> {
    match kind(set, name)? {
        SchemaKind::Object { fields, .. } => Ok(fields),
        _ => Err(unusable(name, "is not an object")),
    }
}

fn required_field(owner: &str, fields: &[Field], wire_name: &str, ok: impl Fn(&TypeRef) -> bool) -> Result<()> {
    match fields.iter().find(|field| field.wire_name == wire_name) {
        Some(field) if field.required && ok(&field.ty) => Ok(()),
        Some(_) => Err(unusable(owner, format!("has an unexpected `{wire_name}` field"))),
        None => Err(unusable(owner, format!("has no `{wire_name}` field"))),
    }
}

fn newtype(set: &SchemaSet, name: &str, ok: impl Fn(&TypeRef) -> bool, expected: &str) -> Result<()> {
    match kind(set, name)? {
        SchemaKind::Alias(inner) if ok(inner) => Ok(()),
        _ => Err(unusable(name, format!("is not {expected}"))),
    }
}

fn string_enum(set: &SchemaSet, name: &str, known: &[&str]) -> Result<()> {
    match kind(set, name)? {
        SchemaKind::StringEnum { values } => match values.iter().find(|v| !known.contains(&v.as_str())) {
            Some(value) => Err(unusable(name, format!("has the unknown value `{value}`"))),
            None => Ok(()),
        },
        _ => Err(unusable(name, "is not a string enum")),
    }
}

fn is_string(ty: &TypeRef) -> bool {
    matches!(ty, TypeRef::String { .. })
}

/// Variant names of `BlockId`'s height and hash members.
fn block_id_variants(set: &SchemaSet) -> Result<(String, String)> {
    const NAME: &str = "BlockId";
    let SchemaKind::Union { members } = kind(set, NAME)? else {
        return Err(unusable(NAME, "is not a union"));
    };
    let is_hash = |ty: &TypeRef| match ty {
        TypeRef::Named(target) => {
            matches!(set.get(target).map(|desc| &desc.kind), Some(SchemaKind::Alias(inner)) if is_string(inner))
        }
        _ => false,
    };
    let height = members
        .iter()
        .find(|member| member.ty == TypeRef::Integer(IntegerKind::U64));
    let hash = members.iter().find(|member| is_hash(&member.ty));
    match (height, hash) {
        (Some(height), Some(hash)) if members.len() == 2 => Ok((height.variant.clone(), hash.variant.clone())),
        _ => Err(unusable(NAME, "is not a block height or a named hash")),
    }
}

/// Invocations of the query and token helper macros for one snapshot.
pub(super) fn emit(set: &SchemaSet) -> Result<TokenStream> {
    object(set, "AccountView")?;
    object(set, "AccessKeyView")?;
    let call_result = object(set, "CallResult")?;
    required_field("CallResult", call_result, "result", |ty| {
        *ty == TypeRef::Array(Box::new(TypeRef::Integer(IntegerKind::U8)))
    })?;
    required_field("CallResult", call_result, "logs", |ty| {
        matches!(ty, TypeRef::Array(item) if is_string(item))
    })?;

    newtype(set, "AccountId", is_string, "a string")?;
    newtype(set, "PublicKey", is_string, "a string")?;
    newtype(set, "NearToken", is_string, "a decimal string")?;
    newtype(set, "NearGas", |ty| *ty == TypeRef::Integer(IntegerKind::U64), "a u64")?;
    string_enum(set, "Finality", &FINALITY)?;
    string_enum(set, "SyncCheckpoint", &SYNC_CHECKPOINT)?;
    let (height, hash) = block_id_variants(set)?;

    let height = naming::ident(&height);
    let hash = naming::ident(&hash);
    Ok(quote! {
        crate::query_helpers::impl_query_surface!(types, Api, BlockId { height: #height, hash: #hash });
        crate::token_helpers::impl_token_helpers!(types);
    })
}
