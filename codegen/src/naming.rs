//! Turning OpenAPI names into Rust identifiers.

use std::collections::BTreeSet;

use heck::{ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use proc_macro2::{Ident, Span};

/// Replaces every character that cannot appear in an identifier with `_`.
pub(crate) fn sanitize(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() {
        out.push_str("Unnamed");
    } else if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// `true` for a plain identifier that is not a keyword.
pub(crate) fn is_plain_ident(s: &str) -> bool {
    syn::parse_str::<Ident>(s).is_ok()
}

/// Builds an identifier from sanitized text, falling back to a raw identifier
/// for keywords.
pub(crate) fn ident(s: &str) -> Ident {
    match s {
        "self" | "Self" | "super" | "crate" | "_" => Ident::new(&format!("{s}_"), Span::call_site()),
        _ if is_plain_ident(s) => Ident::new(s, Span::call_site()),
        _ => Ident::new_raw(s, Span::call_site()),
    }
}

/// Type names are the component keys themselves, minus characters Rust
/// cannot accept.
pub(crate) fn type_name(schema_key: &str) -> String {
    sanitize(schema_key)
}

pub(crate) fn field_name(wire_name: &str) -> String {
    with_fallback(sanitize(wire_name).to_snake_case(), "field_")
}

pub(crate) fn fn_name(method: &str) -> String {
    with_fallback(sanitize(method).to_snake_case(), "method_")
}

/// The camelCase accessor under which a method can be looked up at runtime.
pub(crate) fn accessor(method: &str) -> String {
    sanitize(method).to_lower_camel_case()
}

pub(crate) fn const_name(method: &str) -> String {
    with_fallback(sanitize(method).to_shouty_snake_case(), "M_")
}

pub(crate) fn static_name(type_name: &str) -> String {
    with_fallback(type_name.to_shouty_snake_case(), "S_")
}

pub(crate) fn variant_name(text: &str) -> String {
    with_fallback(sanitize(text).to_upper_camel_case(), "V")
}

/// Suffix for a PascalCase name built from a property or method name.
pub(crate) fn pascal(text: &str) -> String {
    sanitize(text).to_upper_camel_case()
}

fn with_fallback(converted: String, prefix: &str) -> String {
    if converted.is_empty() || converted.starts_with(|c: char| c.is_ascii_digit()) {
        format!("{prefix}{converted}")
    } else {
        converted
    }
}

/// Returns `candidate`, or `candidate2`, `candidate3`... whichever is not in
/// `used` yet, and records it.
pub(crate) fn claim(used: &mut BTreeSet<String>, candidate: String) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let next = format!("{candidate}{n}");
        if used.insert(next.clone()) {
            return next;
        }
        n += 1;
    }
}
