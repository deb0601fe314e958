//! Method table derivation: operation ids become JSON-RPC method names, and
//! request/response bodies become params/result types.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{GenerationError, Result};
use crate::loader::{Operation, SpecDocument};
use crate::naming;
use crate::schema::{SchemaBuilder, TypeRef};

static METHOD_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").expect("method name pattern is valid")
});

const JSON_CONTENT: &str = "application/json";

/// Knobs for one generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Prefixes removed from operation ids before they become method names.
    /// The first matching prefix wins.
    pub strip_prefixes: Vec<String>,
    /// Function names the hand-written client already defines. A method
    /// whose function or accessor name lands here fails generation.
    pub reserved_accessors: BTreeSet<String>,
    /// Hook every snapshot into the client's query and token helpers. A
    /// document lacking the types they build on then fails generation.
    pub client_helpers: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            strip_prefixes: vec!["rpc_".to_owned()],
            reserved_accessors: BTreeSet::new(),
            client_helpers: false,
        }
    }
}

impl GeneratorOptions {
    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefixes.push(prefix.into());
        self
    }

    pub fn reserve<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_accessors
            .extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_client_helpers(mut self) -> Self {
        self.client_helpers = true;
        self
    }

    fn method_name<'s>(&self, operation_id: &'s str) -> &'s str {
        self.strip_prefixes
            .iter()
            .find_map(|prefix| operation_id.strip_prefix(prefix.as_str()))
            .unwrap_or(operation_id)
    }
}

/// One JSON-RPC method of a document.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodDescriptor {
    /// The OpenAPI path the method was declared under.
    pub path: String,
    /// Server-side method name, as sent in the envelope.
    pub name: String,
    /// camelCase lookup name.
    pub accessor: String,
    pub fn_name: String,
    pub const_name: String,
    pub summary: Option<String>,
    pub params: TypeRef,
    pub result: TypeRef,
    pub params_optional: bool,
    /// The params schema carries nothing; the generated function takes no
    /// argument and always sends `null`.
    pub params_empty: bool,
}

/// Builds one descriptor per method-bearing operation, sorted by method name.
pub(crate) fn collect_methods(
    doc: &SpecDocument,
    builder: &mut SchemaBuilder<'_>,
    options: &GeneratorOptions,
) -> Result<Vec<MethodDescriptor>> {
    let mut by_name: BTreeMap<String, MethodDescriptor> = BTreeMap::new();
    let mut by_path: BTreeMap<&str, String> = BTreeMap::new();
    let mut accessors: BTreeMap<String, String> = BTreeMap::new();

    for op in doc.operations() {
        let operation_id = op.operation_id().ok_or_else(|| GenerationError::MissingOperationId {
            path: op.path.to_owned(),
        })?;
        let name = options.method_name(operation_id);
        if !METHOD_NAME.is_match(name) {
            return Err(GenerationError::InvalidMethodName {
                path: op.path.to_owned(),
                operation_id: operation_id.to_owned(),
            });
        }
        if let Some(existing) = by_name.get(name) {
            return Err(GenerationError::DuplicateMethod {
                method: name.to_owned(),
                first: existing.path.clone(),
                second: op.path.to_owned(),
            });
        }
        if let Some(existing) = by_path.insert(op.path, name.to_owned()) {
            return Err(GenerationError::InvalidOperation {
                method: name.to_owned(),
                reason: format!("path `{}` already declares method `{existing}`", op.path),
            });
        }

        let accessor = naming::accessor(name);
        let fn_name = naming::fn_name(name);
        for reserved in [&accessor, &fn_name] {
            if options.reserved_accessors.contains(reserved) {
                return Err(GenerationError::ReservedAccessor {
                    method: name.to_owned(),
                    accessor: reserved.clone(),
                });
            }
        }
        for key in [&accessor, &fn_name] {
            if let Some(first) = accessors.insert(key.clone(), name.to_owned())
                && first != name
            {
                return Err(GenerationError::AccessorCollision {
                    accessor: key.clone(),
                    first,
                    second: name.to_owned(),
                });
            }
        }

        let descriptor = describe_operation(builder, &op, name, accessor, fn_name)?;
        debug!(
            method = %descriptor.name,
            params = %descriptor.params,
            result = %descriptor.result,
            optional = descriptor.params_optional,
            "collected method"
        );
        by_name.insert(name.to_owned(), descriptor);
    }

    Ok(by_name.into_values().collect())
}

fn describe_operation(
    builder: &mut SchemaBuilder<'_>,
    op: &Operation<'_>,
    name: &str,
    accessor: String,
    fn_name: String,
) -> Result<MethodDescriptor> {
    let stem = naming::pascal(name);

    let request_body = op.body.get("requestBody");
    let (params, params_optional, params_empty) = match request_body.and_then(json_schema) {
        None => (TypeRef::Null, true, true),
        Some(schema) => {
            let params_schema = unwrap_request_envelope(builder, schema, name)?;
            // OpenAPI defaults `requestBody.required` to false.
            let required = request_body
                .and_then(|body| body.get("required"))
                .and_then(Value::as_bool);
            if required.is_none() {
                debug!(method = name, "requestBody does not set `required`, params are optional");
            }
            let declared_optional = required != Some(true);
            let empty = is_empty_schema(builder.deref(params_schema, name)?);
            let ty = builder.type_of(params_schema, &format!("{stem}Params"))?;
            (ty, declared_optional || empty, empty)
        }
    };

    let response = op
        .body
        .pointer("/responses/200")
        .and_then(json_schema);
    let result = match response {
        None => TypeRef::Any,
        Some(schema) => {
            let result_schema = unwrap_response_envelope(builder, schema, name)?;
            builder.type_of(result_schema, &format!("{stem}Result"))?
        }
    };

    Ok(MethodDescriptor {
        path: op.path.to_owned(),
        name: name.to_owned(),
        const_name: naming::const_name(name),
        accessor,
        fn_name,
        summary: op.summary().map(str::to_owned),
        params,
        result,
        params_optional,
        params_empty,
    })
}

fn json_schema(body: &Value) -> Option<&Value> {
    body.get("content")?.get(JSON_CONTENT)?.get("schema")
}

/// Returns the `params` schema when `schema` is a JSON-RPC request envelope,
/// `schema` itself otherwise.
fn unwrap_request_envelope<'s>(
    builder: &SchemaBuilder<'s>,
    schema: &'s Value,
    method: &str,
) -> Result<&'s Value> {
    let resolved = builder.deref(schema, method)?;
    let Some(properties) = resolved.get("properties").and_then(Value::as_object) else {
        return Ok(schema);
    };
    if !["jsonrpc", "method", "params"]
        .iter()
        .all(|key| properties.contains_key(*key))
    {
        return Ok(schema);
    }

    let method_schema = builder.deref(&properties["method"], method)?;
    if let Some(names) = method_schema.get("enum").and_then(Value::as_array)
        && !names.iter().any(|value| value.as_str() == Some(method))
    {
        return Err(GenerationError::InvalidOperation {
            method: method.to_owned(),
            reason: "request envelope declares a different method name".to_owned(),
        });
    }
    Ok(&properties["params"])
}

/// Returns the `result` schema when `schema` is a JSON-RPC response envelope,
/// `schema` itself otherwise.
fn unwrap_response_envelope<'s>(
    builder: &SchemaBuilder<'s>,
    schema: &'s Value,
    method: &str,
) -> Result<&'s Value> {
    let resolved = builder.deref(schema, method)?;
    if let Some(result) = resolved.pointer("/properties/result") {
        return Ok(result);
    }

    let members = resolved
        .get("oneOf")
        .or_else(|| resolved.get("anyOf"))
        .and_then(Value::as_array);
    let Some(members) = members else {
        return Ok(schema);
    };
    let mut is_envelope = false;
    for member in members {
        let member = builder.deref(member, method)?;
        if let Some(result) = member.pointer("/properties/result") {
            return Ok(result);
        }
        is_envelope |= member.pointer("/properties/error").is_some();
    }
    if is_envelope {
        return Err(GenerationError::InvalidOperation {
            method: method.to_owned(),
            reason: "response envelope has no `result` member".to_owned(),
        });
    }
    Ok(schema)
}

/// No properties, no type beyond `object`/`null`, nothing to choose between.
fn is_empty_schema(schema: &Value) -> bool {
    let Some(obj) = schema.as_object() else {
        return false;
    };
    const STRUCTURAL: [&str; 6] = ["oneOf", "anyOf", "allOf", "enum", "const", "items"];
    if STRUCTURAL.iter().any(|key| obj.contains_key(*key)) {
        return false;
    }
    if obj
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| !props.is_empty())
    {
        return false;
    }
    if matches!(obj.get("additionalProperties"), Some(Value::Object(_))) {
        return false;
    }
    match obj.get("type") {
        None => true,
        Some(Value::String(ty)) => ty == "object" || ty == "null",
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use serde_json::json;

    fn collect(doc: &SpecDocument, options: &GeneratorOptions) -> Result<Vec<MethodDescriptor>> {
        let mut builder = SchemaBuilder::new(doc)?;
        builder.build_components()?;
        collect_methods(doc, &mut builder, options)
    }

    fn single_path_doc(operation_id: &str) -> SpecDocument {
        SpecDocument::from_value(json!({
            "paths": { "/x": { "post": { "operationId": operation_id } } },
            "components": { "schemas": {} }
        }))
        .expect("valid document")
    }

    #[test]
    fn unwraps_envelopes_and_strips_prefixes() {
        let methods = collect(&fixtures::near(), &GeneratorOptions::default()).expect("valid fixture");
        let names: Vec<_> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["EXPERIMENTAL_view_account", "block", "gas_price", "health"]);

        let block = &methods[1];
        assert_eq!(block.path, "/block");
        assert_eq!(block.params, TypeRef::Named("RpcBlockRequest".into()));
        assert_eq!(block.result, TypeRef::Named("RpcBlockResponse".into()));
        assert!(!block.params_optional);
        assert_eq!(block.accessor, "block");
        assert_eq!(block.const_name, "BLOCK");

        let view = &methods[0];
        assert_eq!(view.path, "/EXPERIMENTAL_view_account");
        assert_eq!(view.accessor, "experimentalViewAccount");
        assert_eq!(view.fn_name, "experimental_view_account");
        assert_eq!(view.params, TypeRef::Named("ExperimentalViewAccountParams".into()));
        assert_eq!(view.result, TypeRef::Named("AccountView".into()));
        assert!(view.params_optional, "a body without `required` is optional");
        assert_eq!(view.summary.as_deref(), Some("Returns account information."));
    }

    #[test]
    fn optional_params() {
        let methods = collect(&fixtures::near(), &GeneratorOptions::default()).expect("valid fixture");
        let by_name: BTreeMap<_, _> = methods.iter().map(|m| (m.name.as_str(), m)).collect();

        let gas_price = by_name["gas_price"];
        assert!(gas_price.params_optional, "requestBody.required is false");
        assert_eq!(gas_price.result, TypeRef::Named("GasPriceResult".into()));

        let health = by_name["health"];
        assert!(health.params_optional, "params schema is null");
        assert!(health.params_empty);
        assert!(!gas_price.params_empty);
        assert_eq!(health.params, TypeRef::Named("RpcHealthRequest".into()));
        assert_eq!(
            health.result,
            TypeRef::Named("RpcHealthResponse".into()).nullable()
        );
    }

    #[test]
    fn missing_operation_id_fails() {
        let doc = SpecDocument::from_value(json!({
            "paths": { "/status": { "post": { "summary": "no id" } } },
            "components": { "schemas": {} }
        }))
        .expect("valid document");
        let err = collect(&doc, &GeneratorOptions::default()).expect_err("missing id");
        assert!(matches!(err, GenerationError::MissingOperationId { path } if path == "/status"));
    }

    #[test]
    fn invalid_method_names_fail() {
        let err = collect(&single_path_doc("view-account"), &GeneratorOptions::default())
            .expect_err("dash is not allowed");
        assert!(matches!(err, GenerationError::InvalidMethodName { .. }));

        let err = collect(&single_path_doc("rpc_1st"), &GeneratorOptions::default())
            .expect_err("digit after prefix stripping");
        assert!(matches!(err, GenerationError::InvalidMethodName { operation_id, .. } if operation_id == "rpc_1st"));
    }

    #[test]
    fn duplicate_names_after_stripping_fail() {
        let doc = SpecDocument::from_value(json!({
            "paths": {
                "/a": { "post": { "operationId": "rpc_status" } },
                "/b": { "post": { "operationId": "status" } }
            },
            "components": { "schemas": {} }
        }))
        .expect("valid document");
        let err = collect(&doc, &GeneratorOptions::default()).expect_err("duplicate");
        assert!(matches!(
            err,
            GenerationError::DuplicateMethod { method, first, second }
                if method == "status" && first == "/a" && second == "/b"
        ));
    }

    #[test]
    fn colliding_accessors_fail() {
        let doc = SpecDocument::from_value(json!({
            "paths": {
                "/a": { "post": { "operationId": "view_account" } },
                "/b": { "post": { "operationId": "viewAccount" } }
            },
            "components": { "schemas": {} }
        }))
        .expect("valid document");
        let err = collect(&doc, &GeneratorOptions::default()).expect_err("collision");
        assert!(matches!(err, GenerationError::AccessorCollision { .. }));
    }

    #[test]
    fn reserved_accessors_fail() {
        let options = GeneratorOptions::default().reserve(["call", "view_account"]);
        let err = collect(&single_path_doc("call"), &options).expect_err("reserved");
        assert!(matches!(err, GenerationError::ReservedAccessor { accessor, .. } if accessor == "call"));

        assert!(collect(&single_path_doc("EXPERIMENTAL_call"), &options).is_ok());
    }

    #[test]
    fn custom_prefixes() {
        let options = GeneratorOptions {
            strip_prefixes: Vec::new(),
            ..GeneratorOptions::default()
        }
        .strip_prefix("near_");
        let methods = collect(&single_path_doc("near_status"), &options).expect("valid");
        assert_eq!(methods[0].name, "status");
        assert!(methods[0].params_optional, "no request body");
        assert_eq!(methods[0].result, TypeRef::Any);
    }

    #[test]
    fn envelope_for_another_method_fails() {
        let mut doc = fixtures::near_document();
        doc["paths"]["/block"]["post"]["operationId"] = json!("chunk");
        let doc = SpecDocument::from_value(doc).expect("valid document");
        let err = collect(&doc, &GeneratorOptions::default()).expect_err("mismatched envelope");
        assert!(matches!(err, GenerationError::InvalidOperation { method, .. } if method == "chunk"));
    }

    #[test]
    fn dangling_body_reference_fails() {
        let mut doc = fixtures::near_document();
        doc["paths"]["/block"]["post"]["requestBody"]["content"]["application/json"]["schema"] =
            json!({ "$ref": "#/components/schemas/Nope" });
        let doc = SpecDocument::from_value(doc).expect("valid document");
        let err = collect(&doc, &GeneratorOptions::default()).expect_err("dangling");
        assert!(matches!(err, GenerationError::DanglingReference { context, .. } if context == "block"));
    }

    #[test]
    fn empty_schemas() {
        assert!(is_empty_schema(&json!({})));
        assert!(is_empty_schema(&json!({ "type": "null" })));
        assert!(is_empty_schema(&json!({ "type": "object", "properties": {} })));
        assert!(!is_empty_schema(&json!({ "type": "object", "properties": { "a": {} } })));
        assert!(!is_empty_schema(&json!({ "type": "string" })));
        assert!(!is_empty_schema(&json!({ "oneOf": [] })));
    }
}
