//! Schema/type model derived from `components.schemas`.
//!
//! Every structural type ends up with a name: component schemas keep their
//! key, and anonymous inline objects, unions and enums are hoisted into
//! synthetic named schemas so they can be imported on their own.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;
use tracing::trace;

use crate::error::{GenerationError, Result};
use crate::loader::{SpecDocument, component_name};
use crate::naming;

/// Width and signedness of a JSON integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegerKind {
    U8,
    U16,
    U32,
    U64,
    I32,
    I64,
}

impl IntegerKind {
    fn from_schema(schema: &Value) -> Self {
        match schema.get("format").and_then(Value::as_str) {
            Some("uint8") => Self::U8,
            Some("uint16") => Self::U16,
            Some("uint32") => Self::U32,
            Some("uint64" | "uint") => Self::U64,
            Some("int32") => Self::I32,
            Some("int64") => Self::I64,
            _ => match schema.get("minimum").and_then(Value::as_f64) {
                Some(min) if min >= 0.0 => Self::U64,
                _ => Self::I64,
            },
        }
    }

    pub fn rust_name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I32 => "i32",
            Self::I64 => "i64",
        }
    }

    pub fn variant(self) -> &'static str {
        match self {
            Self::U8 => "U8",
            Self::U16 => "U16",
            Self::U32 => "U32",
            Self::U64 => "U64",
            Self::I32 => "I32",
            Self::I64 => "I64",
        }
    }
}

/// A reference to a type: either a named schema or an anonymous scalar or
/// container that needs no name of its own.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeRef {
    Named(String),
    String {
        pattern: Option<String>,
        format: Option<String>,
    },
    Integer(IntegerKind),
    Number,
    Boolean,
    Null,
    Any,
    Array(Box<TypeRef>),
    Map(Box<TypeRef>),
    Nullable(Box<TypeRef>),
}

impl TypeRef {
    pub(crate) fn plain_string() -> Self {
        Self::String {
            pattern: None,
            format: None,
        }
    }

    pub fn nullable(self) -> Self {
        match self {
            Self::Nullable(_) | Self::Null | Self::Any => self,
            other => Self::Nullable(Box::new(other)),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::String { .. } => f.write_str("String"),
            Self::Integer(kind) => f.write_str(kind.rust_name()),
            Self::Number => f.write_str("f64"),
            Self::Boolean => f.write_str("bool"),
            Self::Null => f.write_str("null"),
            Self::Any => f.write_str("Value"),
            Self::Array(item) => write!(f, "Vec<{item}>"),
            Self::Map(value) => write!(f, "Map<String, {value}>"),
            Self::Nullable(inner) => write!(f, "Option<{inner}>"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub wire_name: String,
    pub ty: TypeRef,
    pub required: bool,
    pub doc: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionMember {
    pub variant: String,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SchemaKind {
    Object { fields: Vec<Field>, closed: bool },
    /// Every member is a distinguishable, named alternative.
    Union { members: Vec<UnionMember> },
    StringEnum { values: Vec<String> },
    Alias(TypeRef),
}

/// One named structural description.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaDescriptor {
    pub name: String,
    pub doc: Option<String>,
    pub kind: SchemaKind,
    /// `true` for schemas hoisted out of an inline definition.
    pub synthetic: bool,
}

/// All schemas of one document, keyed by type name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchemaSet {
    schemas: BTreeMap<String, SchemaDescriptor>,
}

impl SchemaSet {
    pub fn get(&self, name: &str) -> Option<&SchemaDescriptor> {
        self.schemas.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDescriptor> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Walks component schemas and hoists inline ones.
pub(crate) struct SchemaBuilder<'a> {
    components: &'a BTreeMap<String, Value>,
    /// Component key to type name.
    names: BTreeMap<String, String>,
    /// Every type name handed out so far, including in-progress hoists.
    used: BTreeSet<String>,
    schemas: BTreeMap<String, SchemaDescriptor>,
}

impl<'a> SchemaBuilder<'a> {
    pub(crate) fn new(doc: &'a SpecDocument) -> Result<Self> {
        let mut names = BTreeMap::new();
        let mut owners: BTreeMap<String, &str> = BTreeMap::new();
        for key in doc.schemas.keys() {
            let name = naming::type_name(key);
            if let Some(first) = owners.insert(name.clone(), key) {
                return Err(GenerationError::NameCollision {
                    name,
                    first: first.to_owned(),
                    second: key.clone(),
                });
            }
            names.insert(key.clone(), name);
        }

        Ok(Self {
            components: &doc.schemas,
            used: names.values().cloned().collect(),
            names,
            schemas: BTreeMap::new(),
        })
    }

    /// Describes every component schema.
    pub(crate) fn build_components(&mut self) -> Result<()> {
        let components = self.components;
        for (key, schema) in components {
            let name = self.names[key].clone();
            let kind = self.describe(&name, schema)?;
            self.insert(name, schema, kind, false);
        }
        Ok(())
    }

    /// Fails when a chain of plain aliases leads back to where it started;
    /// such a type has no Rust representation.
    pub(crate) fn finish(self) -> Result<SchemaSet> {
        for name in self.schemas.keys() {
            let mut current = name;
            let mut seen = BTreeSet::new();
            while let Some(SchemaKind::Alias(TypeRef::Named(target))) =
                self.schemas.get(current).map(|desc| &desc.kind)
            {
                if !seen.insert(current) || target == name {
                    return Err(GenerationError::InvalidSchema {
                        name: name.clone(),
                        reason: "aliases form a cycle".to_owned(),
                    });
                }
                current = target;
            }
        }
        Ok(SchemaSet {
            schemas: self.schemas,
        })
    }

    /// Looks a `$ref` up in `components.schemas`.
    pub(crate) fn resolve(&self, reference: &str, context: &str) -> Result<&'a Value> {
        let key = component_name(reference).ok_or_else(|| GenerationError::UnsupportedReference {
            reference: reference.to_owned(),
            context: context.to_owned(),
        })?;
        self.components
            .get(key)
            .ok_or_else(|| GenerationError::DanglingReference {
                reference: reference.to_owned(),
                context: context.to_owned(),
            })
    }

    /// Follows `$ref` chains until a concrete schema is reached.
    pub(crate) fn deref<'s>(&self, schema: &'s Value, context: &str) -> Result<&'s Value>
    where
        'a: 's,
    {
        let mut current = schema;
        for _ in 0..32 {
            match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => current = self.resolve(reference, context)?,
                None => return Ok(current),
            }
        }
        Err(GenerationError::InvalidSchema {
            name: context.to_owned(),
            reason: "reference chain does not terminate".to_owned(),
        })
    }

    fn reference(&self, reference: &str, context: &str) -> Result<TypeRef> {
        self.resolve(reference, context)?;
        let key = component_name(reference).unwrap_or(reference);
        Ok(TypeRef::Named(self.names[key].clone()))
    }

    fn insert(&mut self, name: String, schema: &Value, kind: SchemaKind, synthetic: bool) {
        trace!(%name, synthetic, "described schema");
        self.schemas.insert(
            name.clone(),
            SchemaDescriptor {
                name,
                doc: description(schema),
                kind,
                synthetic,
            },
        );
    }

    /// Gives an inline schema a name of its own and describes it.
    fn hoist(&mut self, schema: &Value, hint: &str) -> Result<TypeRef> {
        let name = naming::claim(&mut self.used, naming::sanitize(hint));
        let kind = self.describe(&name, schema)?;
        self.insert(name.clone(), schema, kind, true);
        Ok(TypeRef::Named(name))
    }

    /// Describes a schema that is about to receive the type name `name`.
    fn describe(&mut self, name: &str, schema: &Value) -> Result<SchemaKind> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return Ok(SchemaKind::Alias(self.reference(reference, name)?));
        }
        if let Some(values) = string_enum(schema) {
            return Ok(SchemaKind::StringEnum { values });
        }
        if let Some(members) = union_members(schema) {
            let (nulls, others): (Vec<&Value>, Vec<&Value>) =
                members.iter().partition(|member| is_null_schema(member));
            return match others.as_slice() {
                [] => Ok(SchemaKind::Alias(TypeRef::Null)),
                [only] if nulls.is_empty() => self.describe(name, only),
                [only] => {
                    let inner = self.type_of(only, &format!("{name}Value"))?;
                    Ok(SchemaKind::Alias(inner.nullable()))
                }
                _ => self.describe_union(name, &others, !nulls.is_empty()),
            };
        }
        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            return match parts.as_slice() {
                [only] => self.describe(name, only),
                _ => self.describe_all_of(name, parts),
            };
        }

        let has_properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|props| !props.is_empty());
        if has_properties {
            let fields = self.object_fields(name, schema)?;
            return Ok(SchemaKind::Object {
                fields,
                closed: is_closed(schema),
            });
        }
        if schema_type(schema) == Some("object") && is_closed(schema) {
            return Ok(SchemaKind::Object {
                fields: Vec::new(),
                closed: true,
            });
        }
        Ok(SchemaKind::Alias(self.type_of(schema, name)?))
    }

    fn describe_union(&mut self, name: &str, members: &[&Value], nullable: bool) -> Result<SchemaKind> {
        let mut variants = BTreeSet::new();
        let mut out = Vec::with_capacity(members.len() + usize::from(nullable));
        for (index, member) in members.iter().enumerate() {
            let title = member.get("title").and_then(Value::as_str).map(naming::variant_name);
            let ty = match member.get("$ref").and_then(Value::as_str) {
                Some(reference) => self.reference(reference, name)?,
                None => {
                    let suffix = title.clone().unwrap_or_else(|| format!("Variant{index}"));
                    self.type_of(member, &format!("{name}{suffix}"))?
                }
            };
            let variant = title.unwrap_or_else(|| match &ty {
                TypeRef::Named(target) => naming::sanitize(target),
                other => naming::variant_name(&scalar_label(other)),
            });
            out.push(UnionMember {
                variant: naming::claim(&mut variants, variant),
                ty,
            });
        }
        if nullable {
            out.push(UnionMember {
                variant: naming::claim(&mut variants, "Null".to_owned()),
                ty: TypeRef::Null,
            });
        }
        Ok(SchemaKind::Union { members: out })
    }

    /// Merges the properties of every `allOf` part into one object.
    fn describe_all_of(&mut self, name: &str, parts: &[Value]) -> Result<SchemaKind> {
        let mut fields: BTreeMap<String, Field> = BTreeMap::new();
        for part in parts {
            let part = self.deref(part, name)?;
            if union_members(part).is_some() || string_enum(part).is_some() {
                return Err(GenerationError::InvalidSchema {
                    name: name.to_owned(),
                    reason: "allOf can only combine object schemas".to_owned(),
                });
            }
            for field in self.object_fields(name, part)? {
                fields.insert(field.wire_name.clone(), field);
            }
        }
        Ok(SchemaKind::Object {
            fields: fields.into_values().collect(),
            closed: false,
        })
    }

    fn object_fields(&mut self, owner: &str, schema: &Value) -> Result<Vec<Field>> {
        let required: BTreeSet<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let properties: BTreeMap<&String, &Value> = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.iter().collect())
            .unwrap_or_default();

        let mut fields = Vec::with_capacity(properties.len());
        for (wire_name, property) in properties {
            let hint = format!("{owner}{}", naming::pascal(wire_name));
            let ty = self.type_of(property, &hint)?;
            fields.push(Field {
                wire_name: wire_name.clone(),
                ty,
                required: required.contains(wire_name.as_str()),
                doc: description(property),
            });
        }
        Ok(fields)
    }

    /// Resolves the type of a property, array item, union member, request or
    /// response body. Structural inline schemas are hoisted under `hint`.
    pub(crate) fn type_of(&mut self, schema: &Value, hint: &str) -> Result<TypeRef> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return self.reference(reference, hint);
        }
        if schema.get("nullable").and_then(Value::as_bool) == Some(true) {
            let mut inner = schema.clone();
            if let Some(obj) = inner.as_object_mut() {
                obj.remove("nullable");
            }
            return Ok(self.type_of(&inner, hint)?.nullable());
        }
        if let Some(types) = schema.get("type").and_then(Value::as_array) {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let non_null: Vec<&str> = names.iter().copied().filter(|t| *t != "null").collect();
            let has_null = non_null.len() != names.len();
            return match non_null.as_slice() {
                [] => Ok(TypeRef::Null),
                [single] => {
                    let mut inner = schema.clone();
                    inner["type"] = Value::from(*single);
                    let ty = self.type_of(&inner, hint)?;
                    Ok(if has_null { ty.nullable() } else { ty })
                }
                _ => Ok(TypeRef::Any),
            };
        }
        if let Some(members) = union_members(schema) {
            let (nulls, others): (Vec<&Value>, Vec<&Value>) =
                members.iter().partition(|member| is_null_schema(member));
            return match others.as_slice() {
                [] => Ok(TypeRef::Null),
                [only] if nulls.is_empty() => self.type_of(only, hint),
                [only] => Ok(self.type_of(only, hint)?.nullable()),
                _ => self.hoist(schema, hint),
            };
        }
        if let Some(parts) = schema.get("allOf").and_then(Value::as_array) {
            return match parts.as_slice() {
                [only] => self.type_of(only, hint),
                _ => self.hoist(schema, hint),
            };
        }
        if string_enum(schema).is_some() {
            return self.hoist(schema, hint);
        }

        let has_properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .is_some_and(|props| !props.is_empty());
        match schema_type(schema) {
            Some("string") => Ok(TypeRef::String {
                pattern: text(schema, "pattern"),
                format: text(schema, "format"),
            }),
            Some("integer") => Ok(TypeRef::Integer(IntegerKind::from_schema(schema))),
            Some("number") => Ok(TypeRef::Number),
            Some("boolean") => Ok(TypeRef::Boolean),
            Some("null") => Ok(TypeRef::Null),
            Some("array") => {
                let item = match schema.get("items") {
                    Some(items) => self.type_of(items, &format!("{hint}Item"))?,
                    None => TypeRef::Any,
                };
                Ok(TypeRef::Array(Box::new(item)))
            }
            Some("object") | None if has_properties || is_closed(schema) => self.hoist(schema, hint),
            Some("object") => match schema.get("additionalProperties") {
                Some(value @ Value::Object(_)) => {
                    let value = self.type_of(value, &format!("{hint}Value"))?;
                    Ok(TypeRef::Map(Box::new(value)))
                }
                _ => Ok(TypeRef::Map(Box::new(TypeRef::Any))),
            },
            None => Ok(TypeRef::Any),
            Some(other) => Err(GenerationError::InvalidSchema {
                name: hint.to_owned(),
                reason: format!("unsupported type `{other}`"),
            }),
        }
    }
}

fn schema_type(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(Value::as_str)
}

fn text(schema: &Value, key: &str) -> Option<String> {
    schema.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn description(schema: &Value) -> Option<String> {
    text(schema, "description")
}

fn is_closed(schema: &Value) -> bool {
    schema.get("additionalProperties") == Some(&Value::Bool(false))
}

fn union_members(schema: &Value) -> Option<&Vec<Value>> {
    schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array)
}

fn is_null_schema(schema: &Value) -> bool {
    schema_type(schema) == Some("null") || schema.get("enum") == Some(&Value::Array(vec![Value::Null]))
}

/// String-valued `enum`, or a string `const`.
fn string_enum(schema: &Value) -> Option<Vec<String>> {
    if let Some(value) = schema.get("const").and_then(Value::as_str) {
        return Some(vec![value.to_owned()]);
    }
    let values = schema.get("enum")?.as_array()?;
    values
        .iter()
        .map(|value| value.as_str().map(str::to_owned))
        .collect::<Option<Vec<_>>>()
        .filter(|values| !values.is_empty())
}

fn scalar_label(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(name) => name.clone(),
        TypeRef::String { .. } => "String".to_owned(),
        TypeRef::Integer(_) => "Integer".to_owned(),
        TypeRef::Number => "Number".to_owned(),
        TypeRef::Boolean => "Boolean".to_owned(),
        TypeRef::Null => "Null".to_owned(),
        TypeRef::Any => "Value".to_owned(),
        TypeRef::Array(_) => "Array".to_owned(),
        TypeRef::Map(_) => "Map".to_owned(),
        TypeRef::Nullable(inner) => scalar_label(inner),
    }
}
