//! The schema interpreter behind generated validators.
//!
//! Every snapshot's `validators` module is a graph of `static` [`Schema`]
//! values. Checking walks that graph against a `serde_json::Value` and stops
//! at the first mismatch.

use std::fmt::Write as _;

use serde_json::Value;

/// Width and signedness of a JSON integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    U8,
    U16,
    U32,
    U64,
    I32,
    I64,
}

impl IntegerKind {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::U8 => value.as_u64().is_some_and(|n| u8::try_from(n).is_ok()),
            Self::U16 => value.as_u64().is_some_and(|n| u16::try_from(n).is_ok()),
            Self::U32 => value.as_u64().is_some_and(|n| u32::try_from(n).is_ok()),
            Self::U64 => value.as_u64().is_some(),
            Self::I32 => value.as_i64().is_some_and(|n| i32::try_from(n).is_ok()),
            Self::I64 => value.as_i64().is_some(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::U8 => "unsigned 8-bit integer",
            Self::U16 => "unsigned 16-bit integer",
            Self::U32 => "unsigned 32-bit integer",
            Self::U64 => "unsigned 64-bit integer",
            Self::I32 => "signed 32-bit integer",
            Self::I64 => "signed 64-bit integer",
        }
    }
}

/// One property of an object schema.
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub schema: &'static Schema,
    pub required: bool,
}

/// The shape a JSON value must have.
#[derive(Debug)]
pub enum Schema {
    Any,
    Null,
    Boolean,
    Integer(IntegerKind),
    Number,
    /// `pattern` and `format` are only enforced with the `validation` feature.
    String {
        pattern: Option<&'static str>,
        format: Option<&'static str>,
    },
    Enum {
        name: &'static str,
        values: &'static [&'static str],
    },
    Array(&'static Schema),
    /// String keys, every value of the given schema.
    Map(&'static Schema),
    Nullable(&'static Schema),
    Object {
        name: &'static str,
        fields: &'static [Field],
        /// Unknown properties are a mismatch.
        closed: bool,
    },
    /// Passes when at least one member does.
    Union {
        name: &'static str,
        members: &'static [&'static Schema],
    },
    Alias {
        name: &'static str,
        target: &'static Schema,
    },
}

/// Where and how a value departs from its schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub path: String,
    pub expected: String,
    pub found: String,
}

impl Schema {
    /// Checks `value`, reporting paths relative to `root` (`params`, `result`).
    pub fn check(&self, value: &Value, root: &str) -> Result<(), Mismatch> {
        let mut path = root.to_owned();
        self.check_at(value, &mut path)
    }

    /// Short human description of what this schema accepts.
    pub fn expected(&self) -> String {
        match self {
            Self::Any => "any value".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Boolean => "boolean".to_owned(),
            Self::Integer(kind) => kind.describe().to_owned(),
            Self::Number => "number".to_owned(),
            Self::String {
                format: Some(format),
                ..
            } => format!("{format} string"),
            Self::String { .. } => "string".to_owned(),
            Self::Enum { name, values } => {
                let values: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                format!("{name} (one of {})", values.join(", "))
            }
            Self::Array(item) => format!("array of {}", item.expected()),
            Self::Map(value) => format!("map of {}", value.expected()),
            Self::Nullable(inner) => format!("{} or null", inner.expected()),
            Self::Object { name, .. } => format!("{name} object"),
            Self::Union { name, .. } | Self::Alias { name, .. } => (*name).to_owned(),
        }
    }

    fn check_at(&self, value: &Value, path: &mut String) -> Result<(), Mismatch> {
        let ok = match self {
            Self::Any => true,
            Self::Null => value.is_null(),
            Self::Boolean => value.is_boolean(),
            Self::Integer(kind) => kind.accepts(value),
            Self::Number => value.is_number(),
            Self::String { pattern, format } => match value.as_str() {
                Some(text) => return check_string(text, *pattern, *format, path),
                None => false,
            },
            Self::Enum { values, .. } => value.as_str().is_some_and(|text| values.contains(&text)),
            Self::Array(item) => match value.as_array() {
                Some(items) => {
                    for (index, element) in items.iter().enumerate() {
                        let len = path.len();
                        let _ = write!(path, "[{index}]");
                        item.check_at(element, path)?;
                        path.truncate(len);
                    }
                    return Ok(());
                }
                None => false,
            },
            Self::Map(schema) => match value.as_object() {
                Some(entries) => {
                    for (key, element) in entries {
                        let len = push_key(path, key);
                        schema.check_at(element, path)?;
                        path.truncate(len);
                    }
                    return Ok(());
                }
                None => false,
            },
            Self::Nullable(_) if value.is_null() => true,
            Self::Nullable(inner) => return inner.check_at(value, path),
            Self::Object {
                name,
                fields,
                closed,
            } => match value.as_object() {
                Some(object) => return check_object(name, fields, *closed, object, path),
                None => false,
            },
            Self::Union { members, .. } => {
                if members.iter().any(|member| member.check_at(value, &mut path.clone()).is_ok()) {
                    return Ok(());
                }
                false
            }
            Self::Alias { target, .. } => return target.check_at(value, path),
        };
        if ok {
            Ok(())
        } else {
            Err(self.mismatch(value, path))
        }
    }

    fn mismatch(&self, value: &Value, path: &str) -> Mismatch {
        Mismatch {
            path: path.to_owned(),
            expected: self.expected(),
            found: describe(value),
        }
    }
}

fn check_object(
    name: &str,
    fields: &[Field],
    closed: bool,
    object: &serde_json::Map<String, Value>,
    path: &mut String,
) -> Result<(), Mismatch> {
    for field in fields {
        let len = push_key(path, field.name);
        match object.get(field.name) {
            None if field.required => {
                return Err(Mismatch {
                    path: path.clone(),
                    expected: format!("required field of type {}", field.schema.expected()),
                    found: "nothing".to_owned(),
                });
            }
            None => {}
            Some(Value::Null) if !field.required => {}
            Some(value) => field.schema.check_at(value, path)?,
        }
        path.truncate(len);
    }
    if closed
        && let Some(unknown) = object
            .keys()
            .find(|key| !fields.iter().any(|field| field.name == key.as_str()))
    {
        let len = push_key(path, unknown);
        let mismatch = Mismatch {
            path: path.clone(),
            expected: format!("no field `{unknown}` in {name}"),
            found: describe(&object[unknown.as_str()]),
        };
        path.truncate(len);
        return Err(mismatch);
    }
    Ok(())
}

fn check_string(
    text: &str,
    pattern: Option<&'static str>,
    format: Option<&'static str>,
    path: &str,
) -> Result<(), Mismatch> {
    if let Some(pattern) = pattern
        && !full::matches_pattern(pattern, text)
    {
        return Err(Mismatch {
            path: path.to_owned(),
            expected: format!("string matching `{pattern}`"),
            found: format!("\"{text}\""),
        });
    }
    if let Some(format) = format
        && !full::matches_format(format, text)
    {
        return Err(Mismatch {
            path: path.to_owned(),
            expected: format!("{format} string"),
            found: format!("\"{text}\""),
        });
    }
    Ok(())
}

/// Appends `.key` and returns the length to truncate back to.
fn push_key(path: &mut String, key: &str) -> usize {
    let len = path.len();
    path.push('.');
    path.push_str(key);
    len
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(_) => "string".to_owned(),
        Value::Array(items) => format!("array of length {}", items.len()),
        Value::Object(_) => "object".to_owned(),
    }
}

/// String checks that need `regress` and `chrono`.
#[cfg(feature = "validation")]
mod full {
    use tracing::trace;

    /// Unsupported patterns are not enforced.
    pub(super) fn matches_pattern(pattern: &str, text: &str) -> bool {
        match regress::Regex::new(pattern) {
            Ok(regex) => regex.find(text).is_some(),
            Err(err) => {
                trace!(pattern, %err, "skipping unsupported pattern");
                true
            }
        }
    }

    /// Unknown formats are not enforced.
    pub(super) fn matches_format(format: &str, text: &str) -> bool {
        match format {
            "date-time" => chrono::DateTime::parse_from_rfc3339(text).is_ok(),
            "date" => chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
            _ => true,
        }
    }
}

/// The structural-only runtime accepts every string.
#[cfg(not(feature = "validation"))]
mod full {
    pub(super) fn matches_pattern(_pattern: &str, _text: &str) -> bool {
        true
    }

    pub(super) fn matches_format(_format: &str, _text: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static HEIGHT: Schema = Schema::Integer(IntegerKind::U64);
    static HASH: Schema = Schema::String {
        pattern: None,
        format: None,
    };
    static ACCOUNT_ID_STRING: Schema = Schema::String {
        pattern: Some(r"^[a-z\d._-]+$"),
        format: None,
    };
    static ACCOUNT_ID: Schema = Schema::Alias {
        name: "AccountId",
        target: &ACCOUNT_ID_STRING,
    };
    static FINALITY: Schema = Schema::Enum {
        name: "Finality",
        values: &["optimistic", "near-final", "final"],
    };
    static BLOCK_ID_MEMBERS: [&Schema; 2] = [&HEIGHT, &HASH];
    static BLOCK_ID: Schema = Schema::Union {
        name: "BlockId",
        members: &BLOCK_ID_MEMBERS,
    };
    static HEADER_FIELDS: [Field; 2] = [
        Field {
            name: "hash",
            schema: &HASH,
            required: true,
        },
        Field {
            name: "height",
            schema: &HEIGHT,
            required: true,
        },
    ];
    static HEADER: Schema = Schema::Object {
        name: "BlockHeader",
        fields: &HEADER_FIELDS,
        closed: false,
    };
    static LOGS: Schema = Schema::Array(&HASH);
    static BLOCK_FIELDS: [Field; 3] = [
        Field {
            name: "author",
            schema: &ACCOUNT_ID,
            required: true,
        },
        Field {
            name: "header",
            schema: &HEADER,
            required: true,
        },
        Field {
            name: "logs",
            schema: &LOGS,
            required: false,
        },
    ];
    static BLOCK: Schema = Schema::Object {
        name: "Block",
        fields: &BLOCK_FIELDS,
        closed: false,
    };
    static CLOSED_FIELDS: [Field; 1] = [Field {
        name: "finality",
        schema: &FINALITY,
        required: true,
    }];
    static CLOSED: Schema = Schema::Object {
        name: "Closed",
        fields: &CLOSED_FIELDS,
        closed: true,
    };

    fn block() -> Value {
        json!({
            "author": "node0",
            "header": { "hash": "abc", "height": 10 },
            "logs": ["first"]
        })
    }

    #[test]
    fn accepts_conforming_values() {
        assert_eq!(BLOCK.check(&block(), "result"), Ok(()));
        let mut without_logs = block();
        without_logs["logs"] = Value::Null;
        assert_eq!(BLOCK.check(&without_logs, "result"), Ok(()));
    }

    #[test]
    fn reports_nested_paths() {
        let mut bad = block();
        bad["header"]["height"] = json!("ten");
        let mismatch = BLOCK.check(&bad, "result").expect_err("height is a string");
        assert_eq!(mismatch.path, "result.header.height");
        assert_eq!(mismatch.expected, "unsigned 64-bit integer");
        assert_eq!(mismatch.found, "string");

        let mut bad = block();
        bad["logs"] = json!(["ok", 7]);
        let mismatch = BLOCK.check(&bad, "result").expect_err("log entry is a number");
        assert_eq!(mismatch.path, "result.logs[1]");
    }

    #[test]
    fn missing_required_field() {
        let mut bad = block();
        bad.as_object_mut().expect("object").remove("author");
        let mismatch = BLOCK.check(&bad, "params").expect_err("author missing");
        assert_eq!(mismatch.path, "params.author");
        assert_eq!(mismatch.found, "nothing");
        assert!(mismatch.expected.starts_with("required field of type AccountId"));
    }

    #[test]
    fn scalars_where_objects_are_expected() {
        let mismatch = BLOCK.check(&json!(123), "result").expect_err("not an object");
        assert_eq!(mismatch.path, "result");
        assert_eq!(mismatch.expected, "Block object");
        assert_eq!(mismatch.found, "number 123");
    }

    #[test]
    fn integer_ranges_and_signedness() {
        let byte = Schema::Integer(IntegerKind::U8);
        assert!(byte.check(&json!(255), "v").is_ok());
        assert!(byte.check(&json!(256), "v").is_err());
        assert!(HEIGHT.check(&json!(-1), "v").is_err());
        assert!(HEIGHT.check(&json!(1.5), "v").is_err());
        let signed = Schema::Integer(IntegerKind::I32);
        assert!(signed.check(&json!(-5), "v").is_ok());
        assert!(signed.check(&json!(i64::from(i32::MAX) + 1), "v").is_err());
    }

    #[test]
    fn unions_need_one_matching_member() {
        assert!(BLOCK_ID.check(&json!(42), "params.block_id").is_ok());
        assert!(BLOCK_ID.check(&json!("9fJ1"), "params.block_id").is_ok());
        let mismatch = BLOCK_ID
            .check(&json!(true), "params.block_id")
            .expect_err("neither height nor hash");
        assert_eq!(mismatch.expected, "BlockId");
        assert_eq!(mismatch.found, "boolean true");
    }

    #[test]
    fn enums_and_closed_objects() {
        assert!(CLOSED.check(&json!({ "finality": "final" }), "params").is_ok());
        let mismatch = CLOSED
            .check(&json!({ "finality": "latest" }), "params")
            .expect_err("unknown finality");
        assert_eq!(mismatch.path, "params.finality");
        assert!(mismatch.expected.contains("\"near-final\""));

        let mismatch = CLOSED
            .check(&json!({ "finality": "final", "extra": 1 }), "params")
            .expect_err("unknown property");
        assert_eq!(mismatch.path, "params.extra");
    }

    #[test]
    fn maps_and_nullables() {
        static VALUES: Schema = Schema::Map(&HEIGHT);
        static MAYBE: Schema = Schema::Nullable(&VALUES);
        assert!(MAYBE.check(&Value::Null, "result").is_ok());
        assert!(MAYBE.check(&json!({ "a": 1, "b": 2 }), "result").is_ok());
        let mismatch = MAYBE
            .check(&json!({ "a": 1, "b": "x" }), "result")
            .expect_err("b is not an integer");
        assert_eq!(mismatch.path, "result.b");
        assert_eq!(MAYBE.expected(), "map of unsigned 64-bit integer or null");
    }

    #[cfg(feature = "validation")]
    #[test]
    fn patterns_and_formats() {
        assert!(ACCOUNT_ID.check(&json!("alice.near"), "params.account_id").is_ok());
        let mismatch = ACCOUNT_ID
            .check(&json!("Alice Near"), "params.account_id")
            .expect_err("uppercase and spaces");
        assert!(mismatch.expected.starts_with("string matching"));

        let time = Schema::String {
            pattern: None,
            format: Some("date-time"),
        };
        assert!(time.check(&json!("2024-05-01T12:00:00.123456Z"), "t").is_ok());
        assert!(time.check(&json!("yesterday"), "t").is_err());
    }

    #[cfg(not(feature = "validation"))]
    #[test]
    fn mini_runtime_skips_string_checks() {
        assert!(ACCOUNT_ID.check(&json!("Alice Near"), "params.account_id").is_ok());
    }
}
