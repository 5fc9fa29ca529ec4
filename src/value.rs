//! Dynamically typed values exchanged with callers: parameter objects, bound
//! values, raw column values, and mapped properties all use [`Value`].
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered string-keyed map used for parameter objects and schemaless records.
pub type ValueMap = IndexMap<String, Value>;

/// Typed value tagged with explicit type information so the serialized form
/// stays unambiguous when parameters arrive from outside the process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Value {
    /// Null, also used for absent properties.
    #[default]
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Signed 64-bit integer literal.
    Int(i64),
    /// 64-bit floating point literal.
    Float(f64),
    /// UTF-8 string literal.
    String(String),
    /// Arbitrary binary payload.
    Bytes(Vec<u8>),
    /// Nanoseconds since Unix epoch in UTC.
    #[serde(deserialize_with = "serde_datetime::deserialize")]
    DateTime(i128),
    /// Ordered sequence; positional parameter objects use this form.
    List(Vec<Value>),
    /// Keyed parameter object.
    Map(ValueMap),
}

/// Parameter payloads written by hand carry timestamps as RFC 3339 text, while
/// machine-produced ones carry epoch nanoseconds as a number or digit string.
mod serde_datetime {
    use serde::de::{self, Deserializer, Visitor};
    use std::fmt;
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    struct EpochNanos;

    impl<'de> Visitor<'de> for EpochNanos {
        type Value = i128;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("epoch nanoseconds or an RFC 3339 timestamp")
        }

        fn visit_i64<E: de::Error>(self, nanos: i64) -> Result<i128, E> {
            Ok(i128::from(nanos))
        }

        fn visit_u64<E: de::Error>(self, nanos: u64) -> Result<i128, E> {
            Ok(i128::from(nanos))
        }

        fn visit_str<E: de::Error>(self, raw: &str) -> Result<i128, E> {
            if let Ok(nanos) = raw.parse::<i128>() {
                return Ok(nanos);
            }
            OffsetDateTime::parse(raw, &Rfc3339)
                .map(OffsetDateTime::unix_timestamp_nanos)
                .map_err(|err| E::custom(format!("invalid timestamp '{raw}': {err}")))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i128, D::Error> {
        deserializer.deserialize_any(EpochNanos)
    }
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrows the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrows the map payload, if any.
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Textual form used for inline substitution and textual column reads.
    ///
    /// Bytes are rendered as UTF-8 (lossy); nulls render as an empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_string(),
        }
    }

    /// Resolves a dotted property path (`user.address.city`) through nested maps.
    ///
    /// Numeric segments index into lists (zero-based). Returns `None` when any
    /// segment is missing.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = match current {
                Value::Map(map) => map.get(segment)?,
                Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Converts an untyped JSON document into a [`Value`].
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts into untyped JSON; bytes become hex strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(hex::encode(b)),
            Value::DateTime(ns) => serde_json::Value::String(ns.to_string()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::DateTime(ns) => write!(f, "{ns}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, item)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Builds a [`Value::Map`] from `key => value` pairs.
///
/// ```
/// use sqlset::{params, Value};
/// let p = params! { "name" => "x", "age" => 42i64 };
/// assert_eq!(p.lookup("age"), Some(&Value::Int(42)));
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::Value::Map($crate::value::ValueMap::new()) };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::value::ValueMap::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        $crate::Value::Map(map)
    }};
}
