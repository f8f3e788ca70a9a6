// ── Canonical values ──
//
// Every parameter, filter operand, and decoded record field is a `Value`.
// The enum is closed so formatters and codecs match exhaustively instead of
// switching on runtime types.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::mapping::codec;

/// A single record: field name to value, in insertion order.
pub type Record = IndexMap<String, Value>;

/// Typed value carried by canonical commands and responses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    Duration(Duration),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(d) => Some(*d),
            _ => None,
        }
    }

    /// Short type label used in tables and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Duration(_) => "duration",
        }
    }
}

/// Plain text form, as handed to transports that only accept strings.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(",")),
            Self::Duration(d) => f.write_str(&codec::format_duration(*d)),
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        i64::try_from(i).map_or_else(|_| Self::Str(i.to_string()), Self::Int)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_owned).collect())
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

/// Loose conversion from JSON input (CLI arguments, REST bodies, fixtures).
///
/// Arrays become string lists; objects are kept as their JSON text since
/// RouterOS has no nested values.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_i64().map_or_else(|| Self::Str(n.to_string()), Self::Int),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            obj @ serde_json::Value::Object(_) => Self::Str(obj.to_string()),
        }
    }
}

// ── Serde ───────────────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => serializer.collect_seq(items),
            Self::Duration(d) => {
                serializer.serialize_str(&humantime::format_duration(*d).to_string())
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_plain_text_forms() {
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(1400).to_string(), "1400");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a,b");
        assert_eq!(Value::Duration(Duration::from_secs(90)).to_string(), "1m30s");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn json_numbers_become_ints_when_they_fit() {
        let v = Value::from(serde_json::json!(1500));
        assert_eq!(v, Value::Int(1500));
        let v = Value::from(serde_json::json!(1.5));
        assert_eq!(v, Value::Str("1.5".into()));
    }

    #[test]
    fn json_arrays_become_string_lists() {
        let v = Value::from(serde_json::json!(["ether1", 2]));
        assert_eq!(v, Value::List(vec!["ether1".into(), "2".into()]));
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&Value::List(vec!["a".into()])).unwrap();
        assert_eq!(json, r#"["a"]"#);
        let json = serde_json::to_string(&Value::Duration(Duration::from_secs(3600))).unwrap();
        assert_eq!(json, r#""1h""#);
    }

    #[test]
    fn huge_unsigned_falls_back_to_text() {
        assert_eq!(Value::from(u64::MAX), Value::Str(u64::MAX.to_string()));
    }
}
