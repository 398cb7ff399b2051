//! Filter values, coerced scalars and attribute value types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-supplied filter mapping: filter key to raw value.
pub type FilterMap = BTreeMap<String, FilterValue>;

/// Raw filter value as supplied by a caller.
///
/// Deserialises from plain JSON (`null`, strings, numbers, booleans and arrays of
/// those). JSON objects are not a valid filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "serde_json::Value")]
pub enum FilterValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Absent values and whitespace-only text mean "no filter for this key".
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Short name of the value shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Bool(_) => "boolean",
            Self::List(_) => "list",
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for FilterValue {
    type Error = String;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::String(s) => Ok(Self::Text(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(format!("unsupported number {}", n))
                }
            }
            Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            Value::Object(_) => Err("objects are not valid filter values".to_string()),
        }
    }
}

impl From<FilterValue> for serde_json::Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::Null => Self::Null,
            FilterValue::Text(s) => Self::String(s),
            FilterValue::Integer(i) => Self::from(i),
            FilterValue::Float(f) => Self::from(f),
            FilterValue::Bool(b) => Self::Bool(b),
            FilterValue::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
        }
    }
}

/// Declared native type of an entity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Integer,
    Long,
    Float,
    Decimal,
    Text,
    Date,
    DateTime,
    Boolean,
    /// Opaque document column (e.g. `jsonb`); only equality makes sense.
    Json,
}

impl ValueType {
    pub fn kind(self) -> ValueKind {
        match self {
            Self::Integer | Self::Long | Self::Float | Self::Decimal => ValueKind::Numeric,
            Self::Text => ValueKind::Text,
            Self::Date | Self::DateTime => ValueKind::Temporal,
            Self::Boolean => ValueKind::Boolean,
            Self::Json => ValueKind::Opaque,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Long => "long",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Boolean => "boolean",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic kind of a value type; operator capability checks are made against this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Numeric,
    Text,
    Temporal,
    Boolean,
    Opaque,
}

impl ValueKind {
    /// Whether `ge`, `le`, `gt`, `lt` and `between` apply.
    pub fn is_orderable(self) -> bool {
        matches!(self, Self::Numeric | Self::Text | Self::Temporal)
    }

    /// Whether the pattern-match operators apply.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// A filter value after coercion to an attribute's native type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Scalar {
    Int(i32),
    Long(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}
