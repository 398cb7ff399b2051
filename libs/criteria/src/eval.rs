//! In-memory evaluation of a condition tree against JSON records.
//!
//! Records are JSON objects keyed by attribute name; relations are nested
//! objects keyed by relation name. A missing or `null` relation behaves like a
//! left join with no match: attributes behind it read as null.
//!
//! Null handling follows SQL `WHERE`: a comparison involving null is not true.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::coerce::coerce;
use crate::condition::{CaseSensitivity, Comparison, Condition, Operand};
use crate::path::AttributePath;
use crate::value::{FilterValue, Scalar, ValueType};

impl Condition {
    /// Whether `record` satisfies the condition.
    ///
    /// Agrees with the rendered SQL except in two places:
    /// - case-insensitive matching uses full Unicode upper-casing, so `ß`
    ///   becomes `SS` here while PostgreSQL `UPPER` leaves it as `ß`;
    /// - text ordering (`ge`, `lt`, `between`, ...) compares bytes, while the
    ///   database compares with the column collation.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Self::True => true,
            Self::And(children) => children.iter().all(|c| c.matches(record)),
            Self::Or(children) => children.iter().any(|c| c.matches(record)),
            Self::Compare { operand, op, value } => {
                let Some(stored) = read_operand(operand, record) else {
                    return false;
                };
                let Some(ordering) = compare_scalars(&stored, value) else {
                    return false;
                };
                match op {
                    Comparison::Eq => ordering == Ordering::Equal,
                    Comparison::Ge => ordering != Ordering::Less,
                    Comparison::Le => ordering != Ordering::Greater,
                    Comparison::Gt => ordering == Ordering::Greater,
                    Comparison::Lt => ordering == Ordering::Less,
                }
            }
            Self::Between { operand, low, high } => {
                let Some(stored) = read_operand(operand, record) else {
                    return false;
                };
                matches!(
                    compare_scalars(&stored, low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    compare_scalars(&stored, high),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
            Self::In { operand, values } => {
                let Some(stored) = read_operand(operand, record) else {
                    return false;
                };
                values
                    .iter()
                    .any(|v| compare_scalars(&stored, v) == Some(Ordering::Equal))
            }
            Self::Like {
                operand,
                needle,
                case,
            } => {
                let haystack = match operand {
                    Operand::Attribute(path) => match lookup(record, path).and_then(Value::as_str) {
                        Some(s) => s.to_string(),
                        None => return false,
                    },
                    Operand::UpperConcat(paths) => paths
                        .iter()
                        .map(|p| {
                            lookup(record, p)
                                .and_then(Value::as_str)
                                .map(str::to_uppercase)
                                .unwrap_or_default()
                        })
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                match case {
                    CaseSensitivity::Sensitive => haystack.contains(needle.as_str()),
                    CaseSensitivity::Insensitive => {
                        haystack.to_uppercase().contains(needle.as_str())
                    }
                }
            }
        }
    }
}

/// Records satisfying `condition`, in input order.
pub fn filter_records<'a>(condition: &Condition, records: &'a [Value]) -> Vec<&'a Value> {
    records.iter().filter(|r| condition.matches(r)).collect()
}

/// Stored value at `path`, or `None` when it (or any relation on the way) is null.
pub fn lookup<'a>(record: &'a Value, path: &AttributePath) -> Option<&'a Value> {
    let mut current = record;
    for relation in path.relations() {
        current = current.get(relation).filter(|v| !v.is_null())?;
    }
    current.get(&path.attribute).filter(|v| !v.is_null())
}

fn read_operand(operand: &Operand, record: &Value) -> Option<Scalar> {
    match operand {
        Operand::Attribute(path) => read_scalar(lookup(record, path)?, path.value_type),
        // Concatenations are only used with pattern matching.
        Operand::UpperConcat(_) => None,
    }
}

/// Interpret a stored JSON value as the attribute's native type.
fn read_scalar(stored: &Value, value_type: ValueType) -> Option<Scalar> {
    if value_type == ValueType::Json {
        return Some(match stored {
            Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        });
    }
    let raw = FilterValue::try_from(stored.clone()).ok()?;
    coerce(&raw, value_type).ok()
}

fn compare_scalars(a: &Scalar, b: &Scalar) -> Option<Ordering> {
    use Scalar::*;

    match (a, b) {
        (Text(x), Text(y)) => Some(x.cmp(y)),
        (Bool(x), Bool(y)) => Some(x.cmp(y)),
        (Date(x), Date(y)) => Some(x.cmp(y)),
        (DateTime(x), DateTime(y)) => Some(x.cmp(y)),
        (Date(x), DateTime(y)) => x.and_hms_opt(0, 0, 0).map(|x| x.cmp(y)),
        (DateTime(x), Date(y)) => y.and_hms_opt(0, 0, 0).map(|y| x.cmp(&y)),
        (Float(x), y) => as_f64(y).and_then(|y| x.partial_cmp(&y)),
        (x, Float(y)) => as_f64(x).and_then(|x| x.partial_cmp(y)),
        (x, y) => Some(as_decimal(x)?.cmp(&as_decimal(y)?)),
    }
}

fn as_decimal(value: &Scalar) -> Option<Decimal> {
    match value {
        Scalar::Int(v) => Some(Decimal::from(*v)),
        Scalar::Long(v) => Some(Decimal::from(*v)),
        Scalar::Decimal(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Int(v) => Some(f64::from(*v)),
        Scalar::Long(v) => Some(*v as f64),
        Scalar::Float(v) => Some(*v),
        Scalar::Decimal(v) => f64::from_str(&v.to_string()).ok(),
        _ => None,
    }
}
