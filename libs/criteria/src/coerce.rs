//! Conversion of raw filter values into an attribute's native type.
//!
//! Rules, in order:
//! 1. a value already of the target type is returned unchanged;
//! 2. numeric widening (`Integer` into `Float`/`Decimal`, ...); integers
//!    past 2^53 are rounded to the nearest `f64` when the target is `Float`;
//! 3. text is trimmed and parsed with a fixed, locale-independent format
//!    (ISO 8601 for dates); a parse failure is an error, never a default;
//! 4. anything else passes through as the closest scalar and is left for the
//!    condition consumer to judge.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::CoercionError;
use crate::value::{FilterValue, Scalar, ValueType};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn coerce(raw: &FilterValue, target: ValueType) -> Result<Scalar, CoercionError> {
    match raw {
        FilterValue::Null | FilterValue::List(_) => Err(CoercionError::NotScalar(raw.shape())),
        FilterValue::Text(s) => match target {
            ValueType::Text | ValueType::Json => Ok(Scalar::Text(s.clone())),
            _ => parse_text(s, target),
        },
        FilterValue::Integer(i) => Ok(coerce_integer(*i, target)),
        FilterValue::Float(f) => Ok(match target {
            ValueType::Decimal => Decimal::try_from(*f)
                .map(Scalar::Decimal)
                .unwrap_or(Scalar::Float(*f)),
            _ => Scalar::Float(*f),
        }),
        FilterValue::Bool(b) => Ok(Scalar::Bool(*b)),
    }
}

/// Coerce every element of a collection value.
pub fn coerce_all(values: &[FilterValue], target: ValueType) -> Result<Vec<Scalar>, CoercionError> {
    values.iter().map(|v| coerce(v, target)).collect()
}

fn coerce_integer(i: i64, target: ValueType) -> Scalar {
    match target {
        ValueType::Integer => i32::try_from(i).map(Scalar::Int).unwrap_or(Scalar::Long(i)),
        ValueType::Float => Scalar::Float(i as f64),
        ValueType::Decimal => Scalar::Decimal(Decimal::from(i)),
        _ => Scalar::Long(i),
    }
}

fn parse_text(raw: &str, target: ValueType) -> Result<Scalar, CoercionError> {
    let s = raw.trim();
    let parsed = match target {
        ValueType::Integer => s.parse::<i32>().ok().map(Scalar::Int),
        ValueType::Long => s.parse::<i64>().ok().map(Scalar::Long),
        ValueType::Float => s.parse::<f64>().ok().map(Scalar::Float),
        ValueType::Decimal => Decimal::from_str_exact(s)
            .ok()
            .map(Scalar::Decimal),
        ValueType::Date => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .map(Scalar::Date),
        ValueType::DateTime => DATE_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(Scalar::DateTime),
        ValueType::Boolean => parse_bool(s).map(Scalar::Bool),
        ValueType::Text | ValueType::Json => Some(Scalar::Text(raw.to_string())),
    };

    parsed.ok_or_else(|| CoercionError::Parse {
        raw: raw.to_string(),
        target,
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
