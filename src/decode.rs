//! Ordered-fallback field access for loosely shaped JSON
//!
//! Several producers write the same concept under different names. These
//! helpers read the first usable value from a list of JSON pointers, so
//! the compatibility rules live in one place and decoders stay flat.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Whether a value counts as "set": not null, false, zero or empty
pub(crate) fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// First set value among `pointers`
pub(crate) fn first_set<'a>(value: &'a Value, pointers: &[&str]) -> Option<&'a Value> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .find(|v| is_set(v))
}

/// First set value among `pointers` that reads as text
pub(crate) fn first_text(value: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter(|v| is_set(v))
        .find_map(as_text)
}

/// First set value among `pointers` that reads as a decimal
pub(crate) fn first_decimal(value: &Value, pointers: &[&str]) -> Option<Decimal> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter(|v| is_set(v))
        .find_map(as_decimal)
}

/// First set value among `pointers` that reads as an integer
pub(crate) fn first_i64(value: &Value, pointers: &[&str]) -> Option<i64> {
    pointers
        .iter()
        .filter_map(|p| value.pointer(p))
        .filter(|v| is_set(v))
        .find_map(as_i64)
}

/// Strings as-is, numbers in their JSON form
pub(crate) fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings
pub(crate) fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

/// Integers, whole floats and numeric strings
pub(crate) fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
