//! Tolerant readers for the stored attribute document.
//!
//! Documents written by older code hold numbers as JSON floats, strings, or
//! occasionally garbage. A value that cannot be read becomes `None` instead of
//! failing the whole load.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::lens::Availability;
use crate::variant::Variant;

pub(crate) fn decimal_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

pub(crate) fn decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(decimal_from_value))
}

pub(crate) fn axis<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(axis_from_value))
}

fn axis_from_value(value: &Value) -> Option<i32> {
    let axis = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    axis.and_then(|a| i32::try_from(a).ok())
}

pub(crate) fn quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(quantity_from_value).unwrap_or(0))
}

fn quantity_from_value(value: &Value) -> Option<u32> {
    let quantity = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    quantity.and_then(|q| u32::try_from(q).ok())
}

pub(crate) fn availability<'de, D>(deserializer: D) -> Result<Availability, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(Availability::Unavailable))
}

pub(crate) fn optional_availability<'de, D>(
    deserializer: D,
) -> Result<Option<Availability>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok()))
}

pub(crate) fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

pub(crate) fn variants<'de, D>(deserializer: D) -> Result<Vec<Variant>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value::<Variant>(item).ok())
        .collect())
}

/// Counts stored variant entries that a lenient read reduces: entries that
/// are not objects, and objects holding a non-null field that reads as
/// nothing or falls back to a default. A `variants` value that is not an
/// array counts as one.
pub(crate) fn lossy_variant_entries(raw: Option<&Value>) -> usize {
    match raw {
        None | Some(Value::Null) => 0,
        Some(Value::Array(items)) => items.iter().filter(|item| entry_is_lossy(item)).count(),
        Some(_) => 1,
    }
}

fn entry_is_lossy(item: &Value) -> bool {
    let Some(fields) = item.as_object() else {
        return true;
    };
    let unreadable = |key: &str, read: fn(&Value) -> bool| {
        fields.get(key).is_some_and(|v| !v.is_null() && !read(v))
    };
    unreadable("sphere", |v| decimal_from_value(v).is_some())
        || unreadable("cylinder", |v| decimal_from_value(v).is_some())
        || unreadable("addition", |v| decimal_from_value(v).is_some())
        || unreadable("axis", |v| axis_from_value(v).is_some())
        || unreadable("quantity", |v| quantity_from_value(v).is_some())
        || unreadable("availability", |v| {
            v.as_str().is_some_and(|s| s.parse::<Availability>().is_ok())
        })
        || unreadable("addition_label", |v| !v.is_array() && !v.is_object())
        || unreadable("ean", |v| !v.is_array() && !v.is_object())
}

pub(crate) fn unavailable() -> Availability {
    Availability::Unavailable
}
