//! Built-in value transformers.
//!
//! Each one converts a wire value into the representation the attribute
//! expects. Dates are normalized to RFC 3339 UTC strings, which is what
//! `chrono::DateTime<Utc>` deserializes from.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

use super::registry::SchemaRegistry;
use crate::domain::TransformError;
use crate::schema::rule::value_kind;

pub const ISO8601_DATE: &str = "iso8601_date";
pub const UNIX_TIMESTAMP: &str = "unix_timestamp";
pub const STRING_TO_INTEGER: &str = "string_to_integer";
pub const STRING_TO_FLOAT: &str = "string_to_float";
pub const INTEGER_TO_BOOL: &str = "integer_to_bool";
pub const TO_STRING: &str = "to_string";

pub fn register_builtins(registry: &mut SchemaRegistry) {
    registry.register_value_transformer(ISO8601_DATE, iso8601_date);
    registry.register_value_transformer(UNIX_TIMESTAMP, unix_timestamp);
    registry.register_value_transformer(STRING_TO_INTEGER, string_to_integer);
    registry.register_value_transformer(STRING_TO_FLOAT, string_to_float);
    registry.register_value_transformer(INTEGER_TO_BOOL, integer_to_bool);
    registry.register_value_transformer(TO_STRING, to_string);
}

fn format_utc(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn expect_str<'a>(value: &'a Value) -> Result<&'a str, TransformError> {
    value.as_str().ok_or(TransformError::TypeMismatch {
        expected: "String",
        found: value_kind(value),
    })
}

/// RFC 3339 timestamp or plain `YYYY-MM-DD` date -> UTC RFC 3339 string.
pub fn iso8601_date(value: &Value) -> Result<Value, TransformError> {
    let s = expect_str(value)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(format_utc(dt.with_timezone(&Utc)));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| TransformError::unparseable(value, e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| TransformError::unparseable(value, "invalid time of day"))?;
    Ok(format_utc(midnight.and_utc()))
}

/// Seconds since the Unix epoch -> UTC RFC 3339 string.
pub fn unix_timestamp(value: &Value) -> Result<Value, TransformError> {
    let secs = value.as_i64().ok_or(TransformError::TypeMismatch {
        expected: "Integer",
        found: value_kind(value),
    })?;
    let dt = DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| TransformError::unparseable(value, "timestamp out of range"))?;
    Ok(format_utc(dt))
}

pub fn string_to_integer(value: &Value) -> Result<Value, TransformError> {
    if value.is_i64() || value.is_u64() {
        return Ok(value.clone());
    }
    let n: i64 = expect_str(value)?
        .trim()
        .parse()
        .map_err(|e| TransformError::unparseable(value, e))?;
    Ok(Value::from(n))
}

pub fn string_to_float(value: &Value) -> Result<Value, TransformError> {
    if value.is_number() {
        return Ok(value.clone());
    }
    let n: f64 = expect_str(value)?
        .trim()
        .parse()
        .map_err(|e| TransformError::unparseable(value, e))?;
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| TransformError::unparseable(value, "not a finite number"))
}

/// `0` / `1` (and booleans) -> bool.
pub fn integer_to_bool(value: &Value) -> Result<Value, TransformError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(TransformError::unparseable(value, "expected 0 or 1")),
        },
        other => Err(TransformError::TypeMismatch {
            expected: "Integer",
            found: value_kind(other),
        }),
    }
}

/// Numbers and booleans -> their string form. Strings pass through.
pub fn to_string(value: &Value) -> Result<Value, TransformError> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(TransformError::TypeMismatch {
            expected: "String",
            found: value_kind(other),
        }),
    }
}
