//! Raw listing → canonical [`PropertyRecord`].
//!
//! Extraction is null-safe: any missing link in a field's path yields
//! [`FieldValue::Null`]. Only a record that cannot carry an id is rejected.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::CanonicalError;
use crate::field::{Field, FieldKind, FieldValue};
use crate::record::{PropertyId, PropertyRecord, parse_timestamp};

/// Canonicalize one raw listing observed at `observed_at`.
pub fn canonicalize(
    raw: &Value,
    observed_at: DateTime<Utc>,
) -> Result<PropertyRecord, CanonicalError> {
    if !raw.is_object() {
        return Err(CanonicalError::NotAnObject);
    }
    let id = extract_id(raw.get("id"))?;

    let mut record = PropertyRecord::empty(id, observed_at);
    for field in Field::ALL {
        let raw_value = raw.pointer(field.raw_path());
        let value = raw_value.map_or(FieldValue::Null, |v| coerce(field, v));
        if value.is_null() && raw_value.is_some_and(has_content) {
            debug!(%id, %field, "unusable raw value, storing null");
        }
        record.set(field, value);
    }
    record.updated_at = raw
        .get("updatedAt")
        .and_then(Value::as_str)
        .and_then(parse_timestamp);
    Ok(record)
}

fn extract_id(raw: Option<&Value>) -> Result<PropertyId, CanonicalError> {
    match raw {
        None | Some(Value::Null) => Err(CanonicalError::MissingId),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(PropertyId(i));
            }
            // Some feeds emit ids as `42.0`.
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(PropertyId(f as i64))
                }
                _ => Err(CanonicalError::InvalidId(n.to_string())),
            }
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(CanonicalError::MissingId);
            }
            s.parse::<i64>()
                .map(PropertyId)
                .map_err(|_| CanonicalError::InvalidId(s.to_string()))
        }
        Some(other) => Err(CanonicalError::InvalidId(other.to_string())),
    }
}

/// Whether a raw value carries anything worth keeping.
fn has_content(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn coerce(field: Field, v: &Value) -> FieldValue {
    if !has_content(v) {
        return FieldValue::Null;
    }
    match field.kind() {
        FieldKind::Number => coerce_number(v),
        FieldKind::Text => coerce_text(v),
        FieldKind::Bool => coerce_bool(v),
        FieldKind::NameList => encode_name_list(v),
    }
}

fn coerce_number(v: &Value) -> FieldValue {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() => FieldValue::Number(n),
        _ => FieldValue::Null,
    }
}

fn coerce_text(v: &Value) -> FieldValue {
    match v {
        Value::String(s) => FieldValue::Text(s.trim().to_string()),
        Value::Number(n) => FieldValue::Text(n.to_string()),
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        _ => FieldValue::Null,
    }
}

fn coerce_bool(v: &Value) -> FieldValue {
    match v {
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => FieldValue::Bool(false),
            Some(1) => FieldValue::Bool(true),
            _ => FieldValue::Null,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => FieldValue::Bool(true),
            "false" | "0" => FieldValue::Bool(false),
            _ => FieldValue::Null,
        },
        _ => FieldValue::Null,
    }
}

/// Encode `[{"name": "Pool"}, {"name": "Gym"}]` as `["Pool","Gym"]`.
///
/// Order is preserved; items without a string `name` are skipped.
fn encode_name_list(v: &Value) -> FieldValue {
    let Some(items) = v.as_array() else {
        return FieldValue::Null;
    };
    let names: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .collect();
    match serde_json::to_string(&names) {
        Ok(encoded) => FieldValue::Text(encoded),
        Err(_) => FieldValue::Null,
    }
}
