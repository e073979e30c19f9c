//! Lenient readers for patient fields arriving as untyped JSON.
//!
//! Form posts and CSV-derived records carry numbers as strings, so every
//! numeric reader accepts either a JSON number or a numeric string. A field
//! that is missing, `null` or an empty string reads as `None`.

use serde_json::{Map, Value};

use crate::error::ScoringError;

/// Markers the stroke dataset uses for an unmeasured BMI.
const MISSING_MARKERS: &[&str] = &["n/a", "na", "nan", "none", "null"];

fn invalid(field: &str, value: &Value) -> ScoringError {
    ScoringError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn present<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

/// Read a real-valued field.
pub fn number(map: &Map<String, Value>, field: &str) -> Result<Option<f64>, ScoringError> {
    let Some(value) = present(map, field) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    // "NaN" and "inf" parse as f64 but are not measurements
    parsed
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| invalid(field, value))
}

/// Read a 0/1 style integer flag. Fractional numbers truncate toward zero.
pub fn flag(map: &Map<String, Value>, field: &str) -> Result<Option<i64>, ScoringError> {
    let Some(value) = present(map, field) else {
        return Ok(None);
    };
    match value {
        Value::Bool(b) => Ok(Some(i64::from(*b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => n
                .as_f64()
                .filter(|f| f.is_finite())
                .map(|f| Some(f.trunc() as i64))
                .ok_or_else(|| invalid(field, value)),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(field, value)),
        _ => Err(invalid(field, value)),
    }
}

/// Read a BMI value, mapping the dataset's missing-value markers to `None`.
pub fn bmi(map: &Map<String, Value>, field: &str) -> Result<Option<f64>, ScoringError> {
    if let Some(Value::String(s)) = map.get(field) {
        return bmi_from_str(s).map_err(|_| invalid(field, &Value::String(s.clone())));
    }
    number(map, field)
}

/// Parse a BMI cell as written in the stroke dataset CSV.
pub fn bmi_from_str(raw: &str) -> Result<Option<f64>, ScoringError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|b| b.is_finite())
        .map(Some)
        .ok_or_else(|| ScoringError::InvalidNumber {
            field: "bmi".to_string(),
            value: raw.to_string(),
        })
}

/// Read a string field.
pub fn text(map: &Map<String, Value>, field: &str) -> Result<Option<String>, ScoringError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(ScoringError::ExpectedString(field.to_string())),
    }
}
