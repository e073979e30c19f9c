//! Request body extraction with input sanitization.
//!
//! Bodies may be JSON or form-encoded. Every string is trimmed, and values
//! carrying a script block or a `javascript:` URL are rejected outright.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::AppError;

pub const SECURITY_VIOLATION: &str = "Invalid input - security violation detected.";

lazy_static! {
    static ref DANGEROUS_INPUT: Regex =
        Regex::new(r"(?is)<script\b.*?</script\s*>|javascript:").expect("valid sanitizer pattern");
}

/// A sanitized request body as a JSON object.
#[derive(Debug, Clone, Default)]
pub struct SanitizedPayload(pub Map<String, Value>);

impl SanitizedPayload {
    pub fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for SanitizedPayload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        let value = if is_form {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect(),
            )
        } else {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            if body.iter().all(u8::is_ascii_whitespace) {
                Value::Object(Map::new())
            } else {
                serde_json::from_slice(&body)
                    .map_err(|_| AppError::bad_request("Malformed JSON body"))?
            }
        };

        match sanitize(value)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(AppError::bad_request("Request body must be a JSON object")),
        }
    }
}

/// Trim every string in `value` and reject dangerous content.
pub fn sanitize(value: Value) -> Result<Value, AppError> {
    match value {
        Value::String(s) => {
            if DANGEROUS_INPUT.is_match(&s) {
                tracing::warn!("Blocked potentially malicious input");
                return Err(AppError::bad_request(SECURITY_VIOLATION));
            }
            Ok(Value::String(s.trim().to_string()))
        }
        Value::Array(items) => items
            .into_iter()
            .map(sanitize)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| sanitize(v).map(|v| (k, v)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        other => Ok(other),
    }
}
