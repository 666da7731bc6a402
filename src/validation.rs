//! Declarative shape checks for request bodies.
//!
//! Each route parses its JSON body with the helpers below before its handler
//! logic runs. Failures are collected as [FieldError]s and returned as a 400
//! response carrying the full list, so a client sees every problem at once.

use std::str::FromStr;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use serde::Serialize;
use serde_json::{Value, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::models::Frequency;

/// A single validation failure, naming the offending field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Where the bad value was found, e.g. `body.email`.
    pub path: String,
    /// What was wrong with it.
    pub message: String,
}

impl FieldError {
    /// Create a field error for the body field `name`.
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            path: format!("body.{name}"),
            message: message.to_string(),
        }
    }
}

/// The 400 response returned when a request body fails its shape check.
pub fn validation_failed(errors: Vec<FieldError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "status": "error",
            "message": "Validation failed",
            "errors": errors,
        })),
    )
        .into_response()
}

/// Extract a required string field, recording an error if it is missing or
/// shorter than `min` characters.
pub fn required_string(
    body: &Value,
    name: &str,
    min: usize,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match body.get(name) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(name, "Required"));
            None
        }
        Some(value) => checked_string(value, name, min, errors),
    }
}

/// Extract an optional string field, recording an error if it is present but
/// not a string of at least `min` characters.
pub fn optional_string(
    body: &Value,
    name: &str,
    min: usize,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match body.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => checked_string(value, name, min, errors),
    }
}

fn checked_string(
    value: &Value,
    name: &str,
    min: usize,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let Some(text) = value.as_str() else {
        errors.push(FieldError::new(name, "Expected string"));
        return None;
    };

    if text.chars().count() < min {
        errors.push(FieldError::new(
            name,
            &format!("String must contain at least {min} character(s)"),
        ));
        return None;
    }

    Some(text.to_string())
}

/// Extract a required integer field.
pub fn required_integer(body: &Value, name: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    match body.get(name) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(name, "Required"));
            None
        }
        Some(value) => checked_integer(value, name, errors),
    }
}

/// Extract a required positive integer field (e.g. an amount in cents).
pub fn required_positive_integer(
    body: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    required_integer(body, name, errors).and_then(|value| checked_positive(value, name, errors))
}

/// Extract an optional positive integer field.
pub fn optional_positive_integer(
    body: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<i64> {
    match body.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => {
            checked_integer(value, name, errors).and_then(|value| checked_positive(value, name, errors))
        }
    }
}

fn checked_integer(value: &Value, name: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    match value.as_i64() {
        Some(number) => Some(number),
        None => {
            errors.push(FieldError::new(name, "Expected number"));
            None
        }
    }
}

fn checked_positive(value: i64, name: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    if value > 0 {
        Some(value)
    } else {
        errors.push(FieldError::new(name, "Number must be greater than 0"));
        None
    }
}

/// Extract an optional boolean field.
pub fn optional_bool(body: &Value, name: &str, errors: &mut Vec<FieldError>) -> Option<bool> {
    match body.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(_) => {
            errors.push(FieldError::new(name, "Expected boolean"));
            None
        }
    }
}

/// Extract a required RFC 3339 datetime field.
pub fn required_datetime(
    body: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<OffsetDateTime> {
    match body.get(name) {
        None | Some(Value::Null) => {
            errors.push(FieldError::new(name, "Required"));
            None
        }
        Some(value) => checked_datetime(value, name, errors),
    }
}

/// Extract an optional RFC 3339 datetime field.
pub fn optional_datetime(
    body: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<OffsetDateTime> {
    match body.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => checked_datetime(value, name, errors),
    }
}

fn checked_datetime(
    value: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<OffsetDateTime> {
    let Some(text) = value.as_str() else {
        errors.push(FieldError::new(name, "Expected string"));
        return None;
    };

    match OffsetDateTime::parse(text, &Rfc3339) {
        Ok(datetime) => Some(datetime),
        Err(_) => {
            errors.push(FieldError::new(name, "Invalid datetime"));
            None
        }
    }
}

/// Extract an optional recurrence frequency field.
pub fn optional_frequency(
    body: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Frequency> {
    match body.get(name) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let Some(text) = value.as_str() else {
                errors.push(FieldError::new(name, "Invalid enum value"));
                return None;
            };

            match Frequency::from_str(text) {
                Ok(frequency) => Some(frequency),
                Err(_) => {
                    errors.push(FieldError::new(name, "Invalid enum value"));
                    None
                }
            }
        }
    }
}

/// Extract a required email field, checking the address format.
pub fn required_email(
    body: &Value,
    name: &str,
    errors: &mut Vec<FieldError>,
) -> Option<EmailAddress> {
    let text = required_string(body, name, 1, errors)?;

    match EmailAddress::from_str(&text) {
        Ok(email) => Some(email),
        Err(_) => {
            errors.push(FieldError::new(name, "Invalid email"));
            None
        }
    }
}

/// Extract a required 4-digit PIN field.
pub fn required_pin(body: &Value, name: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let text = required_string(body, name, 1, errors)?;

    if text.chars().count() != 4 {
        errors.push(FieldError::new(
            name,
            "String must contain exactly 4 character(s)",
        ));
        return None;
    }

    if !text.chars().all(|c| c.is_ascii_digit()) {
        errors.push(FieldError::new(name, "PIN must be 4 digits"));
        return None;
    }

    Some(text)
}
