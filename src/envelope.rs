//! The uniform JSON envelopes applied to every response.
//!
//! Success responses are `{"status": "success", "data": {<resource>: ...}}`,
//! client-caused failures are `{"status": "fail", "message": ...}`, and
//! unhandled failures are `{"status": "error", "statusCode": ..., "message": ...}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::Error;

/// Wrap `payload` in a success envelope, keyed by `resource`.
///
/// Use the singular resource name for single rows (e.g. `"income"`) and the
/// plural for collections (e.g. `"incomes"`).
pub fn success<T: Serialize>(status: StatusCode, resource: &str, payload: T) -> Response {
    match serde_json::to_value(payload) {
        Ok(value) => (status, Json(envelope_body(None, resource, value))).into_response(),
        Err(error) => Error::JSONSerializationError(error.to_string()).into_response(),
    }
}

/// Wrap `payload` in a success envelope that also carries a bearer `token` at
/// the top level, as returned by registration and login.
pub fn success_with_token<T: Serialize>(
    status: StatusCode,
    token: &str,
    resource: &str,
    payload: T,
) -> Response {
    match serde_json::to_value(payload) {
        Ok(value) => (status, Json(envelope_body(Some(token), resource, value))).into_response(),
        Err(error) => Error::JSONSerializationError(error.to_string()).into_response(),
    }
}

/// A client-caused failure: `{"status": "fail", "message": ...}`.
pub fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({
            "status": "fail",
            "message": message,
        })),
    )
        .into_response()
}

/// The error envelope for a request body that could not be read as JSON,
/// carrying the rejection's own status and message.
pub fn invalid_json(rejection: &JsonRejection) -> Response {
    let status = rejection.status();

    (
        status,
        Json(json!({
            "status": "error",
            "statusCode": status.as_u16(),
            "message": rejection.body_text(),
        })),
    )
        .into_response()
}

/// An unhandled failure, normalized to the error envelope.
///
/// Outside production mode the response also carries the debug rendering of
/// the error under `stack`.
pub fn server_error(error: &Error) -> Response {
    let status = StatusCode::INTERNAL_SERVER_ERROR;

    let mut body = Map::new();
    body.insert("status".to_owned(), json!("error"));
    body.insert("statusCode".to_owned(), json!(status.as_u16()));
    body.insert("message".to_owned(), json!(error.to_string()));

    if expose_error_details() {
        body.insert("stack".to_owned(), json!(format!("{error:?}")));
    }

    (status, Json(Value::Object(body))).into_response()
}

fn envelope_body(token: Option<&str>, resource: &str, value: Value) -> Value {
    let mut data = Map::new();
    data.insert(resource.to_owned(), value);

    let mut body = Map::new();
    body.insert("status".to_owned(), json!("success"));
    if let Some(token) = token {
        body.insert("token".to_owned(), json!(token));
    }
    body.insert("data".to_owned(), Value::Object(data));

    Value::Object(body)
}

fn expose_error_details() -> bool {
    std::env::var("EXPENDI_ENV").map_or(true, |mode| mode != "production")
}
