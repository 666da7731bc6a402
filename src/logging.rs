//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and logged in full at the `debug` level.
///
/// Password and PIN values in JSON request bodies are redacted before
/// logging.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    if headers.headers.get(CONTENT_TYPE) == Some(&"application/json".parse().unwrap()) {
        let display_text = redact_json_string_field(&body_text, "password");
        let display_text = redact_json_string_field(&display_text, "pin");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the string value of `field_name` in raw JSON text with asterisks.
///
/// Works on the raw text rather than a parsed value so that malformed bodies
/// are still logged. Values containing escaped quotes are left alone.
fn redact_json_string_field(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");

    let Some(key_start) = body_text.find(&needle) else {
        return body_text.to_string();
    };

    let after_key = key_start + needle.len();
    let Some(colon_offset) = body_text[after_key..].find(':') else {
        return body_text.to_string();
    };

    let value_start = after_key + colon_offset + 1;
    let Some(quote_offset) = body_text[value_start..].find('"') else {
        return body_text.to_string();
    };

    let open_quote = value_start + quote_offset;
    let Some(close_offset) = body_text[open_quote + 1..].find('"') else {
        return body_text.to_string();
    };

    let close_quote = open_quote + 1 + close_offset;

    format!(
        "{}\"********{}",
        &body_text[..open_quote],
        &body_text[close_quote..]
    )
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

/// Bodies longer than this many bytes are truncated in info-level logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

#[cfg(test)]
mod redact_tests {
    use super::redact_json_string_field;

    #[test]
    fn redacts_password_value() {
        let body = r#"{"email":"foo@bar.baz","password":"hunter22"}"#;

        let redacted = redact_json_string_field(body, "password");

        assert_eq!(redacted, r#"{"email":"foo@bar.baz","password":"********"}"#);
    }

    #[test]
    fn redacts_pin_value() {
        let body = r#"{"pin":"4242","name":"Jane"}"#;

        let redacted = redact_json_string_field(body, "pin");

        assert_eq!(redacted, r#"{"pin":"********","name":"Jane"}"#);
    }

    #[test]
    fn leaves_text_without_field_unchanged() {
        let body = r#"{"amount":500}"#;

        assert_eq!(redact_json_string_field(body, "password"), body);
    }
}
