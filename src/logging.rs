//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{
        HeaderMap,
        header::{CONTENT_TYPE, HeaderValue},
    },
    middleware::Next,
    response::Response,
};

/// The form fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "confirm_password", "api_key"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Passwords and API keys in form bodies are redacted. Multipart uploads
/// (receipt images) and event streams are passed through without buffering.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let request = if is_streamed_or_binary(&parts.headers) {
        log_request(&parts, "<not logged>");
        Request::from_parts(parts, body)
    } else {
        let body_text = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                String::new()
            }
        };

        if is_form(&parts.headers) {
            let display_text = REDACTED_FIELDS
                .iter()
                .fold(body_text.clone(), |text, field| redact_field(&text, field));
            log_request(&parts, &display_text);
        } else {
            log_request(&parts, &body_text);
        }

        Request::from_parts(parts, Body::from(body_text))
    };

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();

    if is_streamed_or_binary(&parts.headers) {
        log_response(&parts, "<not logged>");
        return Response::from_parts(parts, body);
    }

    let body_text = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).to_string(),
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            String::new()
        }
    };
    log_response(&parts, &body_text);

    Response::from_parts(parts, Body::from(body_text))
}

fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value: &HeaderValue| value.to_str().ok())
        .unwrap_or_default()
}

fn is_form(headers: &HeaderMap) -> bool {
    content_type(headers).starts_with("application/x-www-form-urlencoded")
}

fn is_streamed_or_binary(headers: &HeaderMap) -> bool {
    let content_type = content_type(headers);

    content_type.starts_with("multipart/")
        || content_type.starts_with("text/event-stream")
        || content_type.starts_with("image/")
}

fn redact_field(form_text: &str, field_name: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == field_name => format!("{field_name}=********"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// The number of characters of a body to log at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Truncate `body` to at most [LOG_BODY_LENGTH_LIMIT] characters.
///
/// Returns `None` if the body is short enough to log in full.
fn truncate(body: &str) -> Option<&str> {
    body.char_indices()
        .nth(LOG_BODY_LENGTH_LIMIT)
        .map(|(byte_index, _)| &body[..byte_index])
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Received request: {headers:#?}\nbody: {truncated}...");
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!("Received request: {headers:#?}\nbody: {body:?}"),
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    match truncate(body) {
        Some(truncated) => {
            tracing::info!("Sending response: {headers:#?}\nbody: {truncated}...");
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {headers:#?}\nbody: {body:?}"),
    }
}
