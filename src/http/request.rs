//! Request envelope parsing.
//!
//! # Responsibilities
//! - Turn GET query strings and POST bodies into one canonical TaskInput
//! - Reject unsupported methods and malformed bodies
//! - Generate a request ID for every request
//!
//! # Design Decisions
//! - Parsing is deterministic and performs no I/O
//! - Query values stay strings; coercion is the processor's job
//! - The `token` query parameter is credentials, never task input

use axum::http::{header, HeaderMap, HeaderValue, Method, Request};
use serde_json::Value;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::security::auth::TOKEN_QUERY_PARAM;
use crate::task::types::{TaskError, TaskInput};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestUuid;

impl MakeRequestId for RequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID assigned to a request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Build the task input for a request.
pub fn parse(
    method: &Method,
    headers: &HeaderMap,
    query: Option<&str>,
    body: &[u8],
) -> Result<TaskInput, TaskError> {
    match *method {
        Method::GET => Ok(parse_query(query.unwrap_or_default())),
        Method::POST if is_form(headers) => Ok(parse_pairs(&String::from_utf8_lossy(body))),
        Method::POST => parse_json_body(body),
        _ => Err(TaskError::method_not_allowed(format!(
            "Method {} is not supported. Use GET with query parameters or POST with a JSON body.",
            method
        ))
        .with_code("METHOD_NOT_ALLOWED")),
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}

fn parse_query(query: &str) -> TaskInput {
    let mut input = parse_pairs(query);
    input.remove(TOKEN_QUERY_PARAM);
    input
}

fn parse_pairs(encoded: &str) -> TaskInput {
    url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect()
}

fn parse_json_body(body: &[u8]) -> Result<TaskInput, TaskError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TaskInput::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TaskError::validation("Request body must be a JSON object.")
            .with_code("INVALID_BODY")),
        Err(e) => Err(TaskError::validation(format!("Request body is not valid JSON: {}", e))
            .with_code("INVALID_JSON")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::TaskErrorKind;
    use serde_json::json;

    fn get(query: &str) -> Result<TaskInput, TaskError> {
        parse(&Method::GET, &HeaderMap::new(), Some(query), b"")
    }

    fn post(body: &str) -> Result<TaskInput, TaskError> {
        parse(&Method::POST, &HeaderMap::new(), None, body.as_bytes())
    }

    #[test]
    fn get_takes_decoded_query_pairs() {
        let input = get("url=https%3A%2F%2Fexample.com&maxItems=5&token=T").unwrap();
        assert_eq!(input.get("url"), Some(&json!("https://example.com")));
        assert_eq!(input.get("maxItems"), Some(&json!("5")));
        assert!(!input.contains_key("token"));
    }

    #[test]
    fn get_without_query_is_empty() {
        let input = parse(&Method::GET, &HeaderMap::new(), None, b"").unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn repeated_keys_keep_last_value() {
        let input = get("tag=a&tag=b").unwrap();
        assert_eq!(input.get("tag"), Some(&json!("b")));
    }

    #[test]
    fn post_takes_json_object() {
        let input = post(r#"{"url": "https://example.com", "maxItems": 3, "title": "Příliš žluťoučký"}"#).unwrap();
        assert_eq!(input.get("maxItems"), Some(&json!(3)));
        assert_eq!(input.get("title"), Some(&json!("Příliš žluťoučký")));
    }

    #[test]
    fn empty_post_body_is_empty_input() {
        assert!(post("").unwrap().is_empty());
        assert!(post("  \n").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_validation_error() {
        let err = post("{not json").unwrap_err();
        assert_eq!(err.kind, TaskErrorKind::Validation);
        assert_eq!(err.code.as_deref(), Some("INVALID_JSON"));
    }

    #[test]
    fn non_object_json_is_validation_error() {
        let err = post("[1, 2, 3]").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("INVALID_BODY"));
    }

    #[test]
    fn form_post_keeps_every_field() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=utf-8"),
        );
        let input = parse(&Method::POST, &headers, None, b"url=https%3A%2F%2Fa.io&token=T").unwrap();
        assert_eq!(input.get("url"), Some(&json!("https://a.io")));
        assert_eq!(input.get("token"), Some(&json!("T")));
    }

    #[test]
    fn other_methods_are_rejected() {
        for method in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let err = parse(&method, &HeaderMap::new(), None, b"").unwrap_err();
            assert_eq!(err.kind, TaskErrorKind::MethodNotAllowed);
        }
    }

    #[test]
    fn request_uuid_is_valid_header() {
        let request = Request::new(());
        let id = RequestUuid.make_request_id(&request).unwrap();
        assert_eq!(id.header_value().len(), 36);
    }
}
