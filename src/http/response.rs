//! Response formatting.
//!
//! # Responsibilities
//! - Map every task outcome to exactly one status code
//! - Wrap payloads and errors in the stable JSON envelope
//! - Turn handler panics into the same error envelope
//!
//! # Design Decisions
//! - Pretty-printed UTF-8 JSON, non-ASCII characters left unescaped
//! - Formatting is total: there is no outcome without a status

use std::any::Any;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::task::processor::panic_message;
use crate::task::types::{TaskError, TaskErrorKind, TaskResult};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

const FALLBACK_ERROR_BODY: &str =
    "{\n  \"status\": \"error\",\n  \"error\": \"Failed to serialize response\"\n}";

#[derive(Serialize)]
struct SuccessEnvelope<'a> {
    status: &'static str,
    data: &'a Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    artifacts: Vec<ArtifactSummary<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactSummary<'a> {
    name: &'a str,
    content_type: &'a str,
    size: usize,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    status: &'static str,
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}

/// HTTP status for an error kind.
pub fn status_for(kind: TaskErrorKind) -> StatusCode {
    match kind {
        TaskErrorKind::Validation => StatusCode::BAD_REQUEST,
        TaskErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        TaskErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        TaskErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        TaskErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        TaskErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// HTTP status for a task outcome.
pub fn status_of(outcome: &Result<TaskResult, TaskError>) -> StatusCode {
    match outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e.kind),
    }
}

/// Render a task outcome as status code and JSON body.
pub fn format(outcome: &Result<TaskResult, TaskError>) -> (StatusCode, String) {
    let status = status_of(outcome);
    let rendered = match outcome {
        Ok(result) => serde_json::to_string_pretty(&SuccessEnvelope {
            status: "success",
            data: &result.payload,
            artifacts: result
                .artifacts
                .iter()
                .map(|a| ArtifactSummary {
                    name: &a.name,
                    content_type: &a.content_type,
                    size: a.data.len(),
                })
                .collect(),
        }),
        Err(err) => serde_json::to_string_pretty(&ErrorEnvelope {
            status: "error",
            error: &err.message,
            code: err.code.as_deref(),
        }),
    };

    match rendered {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response");
            (StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_ERROR_BODY.to_string())
        }
    }
}

/// A task outcome on its way to the client.
#[derive(Debug)]
pub struct TaskResponse(pub Result<TaskResult, TaskError>);

impl From<TaskError> for TaskResponse {
    fn from(err: TaskError) -> Self {
        Self(Err(err))
    }
}

impl IntoResponse for TaskResponse {
    fn into_response(self) -> Response {
        let (status, body) = format(&self.0);
        (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            body,
        )
            .into_response()
    }
}

/// Response used by `CatchPanicLayer` when a handler panics.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    tracing::error!(panic = %message, "Request handler panicked");
    TaskResponse::from(
        TaskError::internal("Internal error while handling the request.").with_code("HANDLER_PANIC"),
    )
    .into_response()
}
