//! Canonical request, success and failure values.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Input handed to a processor: a JSON object keyed by field name.
pub type TaskInput = Map<String, Value>;

/// Successful outcome of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    /// JSON payload returned to the caller or pushed to the dataset.
    pub payload: Value,

    /// Named binary outputs (screenshots, exports, ...).
    pub artifacts: Vec<Artifact>,
}

impl TaskResult {
    /// Create a result without artifacts.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            artifacts: Vec::new(),
        }
    }

    /// Attach an artifact to the result.
    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }
}

/// A binary blob produced alongside the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// Failure category. Each kind maps to exactly one HTTP status and one exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskErrorKind {
    /// Bad or missing input.
    Validation,
    /// Missing or rejected credential.
    Unauthorized,
    /// HTTP verb other than GET/POST.
    MethodNotAllowed,
    /// A dependency of the processor failed.
    Upstream,
    /// The processor exceeded its time budget.
    Timeout,
    /// Anything unexpected, including panics.
    Internal,
}

impl TaskErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskErrorKind::Validation => "VALIDATION",
            TaskErrorKind::Unauthorized => "UNAUTHORIZED",
            TaskErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            TaskErrorKind::Upstream => "UPSTREAM",
            TaskErrorKind::Timeout => "TIMEOUT",
            TaskErrorKind::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for TaskErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed task failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TaskError {
    pub kind: TaskErrorKind,
    pub message: String,
    /// Optional machine-readable code, surfaced as `code` in the error envelope.
    pub code: Option<String>,
}

impl TaskError {
    pub fn new(kind: TaskErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            code: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(TaskErrorKind::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(TaskErrorKind::Unauthorized, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::new(TaskErrorKind::MethodNotAllowed, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(TaskErrorKind::Upstream, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TaskErrorKind::Timeout, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(TaskErrorKind::Internal, message)
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}
