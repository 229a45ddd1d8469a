//! Request size limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//!
//! # Design Decisions
//! - The body is only read for methods that carry input (POST)
//! - Exceeding the limit is reported as a Validation error so the status
//!   stays within the controller's response contract

use axum::body::{Body, Bytes};

use crate::task::types::TaskError;

/// Read at most `limit` bytes of `body`.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, TaskError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        TaskError::validation(format!(
            "Request body could not be read (limit is {} bytes): {}",
            limit, e
        ))
        .with_code("BODY_REJECTED")
    })
}
