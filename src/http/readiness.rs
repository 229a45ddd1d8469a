//! Platform readiness probe.
//!
//! A request carrying the probe header is answered here, ahead of auth and
//! input parsing, whatever its method, path or body.

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::observability::metrics;

/// Header the platform sets on readiness probes.
pub const READINESS_HEADER: &str = "x-apify-container-server-readiness-probe";

/// Body of a readiness answer.
pub const READY_BODY: &str = "Ready!";

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    header: HeaderName,
}

impl ReadinessProbe {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    pub fn matches(&self, request: &Request) -> bool {
        request.headers().contains_key(&self.header)
    }
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new(HeaderName::from_static(READINESS_HEADER))
    }
}

/// Middleware answering probes before the task handler sees them.
pub async fn answer_probe(
    State(probe): State<ReadinessProbe>,
    request: Request,
    next: Next,
) -> Response {
    if !probe.matches(&request) {
        return next.run(request).await;
    }

    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        "Readiness probe"
    );
    metrics::record_readiness_probe();
    ready_response()
}

pub fn ready_response() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        READY_BODY,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn matches_on_header_presence_only() {
        let probe = ReadinessProbe::default();
        let with = Request::builder()
            .method("DELETE")
            .uri("/any/path")
            .header(READINESS_HEADER, "")
            .body(Body::empty())
            .unwrap();
        let without = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert!(probe.matches(&with));
        assert!(!probe.matches(&without));
    }

    #[tokio::test]
    async fn ready_response_is_plain_text() {
        let response = ready_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 64).await.unwrap();
        assert_eq!(&body[..], READY_BODY.as_bytes());
    }
}
