//! Standby HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router: every method and path goes to the task handler
//! - Wire up middleware (request ID, tracing, readiness probe, panic catching)
//! - Serve a bound listener until shutdown, then drain within the grace period
//!
//! # Request Pipeline
//! ```text
//! request → request ID → trace span → readiness probe? ──yes──▶ 200 "Ready!"
//!                                          │ no
//!                                          ▼
//!           auth → body (POST) → parse → input schema → processor → envelope
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header::InvalidHeaderName, HeaderMap, HeaderName, Method, Uri},
    middleware,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{RunContext, RunnerConfig};
use crate::http::readiness::{self, ReadinessProbe};
use crate::http::request::{self, RequestUuid};
use crate::http::response::{self, TaskResponse};
use crate::lifecycle::shutdown::{DrainOutcome, Shutdown};
use crate::net::InFlightTracker;
use crate::observability::metrics;
use crate::security::{limits, Authenticator};
use crate::task::schema::{self, InputValidator};
use crate::task::types::{TaskError, TaskResult};
use crate::task::{processor, SharedProcessor};

/// Error type for standby server setup and serving.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid readiness header {name:?}: {source}")]
    ReadinessHeader {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: SharedProcessor,
    pub auth: Authenticator,
    pub validator: Option<Arc<dyn InputValidator>>,
    pub shutdown: Shutdown,
    pub in_flight: InFlightTracker,
    pub request_timeout: Duration,
    pub max_body_size: usize,
}

/// HTTP server for standby mode.
pub struct StandbyServer {
    state: AppState,
    readiness: ReadinessProbe,
    grace: Duration,
}

impl StandbyServer {
    pub fn new(
        config: &RunnerConfig,
        context: &RunContext,
        processor: SharedProcessor,
        shutdown: Shutdown,
    ) -> Result<Self, ServerError> {
        let header_name = &config.standby.readiness_header;
        let header = HeaderName::from_bytes(header_name.as_bytes()).map_err(|source| {
            ServerError::ReadinessHeader {
                name: header_name.clone(),
                source,
            }
        })?;

        let auth = Authenticator::from_context(context, config.auth.required);
        if !auth.is_enabled() {
            tracing::warn!("Standby authentication is disabled");
        }

        let state = AppState {
            processor,
            auth,
            validator: None,
            shutdown,
            in_flight: InFlightTracker::new(),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            max_body_size: config.security.max_body_size,
        };

        Ok(Self {
            state,
            readiness: ReadinessProbe::new(header),
            grace: Duration::from_secs(config.shutdown.grace_secs),
        })
    }

    /// Validate and default every request's input against `validator`.
    pub fn with_validator(mut self, validator: Arc<dyn InputValidator>) -> Self {
        self.state.validator = Some(validator);
        self
    }

    /// Tracker of requests currently in the task handler.
    pub fn in_flight(&self) -> InFlightTracker {
        self.state.in_flight.clone()
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(handle_task))
            .fallback(handle_task)
            .with_state(self.state.clone())
            .layer(CatchPanicLayer::custom(response::panic_response))
            .layer(middleware::from_fn_with_state(
                self.readiness.clone(),
                readiness::answer_probe,
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestUuid))
    }

    /// Serve `listener` until shutdown is requested, then drain.
    ///
    /// Returns [`DrainOutcome::Forced`] when handlers were still running at
    /// the grace deadline; their cancellation tokens have fired by then.
    pub async fn run(self, listener: TcpListener) -> Result<DrainOutcome, ServerError> {
        let addr = listener.local_addr()?;
        let shutdown = self.state.shutdown.clone();
        let in_flight = self.state.in_flight.clone();
        let app = self.router();

        let stop = shutdown.clone();
        let mut serving = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.requested().await })
                .await
        });

        tracing::info!(address = %addr, "Standby server listening");

        tokio::select! {
            finished = &mut serving => {
                // Serving ended on its own: a listener failure, not a shutdown.
                shutdown.trigger();
                shutdown.mark_stopped();
                finished??;
                return Ok(DrainOutcome::Graceful);
            }
            _ = shutdown.requested() => {}
        }

        tracing::info!(
            in_flight = in_flight.active_count(),
            grace_secs = self.grace.as_secs(),
            "Draining standby server"
        );

        let outcome = match tokio::time::timeout(self.grace, &mut serving).await {
            Ok(finished) => {
                finished??;
                DrainOutcome::Graceful
            }
            Err(_) => {
                tracing::warn!(
                    in_flight = in_flight.active_count(),
                    "Grace period elapsed, cancelling remaining requests"
                );
                shutdown.force_cancel();
                serving.abort();
                DrainOutcome::Forced
            }
        };

        shutdown.mark_stopped();
        tracing::info!(outcome = ?outcome, "Standby server stopped");
        Ok(outcome)
    }
}

/// Task handler for every non-probe request.
async fn handle_task(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> TaskResponse {
    let start = Instant::now();
    let guard = state.in_flight.track();
    let request_id = request::request_id(&headers).to_string();

    tracing::debug!(
        request_id = %request_id,
        request_seq = %guard.seq(),
        method = %method,
        path = %uri.path(),
        "Handling task request"
    );

    let outcome = run_task(&state, &method, uri.query(), &headers, body).await;
    let status = response::status_of(&outcome);
    metrics::record_request(method.as_str(), status.as_u16(), start);

    match &outcome {
        Ok(_) => tracing::info!(
            request_id = %request_id,
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Task succeeded"
        ),
        Err(e) if status.is_server_error() => tracing::error!(
            request_id = %request_id,
            status = status.as_u16(),
            kind = %e.kind,
            error = %e.message,
            "Task failed"
        ),
        Err(e) => tracing::warn!(
            request_id = %request_id,
            status = status.as_u16(),
            kind = %e.kind,
            error = %e.message,
            "Task request rejected"
        ),
    }

    drop(guard);
    TaskResponse(outcome)
}

async fn run_task(
    state: &AppState,
    method: &Method,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Body,
) -> Result<TaskResult, TaskError> {
    state.auth.authenticate(headers, query)?;

    let body = if method == Method::POST {
        limits::read_body(body, state.max_body_size).await?
    } else {
        Bytes::new()
    };

    let input = request::parse(method, headers, query, &body)?;
    let input = match &state.validator {
        Some(validator) => schema::check_input(validator.as_ref(), input)?,
        None => input,
    };

    processor::invoke(
        Arc::clone(&state.processor),
        input,
        state.shutdown.child_token(),
        Some(state.request_timeout),
    )
    .await
}
