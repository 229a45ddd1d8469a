//! Caller authentication for standby requests.
//!
//! The controller only extracts the candidate token; deciding whether it is
//! valid belongs to an [`AuthVerifier`].

use std::sync::Arc;

use axum::http::{header, HeaderMap};

use crate::config::context::{RunContext, TokenSource};
use crate::task::types::TaskError;

/// Query parameter that may carry the token.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Decides whether a presented token is acceptable.
pub trait AuthVerifier: Send + Sync {
    fn verify(&self, candidate: &str) -> bool;
}

/// Accepts exactly one configured token.
pub struct StaticTokenVerifier {
    token: String,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl AuthVerifier for StaticTokenVerifier {
    fn verify(&self, candidate: &str) -> bool {
        candidate == self.token
    }
}

struct DenyAll;

impl AuthVerifier for DenyAll {
    fn verify(&self, _: &str) -> bool {
        false
    }
}

/// Pull the candidate token out of a request.
///
/// `Authorization: Bearer <token>` wins over the `token` query parameter.
pub fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let from_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            let (scheme, token) = v.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
        })
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        url::form_urlencoded::parse(query?.as_bytes())
            .filter(|(key, _)| key == TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.into_owned())
            .find(|value| !value.is_empty())
    })
}

/// Per-request authentication gate.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Option<Arc<dyn AuthVerifier>>,
}

impl Authenticator {
    /// Require a token accepted by `verifier`.
    pub fn new(verifier: Arc<dyn AuthVerifier>) -> Self {
        Self {
            verifier: Some(verifier),
        }
    }

    /// Let every request through.
    pub fn disabled() -> Self {
        Self { verifier: None }
    }

    /// Build the gate from the run context.
    ///
    /// With auth required but no token configured, every request is rejected.
    pub fn from_context(context: &RunContext, required: bool) -> Self {
        if !required {
            return Self::disabled();
        }
        match &context.token {
            TokenSource::Static(token) => Self::new(Arc::new(StaticTokenVerifier::new(token.clone()))),
            TokenSource::None => Self::new(Arc::new(DenyAll)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    pub fn authenticate(&self, headers: &HeaderMap, query: Option<&str>) -> Result<(), TaskError> {
        let Some(verifier) = &self.verifier else {
            return Ok(());
        };

        let token = extract_token(headers, query).ok_or_else(|| {
            TaskError::unauthorized(
                "Missing API token. Pass it in the `Authorization: Bearer <token>` header or the `token` query parameter.",
            )
            .with_code("TOKEN_MISSING")
        })?;

        if verifier.verify(&token) {
            Ok(())
        } else {
            Err(TaskError::unauthorized("Invalid API token.").with_code("TOKEN_INVALID"))
        }
    }
}
