//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check that standby mode has what it needs (token, header name)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RunnerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::context::OriginKind;
use crate::config::schema::RunnerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("run.port must be non-zero in standby mode")]
    ZeroPort,

    #[error("run.public_url `{0}` is not an absolute URL")]
    InvalidPublicUrl(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("standby.readiness_header `{0}` is not a valid header name")]
    InvalidReadinessHeader(String),

    #[error("auth.required is set but no token was configured for standby mode")]
    MissingToken,

    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &RunnerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let standby = OriginKind::parse(config.run.origin.as_deref()) == OriginKind::Standby;

    if standby && config.run.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if let Some(raw) = &config.run.public_url {
        if Url::parse(raw).map(|u| u.cannot_be_a_base()).unwrap_or(true) {
            errors.push(ValidationError::InvalidPublicUrl(raw.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }
    if config.timeouts.batch_secs == Some(0) {
        errors.push(ValidationError::ZeroDuration("timeouts.batch_secs"));
    }
    if config.shutdown.grace_secs == 0 {
        errors.push(ValidationError::ZeroDuration("shutdown.grace_secs"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if HeaderName::from_bytes(config.standby.readiness_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidReadinessHeader(
            config.standby.readiness_header.clone(),
        ));
    }

    let has_token = config
        .run
        .token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if standby && config.auth.required && !has_token {
        errors.push(ValidationError::MissingToken);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
