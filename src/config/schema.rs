//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the actor controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RunnerConfig {
    /// Run context inputs (origin, port, token, storage).
    pub run: RunConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Shutdown coordination.
    pub shutdown: ShutdownConfig,

    /// Standby server behaviour.
    pub standby: StandbyConfig,

    /// Authentication settings.
    pub auth: AuthConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Values that make up the immutable run context.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    /// Where the run came from; `STANDBY` selects the HTTP server.
    pub origin: Option<String>,

    /// Port the standby server listens on.
    pub port: u16,

    /// Externally reachable base URL of the standby server.
    pub public_url: Option<String>,

    /// Token callers must present in standby mode.
    pub token: Option<String>,

    /// Root of the local storage emulation (datasets, key-value stores).
    pub storage_dir: PathBuf,

    /// Explicit input document for batch runs.
    pub input_path: Option<PathBuf>,

    /// Input schema document used for defaults and validation.
    pub input_schema_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            origin: None,
            port: 4321,
            public_url: None,
            token: None,
            storage_dir: PathBuf::from("./storage"),
            input_path: None,
            input_schema_path: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for one processor invocation in standby mode, in seconds.
    pub request_secs: u64,

    /// Optional upper bound for the processor in batch mode, in seconds.
    pub batch_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            batch_secs: None,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Time in-flight requests get to finish before forced cancellation.
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 10 }
    }
}

/// Standby server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StandbyConfig {
    /// Header whose presence marks a load-balancer readiness probe.
    pub readiness_header: String,
}

impl Default for StandbyConfig {
    fn default() -> Self {
        Self {
            readiness_header: "x-apify-container-server-readiness-probe".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Require a valid token on every non-probe request.
    pub required: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { required: true }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum POST body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
