//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (platform environment, then command-line overrides)
//!     → validation.rs (semantic checks)
//!     → RunnerConfig (validated, immutable)
//!     → context.rs (RunContext, built exactly once)
//!     → threaded explicitly into mode selection, standby server, batch runner
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; nothing re-reads it after startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment access goes through `EnvSource` so tests never touch process state

pub mod context;
pub mod loader;
pub mod schema;
pub mod validation;

pub use context::{OriginKind, RunContext, TokenSource};
pub use loader::{load_config, ConfigError, ConfigOverrides, EnvSource, ProcessEnv};
pub use schema::{LogFormat, ObservabilityConfig, RunnerConfig};
