//! Actor task execution controller.
//!
//! Runs one pluggable [`TaskProcessor`] either as a batch job (input from
//! storage, result to a dataset, process exit code) or as a standby HTTP
//! server answering task requests until it is told to stop.
//!
//! # Architecture Overview
//!
//! ```text
//!   config ──▶ RunContext ──▶ select_mode
//!                                 │
//!             ┌───────────────────┴────────────────────┐
//!             ▼                                        ▼
//!        batch runner                           standby server
//!   INPUT.json → processor → dataset    request → auth → parse → processor
//!             │                                        │
//!             ▼                                        ▼
//!         exit code                           JSON envelope + status
//!
//!   Cross-cutting: lifecycle (signals, shutdown, drain), security,
//!   observability (tracing, metrics)
//! ```

// Core subsystems
pub mod batch;
pub mod config;
pub mod http;
pub mod net;
pub mod storage;
pub mod task;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::{RunContext, RunnerConfig};
pub use http::StandbyServer;
pub use lifecycle::{RunOutcome, Shutdown};
pub use task::{TaskError, TaskErrorKind, TaskInput, TaskProcessor, TaskResult};
