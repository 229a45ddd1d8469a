//! Task subsystem: the values that flow through a run and the pluggable processor.
//!
//! # Data Flow
//! ```text
//! TaskInput (query string, JSON body or INPUT.json)
//!     → schema.rs (defaults + required/type checks)
//!     → processor.rs (TaskProcessor::process under a cancellation token)
//!     → Result<TaskResult, TaskError>
//!     → http::response (standby) | storage::ResultSink (batch)
//! ```
//!
//! # Design Decisions
//! - The controller never looks inside a TaskInput beyond schema checks
//! - Processors run in their own task so a panic becomes an Internal error
//! - Cancellation is cooperative; the controller stops waiting, it never kills

pub mod processor;
pub mod sample;
pub mod schema;
pub mod types;

pub use processor::{invoke, run_to_completion, SharedProcessor, TaskProcessor};
pub use sample::SampleProcessor;
pub use schema::{FieldError, InputSchema, InputValidator};
pub use types::{Artifact, TaskError, TaskErrorKind, TaskInput, TaskResult};
