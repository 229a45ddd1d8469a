//! Batch mode: one task, run to completion, result to storage.
//!
//! # Data Flow
//! ```text
//! INPUT.json → storage::load_input → schema check → processor (once)
//!     → Ok:  ResultSink::push → exit 0
//!     → Err: log → non-zero exit, nothing pushed
//! ```

pub mod runner;

pub use runner::BatchRunner;
