//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     RunContext → select_mode (mode.rs) → batch runner | standby server
//!
//! Shutdown (shutdown.rs):
//!     Abort received → Draining (stop accepting) → grace deadline → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (repeats are no-ops)
//!
//! Exit (outcome.rs):
//!     RunOutcome → process exit code
//! ```
//!
//! # Design Decisions
//! - Exactly one mode runs per process
//! - Shutdown has a deadline: remaining work is cancelled after the grace period

pub mod mode;
pub mod outcome;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use mode::{select_mode, Mode};
pub use outcome::RunOutcome;
pub use shutdown::{DrainOutcome, Shutdown, ShutdownPhase};
pub use startup::StartupError;
