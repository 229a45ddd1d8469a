//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Standby start
//!     → listener.rs (bind the standby port before serving)
//!     → HTTP layer (axum serves the bound listener)
//!     → connection.rs (in-flight request tracking for drain and metrics)
//! ```
//!
//! # Design Decisions
//! - Binding happens before the server reports itself as listening
//! - In-flight tracking is per request, not per TCP connection

pub mod connection;
pub mod listener;

pub use connection::{InFlightGuard, InFlightTracker};
pub use listener::{bind, standby_address, ListenerError};
