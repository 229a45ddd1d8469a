//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming non-probe request:
//!     → auth.rs (extract token from header or query, verify)
//!     → limits.rs (bounded body read)
//!     → Pass to envelope parsing
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or rejected token stops the request before the body is read
//! - Token verification is a trait so the platform verifier can replace the static one
//! - Oversized bodies are input errors (400), not transport errors

pub mod auth;
pub mod limits;

pub use auth::{extract_token, AuthVerifier, Authenticator, StaticTokenVerifier};
