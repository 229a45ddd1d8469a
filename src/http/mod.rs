//! HTTP protocol handling subsystem (standby mode).
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, drain on shutdown)
//!     → readiness.rs (probe header? answer "Ready!" and stop)
//!     → request.rs (request ID, query/body → TaskInput)
//!     → [processor runs under timeout and shutdown token]
//!     → response.rs (status mapping, JSON envelope)
//!     → Send to client
//! ```

pub mod readiness;
pub mod request;
pub mod response;
pub mod server;

pub use readiness::{ReadinessProbe, READINESS_HEADER, READY_BODY};
pub use request::{RequestUuid, X_REQUEST_ID};
pub use response::TaskResponse;
pub use server::{ServerError, StandbyServer};
