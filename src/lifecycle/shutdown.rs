//! Shutdown coordination for the controller.
//!
//! `Running → Draining → Stopped`. The transition out of `Running` happens
//! exactly once; every later abort notification is a no-op.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Phase of the shutdown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    /// Accepting new work.
    Running,
    /// No new work; in-flight work may finish until the grace deadline.
    Draining,
    /// All resources released.
    Stopped,
}

/// How draining ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Everything in flight finished before the grace deadline.
    Graceful,
    /// The grace deadline passed and remaining work was cancelled.
    Forced,
}

/// Coordinator for graceful shutdown.
///
/// Cheap to clone; all clones observe the same state. Long-running tasks
/// either wait on [`Shutdown::requested`] or hold a token from
/// [`Shutdown::child_token`], which fires when the coordinator forces
/// cancellation.
#[derive(Debug, Clone)]
pub struct Shutdown {
    phase: Arc<watch::Sender<ShutdownPhase>>,
    force: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ShutdownPhase::Running);
        Self {
            phase: Arc::new(tx),
            force: CancellationToken::new(),
        }
    }

    /// Request shutdown. Returns `true` only for the call that started draining.
    pub fn trigger(&self) -> bool {
        self.phase.send_if_modified(|phase| {
            if *phase == ShutdownPhase::Running {
                *phase = ShutdownPhase::Draining;
                true
            } else {
                false
            }
        })
    }

    /// Current phase.
    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.borrow()
    }

    pub fn is_requested(&self) -> bool {
        self.phase() != ShutdownPhase::Running
    }

    /// Subscribe to phase changes.
    pub fn subscribe(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase.subscribe()
    }

    /// Resolve once shutdown has been requested. Returns immediately if it already was.
    pub async fn requested(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|phase| *phase != ShutdownPhase::Running).await;
    }

    /// Token for one unit of work; cancelled when the coordinator forces shutdown.
    pub fn child_token(&self) -> CancellationToken {
        self.force.child_token()
    }

    /// Cancel every token handed out by [`Shutdown::child_token`].
    pub fn force_cancel(&self) {
        self.trigger();
        self.force.cancel();
    }

    pub fn is_forced(&self) -> bool {
        self.force.is_cancelled()
    }

    /// Record that all resources have been released.
    pub fn mark_stopped(&self) {
        self.phase.send_modify(|phase| *phase = ShutdownPhase::Stopped);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
