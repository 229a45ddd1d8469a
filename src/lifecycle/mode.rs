//! Execution mode selection.

use std::fmt;

use crate::config::context::{OriginKind, RunContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Batch,
    Standby,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Batch => f.write_str("batch"),
            Mode::Standby => f.write_str("standby"),
        }
    }
}

/// Pick the execution mode for this process.
///
/// Anything other than a standby origin runs as a batch job: it is the
/// bounded-lifetime mode.
pub fn select_mode(context: &RunContext) -> Mode {
    match context.origin {
        OriginKind::Standby => Mode::Standby,
        OriginKind::Batch | OriginKind::Other(_) => Mode::Batch,
    }
}
