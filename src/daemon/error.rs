//! Timer state machine errors.
//!
//! Every variant is recoverable: the supervisor maps each one to a typed
//! response and the daemon keeps serving.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by [`TimerSupervisor`](super::TimerSupervisor) operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// A timer is already live.
    #[error("a timer is already running")]
    AlreadyRunning,

    /// No timer is live.
    #[error("no timer is running")]
    NotRunning,

    /// The timer is already paused.
    #[error("the timer is already paused")]
    AlreadyPaused,

    /// The timer is not paused.
    #[error("the timer is not paused")]
    NotPaused,

    /// The runner did not answer a status query in time.
    #[error("the timer did not respond within {0:?}")]
    Unresponsive(Duration),
}

impl TimerError {
    /// Returns true if this error is a state machine violation rather than
    /// an internal failure.
    #[must_use]
    pub fn is_state_violation(&self) -> bool {
        !matches!(self, Self::Unresponsive(_))
    }
}
