//! Core data types for the countdown timer.
//!
//! This module defines the data structures used for:
//! - Commands sent from the client to the daemon
//! - Typed responses, one outcome set per command
//! - Timer status snapshots shared by the runner and the wire format

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Upper bound accepted for `start` durations (99 hours).
pub const MAX_DURATION_SECS: u64 = 99 * 60 * 60;

// ============================================================================
// TimerStatus
// ============================================================================

/// Snapshot of a live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    /// Total seconds, fixed when the timer was started
    pub duration: u64,
    /// Seconds left
    pub remaining: u64,
    /// Whether the countdown is currently frozen
    pub is_paused: bool,
}

// ============================================================================
// Command
// ============================================================================

/// Request sent from the client to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    /// Start a new timer
    Start {
        /// Duration in seconds
        duration: u64,
    },
    /// Stop the running timer
    Stop,
    /// Pause the running timer
    Pause,
    /// Resume the paused timer
    Resume,
    /// Query the current status
    Status,
}

/// Reasons a request payload is rejected at the decode boundary.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Nothing was received
    #[error("empty request")]
    Empty,

    /// Payload is not a recognized command
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Start duration above the accepted bound
    #[error("duration {duration}s exceeds the maximum of {max}s")]
    DurationOutOfRange {
        /// Requested duration
        duration: u64,
        /// Accepted maximum
        max: u64,
    },
}

impl Command {
    /// Decodes and validates a raw request payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is empty, is not a known command,
    /// or asks for a duration above [`MAX_DURATION_SECS`].
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ProtocolError::Empty);
        }

        let command: Command = serde_json::from_slice(bytes)?;

        if let Command::Start { duration } = command {
            if duration > MAX_DURATION_SECS {
                return Err(ProtocolError::DurationOutOfRange {
                    duration,
                    max: MAX_DURATION_SECS,
                });
            }
        }

        Ok(command)
    }

    /// Returns the lowercase command name.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start { .. } => "start",
            Command::Stop => "stop",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Status => "status",
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Outcome of a `start` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum StartResponse {
    /// Timer started
    Ok {
        /// Duration in seconds
        duration: u64,
    },
    /// A timer is already live
    AlreadyRunning,
}

/// Outcome of a `stop` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum StopResponse {
    Ok,
    NotRunning,
}

/// Outcome of a `pause` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum PauseResponse {
    Ok,
    AlreadyPaused,
    NotRunning,
    /// The timer did not answer the status query in time
    Unresponsive,
}

/// Outcome of a `resume` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum ResumeResponse {
    Ok,
    NotPaused,
    /// The timer did not answer the status query in time
    Unresponsive,
}

/// Outcome of a `status` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum StatusResponse {
    /// Current status; `timer` is absent when idle
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timer: Option<TimerStatus>,
    },
    /// The timer did not answer the status query in time
    Unresponsive,
}

/// Outcome of a request that could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum UnknownResponse {
    InvalidCommand,
}

/// Response from the daemon to the client, tagged by the command it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Response {
    Start(StartResponse),
    Stop(StopResponse),
    Pause(PauseResponse),
    Resume(ResumeResponse),
    Status(StatusResponse),
    Unknown(UnknownResponse),
}

impl Response {
    /// Response sent for undecodable requests.
    pub fn invalid_command() -> Self {
        Response::Unknown(UnknownResponse::InvalidCommand)
    }

    /// Returns true if the command succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            Response::Start(StartResponse::Ok { .. })
                | Response::Stop(StopResponse::Ok)
                | Response::Pause(PauseResponse::Ok)
                | Response::Resume(ResumeResponse::Ok)
                | Response::Status(StatusResponse::Ok { .. })
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
