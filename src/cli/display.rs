//! Display utilities for the countdown timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Failure messages
//! - Status display

use crate::types::{
    PauseResponse, Response, ResumeResponse, StartResponse, StatusResponse, StopResponse,
    TimerStatus, UnknownResponse,
};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Prints a response: successes to stdout, failures to stderr.
    pub fn show_response(response: &Response) {
        let message = Self::render(response);
        if response.is_ok() {
            println!("{}", message);
        } else {
            Self::show_error(&message);
        }
    }

    /// Renders a response as human-readable text.
    pub fn render(response: &Response) -> String {
        match response {
            Response::Start(StartResponse::Ok { duration }) => {
                format!("> Timer started ({})", Self::format_time(*duration))
            }
            Response::Start(StartResponse::AlreadyRunning) => {
                "A timer is already running".to_string()
            }
            Response::Stop(StopResponse::Ok) => "[] Timer stopped".to_string(),
            Response::Stop(StopResponse::NotRunning) => "No timer is running".to_string(),
            Response::Pause(PauseResponse::Ok) => "|| Timer paused".to_string(),
            Response::Pause(PauseResponse::AlreadyPaused) => {
                "The timer is already paused".to_string()
            }
            Response::Pause(PauseResponse::NotRunning) => "No timer is running".to_string(),
            Response::Resume(ResumeResponse::Ok) => "> Timer resumed".to_string(),
            Response::Resume(ResumeResponse::NotPaused) => "The timer is not paused".to_string(),
            Response::Status(StatusResponse::Ok { timer: None }) => "No timer running".to_string(),
            Response::Status(StatusResponse::Ok { timer: Some(timer) }) => {
                Self::render_status(timer)
            }
            Response::Pause(PauseResponse::Unresponsive)
            | Response::Resume(ResumeResponse::Unresponsive)
            | Response::Status(StatusResponse::Unresponsive) => {
                "The timer did not respond".to_string()
            }
            Response::Unknown(UnknownResponse::InvalidCommand) => {
                "The daemon rejected the command".to_string()
            }
        }
    }

    fn render_status(timer: &TimerStatus) -> String {
        let marker = if timer.is_paused { "||" } else { ">" };
        let mut line = format!(
            "{} {} / {}",
            marker,
            Self::format_time(timer.remaining),
            Self::format_time(timer.duration)
        );
        if timer.is_paused {
            line.push_str(" (paused)");
        }
        line
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }

    /// Formats seconds as `H:MM:SS`, or `M:SS` under an hour.
    pub fn format_time(total_seconds: u64) -> String {
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}
