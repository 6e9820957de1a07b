//! CLI module for the countdown timer.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `client`: IPC client for daemon communication
//! - `display`: Output formatting and display logic
//! - `duration`: Duration spec parsing (`1h30m`)

pub mod client;
pub mod commands;
pub mod display;
pub mod duration;

pub use client::IpcClient;
pub use commands::{Cli, Commands, DaemonArgs, LogLevel, StartArgs};
pub use display::Display;
pub use duration::{parse_duration, DurationSpecError};
