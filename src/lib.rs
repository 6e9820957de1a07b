//! Countdown Timer Library
//!
//! This library provides the core functionality for the `pomo` timer.
//! It includes:
//! - Daemon: timer supervisor, runner task, control channel and IPC server
//! - Lifecycle hooks that run external programs
//! - CLI command parsing, IPC client and display utilities
//! - Protocol types shared by client and daemon
//! - TOML configuration loading

pub mod cli;
pub mod config;
pub mod daemon;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use daemon::{
    Daemon, HookCommand, HookEvent, HookSet, Hooks, MockHooks, RunnerSettings, TimerError,
    TimerSupervisor,
};
pub use types::{Command, ProtocolError, Response, TimerStatus, MAX_DURATION_SECS};
