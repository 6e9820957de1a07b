//! Command definitions for the countdown timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// CLI Structure
// ============================================================================

/// Countdown timer CLI and daemon
#[derive(Parser, Debug)]
#[command(
    name = "pomo",
    version,
    about = "A countdown timer driven by a background daemon",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute (defaults to `status`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the daemon socket
    #[arg(short, long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start a new timer
    Start(StartArgs),

    /// Stop the current timer
    Stop,

    /// Pause the current timer
    Pause,

    /// Resume a paused timer
    Resume,

    /// Show current timer status
    Status,

    /// Run the daemon in the foreground
    Daemon(DaemonArgs),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

/// Arguments for the start command
#[derive(Args, Debug, Clone, Default)]
pub struct StartArgs {
    /// Timer length such as `25m`, `1h30m` or `90s` (defaults to the config)
    #[arg(short, long, value_name = "SPEC")]
    pub duration: Option<String>,
}

/// Arguments for the daemon command
#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    /// Log level used when RUST_LOG is not set
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

/// Log levels accepted by `--log-level`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod cli_tests {
        use super::*;

        #[test]
        fn test_parse_no_args() {
            let cli = Cli::parse_from(["pomo"]);
            assert!(cli.command.is_none());
            assert!(!cli.verbose);
            assert!(cli.config.is_none());
            assert!(cli.socket.is_none());
        }

        #[test]
        fn test_parse_global_options() {
            let cli = Cli::parse_from([
                "pomo",
                "status",
                "--socket",
                "/tmp/a.sock",
                "-c",
                "/tmp/config.toml",
                "-v",
            ]);
            assert!(matches!(cli.command, Some(Commands::Status)));
            assert_eq!(cli.socket, Some(PathBuf::from("/tmp/a.sock")));
            assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.toml")));
            assert!(cli.verbose);
        }

        #[test]
        fn test_parse_unit_commands() {
            assert!(matches!(
                Cli::parse_from(["pomo", "stop"]).command,
                Some(Commands::Stop)
            ));
            assert!(matches!(
                Cli::parse_from(["pomo", "pause"]).command,
                Some(Commands::Pause)
            ));
            assert!(matches!(
                Cli::parse_from(["pomo", "resume"]).command,
                Some(Commands::Resume)
            ));
        }

        #[test]
        fn test_parse_completions_zsh() {
            let cli = Cli::parse_from(["pomo", "completions", "zsh"]);
            match cli.command {
                Some(Commands::Completions { shell }) => {
                    assert_eq!(shell, clap_complete::Shell::Zsh);
                }
                _ => panic!("Expected Completions command"),
            }
        }

        #[test]
        fn test_parse_unknown_command_fails() {
            assert!(Cli::try_parse_from(["pomo", "restart"]).is_err());
        }
    }

    mod start_args_tests {
        use super::*;

        #[test]
        fn test_parse_start_default() {
            match Cli::parse_from(["pomo", "start"]).command {
                Some(Commands::Start(args)) => assert!(args.duration.is_none()),
                _ => panic!("Expected Start command"),
            }
        }

        #[test]
        fn test_parse_start_duration() {
            match Cli::parse_from(["pomo", "start", "-d", "1h30m"]).command {
                Some(Commands::Start(args)) => {
                    assert_eq!(args.duration.as_deref(), Some("1h30m"));
                }
                _ => panic!("Expected Start command"),
            }
        }
    }

    mod daemon_args_tests {
        use super::*;

        #[test]
        fn test_parse_daemon_default_level() {
            match Cli::parse_from(["pomo", "daemon"]).command {
                Some(Commands::Daemon(args)) => assert_eq!(args.log_level, LogLevel::Warn),
                _ => panic!("Expected Daemon command"),
            }
        }

        #[test]
        fn test_parse_daemon_log_level() {
            match Cli::parse_from(["pomo", "daemon", "--log-level", "debug"]).command {
                Some(Commands::Daemon(args)) => {
                    assert_eq!(args.log_level, LogLevel::Debug);
                    assert_eq!(args.log_level.as_str(), "debug");
                }
                _ => panic!("Expected Daemon command"),
            }
        }

        #[test]
        fn test_parse_daemon_invalid_level() {
            assert!(Cli::try_parse_from(["pomo", "daemon", "--log-level", "loud"]).is_err());
        }
    }
}
