//! pomo - a countdown timer with a background daemon
//!
//! `pomo daemon` owns the timer; every other subcommand is a thin client
//! that sends one command over the daemon's socket and prints the reply.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use pomo::cli::{parse_duration, Cli, Commands, DaemonArgs, Display, IpcClient};
use pomo::{Config, Daemon, RunnerSettings};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(default_log_level(&cli));

    // Execute command
    match execute(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            Display::show_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

/// Picks the log level used when RUST_LOG is not set.
fn default_log_level(cli: &Cli) -> &'static str {
    match &cli.command {
        Some(Commands::Daemon(args)) if !cli.verbose => args.log_level.as_str(),
        _ if cli.verbose => "info",
        _ => "warn",
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command. Returns whether the daemon reported success.
async fn execute(cli: Cli) -> Result<bool> {
    let command = cli.command.unwrap_or(Commands::Status);
    let socket_flag = cli.socket.as_deref();
    let load_config = || -> Result<Config> {
        let config = Config::load_or_default(cli.config.as_deref())?;
        tracing::debug!("{:?}", config);
        Ok(config)
    };

    let response = match command {
        Commands::Completions { shell } => {
            generate_completions(shell);
            return Ok(true);
        }
        Commands::Daemon(args) => {
            run_daemon(&load_config()?, socket_flag, &args).await?;
            return Ok(true);
        }
        Commands::Start(args) => {
            let config = load_config()?;
            let spec = args
                .duration
                .unwrap_or_else(|| config.client.default_duration.clone());
            let duration = parse_duration(&spec)
                .with_context(|| format!("Invalid duration '{}'", spec))?;
            client_for(&config, socket_flag).start(duration).await?
        }
        Commands::Stop => client_for(&load_config()?, socket_flag).stop().await?,
        Commands::Pause => client_for(&load_config()?, socket_flag).pause().await?,
        Commands::Resume => client_for(&load_config()?, socket_flag).resume().await?,
        Commands::Status => client_for(&load_config()?, socket_flag).status().await?,
    };

    Display::show_response(&response);
    Ok(response.is_ok())
}

/// Builds a client for the configured socket.
fn client_for(config: &Config, socket_flag: Option<&Path>) -> IpcClient {
    IpcClient::new(config.client_socket(socket_flag))
}

/// Runs the daemon in the foreground until SIGINT or SIGTERM.
async fn run_daemon(
    config: &Config,
    socket_flag: Option<&Path>,
    args: &DaemonArgs,
) -> Result<()> {
    let socket_path = config.daemon_socket(socket_flag);
    tracing::debug!("{:?}", args);

    let daemon = Daemon::bind(
        &socket_path,
        Arc::new(config.daemon.hooks()),
        RunnerSettings::default(),
    )
    .context("Failed to start daemon")?;

    daemon.run().await;
    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
