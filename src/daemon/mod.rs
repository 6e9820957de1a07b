//! Daemon module for the countdown timer.
//!
//! This module contains the core daemon functionality:
//! - `channel`: Private control channel between supervisor and runner
//! - `runner`: The task that owns one countdown
//! - `supervisor`: Timer state machine holding at most one runner
//! - `hooks`: External programs fired on lifecycle events
//! - `ipc`: Unix socket server and request dispatch
//!
//! [`Daemon`] ties these together: it is built once at startup (bind the
//! socket, build the supervisor), runs the accept loop, and unlinks the
//! socket when dropped.

pub mod channel;
pub mod error;
pub mod hooks;
pub mod ipc;
pub mod runner;
pub mod supervisor;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

pub use error::TimerError;
pub use hooks::{HookCommand, HookEvent, HookSet, Hooks, MockHooks};
pub use ipc::{IpcServer, RequestHandler, DEFAULT_SOCKET_PATH};
pub use runner::{RunnerExit, TimerRunner};
pub use supervisor::{RunnerSettings, TimerSupervisor};

// ============================================================================
// Daemon
// ============================================================================

/// Daemon context: the bound socket plus the supervisor behind it.
pub struct Daemon {
    server: IpcServer,
    handler: RequestHandler,
}

impl Daemon {
    /// Binds the socket and builds an idle supervisor.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound. This is the only
    /// fatal condition; callers should exit.
    pub fn bind(socket_path: &Path, hooks: Arc<dyn Hooks>, settings: RunnerSettings) -> Result<Self> {
        let server = IpcServer::new(socket_path)?;
        let supervisor = TimerSupervisor::new(hooks, settings);

        info!("Listening on {:?}", server.socket_path());

        Ok(Self {
            server,
            handler: RequestHandler::new(supervisor),
        })
    }

    /// Returns the bound socket path.
    pub fn socket_path(&self) -> &Path {
        self.server.socket_path()
    }

    /// Serves connections until SIGINT or SIGTERM.
    pub async fn run(self) {
        self.run_until(shutdown_signal()).await;
    }

    /// Serves connections one at a time until `shutdown` resolves.
    ///
    /// A connection being handled when `shutdown` resolves is finished
    /// first. The socket file is removed on return.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.server.accept() => match accepted {
                    Ok(stream) => self.handler.handle_connection(stream).await,
                    Err(e) => error!("{:#}", e),
                },
                () = &mut shutdown => {
                    info!("Shutting down");
                    break;
                }
            }
        }
    }
}

/// Waits for SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
        _ = terminate.recv() => info!("Received SIGTERM"),
    }
}
