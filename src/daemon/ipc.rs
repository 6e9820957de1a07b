//! IPC server for the countdown daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that binds a well-known socket path, replacing any stale file
//! - One command per connection, one response back, then close
//! - Dispatch of decoded commands to the [`TimerSupervisor`]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::IgnoredAny;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::types::{
    Command, PauseResponse, Response, ResumeResponse, StartResponse, StatusResponse,
    StopResponse,
};

use super::error::TimerError;
use super::supervisor::TimerSupervisor;

// ============================================================================
// Constants
// ============================================================================

/// Default socket path
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/pomodoro.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Write error
    #[error("Failed to write response: {0}")]
    WriteError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If a file already exists at the path, it is removed before binding.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the stale file cannot be removed or the socket
    /// cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        match std::fs::remove_file(socket_path) {
            Ok(()) => debug!("Removed stale socket {:?}", socket_path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))
            }
        }

        if let Some(parent) = socket_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Reads one raw request from the stream.
    ///
    /// Reading stops at end of stream or as soon as the bytes received form
    /// a complete JSON value, so clients need not shut down their write half.
    ///
    /// # Errors
    ///
    /// Returns an error on IO failure, timeout, or an oversized request.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<Vec<u8>, IpcError> {
        let read = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            Self::read_request(stream),
        )
        .await;

        match read {
            Ok(result) => result,
            Err(_) => Err(IpcError::Timeout),
        }
    }

    async fn read_request(stream: &mut UnixStream) -> Result<Vec<u8>, IpcError> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| IpcError::ReadError(e.to_string()))?;
            if n == 0 {
                return Ok(buffer);
            }

            buffer.extend_from_slice(&chunk[..n]);
            if buffer.len() > MAX_REQUEST_SIZE {
                return Err(IpcError::RequestTooLarge);
            }
            if serde_json::from_slice::<IgnoredAny>(&buffer).is_ok() {
                return Ok(buffer);
            }
        }
    }

    /// Serializes and sends a response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &Response) -> Result<(), IpcError> {
        let json =
            serde_json::to_vec(response).map_err(|e| IpcError::SerializationError(e.to_string()))?;

        stream
            .write_all(&json)
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|e| IpcError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the [`TimerSupervisor`].
pub struct RequestHandler {
    supervisor: TimerSupervisor,
}

impl RequestHandler {
    /// Creates a new request handler owning the supervisor.
    pub fn new(supervisor: TimerSupervisor) -> Self {
        Self { supervisor }
    }

    /// Serves one connection: read, decode, dispatch, reply, close.
    ///
    /// Never fails; problems are logged and answered where possible.
    pub async fn handle_connection(&mut self, mut stream: UnixStream) {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(bytes) => match Command::decode(&bytes) {
                Ok(command) => {
                    debug!("Received {} command", command.name());
                    self.handle(command).await
                }
                Err(e) => {
                    warn!("Rejected request: {}", e);
                    Response::invalid_command()
                }
            },
            Err(e) => {
                warn!("Failed to receive request: {}", e);
                Response::invalid_command()
            }
        };

        debug!("Responding {:?}", response);
        if let Err(e) = IpcServer::send_response(&mut stream, &response).await {
            warn!("Failed to send response: {}", e);
        }
        let _ = stream.shutdown().await;
    }

    /// Handles a decoded command and returns the appropriate response.
    pub async fn handle(&mut self, command: Command) -> Response {
        match command {
            Command::Start { duration } => Response::Start(self.handle_start(duration)),
            Command::Stop => Response::Stop(self.handle_stop()),
            Command::Pause => Response::Pause(self.handle_pause().await),
            Command::Resume => Response::Resume(self.handle_resume().await),
            Command::Status => Response::Status(self.handle_status().await),
        }
    }

    fn handle_start(&mut self, duration: u64) -> StartResponse {
        match self.supervisor.start(duration).inspect_err(log_rejection) {
            Ok(duration) => StartResponse::Ok { duration },
            Err(_) => StartResponse::AlreadyRunning,
        }
    }

    fn handle_stop(&mut self) -> StopResponse {
        match self.supervisor.stop().inspect_err(log_rejection) {
            Ok(()) => StopResponse::Ok,
            Err(_) => StopResponse::NotRunning,
        }
    }

    async fn handle_pause(&mut self) -> PauseResponse {
        match self.supervisor.pause().await.inspect_err(log_rejection) {
            Ok(()) => PauseResponse::Ok,
            Err(TimerError::AlreadyPaused) => PauseResponse::AlreadyPaused,
            Err(TimerError::Unresponsive(_)) => PauseResponse::Unresponsive,
            Err(_) => PauseResponse::NotRunning,
        }
    }

    async fn handle_resume(&mut self) -> ResumeResponse {
        match self.supervisor.resume().await.inspect_err(log_rejection) {
            Ok(()) => ResumeResponse::Ok,
            Err(TimerError::Unresponsive(_)) => ResumeResponse::Unresponsive,
            Err(_) => ResumeResponse::NotPaused,
        }
    }

    async fn handle_status(&mut self) -> StatusResponse {
        match self.supervisor.status().await.inspect_err(log_rejection) {
            Ok(timer) => StatusResponse::Ok { timer },
            Err(_) => StatusResponse::Unresponsive,
        }
    }
}

fn log_rejection(error: &TimerError) {
    if error.is_state_violation() {
        debug!("Rejected: {}", error);
    } else {
        warn!("{}", error);
    }
}

// ============================================================================
// Tests
// ============================================================================
