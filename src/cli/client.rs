//! IPC client for communicating with the countdown daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::types::{Command, Response};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 200;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client for the given socket path.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self, duration: u64) -> Result<Response> {
        self.send_request_with_retry(&Command::Start { duration })
            .await
    }

    /// Sends a stop command to the daemon.
    pub async fn stop(&self) -> Result<Response> {
        self.send_request_with_retry(&Command::Stop).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<Response> {
        self.send_request_with_retry(&Command::Pause).await
    }

    /// Sends a resume command to the daemon.
    pub async fn resume(&self) -> Result<Response> {
        self.send_request_with_retry(&Command::Resume).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<Response> {
        self.send_request_with_retry(&Command::Status).await
    }

    /// Sends a request, retrying only when the daemon cannot be reached.
    ///
    /// Commands are not idempotent, so once a connection is established the
    /// outcome is final.
    async fn send_request_with_retry(&self, command: &Command) -> Result<Response> {
        let mut attempt = 1;

        loop {
            match self.connect().await {
                Ok(stream) => return self.send_request(stream, command).await,
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::warn!("Connection failed (attempt {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Connects to the daemon socket with a timeout.
    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to daemon at {:?}; is `pomo daemon` running?",
                    self.socket_path
                )
            })
    }

    /// Sends a single request over an open connection.
    async fn send_request(&self, mut stream: UnixStream, command: &Command) -> Result<Response> {
        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

        // Serialize request
        let request_json = serde_json::to_vec(command).context("Failed to serialize request")?;

        // Send request with timeout
        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("Write timed out")?
            .context("Failed to send request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to shut down write side")?;

        // Read the whole response with timeout
        let mut buffer = Vec::new();
        timeout(
            io_timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("No response from daemon");
        }

        let response: Response =
            serde_json::from_slice(&buffer).context("Failed to parse response")?;
        tracing::debug!("Received {:?}", response);

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
