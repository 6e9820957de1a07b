//! Private control channel between the supervisor and a timer runner.
//!
//! A channel is a pair of [`Endpoint`]s, each able to send one message type
//! and receive the other. Sends never block, `recv` waits for the next
//! message and `poll` reports whether one is waiting without consuming it.

use tokio::sync::mpsc::{self, error::SendError, error::TryRecvError};

/// Messages the supervisor sends to a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Reply with the current status
    Status,
    /// Exit immediately, skipping the completion hook
    Stop,
    /// Freeze the countdown
    Pause,
    /// Continue the countdown
    Resume,
}

/// One side of a bidirectional control channel.
#[derive(Debug)]
pub struct Endpoint<Out, In> {
    tx: mpsc::UnboundedSender<Out>,
    rx: mpsc::UnboundedReceiver<In>,
}

/// Creates a connected pair of endpoints.
pub fn pair<A, B>() -> (Endpoint<A, B>, Endpoint<B, A>) {
    let (a_tx, a_rx) = mpsc::unbounded_channel();
    let (b_tx, b_rx) = mpsc::unbounded_channel();
    (
        Endpoint { tx: a_tx, rx: b_rx },
        Endpoint { tx: b_tx, rx: a_rx },
    )
}

impl<Out, In> Endpoint<Out, In> {
    /// Sends a message to the other side.
    ///
    /// # Errors
    ///
    /// Returns the message back if the other side has been dropped.
    pub fn send(&self, message: Out) -> Result<(), SendError<Out>> {
        self.tx.send(message)
    }

    /// Waits for the next message. Returns `None` once the other side is gone.
    pub async fn recv(&mut self) -> Option<In> {
        self.rx.recv().await
    }

    /// Returns true if a message is waiting.
    pub fn poll(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Takes a waiting message without blocking.
    pub fn try_recv(&mut self) -> Result<In, TryRecvError> {
        self.rx.try_recv()
    }

    /// Discards every waiting message, returning how many were dropped.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while self.rx.try_recv().is_ok() {
            dropped += 1;
        }
        dropped
    }

    /// Returns true if the other side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
