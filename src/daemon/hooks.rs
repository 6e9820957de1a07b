//! External programs invoked at timer lifecycle events.
//!
//! Hooks are best-effort: a missing or failing program is logged and never
//! affects the timer. The runner only ever sees the [`Hooks`] trait, so tests
//! can swap in [`MockHooks`] and count invocations.

use std::fmt;
use std::process::Stdio;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, info, warn};

// ============================================================================
// HookEvent
// ============================================================================

/// Timer lifecycle events that can trigger a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// The runner started counting down
    Begin,
    /// The countdown reached zero
    Done,
    /// The runner is exiting, for any reason
    End,
}

impl HookEvent {
    /// Returns the string representation of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::Begin => "begin",
            HookEvent::Done => "done",
            HookEvent::End => "end",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives lifecycle events from a runner.
///
/// `fire` must return promptly; anything slow belongs in a spawned task.
pub trait Hooks: Send + Sync {
    fn fire(&self, event: HookEvent);
}

// ============================================================================
// HookCommand / HookSet
// ============================================================================

/// A configured external program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HookCommand {
    /// Command line run through `sh -c`
    Shell(String),
    /// Program and arguments run directly
    Argv(Vec<String>),
}

impl HookCommand {
    fn to_command(&self) -> Option<Command> {
        match self {
            HookCommand::Shell(line) => {
                let mut command = Command::new("sh");
                command.arg("-c").arg(line);
                Some(command)
            }
            HookCommand::Argv(argv) => {
                let (program, args) = argv.split_first()?;
                let mut command = Command::new(program);
                command.args(args);
                Some(command)
            }
        }
    }
}

impl fmt::Display for HookCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookCommand::Shell(line) => f.write_str(line),
            HookCommand::Argv(argv) => f.write_str(&argv.join(" ")),
        }
    }
}

/// The three optional hooks, one per [`HookEvent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    pub begin: Option<HookCommand>,
    pub done: Option<HookCommand>,
    pub end: Option<HookCommand>,
}

impl HookSet {
    /// Returns the command configured for an event, if any.
    pub fn get(&self, event: HookEvent) -> Option<&HookCommand> {
        match event {
            HookEvent::Begin => self.begin.as_ref(),
            HookEvent::Done => self.done.as_ref(),
            HookEvent::End => self.end.as_ref(),
        }
    }
}

impl Hooks for HookSet {
    /// Spawns the configured program and returns without waiting for it.
    ///
    /// Must be called from within a tokio runtime; the child is reaped by a
    /// detached task.
    fn fire(&self, event: HookEvent) {
        let Some(hook) = self.get(event) else {
            debug!("No {} hook configured", event);
            return;
        };

        let Some(mut command) = hook.to_command() else {
            warn!("Empty {} hook, skipping", event);
            return;
        };

        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to run {} hook `{}`: {}", event, hook, e);
                return;
            }
        };

        info!("Started {} hook `{}`", event, hook);

        let hook = hook.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("{} hook `{}` finished", event, hook),
                Ok(status) => warn!("{} hook `{}` exited with {}", event, hook, status),
                Err(e) => warn!("Failed to wait for {} hook `{}`: {}", event, hook, e),
            }
        });
    }
}

// ============================================================================
// MockHooks
// ============================================================================

/// Records fired events instead of running anything.
#[derive(Debug, Default)]
pub struct MockHooks {
    fired: Mutex<Vec<HookEvent>>,
}

impl MockHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event fired so far, in order.
    #[must_use]
    pub fn fired(&self) -> Vec<HookEvent> {
        self.fired.lock().map(|f| f.clone()).unwrap_or_default()
    }

    /// Returns how many times an event was fired.
    #[must_use]
    pub fn count(&self, event: HookEvent) -> usize {
        self.fired().iter().filter(|&&e| e == event).count()
    }
}

impl Hooks for MockHooks {
    fn fire(&self, event: HookEvent) {
        if let Ok(mut fired) = self.fired.lock() {
            fired.push(event);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
