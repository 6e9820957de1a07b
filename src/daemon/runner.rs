//! Timer runner: the task that owns one countdown.
//!
//! A runner is spawned per `start` and shares nothing with the supervisor
//! except its control channel. It:
//! - Fires the `begin` hook once at startup
//! - Advances elapsed time on every tick while unpaused
//! - Services `Status`/`Stop`/`Pause`/`Resume` messages between ticks
//! - Fires `done` on natural completion, then `end` unconditionally

use std::sync::Arc;

use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::types::TimerStatus;

use super::channel::{ControlMessage, Endpoint};
use super::hooks::{HookEvent, Hooks};

/// Runner side of the control channel.
pub type RunnerEndpoint = Endpoint<TimerStatus, ControlMessage>;

/// Default scheduling interval.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// RunnerExit
// ============================================================================

/// Why a runner stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerExit {
    /// The countdown reached zero
    Completed,
    /// A `Stop` message was received
    Stopped,
    /// The supervisor dropped its endpoint while the timer was paused
    Abandoned,
}

// ============================================================================
// TimerRunner
// ============================================================================

/// Countdown state for one timer instance.
pub struct TimerRunner {
    /// Total length, fixed at creation
    duration: Duration,
    /// Time counted so far; only advances while unpaused
    elapsed: Duration,
    is_paused: bool,
    /// Instant the elapsed time was last advanced to
    last_tick: Instant,
    tick_interval: Duration,
    channel: RunnerEndpoint,
    hooks: Arc<dyn Hooks>,
}

impl TimerRunner {
    /// Creates a runner for a countdown of `duration_secs` seconds.
    pub fn new(
        duration_secs: u64,
        tick_interval: Duration,
        channel: RunnerEndpoint,
        hooks: Arc<dyn Hooks>,
    ) -> Self {
        Self {
            duration: Duration::from_secs(duration_secs),
            elapsed: Duration::ZERO,
            is_paused: false,
            last_tick: Instant::now(),
            tick_interval,
            channel,
            hooks,
        }
    }

    /// Runs the countdown to completion or until stopped.
    ///
    /// This should be spawned as a separate tokio task.
    pub async fn run(mut self) -> RunnerExit {
        info!("Timer started for {}s", self.duration.as_secs());
        self.hooks.fire(HookEvent::Begin);

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.last_tick = Instant::now();

        let exit = loop {
            self.advance();
            if self.elapsed >= self.duration {
                break RunnerExit::Completed;
            }

            let message = if self.is_paused {
                // Nothing to count while paused; wait for the next message.
                match self.channel.recv().await {
                    Some(message) => message,
                    None => break RunnerExit::Abandoned,
                }
            } else {
                ticker.tick().await;
                if !self.channel.poll() {
                    continue;
                }
                match self.channel.try_recv() {
                    Ok(message) => message,
                    Err(_) => continue,
                }
            };

            debug!("Timer received {:?}", message);
            match message {
                ControlMessage::Status => {
                    // A supervisor that gave up waiting may already be gone.
                    let _ = self.channel.send(self.status());
                }
                ControlMessage::Stop => break RunnerExit::Stopped,
                ControlMessage::Pause => {
                    self.advance();
                    self.is_paused = true;
                }
                ControlMessage::Resume => {
                    if self.is_paused {
                        self.last_tick = Instant::now();
                    }
                    self.is_paused = false;
                }
            }
        };

        if exit == RunnerExit::Completed {
            info!("Timer completed");
            self.hooks.fire(HookEvent::Done);
        } else {
            info!("Timer ended early ({:?})", exit);
        }
        self.hooks.fire(HookEvent::End);

        exit
    }

    /// Moves elapsed time forward to now unless paused.
    fn advance(&mut self) {
        let now = Instant::now();
        if !self.is_paused {
            self.elapsed += now.saturating_duration_since(self.last_tick);
        }
        self.last_tick = now;
    }

    /// Remaining whole seconds, rounded to nearest.
    fn remaining_secs(&self) -> u64 {
        let remaining = self.duration.saturating_sub(self.elapsed);
        let secs = remaining.as_secs();
        if remaining.subsec_millis() >= 500 {
            secs + 1
        } else {
            secs
        }
    }

    /// Returns a status snapshot.
    pub fn status(&self) -> TimerStatus {
        TimerStatus {
            duration: self.duration.as_secs(),
            remaining: self.remaining_secs(),
            is_paused: self.is_paused,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::channel::{self, Endpoint};
    use crate::daemon::hooks::MockHooks;
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    type SupervisorSide = Endpoint<ControlMessage, TimerStatus>;

    fn spawn_runner(duration_secs: u64) -> (SupervisorSide, Arc<MockHooks>, JoinHandle<RunnerExit>) {
        let (supervisor_end, runner_end) = channel::pair();
        let hooks = Arc::new(MockHooks::new());
        let runner = TimerRunner::new(
            duration_secs,
            DEFAULT_TICK_INTERVAL,
            runner_end,
            hooks.clone(),
        );
        (supervisor_end, hooks, tokio::spawn(runner.run()))
    }

    async fn query(channel: &mut SupervisorSide) -> TimerStatus {
        channel.send(ControlMessage::Status).unwrap();
        timeout(Duration::from_secs(1), channel.recv())
            .await
            .expect("status reply timed out")
            .expect("runner exited")
    }

    // ------------------------------------------------------------------------
    // State Tests
    // ------------------------------------------------------------------------

    mod state_tests {
        use super::*;

        #[test]
        fn test_remaining_rounds_to_nearest_second() {
            let (_supervisor_end, runner_end) = channel::pair();
            let mut runner = TimerRunner::new(
                10,
                DEFAULT_TICK_INTERVAL,
                runner_end,
                Arc::new(MockHooks::new()),
            );

            runner.elapsed = Duration::from_millis(2_400);
            assert_eq!(runner.remaining_secs(), 8);

            runner.elapsed = Duration::from_millis(2_600);
            assert_eq!(runner.remaining_secs(), 7);

            runner.elapsed = Duration::from_secs(15);
            assert_eq!(runner.remaining_secs(), 0);
        }

        #[test]
        fn test_initial_status() {
            let (_supervisor_end, runner_end) = channel::pair();
            let runner = TimerRunner::new(
                90,
                DEFAULT_TICK_INTERVAL,
                runner_end,
                Arc::new(MockHooks::new()),
            );

            assert_eq!(
                runner.status(),
                TimerStatus {
                    duration: 90,
                    remaining: 90,
                    is_paused: false,
                }
            );
        }
    }

    // ------------------------------------------------------------------------
    // Run Loop Tests
    // ------------------------------------------------------------------------

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_status_reply() {
            let (mut channel, _hooks, handle) = spawn_runner(30);

            let status = query(&mut channel).await;
            assert_eq!(status.duration, 30);
            assert!(status.remaining <= 30);
            assert!(!status.is_paused);

            channel.send(ControlMessage::Stop).unwrap();
            handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_zero_duration_completes_immediately() {
            let (_channel, hooks, handle) = spawn_runner(0);

            let exit = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

            assert_eq!(exit, RunnerExit::Completed);
            assert_eq!(
                hooks.fired(),
                vec![HookEvent::Begin, HookEvent::Done, HookEvent::End]
            );
        }

        #[tokio::test]
        async fn test_natural_completion_fires_done_then_end() {
            let (_channel, hooks, handle) = spawn_runner(1);

            let exit = timeout(Duration::from_secs(3), handle).await.unwrap().unwrap();

            assert_eq!(exit, RunnerExit::Completed);
            assert_eq!(hooks.count(HookEvent::Begin), 1);
            assert_eq!(hooks.count(HookEvent::Done), 1);
            assert_eq!(hooks.count(HookEvent::End), 1);
        }

        #[tokio::test]
        async fn test_stop_skips_done() {
            let (channel, hooks, handle) = spawn_runner(60);

            channel.send(ControlMessage::Stop).unwrap();
            let exit = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

            assert_eq!(exit, RunnerExit::Stopped);
            assert_eq!(hooks.fired(), vec![HookEvent::Begin, HookEvent::End]);
        }

        #[tokio::test]
        async fn test_stop_while_paused() {
            let (channel, hooks, handle) = spawn_runner(60);

            channel.send(ControlMessage::Pause).unwrap();
            channel.send(ControlMessage::Stop).unwrap();
            let exit = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

            assert_eq!(exit, RunnerExit::Stopped);
            assert_eq!(hooks.count(HookEvent::Done), 0);
            assert_eq!(hooks.count(HookEvent::End), 1);
        }

        #[tokio::test]
        async fn test_pause_freezes_remaining() {
            let (mut channel, _hooks, handle) = spawn_runner(30);

            channel.send(ControlMessage::Pause).unwrap();
            let first = query(&mut channel).await;
            assert!(first.is_paused);

            tokio::time::sleep(Duration::from_millis(1_200)).await;
            let second = query(&mut channel).await;

            assert_eq!(first.remaining, second.remaining);

            channel.send(ControlMessage::Stop).unwrap();
            handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_resume_continues_countdown() {
            let (mut channel, _hooks, handle) = spawn_runner(30);

            channel.send(ControlMessage::Pause).unwrap();
            let paused = query(&mut channel).await;

            channel.send(ControlMessage::Resume).unwrap();
            tokio::time::sleep(Duration::from_millis(1_600)).await;
            let resumed = query(&mut channel).await;

            assert!(!resumed.is_paused);
            assert!(resumed.remaining < paused.remaining);

            channel.send(ControlMessage::Stop).unwrap();
            handle.await.unwrap();
        }

        #[tokio::test]
        async fn test_paused_runner_abandoned_when_supervisor_drops() {
            let (channel, hooks, handle) = spawn_runner(60);

            channel.send(ControlMessage::Pause).unwrap();
            drop(channel);

            let exit = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
            assert_eq!(exit, RunnerExit::Abandoned);
            assert_eq!(hooks.count(HookEvent::Done), 0);
            assert_eq!(hooks.count(HookEvent::End), 1);
        }
    }
}
