//! Timer supervisor: holds at most one live runner and enforces the timer
//! state machine.
//!
//! Only `status` waits for the runner; `start`, `stop`, `pause` and `resume`
//! decide success from local handle state and send without waiting. Every
//! operation first reaps a runner that has already exited, so a timer that
//! finished on its own is forgotten without an explicit stop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info};

use crate::types::TimerStatus;

use super::channel::{self, ControlMessage, Endpoint};
use super::error::TimerError;
use super::hooks::Hooks;
use super::runner::{RunnerExit, TimerRunner, DEFAULT_TICK_INTERVAL};

/// Default bound on the status round trip.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// RunnerSettings
// ============================================================================

/// Scheduling parameters handed to every runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSettings {
    /// Runner scheduling interval
    pub tick_interval: Duration,
    /// How long `status` waits for a runner reply
    pub status_timeout: Duration,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
        }
    }
}

// ============================================================================
// TimerHandle
// ============================================================================

/// Supervisor-owned reference to a live runner.
struct TimerHandle {
    task: JoinHandle<RunnerExit>,
    channel: Endpoint<ControlMessage, TimerStatus>,
}

impl TimerHandle {
    fn is_alive(&self) -> bool {
        !self.task.is_finished() && !self.channel.is_closed()
    }
}

// ============================================================================
// TimerSupervisor
// ============================================================================

/// Coordinates the single timer runner.
pub struct TimerSupervisor {
    handle: Option<TimerHandle>,
    hooks: Arc<dyn Hooks>,
    settings: RunnerSettings,
}

impl TimerSupervisor {
    /// Creates an idle supervisor.
    pub fn new(hooks: Arc<dyn Hooks>, settings: RunnerSettings) -> Self {
        Self {
            handle: None,
            hooks,
            settings,
        }
    }

    /// Spawns a runner for `duration` seconds.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyRunning`] if a runner is live.
    pub fn start(&mut self, duration: u64) -> Result<u64, TimerError> {
        if self.is_running() {
            return Err(TimerError::AlreadyRunning);
        }

        let (supervisor_end, runner_end) = channel::pair();
        let runner = TimerRunner::new(
            duration,
            self.settings.tick_interval,
            runner_end,
            Arc::clone(&self.hooks),
        );

        self.handle = Some(TimerHandle {
            task: tokio::spawn(runner.run()),
            channel: supervisor_end,
        });
        info!("Started timer for {}s", duration);

        Ok(duration)
    }

    /// Asks the runner to stop and forgets it.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotRunning`] if no runner is live.
    pub fn stop(&mut self) -> Result<(), TimerError> {
        if !self.is_running() {
            return Err(TimerError::NotRunning);
        }

        if let Some(handle) = self.handle.take() {
            if handle.channel.send(ControlMessage::Stop).is_err() {
                // Exited between the liveness check and the send.
                debug!("Timer exited before stop was delivered");
            }
        }
        info!("Stopped timer");

        Ok(())
    }

    /// Pauses the live runner.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::AlreadyPaused`] if it is paused,
    /// [`TimerError::NotRunning`] if no runner is live, or
    /// [`TimerError::Unresponsive`] if the status query timed out.
    pub async fn pause(&mut self) -> Result<(), TimerError> {
        if self.is_paused().await? {
            return Err(TimerError::AlreadyPaused);
        }
        if !self.is_running() {
            return Err(TimerError::NotRunning);
        }

        self.send(ControlMessage::Pause)?;
        info!("Paused timer");

        Ok(())
    }

    /// Resumes the paused runner.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::NotPaused`] if no runner is paused, or
    /// [`TimerError::Unresponsive`] if the status query timed out.
    pub async fn resume(&mut self) -> Result<(), TimerError> {
        if !self.is_paused().await? {
            return Err(TimerError::NotPaused);
        }

        self.send(ControlMessage::Resume)
            .map_err(|_| TimerError::NotPaused)?;
        info!("Resumed timer");

        Ok(())
    }

    /// Queries the live runner. Returns `None` when idle.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::Unresponsive`] if the runner does not reply
    /// within the configured status timeout.
    pub async fn status(&mut self) -> Result<Option<TimerStatus>, TimerError> {
        self.reap();
        let wait = self.settings.status_timeout;

        let Some(handle) = self.handle.as_mut() else {
            return Ok(None);
        };

        // Replies left behind by an earlier timed-out query.
        let stale = handle.channel.drain();
        if stale > 0 {
            debug!("Discarded {} stale status replies", stale);
        }

        if handle.channel.send(ControlMessage::Status).is_err() {
            self.handle = None;
            return Ok(None);
        }

        let reply = timeout(wait, handle.channel.recv()).await;
        match reply {
            Ok(Some(status)) => Ok(Some(status)),
            Ok(None) => {
                // Finished before answering.
                self.handle = None;
                Ok(None)
            }
            Err(_) => {
                debug!("Timer did not answer status within {:?}", wait);
                Err(TimerError::Unresponsive(wait))
            }
        }
    }

    /// Returns true if a runner is live.
    pub fn is_running(&mut self) -> bool {
        self.reap();
        self.handle.is_some()
    }

    async fn is_paused(&mut self) -> Result<bool, TimerError> {
        Ok(self.status().await?.is_some_and(|status| status.is_paused))
    }

    /// Sends to the live runner, forgetting it if it has gone away.
    fn send(&mut self, message: ControlMessage) -> Result<(), TimerError> {
        let Some(handle) = self.handle.as_ref() else {
            return Err(TimerError::NotRunning);
        };

        if handle.channel.send(message).is_err() {
            self.handle = None;
            return Err(TimerError::NotRunning);
        }

        Ok(())
    }

    /// Drops the handle of a runner that has exited.
    fn reap(&mut self) {
        if self.handle.as_ref().is_some_and(|handle| !handle.is_alive()) {
            debug!("Reaped finished timer");
            self.handle = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::hooks::{HookEvent, MockHooks};

    fn create_supervisor() -> (TimerSupervisor, Arc<MockHooks>) {
        let hooks = Arc::new(MockHooks::new());
        let supervisor = TimerSupervisor::new(hooks.clone(), RunnerSettings::default());
        (supervisor, hooks)
    }

    async fn wait_until_idle(supervisor: &mut TimerSupervisor, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if supervisor.status().await.unwrap().is_none() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }

    // ------------------------------------------------------------------------
    // Start / Status Tests
    // ------------------------------------------------------------------------

    mod start_tests {
        use super::*;

        #[tokio::test]
        async fn test_status_idle() {
            let (mut supervisor, _hooks) = create_supervisor();
            assert_eq!(supervisor.status().await.unwrap(), None);
        }

        #[tokio::test]
        async fn test_start_then_status() {
            let (mut supervisor, _hooks) = create_supervisor();

            for duration in [1, 5, 600] {
                assert_eq!(supervisor.start(duration).unwrap(), duration);

                let status = supervisor.status().await.unwrap().expect("timer is live");
                assert_eq!(status.duration, duration);
                assert!(status.remaining <= duration);
                assert!(!status.is_paused);

                supervisor.stop().unwrap();
            }
        }

        #[tokio::test]
        async fn test_start_already_running() {
            let (mut supervisor, _hooks) = create_supervisor();

            supervisor.start(60).unwrap();
            assert_eq!(supervisor.start(5), Err(TimerError::AlreadyRunning));

            let status = supervisor.status().await.unwrap().unwrap();
            assert_eq!(status.duration, 60);
        }

        #[tokio::test]
        async fn test_start_after_natural_completion() {
            let (mut supervisor, hooks) = create_supervisor();

            supervisor.start(1).unwrap();
            assert!(wait_until_idle(&mut supervisor, Duration::from_secs(3)).await);

            assert_eq!(hooks.count(HookEvent::Done), 1);
            assert_eq!(hooks.count(HookEvent::End), 1);
            assert!(supervisor.start(1).is_ok());
        }
    }

    // ------------------------------------------------------------------------
    // Stop Tests
    // ------------------------------------------------------------------------

    mod stop_tests {
        use super::*;

        #[tokio::test]
        async fn test_stop_not_running() {
            let (mut supervisor, _hooks) = create_supervisor();
            assert_eq!(supervisor.stop(), Err(TimerError::NotRunning));
        }

        #[tokio::test]
        async fn test_stop_then_idle() {
            let (mut supervisor, hooks) = create_supervisor();

            supervisor.start(60).unwrap();
            supervisor.stop().unwrap();

            assert_eq!(supervisor.status().await.unwrap(), None);
            assert_eq!(supervisor.stop(), Err(TimerError::NotRunning));

            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(hooks.count(HookEvent::Done), 0);
            assert_eq!(hooks.count(HookEvent::End), 1);
        }

        #[tokio::test]
        async fn test_start_stop_start() {
            let (mut supervisor, _hooks) = create_supervisor();

            supervisor.start(60).unwrap();
            supervisor.stop().unwrap();
            assert_eq!(supervisor.start(30), Ok(30));

            let status = supervisor.status().await.unwrap().unwrap();
            assert_eq!(status.duration, 30);
        }
    }

    // ------------------------------------------------------------------------
    // Pause / Resume Tests
    // ------------------------------------------------------------------------

    mod pause_tests {
        use super::*;

        #[tokio::test]
        async fn test_pause_not_running() {
            let (mut supervisor, _hooks) = create_supervisor();
            assert_eq!(supervisor.pause().await, Err(TimerError::NotRunning));
        }

        #[tokio::test]
        async fn test_pause_twice() {
            let (mut supervisor, _hooks) = create_supervisor();

            supervisor.start(60).unwrap();
            supervisor.pause().await.unwrap();

            assert_eq!(supervisor.pause().await, Err(TimerError::AlreadyPaused));
            assert!(supervisor.status().await.unwrap().unwrap().is_paused);
        }

        #[tokio::test]
        async fn test_resume_not_paused() {
            let (mut supervisor, _hooks) = create_supervisor();

            assert_eq!(supervisor.resume().await, Err(TimerError::NotPaused));

            supervisor.start(60).unwrap();
            assert_eq!(supervisor.resume().await, Err(TimerError::NotPaused));
        }

        #[tokio::test]
        async fn test_pause_resume_cycle() {
            let (mut supervisor, _hooks) = create_supervisor();

            supervisor.start(60).unwrap();
            supervisor.pause().await.unwrap();
            let paused = supervisor.status().await.unwrap().unwrap();

            tokio::time::sleep(Duration::from_millis(1_200)).await;
            assert_eq!(
                supervisor.status().await.unwrap().unwrap().remaining,
                paused.remaining
            );

            supervisor.resume().await.unwrap();
            tokio::time::sleep(Duration::from_millis(1_600)).await;

            let resumed = supervisor.status().await.unwrap().unwrap();
            assert!(!resumed.is_paused);
            assert!(resumed.remaining < paused.remaining);
        }

        #[tokio::test]
        async fn test_stop_paused_timer() {
            let (mut supervisor, hooks) = create_supervisor();

            supervisor.start(60).unwrap();
            supervisor.pause().await.unwrap();
            supervisor.stop().unwrap();

            assert_eq!(supervisor.status().await.unwrap(), None);
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert_eq!(hooks.count(HookEvent::Done), 0);
            assert_eq!(hooks.count(HookEvent::End), 1);
        }
    }

    // ------------------------------------------------------------------------
    // Status Timeout Tests
    // ------------------------------------------------------------------------

    mod status_tests {
        use super::*;

        /// A runner that only looks at its channel every 200ms, queried
        /// with a 5ms budget.
        fn create_slow_supervisor() -> TimerSupervisor {
            TimerSupervisor::new(
                Arc::new(MockHooks::new()),
                RunnerSettings {
                    tick_interval: Duration::from_millis(200),
                    status_timeout: Duration::from_millis(5),
                },
            )
        }

        #[tokio::test]
        async fn test_status_times_out() {
            let mut supervisor = create_slow_supervisor();
            supervisor.start(60).unwrap();
            // Let the runner consume its immediate first tick.
            tokio::time::sleep(Duration::from_millis(50)).await;

            assert_eq!(
                supervisor.status().await,
                Err(TimerError::Unresponsive(Duration::from_millis(5)))
            );
            assert!(supervisor.is_running());

            supervisor.stop().unwrap();
        }

        #[tokio::test]
        async fn test_pause_and_resume_time_out() {
            let mut supervisor = create_slow_supervisor();
            supervisor.start(60).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;

            assert!(matches!(
                supervisor.pause().await,
                Err(TimerError::Unresponsive(_))
            ));
            assert!(matches!(
                supervisor.resume().await,
                Err(TimerError::Unresponsive(_))
            ));

            supervisor.stop().unwrap();
        }

        #[tokio::test]
        async fn test_stale_replies_are_discarded() {
            let mut supervisor = create_slow_supervisor();
            supervisor.start(60).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;

            assert!(supervisor.status().await.is_err());
            assert!(supervisor.pause().await.is_err());

            // Both late replies arrive over the next two ticks.
            tokio::time::sleep(Duration::from_millis(700)).await;
            assert_eq!(supervisor.handle.as_ref().map(|h| h.channel.poll()), Some(true));

            supervisor.settings.status_timeout = Duration::from_secs(2);
            let status = supervisor.status().await.unwrap().expect("timer is live");
            assert_eq!(status.duration, 60);
            assert!((58..=60).contains(&status.remaining));
            // The timed-out pause was never sent.
            assert!(!status.is_paused);
            assert_eq!(supervisor.handle.as_ref().map(|h| h.channel.poll()), Some(false));

            supervisor.stop().unwrap();
        }
    }
}
