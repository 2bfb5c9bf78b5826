use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::sweep_ports::{RecurrenceSchedule, SweepRunner};

#[cfg(test)]
mod tests;

/// Upper bound of one sleep increment while waiting for the next run.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Lifecycle of the recurring sweep loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Not started yet.
    Idle,
    /// A sweep is executing.
    Running,
    /// Sleeping until the next scheduled run.
    Waiting,
    /// Terminal state after cancellation.
    Stopped,
}

impl SchedulerState {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Stopped => "stopped",
        }
    }
}

/// Drives a [`SweepRunner`] once immediately and then on every occurrence of
/// a [`RecurrenceSchedule`] until cancelled.
pub struct SweepScheduler {
    runner: Arc<dyn SweepRunner>,
    schedule: Arc<dyn RecurrenceSchedule>,
    poll_interval: Duration,
    state: watch::Sender<SchedulerState>,
}

impl SweepScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new(runner: Arc<dyn SweepRunner>, schedule: Arc<dyn RecurrenceSchedule>) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            runner,
            schedule,
            poll_interval: MAX_POLL_INTERVAL,
            state,
        }
    }

    /// Overrides the sleep increment, capped at [`MAX_POLL_INTERVAL`].
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.clamp(Duration::from_millis(1), MAX_POLL_INTERVAL);
        self
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Subscribes to lifecycle transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Runs until `cancel` fires.
    ///
    /// The first sweep runs before any schedule is computed. A cancellation
    /// observed after that sweep stops the loop without consulting the
    /// schedule.
    pub async fn run(&self, cancel: CancellationToken) {
        info!("running initial sweep");
        self.transition(SchedulerState::Running);
        self.runner.run_sweep().await;

        while !cancel.is_cancelled() {
            let next_run = match self.schedule.next_after(Utc::now()) {
                Ok(next_run) => next_run,
                Err(error) => {
                    error!(error = %error, "failed to compute next sweep time");
                    break;
                }
            };

            info!(next_run = %next_run.to_rfc3339(), "next sweep scheduled");
            self.transition(SchedulerState::Waiting);
            if !self.wait_until(next_run, &cancel).await {
                break;
            }

            info!("scheduled sweep starting");
            self.transition(SchedulerState::Running);
            self.runner.run_sweep().await;
        }

        info!("sweep scheduler stopped");
        self.transition(SchedulerState::Stopped);
    }

    /// Sleeps in bounded increments until `deadline`.
    ///
    /// Returns false when cancelled first.
    async fn wait_until(&self, deadline: DateTime<Utc>, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }

            let remaining = match (deadline - Utc::now()).to_std() {
                Ok(remaining) if !remaining.is_zero() => remaining,
                _ => return true,
            };

            tokio::select! {
                () = cancel.cancelled() => return false,
                () = tokio::time::sleep(remaining.min(self.poll_interval)) => {}
            }
        }
    }

    fn transition(&self, next: SchedulerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = previous.as_str(), to = next.as_str(), "scheduler transition");
        }
    }
}
