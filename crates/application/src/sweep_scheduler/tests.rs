use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use reclaim_core::{AppError, AppResult};
use reclaim_domain::SweepStatistics;

use crate::sweep_ports::{RecurrenceSchedule, SweepRunner};

use super::{MAX_POLL_INTERVAL, SchedulerState, SweepScheduler};

struct FakeRunner {
    runs: Mutex<u32>,
    cancel_after_runs: Option<(u32, CancellationToken)>,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            runs: Mutex::new(0),
            cancel_after_runs: None,
        }
    }

    fn cancelling_after(runs: u32, token: CancellationToken) -> Self {
        Self {
            runs: Mutex::new(0),
            cancel_after_runs: Some((runs, token)),
        }
    }

    async fn runs(&self) -> u32 {
        *self.runs.lock().await
    }
}

#[async_trait]
impl SweepRunner for FakeRunner {
    async fn run_sweep(&self) -> SweepStatistics {
        let mut runs = self.runs.lock().await;
        *runs += 1;

        if let Some((limit, token)) = &self.cancel_after_runs
            && *runs >= *limit
        {
            token.cancel();
        }

        SweepStatistics::default()
    }
}

struct FakeSchedule {
    delay: TimeDelta,
    fail: bool,
    calls: std::sync::Mutex<u32>,
}

impl FakeSchedule {
    fn every(delay: TimeDelta) -> Self {
        Self {
            delay,
            fail: false,
            calls: std::sync::Mutex::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::every(TimeDelta::zero())
        }
    }

    fn calls(&self) -> u32 {
        self.calls.lock().map(|calls| *calls).unwrap_or_default()
    }
}

impl RecurrenceSchedule for FakeSchedule {
    fn next_after(&self, after: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }

        if self.fail {
            return Err(AppError::Validation("schedule has no future run".to_owned()));
        }

        Ok(after + self.delay)
    }
}

#[tokio::test]
async fn cancellation_during_first_sweep_stops_without_scheduling() {
    let cancel = CancellationToken::new();
    let runner = Arc::new(FakeRunner::cancelling_after(1, cancel.clone()));
    let schedule = Arc::new(FakeSchedule::every(TimeDelta::hours(1)));
    let scheduler = SweepScheduler::new(runner.clone(), schedule.clone());
    assert_eq!(scheduler.state(), SchedulerState::Idle);

    scheduler.run(cancel).await;

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(runner.runs().await, 1);
    assert_eq!(schedule.calls(), 0);
}

#[tokio::test]
async fn runs_scheduled_sweeps_until_cancelled() {
    let cancel = CancellationToken::new();
    let runner = Arc::new(FakeRunner::cancelling_after(3, cancel.clone()));
    let schedule = Arc::new(FakeSchedule::every(TimeDelta::milliseconds(20)));
    let scheduler = SweepScheduler::new(runner.clone(), schedule.clone())
        .with_poll_interval(Duration::from_millis(5));

    let finished = tokio::time::timeout(Duration::from_secs(5), scheduler.run(cancel)).await;

    assert!(finished.is_ok());
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(runner.runs().await, 3);
    assert_eq!(schedule.calls(), 2);
}

#[tokio::test]
async fn cancellation_while_waiting_is_honored_before_next_run() {
    let cancel = CancellationToken::new();
    let runner = Arc::new(FakeRunner::new());
    let schedule = Arc::new(FakeSchedule::every(TimeDelta::hours(6)));
    let scheduler = Arc::new(SweepScheduler::new(runner.clone(), schedule));
    let mut states = scheduler.subscribe();

    let task = {
        let scheduler = scheduler.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { scheduler.run(cancel).await })
    };

    let waiting = states
        .wait_for(|state| *state == SchedulerState::Waiting)
        .await;
    assert!(waiting.is_ok());
    drop(waiting);

    cancel.cancel();
    let joined = tokio::time::timeout(Duration::from_secs(1), task).await;

    assert!(matches!(joined, Ok(Ok(()))));
    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(runner.runs().await, 1);
}

#[tokio::test]
async fn schedule_failure_stops_after_initial_sweep() {
    let runner = Arc::new(FakeRunner::new());
    let schedule = Arc::new(FakeSchedule::failing());
    let scheduler = SweepScheduler::new(runner.clone(), schedule.clone());

    scheduler.run(CancellationToken::new()).await;

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(runner.runs().await, 1);
    assert_eq!(schedule.calls(), 1);
}

#[test]
fn poll_interval_is_capped() {
    let scheduler = SweepScheduler::new(
        Arc::new(FakeRunner::new()),
        Arc::new(FakeSchedule::every(TimeDelta::hours(1))),
    );
    assert_eq!(scheduler.poll_interval, MAX_POLL_INTERVAL);

    let scheduler = scheduler.with_poll_interval(Duration::from_secs(3600));
    assert_eq!(scheduler.poll_interval, MAX_POLL_INTERVAL);

    let scheduler = scheduler.with_poll_interval(Duration::from_secs(5));
    assert_eq!(scheduler.poll_interval, Duration::from_secs(5));
}
