use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reclaim_core::AppResult;
use reclaim_domain::SweepStatistics;

/// Executes one complete sweep.
#[async_trait]
pub trait SweepRunner: Send + Sync {
    /// Runs a sweep to completion and returns its statistics.
    async fn run_sweep(&self) -> SweepStatistics;
}

/// Recurrence rule that yields successive run times.
pub trait RecurrenceSchedule: Send + Sync {
    /// Returns the first occurrence strictly after `after`.
    fn next_after(&self, after: DateTime<Utc>) -> AppResult<DateTime<Utc>>;
}
