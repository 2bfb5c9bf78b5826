use chrono::{DateTime, Utc};
use croner::Cron;
use reclaim_application::RecurrenceSchedule;
use reclaim_core::{AppError, AppResult};

/// Default run time: daily at 02:00 UTC.
pub const DEFAULT_CRON_SCHEDULE: &str = "0 2 * * *";

/// Five-field cron expression evaluated in UTC.
#[derive(Debug, Clone)]
pub struct CronRecurrenceSchedule {
    expression: String,
    cron: Cron,
}

impl CronRecurrenceSchedule {
    /// Parses a standard cron expression.
    pub fn parse(expression: &str) -> AppResult<Self> {
        let expression = expression.trim();
        let cron = Cron::new(expression).parse().map_err(|error| {
            AppError::Validation(format!("invalid cron expression '{expression}': {error}"))
        })?;

        Ok(Self {
            expression: expression.to_owned(),
            cron,
        })
    }

    /// Returns the expression as configured.
    #[must_use]
    pub fn expression(&self) -> &str {
        self.expression.as_str()
    }
}

impl RecurrenceSchedule for CronRecurrenceSchedule {
    fn next_after(&self, after: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        self.cron.find_next_occurrence(&after, false).map_err(|error| {
            AppError::Internal(format!(
                "cron expression '{}' has no occurrence after {after}: {error}",
                self.expression
            ))
        })
    }
}
