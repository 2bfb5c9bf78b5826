//! Retention policy and age filtering.
//!
//! All age comparisons of one sweep are made against a single
//! [`RetentionCutoff`] so the sweep is temporally consistent.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use reclaim_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 8;

/// File suffix of meeting recordings.
pub const DEFAULT_RECORDING_SUFFIX: &str = ".mp4";

/// Folder name that marks recordings when the folder restriction is active.
pub const DEFAULT_RECORDINGS_FOLDER_MARKER: &str = "Recordings";

/// Policy parameters of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Items older than this many days are expired.
    pub retention_days: u32,
    /// Simulate deletions and purges without calling destructive APIs.
    pub dry_run: bool,
    /// Purge the first-stage recycle bin of every site.
    pub purge_first_stage: bool,
    /// Only consider items whose parent path contains the recordings marker.
    pub require_recordings_folder: bool,
    /// Marker searched for in parent paths.
    pub recordings_folder_marker: String,
    /// Suffix used both as search query and as name filter.
    pub file_suffix: String,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            dry_run: true,
            purge_first_stage: false,
            require_recordings_folder: false,
            recordings_folder_marker: DEFAULT_RECORDINGS_FOLDER_MARKER.to_owned(),
            file_suffix: DEFAULT_RECORDING_SUFFIX.to_owned(),
        }
    }
}

impl RetentionPolicy {
    /// Returns the log label of the execution mode.
    #[must_use]
    pub fn mode_label(&self) -> &'static str {
        if self.dry_run { "DRY RUN" } else { "LIVE" }
    }

    /// Computes the cutoff relative to `now`.
    #[must_use]
    pub fn cutoff_at(&self, now: DateTime<Utc>) -> RetentionCutoff {
        RetentionCutoff::at(now, self.retention_days)
    }

    /// Returns whether a file name carries the configured suffix.
    ///
    /// Remote search is a substring match, so results are re-checked here.
    #[must_use]
    pub fn matches_file_name(&self, name: &str) -> bool {
        name.to_lowercase()
            .ends_with(self.file_suffix.to_lowercase().as_str())
    }

    /// Returns whether an item located under `parent_path` is in scope.
    #[must_use]
    pub fn matches_folder(&self, parent_path: Option<&str>) -> bool {
        if !self.require_recordings_folder {
            return true;
        }

        parent_path.is_some_and(|path| {
            path.to_lowercase()
                .contains(self.recordings_folder_marker.to_lowercase().as_str())
        })
    }
}

/// Timestamp below which items are expired for one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RetentionCutoff(DateTime<Utc>);

impl RetentionCutoff {
    /// Computes `now - retention_days`.
    #[must_use]
    pub fn at(now: DateTime<Utc>, retention_days: u32) -> Self {
        let window = TimeDelta::try_days(i64::from(retention_days)).unwrap_or(TimeDelta::MAX);
        Self(
            now.checked_sub_signed(window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }

    /// Returns the cutoff instant.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns whether `timestamp` strictly precedes this cutoff.
    #[must_use]
    pub fn is_expired(&self, timestamp: DateTime<Utc>) -> bool {
        is_expired(timestamp, self.0)
    }
}

/// Returns true iff `timestamp` strictly precedes `cutoff`.
#[must_use]
pub fn is_expired(timestamp: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
    timestamp < cutoff
}

/// Parses a remote timestamp into UTC.
///
/// Accepts RFC 3339 with a `Z` suffix or an explicit offset. Timestamps
/// without any offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Parse("timestamp is empty".to_owned()));
    }

    let normalized = match trimmed.strip_suffix(['Z', 'z']) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => trimmed.to_owned(),
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(normalized.as_str()) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(normalized.as_str(), "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|error| AppError::Parse(format!("invalid timestamp '{trimmed}': {error}")))
}

/// Returns the whole number of days between `timestamp` and `now`.
#[must_use]
pub fn age_in_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(timestamp).num_days()
}
