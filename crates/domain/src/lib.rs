//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod retention;
mod size;
mod statistics;
mod storage;

pub use retention::{
    DEFAULT_RECORDINGS_FOLDER_MARKER, DEFAULT_RECORDING_SUFFIX, DEFAULT_RETENTION_DAYS,
    RetentionCutoff, RetentionPolicy, age_in_days, is_expired, parse_timestamp,
};
pub use size::format_size;
pub use statistics::SweepStatistics;
pub use storage::{Drive, DriveItem, RecycleBinEntry, RecycleBinStage, Site};
