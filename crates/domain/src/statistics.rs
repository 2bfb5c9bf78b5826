use serde::Serialize;

use crate::storage::RecycleBinStage;

/// Counters accumulated over one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepStatistics {
    /// Files deleted (or that would have been deleted in dry-run).
    pub files_deleted: u64,
    /// Sum of the sizes of deleted files.
    pub bytes_freed: u64,
    /// Entries purged from first-stage recycle bins.
    pub first_stage_purged: u64,
    /// Entries purged from second-stage recycle bins.
    pub second_stage_purged: u64,
    /// Scope and item failures.
    pub errors: u64,
}

impl SweepStatistics {
    /// Records one deleted file.
    pub fn record_deletion(&mut self, size: u64) {
        self.files_deleted = self.files_deleted.saturating_add(1);
        self.bytes_freed = self.bytes_freed.saturating_add(size);
    }

    /// Records one purged recycle-bin entry.
    pub fn record_purge(&mut self, stage: RecycleBinStage) {
        let counter = match stage {
            RecycleBinStage::First => &mut self.first_stage_purged,
            RecycleBinStage::Second => &mut self.second_stage_purged,
        };
        *counter = counter.saturating_add(1);
    }

    /// Records one failure.
    pub fn record_error(&mut self) {
        self.errors = self.errors.saturating_add(1);
    }

    /// Returns the purge count across both recycle-bin stages.
    #[must_use]
    pub fn recycle_purged(&self) -> u64 {
        self.first_stage_purged
            .saturating_add(self.second_stage_purged)
    }
}
