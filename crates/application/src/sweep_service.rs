use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reclaim_core::{AppError, ErrorKind};
use reclaim_domain::{
    RecycleBinStage, RetentionCutoff, RetentionPolicy, Site, SweepStatistics, format_size,
};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::sweep_ports::{RecycleBinGateway, StorageGateway, SweepRunner};

mod drives;
mod recycle_bin;


/// Retention sweep over every site, drive and recycle bin of one tenant.
///
/// A sweep never fails as a whole: scope and item failures are logged and
/// counted in [`SweepStatistics::errors`]. Only a failure to list sites ends
/// the run early.
#[derive(Clone)]
pub struct SweepService {
    storage: Arc<dyn StorageGateway>,
    first_stage: Option<Arc<dyn RecycleBinGateway>>,
    second_stage: Option<Arc<dyn RecycleBinGateway>>,
    policy: RetentionPolicy,
}

/// State of one sweep in progress.
struct SweepRun {
    now: DateTime<Utc>,
    cutoff: RetentionCutoff,
    statistics: SweepStatistics,
}

impl SweepRun {
    /// Accounts a failure to list one scope of a site.
    fn scope_failure(&mut self, scope: &str, site: &Site, error: &AppError) {
        match error.kind() {
            ErrorKind::AccessDenied => {
                debug!(
                    site = %site.display_name,
                    scope,
                    error = %error,
                    "scope not visible to credential, skipping"
                );
            }
            ErrorKind::Transient | ErrorKind::Fatal | ErrorKind::Parse => {
                warn!(
                    site = %site.display_name,
                    scope,
                    error = %error,
                    "failed to list scope"
                );
                self.statistics.record_error();
            }
        }
    }
}

impl SweepService {
    /// Creates a sweep service without recycle-bin capabilities.
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>, policy: RetentionPolicy) -> Self {
        Self {
            storage,
            first_stage: None,
            second_stage: None,
            policy,
        }
    }

    /// Adds the first-stage recycle bin. Purging still requires
    /// [`RetentionPolicy::purge_first_stage`].
    #[must_use]
    pub fn with_first_stage_recycle_bin(mut self, gateway: Arc<dyn RecycleBinGateway>) -> Self {
        self.first_stage = Some(gateway);
        self
    }

    /// Adds the second-stage recycle bin, purged for every site with a URL.
    #[must_use]
    pub fn with_second_stage_recycle_bin(mut self, gateway: Arc<dyn RecycleBinGateway>) -> Self {
        self.second_stage = Some(gateway);
        self
    }

    /// Returns the policy applied by every sweep.
    #[must_use]
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Runs one sweep with the cutoff derived from the current time.
    pub async fn run_sweep(&self) -> SweepStatistics {
        self.sweep_at(Utc::now()).await
    }

    /// Runs one sweep as if the current time were `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepStatistics {
        let run_id = Uuid::new_v4();
        let span = info_span!("sweep", run_id = %run_id);
        self.sweep(now).instrument(span).await
    }

    async fn sweep(&self, now: DateTime<Utc>) -> SweepStatistics {
        let mut run = SweepRun {
            now,
            cutoff: self.policy.cutoff_at(now),
            statistics: SweepStatistics::default(),
        };
        let mode = self.policy.mode_label();

        info!(
            mode,
            retention_days = self.policy.retention_days,
            cutoff = %run.cutoff.as_datetime().to_rfc3339(),
            purge_first_stage = self.policy.purge_first_stage,
            first_stage_available = self.first_stage.is_some(),
            second_stage_available = self.second_stage.is_some(),
            require_recordings_folder = self.policy.require_recordings_folder,
            "starting retention sweep"
        );

        let sites = match self.storage.list_sites().await {
            Ok(sites) => sites,
            Err(error) => {
                error!(error = %error, "failed to list sites, aborting sweep");
                return run.statistics;
            }
        };
        info!(site_count = sites.len(), "listed sites");

        for site in &sites {
            self.sweep_site(site, &mut run).await;
        }

        let statistics = run.statistics;
        info!(
            mode,
            files_deleted = statistics.files_deleted,
            bytes_freed = %format_size(statistics.bytes_freed),
            first_stage_purged = statistics.first_stage_purged,
            second_stage_purged = statistics.second_stage_purged,
            recycle_purged = statistics.recycle_purged(),
            errors = statistics.errors,
            "retention sweep complete"
        );

        statistics
    }

    async fn sweep_site(&self, site: &Site, run: &mut SweepRun) {
        info!(site = %site.display_name, url = %site.web_url, "processing site");

        match self.storage.list_drives(site.id.as_str()).await {
            Ok(drives) => {
                for drive in &drives {
                    self.sweep_drive(site, drive, run).await;
                }
            }
            Err(error) => run.scope_failure("drives", site, &error),
        }

        if self.policy.purge_first_stage {
            match &self.first_stage {
                Some(gateway) => {
                    self.purge_recycle_bin(RecycleBinStage::First, gateway.as_ref(), site, run)
                        .await;
                }
                None => debug!(
                    site = %site.display_name,
                    "first-stage purge requested but no first-stage recycle bin is configured"
                ),
            }
        }

        if let Some(gateway) = &self.second_stage {
            self.purge_recycle_bin(RecycleBinStage::Second, gateway.as_ref(), site, run)
                .await;
        }
    }
}

#[async_trait]
impl SweepRunner for SweepService {
    async fn run_sweep(&self) -> SweepStatistics {
        SweepService::run_sweep(self).await
    }
}
