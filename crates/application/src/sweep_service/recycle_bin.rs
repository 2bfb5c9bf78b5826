use reclaim_domain::{RecycleBinEntry, RecycleBinStage, Site, format_size, parse_timestamp};
use tracing::{debug, info, warn};

use crate::sweep_ports::RecycleBinGateway;

use super::{SweepRun, SweepService};

impl SweepService {
    pub(super) async fn purge_recycle_bin(
        &self,
        stage: RecycleBinStage,
        gateway: &dyn RecycleBinGateway,
        site: &Site,
        run: &mut SweepRun,
    ) {
        let Some(scope) = stage.scope_for(site) else {
            debug!(
                site = %site.display_name,
                stage = %stage,
                "site has no URL, skipping recycle bin"
            );
            return;
        };

        let entries = match gateway.list_entries(scope).await {
            Ok(entries) => entries,
            Err(error) => {
                run.scope_failure(stage.as_str(), site, &error);
                return;
            }
        };

        let recordings = entries
            .iter()
            .filter(|entry| self.policy.matches_file_name(entry.leaf_name.as_str()))
            .collect::<Vec<_>>();
        debug!(
            site = %site.display_name,
            stage = %stage,
            entries = entries.len(),
            recordings = recordings.len(),
            "listed recycle bin"
        );

        for entry in recordings {
            self.purge_entry(stage, gateway, scope, site, entry, run)
                .await;
        }
    }

    async fn purge_entry(
        &self,
        stage: RecycleBinStage,
        gateway: &dyn RecycleBinGateway,
        scope: &str,
        site: &Site,
        entry: &RecycleBinEntry,
        run: &mut SweepRun,
    ) {
        let deleted = match parse_timestamp(entry.deleted_date_time.as_str()) {
            Ok(deleted) => deleted,
            Err(error) => {
                warn!(
                    item = %entry.leaf_name,
                    stage = %stage,
                    error = %error,
                    "could not parse deleted timestamp, skipping"
                );
                return;
            }
        };

        if !run.cutoff.is_expired(deleted) {
            debug!(item = %entry.leaf_name, stage = %stage, "recycle bin entry too recent, skipping");
            return;
        }

        let size = format_size(entry.size);
        if self.policy.dry_run {
            info!(
                item = %entry.leaf_name,
                size = %size,
                stage = %stage,
                site = %site.display_name,
                "[DRY RUN] would purge from recycle bin"
            );
            run.statistics.record_purge(stage);
            return;
        }

        info!(
            item = %entry.leaf_name,
            size = %size,
            stage = %stage,
            site = %site.display_name,
            "purging from recycle bin"
        );

        match gateway.purge_entry(scope, entry.id.as_str()).await {
            Ok(()) => run.statistics.record_purge(stage),
            Err(error) => {
                warn!(
                    item = %entry.leaf_name,
                    stage = %stage,
                    error = %error,
                    "failed to purge recycle bin entry"
                );
                run.statistics.record_error();
            }
        }
    }
}
