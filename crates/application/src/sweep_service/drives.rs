use reclaim_domain::{Drive, DriveItem, Site, age_in_days, format_size, parse_timestamp};
use tracing::{debug, info, warn};

use super::{SweepRun, SweepService};

impl SweepService {
    pub(super) async fn sweep_drive(&self, site: &Site, drive: &Drive, run: &mut SweepRun) {
        debug!(site = %site.display_name, drive = %drive.name, "searching drive");

        let items = match self
            .storage
            .search_items(drive.id.as_str(), self.policy.file_suffix.as_str())
            .await
        {
            Ok(items) => items,
            Err(error) => {
                run.scope_failure("drive_items", site, &error);
                return;
            }
        };

        for item in &items {
            if !self.policy.matches_file_name(item.name.as_str()) {
                continue;
            }

            if !self.policy.matches_folder(item.parent_path.as_deref()) {
                debug!(
                    item = %item.name,
                    parent_path = item.parent_path.as_deref().unwrap_or_default(),
                    "outside recordings folder, skipping"
                );
                continue;
            }

            self.expire_item(site, drive, item, run).await;
        }
    }

    async fn expire_item(&self, site: &Site, drive: &Drive, item: &DriveItem, run: &mut SweepRun) {
        let created = match parse_timestamp(item.created_date_time.as_str()) {
            Ok(created) => created,
            Err(error) => {
                warn!(
                    item = %item.name,
                    site = %site.display_name,
                    error = %error,
                    "could not parse created timestamp, skipping"
                );
                return;
            }
        };

        if !run.cutoff.is_expired(created) {
            return;
        }

        let size = format_size(item.size);
        let age_days = age_in_days(created, run.now);

        if self.policy.dry_run {
            info!(
                item = %item.name,
                size = %size,
                age_days,
                site = %site.display_name,
                drive = %drive.name,
                "[DRY RUN] would delete recording"
            );
            run.statistics.record_deletion(item.size);
            return;
        }

        info!(
            item = %item.name,
            size = %size,
            age_days,
            site = %site.display_name,
            drive = %drive.name,
            "deleting recording"
        );

        match self
            .storage
            .delete_item(drive.id.as_str(), item.id.as_str())
            .await
        {
            Ok(()) => run.statistics.record_deletion(item.size),
            Err(error) => {
                warn!(
                    item = %item.name,
                    site = %site.display_name,
                    error = %error,
                    "failed to delete recording"
                );
                run.statistics.record_error();
            }
        }
    }
}
