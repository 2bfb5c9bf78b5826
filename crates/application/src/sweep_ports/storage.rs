use async_trait::async_trait;
use reclaim_core::AppResult;
use reclaim_domain::{Drive, DriveItem, Site};

/// Remote storage port used to enumerate and delete files.
///
/// Implementations handle authentication and pagination. Failures carry an
/// [`reclaim_core::AppError`] whose kind drives the sweep's accounting.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Lists every site visible to the credential.
    async fn list_sites(&self) -> AppResult<Vec<Site>>;

    /// Lists the drives of one site.
    async fn list_drives(&self, site_id: &str) -> AppResult<Vec<Drive>>;

    /// Searches a drive recursively. The query is a substring match.
    async fn search_items(&self, drive_id: &str, query: &str) -> AppResult<Vec<DriveItem>>;

    /// Deletes one item from a drive.
    async fn delete_item(&self, drive_id: &str, item_id: &str) -> AppResult<()>;
}
