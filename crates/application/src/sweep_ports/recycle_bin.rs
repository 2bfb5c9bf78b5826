use async_trait::async_trait;
use reclaim_core::AppResult;
use reclaim_domain::RecycleBinEntry;

/// Port for one recycle-bin stage.
///
/// The scope is the site id for the first stage and the site URL for the
/// second stage.
#[async_trait]
pub trait RecycleBinGateway: Send + Sync {
    /// Lists all entries in the recycle bin of one scope.
    async fn list_entries(&self, scope: &str) -> AppResult<Vec<RecycleBinEntry>>;

    /// Permanently removes one entry.
    async fn purge_entry(&self, scope: &str, entry_id: &str) -> AppResult<()>;
}
