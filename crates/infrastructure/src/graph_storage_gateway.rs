use async_trait::async_trait;
use reclaim_application::StorageGateway;
use reclaim_core::AppResult;
use reclaim_domain::{Drive, DriveItem, Site};
use serde::Deserialize;
use tracing::{debug, info};

use crate::graph_client::GraphClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphSite {
    id: String,
    display_name: Option<String>,
    web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphDrive {
    id: String,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDriveItem {
    id: String,
    name: Option<String>,
    size: Option<i64>,
    created_date_time: Option<String>,
    parent_reference: Option<GraphItemReference>,
    folder: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphItemReference {
    path: Option<String>,
}

impl From<GraphDriveItem> for DriveItem {
    fn from(item: GraphDriveItem) -> Self {
        Self {
            id: item.id,
            name: item.name.unwrap_or_default(),
            size: item
                .size
                .and_then(|size| u64::try_from(size).ok())
                .unwrap_or(0),
            created_date_time: item.created_date_time.unwrap_or_default(),
            parent_path: item.parent_reference.and_then(|reference| reference.path),
        }
    }
}

/// Microsoft Graph adapter for site, drive and item operations.
#[derive(Clone)]
pub struct GraphStorageGateway {
    graph: GraphClient,
}

impl GraphStorageGateway {
    /// Creates a gateway over an authenticated Graph client.
    #[must_use]
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl StorageGateway for GraphStorageGateway {
    async fn list_sites(&self) -> AppResult<Vec<Site>> {
        info!("fetching all SharePoint sites");
        let sites = self
            .graph
            .get_paginated::<GraphSite>(self.graph.url("/sites?search=*"), "list sites")
            .await?;
        info!(site_count = sites.len(), "found sites");

        Ok(sites
            .into_iter()
            .map(|site| Site::new(site.id, site.display_name, site.web_url))
            .collect())
    }

    async fn list_drives(&self, site_id: &str) -> AppResult<Vec<Drive>> {
        debug!(site_id, "fetching drives");
        let drives = self
            .graph
            .get_paginated::<GraphDrive>(
                self.graph.url(format!("/sites/{site_id}/drives").as_str()),
                "list drives",
            )
            .await?;

        Ok(drives
            .into_iter()
            .map(|drive| Drive::new(drive.id, drive.name))
            .collect())
    }

    async fn search_items(&self, drive_id: &str, query: &str) -> AppResult<Vec<DriveItem>> {
        debug!(drive_id, query, "searching drive");
        let escaped = query.replace('\'', "''");
        let items = self
            .graph
            .get_paginated::<GraphDriveItem>(
                self.graph
                    .url(format!("/drives/{drive_id}/root/search(q='{escaped}')").as_str()),
                "search drive",
            )
            .await?;

        Ok(items
            .into_iter()
            .filter(|item| item.folder.is_none())
            .map(DriveItem::from)
            .collect())
    }

    async fn delete_item(&self, drive_id: &str, item_id: &str) -> AppResult<()> {
        self.graph
            .delete(
                self.graph
                    .url(format!("/drives/{drive_id}/items/{item_id}").as_str()),
                "delete drive item",
            )
            .await
    }
}
