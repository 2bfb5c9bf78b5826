use async_trait::async_trait;
use reclaim_application::RecycleBinGateway;
use reclaim_core::AppResult;
use reclaim_domain::RecycleBinEntry;
use serde::Deserialize;
use tracing::debug;

use crate::graph_client::GraphClient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphRecycleBinItem {
    id: String,
    name: Option<String>,
    title: Option<String>,
    size: Option<i64>,
    deleted_date_time: Option<String>,
}

impl From<GraphRecycleBinItem> for RecycleBinEntry {
    fn from(item: GraphRecycleBinItem) -> Self {
        Self {
            leaf_name: item.name.or(item.title).unwrap_or_default(),
            size: item
                .size
                .and_then(|size| u64::try_from(size).ok())
                .unwrap_or(0),
            deleted_date_time: item.deleted_date_time.unwrap_or_default(),
            id: item.id,
        }
    }
}

/// First-stage recycle bin of a site, reached through the Graph beta endpoint.
///
/// Scopes are site ids.
#[derive(Clone)]
pub struct GraphRecycleBinGateway {
    graph: GraphClient,
}

impl GraphRecycleBinGateway {
    /// Creates a gateway over a Graph client pointed at the beta endpoint.
    #[must_use]
    pub fn new(graph: GraphClient) -> Self {
        Self { graph }
    }
}

#[async_trait]
impl RecycleBinGateway for GraphRecycleBinGateway {
    async fn list_entries(&self, scope: &str) -> AppResult<Vec<RecycleBinEntry>> {
        debug!(site_id = scope, "fetching first-stage recycle bin");
        let items = self
            .graph
            .get_paginated::<GraphRecycleBinItem>(
                self.graph
                    .url(format!("/sites/{scope}/recycleBin/items").as_str()),
                "list first-stage recycle bin",
            )
            .await?;

        Ok(items.into_iter().map(RecycleBinEntry::from).collect())
    }

    async fn purge_entry(&self, scope: &str, entry_id: &str) -> AppResult<()> {
        self.graph
            .delete(
                self.graph
                    .url(format!("/sites/{scope}/recycleBin/items/{entry_id}").as_str()),
                "purge first-stage recycle bin entry",
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reclaim_application::{RecycleBinGateway, SweepService};
    use reclaim_core::ErrorKind;
    use reclaim_domain::RetentionPolicy;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::GraphRecycleBinGateway;
    use crate::graph_client::{GRAPH_SCOPE, GraphClient};
    use crate::graph_storage_gateway::GraphStorageGateway;
    use crate::test_support::StaticTokenProvider;

    fn gateway(server: &MockServer, tokens: Arc<StaticTokenProvider>) -> GraphRecycleBinGateway {
        GraphRecycleBinGateway::new(
            GraphClient::new(reqwest::Client::new(), tokens).with_base_url(server.uri()),
        )
    }

    #[tokio::test]
    async fn list_entries_prefers_name_over_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/site-1/recycleBin/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [
                    {
                        "id": "entry-1",
                        "name": "Weekly sync.mp4",
                        "title": "Weekly sync",
                        "size": 2048,
                        "deletedDateTime": "2024-04-01T10:00:00Z"
                    },
                    {
                        "id": "entry-2",
                        "title": "Board review.mp4",
                        "deletedDateTime": "2024-04-02T10:00:00Z"
                    }
                ]
            })))
            .mount(&server)
            .await;

        let tokens = Arc::new(StaticTokenProvider::default());
        let entries = gateway(&server, tokens.clone()).list_entries("site-1").await;

        assert!(entries.is_ok());
        let entries = entries.unwrap_or_default();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].leaf_name, "Weekly sync.mp4");
        assert_eq!(entries[0].size, 2048);
        assert_eq!(entries[1].leaf_name, "Board review.mp4");
        assert_eq!(entries[1].size, 0);
        assert_eq!(tokens.requested_scopes().await, vec![GRAPH_SCOPE.to_owned()]);
    }

    #[tokio::test]
    async fn purge_entry_deletes_the_item() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/sites/site-1/recycleBin/items/entry-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let result = gateway(&server, Arc::new(StaticTokenProvider::default()))
            .purge_entry("site-1", "entry-1")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_recycle_bin_is_access_denied() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/site-1/recycleBin/items"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = gateway(&server, Arc::new(StaticTokenProvider::default()))
            .list_entries("site-1")
            .await;

        assert!(matches!(result, Err(error) if error.kind() == ErrorKind::AccessDenied));
    }

    fn null_dated_page() -> serde_json::Value {
        json!({
            "value": [
                {
                    "id": "entry-old",
                    "name": "All hands.mp4",
                    "size": 4096,
                    "deletedDateTime": "2020-01-01T00:00:00Z"
                },
                {
                    "id": "entry-undated",
                    "name": "Unknown.mp4",
                    "title": null,
                    "size": null,
                    "deletedDateTime": null
                }
            ]
        })
    }

    #[tokio::test]
    async fn null_fields_do_not_fail_the_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites/site-1/recycleBin/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(null_dated_page()))
            .mount(&server)
            .await;

        let entries = gateway(&server, Arc::new(StaticTokenProvider::default()))
            .list_entries("site-1")
            .await;

        assert!(entries.is_ok());
        let entries = entries.unwrap_or_default();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].deleted_date_time, "2020-01-01T00:00:00Z");
        assert_eq!(entries[1].id, "entry-undated");
        assert_eq!(entries[1].size, 0);
        assert_eq!(entries[1].deleted_date_time, "");
    }

    #[tokio::test]
    async fn sweep_purges_dated_entry_and_skips_null_dated_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sites"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{"id": "site-1", "displayName": "Sales"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sites/site-1/drives"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sites/site-1/recycleBin/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(null_dated_page()))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/sites/site-1/recycleBin/items/entry-old"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/sites/site-1/recycleBin/items/entry-undated"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let graph = GraphClient::new(reqwest::Client::new(), Arc::new(StaticTokenProvider::default()))
            .with_base_url(server.uri());
        let service = SweepService::new(
            Arc::new(GraphStorageGateway::new(graph.clone())),
            RetentionPolicy {
                dry_run: false,
                purge_first_stage: true,
                ..RetentionPolicy::default()
            },
        )
        .with_first_stage_recycle_bin(Arc::new(GraphRecycleBinGateway::new(graph)));

        let statistics = service.run_sweep().await;

        assert_eq!(statistics.first_stage_purged, 1);
        assert_eq!(statistics.errors, 0);
    }
}
