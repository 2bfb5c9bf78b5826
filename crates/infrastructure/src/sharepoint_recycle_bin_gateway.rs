use std::sync::Arc;

use async_trait::async_trait;
use reclaim_application::RecycleBinGateway;
use reclaim_core::{AppError, AppResult};
use reclaim_domain::RecycleBinEntry;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::client_credential_token_provider::AccessTokenProvider;
use crate::remote_http;

const VERBOSE_JSON: &str = "application/json;odata=verbose";

/// SharePoint `ItemState` of entries held in the site collection bin.
const SECOND_STAGE_ITEM_STATE: &str = "ItemState eq 2";

const PAGE_SIZE: &str = "200";

#[derive(Debug, Deserialize)]
struct VerboseEnvelope {
    d: VerbosePage,
}

#[derive(Debug, Deserialize)]
struct VerbosePage {
    #[serde(default)]
    results: Vec<SharePointRecycleBinItem>,
    #[serde(rename = "__next")]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SharePointRecycleBinItem {
    id: String,
    leaf_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_size")]
    size: u64,
    deleted_date: Option<String>,
}

impl From<SharePointRecycleBinItem> for RecycleBinEntry {
    fn from(item: SharePointRecycleBinItem) -> Self {
        Self {
            id: item.id,
            leaf_name: item.leaf_name.unwrap_or_default(),
            size: item.size,
            deleted_date_time: item.deleted_date.unwrap_or_default(),
        }
    }
}

/// Verbose OData serializes `Int64` as a string. Null reads as zero.
fn lenient_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|size| *size > 0.0).map(|size| size as u64))
            .unwrap_or(0),
        serde_json::Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// Second-stage (site collection) recycle bin through the SharePoint REST API.
///
/// Scopes are absolute site URLs. SharePoint only accepts app-only tokens
/// obtained with a certificate credential here.
#[derive(Clone)]
pub struct SharePointRecycleBinGateway {
    http_client: reqwest::Client,
    token_provider: Arc<dyn AccessTokenProvider>,
    token_scope: String,
}

impl SharePointRecycleBinGateway {
    /// Creates a gateway for the tenant's SharePoint host, e.g. `contoso.sharepoint.com`.
    pub fn new(
        http_client: reqwest::Client,
        token_provider: Arc<dyn AccessTokenProvider>,
        sharepoint_domain: &str,
    ) -> AppResult<Self> {
        let domain = sharepoint_domain
            .trim()
            .trim_start_matches("https://")
            .trim_end_matches('/');
        if domain.is_empty() {
            return Err(AppError::Validation(
                "sharepoint domain must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            http_client,
            token_provider,
            token_scope: format!("https://{domain}/.default"),
        })
    }

    async fn authorized(
        &self,
        request: reqwest::RequestBuilder,
    ) -> AppResult<reqwest::RequestBuilder> {
        let token = self
            .token_provider
            .access_token(self.token_scope.as_str())
            .await?;
        Ok(request.bearer_auth(token).header(ACCEPT, VERBOSE_JSON))
    }
}

fn site_api_url(site_url: &str, path: &str) -> String {
    format!("{}/_api/site/{path}", site_url.trim_end_matches('/'))
}

#[async_trait]
impl RecycleBinGateway for SharePointRecycleBinGateway {
    async fn list_entries(&self, scope: &str) -> AppResult<Vec<RecycleBinEntry>> {
        debug!(site_url = scope, "fetching second-stage recycle bin");
        let operation = "list second-stage recycle bin";
        let mut entries = Vec::new();

        let first_page = self.http_client.get(site_api_url(scope, "RecycleBin")).query(&[
            ("$filter", SECOND_STAGE_ITEM_STATE),
            ("$top", PAGE_SIZE),
        ]);
        let mut request = Some(first_page);

        while let Some(next) = request.take() {
            let response = remote_http::send(self.authorized(next).await?, operation).await?;
            let envelope = remote_http::read_json::<VerboseEnvelope>(response, operation).await?;

            entries.extend(envelope.d.results.into_iter().map(RecycleBinEntry::from));
            request = envelope
                .d
                .next
                .map(|url| self.http_client.get(url.as_str()));
        }

        Ok(entries)
    }

    async fn purge_entry(&self, scope: &str, entry_id: &str) -> AppResult<()> {
        let escaped = entry_id.replace('\'', "''");
        let request = self
            .http_client
            .post(site_api_url(
                scope,
                format!("RecycleBin('{escaped}')/DeleteObject()").as_str(),
            ))
            .body(Vec::<u8>::new());

        remote_http::send(
            self.authorized(request).await?,
            "purge second-stage recycle bin entry",
        )
        .await?;
        Ok(())
    }
}
