use std::sync::Arc;

use reclaim_core::AppResult;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::client_credential_token_provider::AccessTokenProvider;
use crate::remote_http;

/// Default Microsoft Graph endpoint.
pub const GRAPH_V1_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Microsoft Graph endpoint for preview APIs such as site recycle bins.
pub const GRAPH_BETA_BASE_URL: &str = "https://graph.microsoft.com/beta";

/// Token scope for Microsoft Graph application permissions.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

#[derive(Debug, Deserialize)]
struct ODataPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Authenticated Microsoft Graph client shared by the Graph adapters.
#[derive(Clone)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_provider: Arc<dyn AccessTokenProvider>,
    base_url: String,
}

impl GraphClient {
    /// Creates a client against the v1.0 endpoint.
    #[must_use]
    pub fn new(http_client: reqwest::Client, token_provider: Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            http_client,
            token_provider,
            base_url: GRAPH_V1_BASE_URL.to_owned(),
        }
    }

    /// Points the client at another Graph endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::RequestBuilder> {
        let token = self.token_provider.access_token(GRAPH_SCOPE).await?;
        Ok(request.bearer_auth(token))
    }

    /// Collects every page of an OData collection, following `@odata.nextLink`.
    pub(crate) async fn get_paginated<T>(&self, url: String, operation: &str) -> AppResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut next = Some(url);

        while let Some(url) = next {
            let request = self.authorized(self.http_client.get(url.as_str())).await?;
            let response = remote_http::send(request, operation).await?;
            let page = remote_http::read_json::<ODataPage<T>>(response, operation).await?;

            items.extend(page.value);
            next = page.next_link;
        }

        Ok(items)
    }

    pub(crate) async fn delete(&self, url: String, operation: &str) -> AppResult<()> {
        let request = self.authorized(self.http_client.delete(url.as_str())).await?;
        remote_http::send(request, operation).await?;
        Ok(())
    }
}
