use std::sync::Arc;

use async_trait::async_trait;
use reclaim_core::AppResult;
use tokio::sync::Mutex;

use crate::client_credential_token_provider::AccessTokenProvider;

/// Token provider that hands out a fixed token and records requested scopes.
#[derive(Default)]
pub(crate) struct StaticTokenProvider {
    scopes: Mutex<Vec<String>>,
}

impl StaticTokenProvider {
    pub(crate) async fn requested_scopes(&self) -> Vec<String> {
        self.scopes.lock().await.clone()
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self, scope: &str) -> AppResult<Arc<str>> {
        self.scopes.lock().await.push(scope.to_owned());
        Ok(Arc::from("test-token"))
    }
}
