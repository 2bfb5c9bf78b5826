//! OAuth 2.0 client-credential token acquisition against Microsoft Entra ID.
//!
//! Tokens are cached per requested scope until shortly before they expire.
//! The provider is owned by the adapters that need it and injected as an
//! [`AccessTokenProvider`], so no token state is process-global.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reclaim_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::remote_http;

/// Default Entra ID authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tokens are refreshed this long before the reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime of a signed client assertion.
const CLIENT_ASSERTION_LIFETIME_SECONDS: i64 = 600;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Source of bearer tokens for one scope.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns a valid access token for `scope`.
    async fn access_token(&self, scope: &str) -> AppResult<Arc<str>>;
}

/// Credential of the app registration.
#[derive(Clone)]
pub enum ClientCredential {
    /// Shared client secret.
    Secret(String),
    /// Certificate private key (PEM) with its SHA-1 thumbprint in hex.
    ///
    /// SharePoint REST only accepts app-only tokens obtained this way.
    Certificate {
        /// PKCS#8 or PKCS#1 RSA private key in PEM form.
        private_key_pem: String,
        /// SHA-1 thumbprint of the certificate, hex encoded.
        thumbprint: String,
    },
}

impl ClientCredential {
    /// Returns whether this credential can sign client assertions.
    #[must_use]
    pub fn is_certificate(&self) -> bool {
        matches!(self, Self::Certificate { .. })
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Secret(_) => "client_secret",
            Self::Certificate { .. } => "client_certificate",
        }
    }
}

impl std::fmt::Debug for ClientCredential {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.kind())
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: Arc<str>,
    refresh_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Serialize)]
struct ClientAssertionClaims<'a> {
    aud: &'a str,
    iss: &'a str,
    sub: &'a str,
    jti: String,
    nbf: i64,
    exp: i64,
}

/// Client-credential flow with an expiry-aware per-scope cache.
pub struct ClientCredentialTokenProvider {
    http_client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    credential: ClientCredential,
    cache: RwLock<HashMap<String, CachedToken>>,
}

impl ClientCredentialTokenProvider {
    /// Creates a provider for one tenant and app registration.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        tenant_id: &str,
        client_id: impl Into<String>,
        credential: ClientCredential,
    ) -> Self {
        Self::with_authority(
            http_client,
            DEFAULT_AUTHORITY_HOST,
            tenant_id,
            client_id,
            credential,
        )
    }

    /// Creates a provider against a custom authority host.
    #[must_use]
    pub fn with_authority(
        http_client: reqwest::Client,
        authority_host: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        credential: ClientCredential,
    ) -> Self {
        Self {
            http_client,
            token_endpoint: format!(
                "{}/{tenant_id}/oauth2/v2.0/token",
                authority_host.trim_end_matches('/')
            ),
            client_id: client_id.into(),
            credential,
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn cached(&self, scope: &str) -> Option<Arc<str>> {
        self.cache
            .read()
            .await
            .get(scope)
            .filter(|cached| cached.refresh_at > Instant::now())
            .map(|cached| cached.token.clone())
    }

    async fn request_token(&self, scope: &str) -> AppResult<TokenResponse> {
        let mut form = vec![
            ("grant_type", "client_credentials".to_owned()),
            ("client_id", self.client_id.clone()),
            ("scope", scope.to_owned()),
        ];

        match &self.credential {
            ClientCredential::Secret(secret) => form.push(("client_secret", secret.clone())),
            ClientCredential::Certificate {
                private_key_pem,
                thumbprint,
            } => {
                form.push(("client_assertion_type", CLIENT_ASSERTION_TYPE.to_owned()));
                form.push((
                    "client_assertion",
                    self.sign_client_assertion(private_key_pem, thumbprint)?,
                ));
            }
        }

        let response = remote_http::send(
            self.http_client.post(self.token_endpoint.as_str()).form(&form),
            "token request",
        )
        .await
        .map_err(|error| match error {
            AppError::Forbidden(message) | AppError::NotFound(message) => {
                AppError::Unauthorized(message)
            }
            other => other,
        })?;

        remote_http::read_json(response, "token").await
    }

    fn sign_client_assertion(&self, private_key_pem: &str, thumbprint: &str) -> AppResult<String> {
        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(thumbprint_to_x5t(thumbprint)?);

        let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|error| {
            AppError::Validation(format!("invalid client certificate private key: {error}"))
        })?;

        let now = Utc::now().timestamp();
        let claims = ClientAssertionClaims {
            aud: self.token_endpoint.as_str(),
            iss: self.client_id.as_str(),
            sub: self.client_id.as_str(),
            jti: uuid::Uuid::new_v4().to_string(),
            nbf: now,
            exp: now + CLIENT_ASSERTION_LIFETIME_SECONDS,
        };

        jsonwebtoken::encode(&header, &claims, &key)
            .map_err(|error| AppError::Internal(format!("failed to sign client assertion: {error}")))
    }
}

#[async_trait]
impl AccessTokenProvider for ClientCredentialTokenProvider {
    async fn access_token(&self, scope: &str) -> AppResult<Arc<str>> {
        if let Some(token) = self.cached(scope).await {
            return Ok(token);
        }

        // Token requests run without holding the cache lock.
        let response = self.request_token(scope).await?;
        let now = Instant::now();
        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        let fetched = CachedToken {
            token: response.access_token.into(),
            refresh_at: now.checked_add(lifetime).unwrap_or(now),
        };

        let mut cache = self.cache.write().await;
        let token = match cache.get(scope) {
            Some(cached) if cached.refresh_at >= fetched.refresh_at => cached.token.clone(),
            _ => {
                let token = fetched.token.clone();
                cache.insert(scope.to_owned(), fetched);
                token
            }
        };
        drop(cache);

        debug!(
            scope,
            credential = self.credential.kind(),
            expires_in = response.expires_in,
            "acquired access token"
        );

        Ok(token)
    }
}

/// Converts a hex SHA-1 certificate thumbprint into the JWT `x5t` value.
pub fn thumbprint_to_x5t(thumbprint: &str) -> AppResult<String> {
    let normalized = thumbprint
        .chars()
        .filter(|character| !matches!(character, ':' | ' '))
        .collect::<String>();
    let bytes = hex::decode(normalized.as_str()).map_err(|error| {
        AppError::Validation(format!("certificate thumbprint must be hex: {error}"))
    })?;

    if bytes.len() != 20 {
        return Err(AppError::Validation(format!(
            "certificate thumbprint must be 20 bytes, got {}",
            bytes.len()
        )));
    }

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
