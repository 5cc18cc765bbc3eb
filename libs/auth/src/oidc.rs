//! Client-credentials token provider for outbound repository calls.
//!
//! One instance per configured endpoint (source, target); caches the
//! bearer token until shortly before it expires rather than fetching on
//! every call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::ClientCredentialsConfig;
use crate::error::{AuthError, AuthResult};

/// Refresh this far ahead of the token's actual expiry to absorb request
/// latency and clock drift.
const REFRESH_SKEW: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Fetches and caches a client-credentials bearer token for one endpoint.
pub struct ClientCredentialsTokenProvider {
    http_client: reqwest::Client,
    config: ClientCredentialsConfig,
    cached: RwLock<Option<CachedToken>>,
}

impl ClientCredentialsTokenProvider {
    pub fn new(config: ClientCredentialsConfig) -> AuthResult<Self> {
        let http_client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::TokenRequestError(format!("failed to build client: {e}")))?;

        Ok(Self {
            http_client,
            config,
            cached: RwLock::new(None),
        })
    }

    /// Returns a valid bearer token, fetching or refreshing as needed.
    pub async fn token(&self) -> AuthResult<String> {
        {
            let guard = self.cached.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.expires_at > Instant::now() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut guard = self.cached.write().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let fetched = self.fetch_token().await?;
        let access_token = fetched.access_token.clone();
        *guard = Some(CachedToken {
            access_token: fetched.access_token,
            expires_at: Instant::now() + Duration::from_secs(fetched.expires_in).saturating_sub(REFRESH_SKEW),
        });
        Ok(access_token)
    }

    async fn fetch_token(&self) -> AuthResult<TokenEndpointResponse> {
        let token_url = self.config.token_url();
        info!(url = %token_url, "requesting client-credentials token");

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::TokenRequestError(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenRequestError(format!(
                "HTTP {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::TokenRequestError(format!("invalid response: {e}")))
    }
}

/// One token provider per configured endpoint: source and target.
pub struct TokenProviders {
    pub source: Arc<ClientCredentialsTokenProvider>,
    pub target: Arc<ClientCredentialsTokenProvider>,
}

impl TokenProviders {
    pub fn from_configs(
        source: ClientCredentialsConfig,
        target: ClientCredentialsConfig,
    ) -> AuthResult<Self> {
        Ok(Self {
            source: Arc::new(ClientCredentialsTokenProvider::new(source)?),
            target: Arc::new(ClientCredentialsTokenProvider::new(target)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ClientCredentialsConfig {
        ClientCredentialsConfig {
            oidc_config: "https://issuer.example.com".to_string(),
            client_id: "test-client-id".to_string(),
            client_secret: "test-secret".to_string(),
        }
    }

    #[test]
    fn provider_construction_succeeds() {
        let provider = ClientCredentialsTokenProvider::new(test_config());
        assert!(provider.is_ok());
    }
}
