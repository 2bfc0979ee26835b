//! Token refresh client.
//!
//! Exchanges a refresh token for a new access token with a single call to
//! the refresh endpoint. There is no retry here: the caller decides what a
//! failure means (the authenticated client treats it as terminal).

use crate::{RefreshError, RefreshResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "users/login/refresh/";

/// Tokens returned by a successful refresh.
///
/// `refresh` is only present when the backend rotates refresh tokens.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl std::fmt::Debug for RefreshedTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedTokens")
            .field("rotated", &self.refresh.is_some())
            .finish()
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

/// Exchanges a refresh token for new tokens.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> RefreshResult<RefreshedTokens>;
}

/// [`TokenRefresher`] that calls `POST {base}/users/login/refresh/`.
#[derive(Clone)]
pub struct HttpTokenRefresher {
    http_client: reqwest::Client,
    refresh_url: Url,
}

impl HttpTokenRefresher {
    /// Create a refresher for the API rooted at `base_url`.
    pub fn new(base_url: &Url) -> Result<Self, url::ParseError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a refresher sharing an existing HTTP client.
    pub fn with_client(http_client: reqwest::Client, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            http_client,
            refresh_url: base_url.join(REFRESH_PATH)?,
        })
    }

    /// The resolved refresh endpoint.
    pub fn refresh_url(&self) -> &Url {
        &self.refresh_url
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(&self, refresh_token: &str) -> RefreshResult<RefreshedTokens> {
        info!("Attempting to refresh access token");
        debug!(url = %self.refresh_url, "Refreshing token");

        let response = self
            .http_client
            .post(self.refresh_url.clone())
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Token refresh rejected");
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let tokens: RefreshedTokens = response
            .json()
            .await
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;

        if tokens.access.trim().is_empty() {
            return Err(RefreshError::InvalidResponse(
                "refresh response has an empty access token".to_string(),
            ));
        }

        debug!(rotated = tokens.refresh.is_some(), "Token refreshed");
        Ok(tokens)
    }
}
