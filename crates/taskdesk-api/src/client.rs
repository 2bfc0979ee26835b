//! Authenticated HTTP client.
//!
//! Every outbound call goes through [`ApiClient::execute`]. Protected
//! requests get `Authorization: Bearer <access>` read from the credential
//! store at send time. A 401 on a protected request that has not been
//! retried yet enters the refresh protocol:
//!
//! - the first such request leads a refresh cycle, run on its own task so
//!   it completes even if the leader's caller is dropped;
//! - requests hitting 401 while that cycle runs are queued and replayed by
//!   the cycle, oldest first, with the new token;
//! - the cycle also replays the leader's request, after every queued replay
//!   has been dispatched;
//! - if the refresh fails, the credential store is cleared, the session is
//!   logged out, and every waiter gets the same [`RefreshError`].
//!
//! A request gets at most one retry. A 401 on the retry is returned as
//! [`ApiError::Unauthorized`].

use crate::coordinator::{Admission, PendingRequest, RefreshCoordinator};
use crate::endpoints::is_public_path;
use crate::{ApiError, ApiResponse, ApiResult, RequestDescriptor};
use futures_util::future::{join, join_all};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use taskdesk_auth::{
    AuthAction, HttpTokenRefresher, RefreshError, RefreshPhase, SessionDispatch, TokenRefresher,
};
use taskdesk_config::{Config, CoreResult};
use taskdesk_storage::{CredentialStore, TokenPair};
use tracing::{debug, error, info, warn};
use url::Url;

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; always ends with `/`.
    pub base_url: Url,
    /// Upper bound on a refresh call. `None` waits as long as the transport does.
    pub refresh_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            refresh_timeout: None,
        }
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Settings from the loaded configuration.
    pub fn from_config(config: &Config) -> CoreResult<Self> {
        let mut client_config = Self::new(config.api_base_url()?);
        client_config.refresh_timeout = config.refresh_timeout();
        Ok(client_config)
    }
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    credentials: Arc<CredentialStore>,
    session: Arc<dyn SessionDispatch>,
    refresher: Arc<dyn TokenRefresher>,
    coordinator: RefreshCoordinator,
    refresh_timeout: Option<Duration>,
}

/// Client for the task service REST API.
///
/// Cheap to clone; clones share the refresh coordinator, so single-flight
/// holds across all of them.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

fn build_http_client() -> ApiResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(reqwest::Client::builder().default_headers(headers).build()?)
}

impl ApiClient {
    /// Create a client that refreshes tokens against the API's own refresh
    /// endpoint.
    pub fn new(
        config: ClientConfig,
        credentials: Arc<CredentialStore>,
        session: Arc<dyn SessionDispatch>,
    ) -> ApiResult<Self> {
        let http_client = build_http_client()?;
        let refresher = HttpTokenRefresher::with_client(http_client.clone(), &config.base_url)?;
        Ok(Self::assemble(
            http_client,
            config,
            credentials,
            session,
            Arc::new(refresher),
        ))
    }

    /// Create a client with a custom token refresher.
    pub fn with_refresher(
        config: ClientConfig,
        credentials: Arc<CredentialStore>,
        session: Arc<dyn SessionDispatch>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> ApiResult<Self> {
        let http_client = build_http_client()?;
        Ok(Self::assemble(
            http_client,
            config,
            credentials,
            session,
            refresher,
        ))
    }

    fn assemble(
        http_client: reqwest::Client,
        config: ClientConfig,
        credentials: Arc<CredentialStore>,
        session: Arc<dyn SessionDispatch>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.base_url,
                credentials,
                session,
                refresher,
                coordinator: RefreshCoordinator::new(),
                refresh_timeout: config.refresh_timeout,
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The credential store this client reads tokens from.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.inner.credentials
    }

    /// Whether a refresh cycle is currently in flight.
    pub fn refresh_phase(&self) -> RefreshPhase {
        self.inner.coordinator.phase()
    }

    /// Number of requests queued behind the in-flight refresh.
    pub fn pending_refresh_waiters(&self) -> usize {
        self.inner.coordinator.pending_len()
    }

    /// Send a request, recovering from an expired access token once.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> ApiResult<ApiResponse> {
        let url = self.resolve(&descriptor)?;
        let public = is_public_path(url.path());
        let bearer = if public {
            None
        } else {
            self.inner.credentials.access_token()
        };

        let result = self.send(&descriptor, url, bearer.as_deref()).await;
        match result {
            Err(ApiError::Unauthorized { .. }) if !public && !descriptor.retried => {
                self.recover(descriptor, bearer).await
            }
            other => other,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.execute(RequestDescriptor::get(path)).await?.json()
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::post(path).with_json(body)?;
        self.execute(descriptor).await?.json()
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::put(path).with_json(body)?;
        self.execute(descriptor).await?.json()
    }

    /// DELETE `path`, discarding the (empty) body.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute(RequestDescriptor::delete(path)).await?;
        Ok(())
    }

    fn resolve(&self, descriptor: &RequestDescriptor) -> ApiResult<Url> {
        Ok(self.inner.base_url.join(&descriptor.path)?)
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        url: Url,
        bearer: Option<&str>,
    ) -> ApiResult<ApiResponse> {
        debug!(
            method = %descriptor.method,
            path = %descriptor.path,
            retried = descriptor.retried,
            authenticated = bearer.is_some(),
            "Sending request"
        );

        let mut request = self
            .inner
            .http_client
            .request(descriptor.method.clone(), url);
        if !descriptor.query.is_empty() {
            request = request.query(&descriptor.query);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!(method = %descriptor.method, path = %descriptor.path, error = %e, "Request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(ApiResponse { status, body });
        }

        if status == StatusCode::UNAUTHORIZED {
            debug!(path = %descriptor.path, "Request unauthorized");
        } else {
            warn!(
                method = %descriptor.method,
                path = %descriptor.path,
                status = %status,
                body_len = body.len(),
                "API request returned an error"
            );
        }
        Err(ApiError::from_response(status, &body))
    }

    /// Send with an explicit token. Replays never re-enter recovery.
    async fn replay(&self, descriptor: &RequestDescriptor, token: &str) -> ApiResult<ApiResponse> {
        let url = self.resolve(descriptor)?;
        self.send(descriptor, url, Some(token)).await
    }

    async fn recover(
        &self,
        mut descriptor: RequestDescriptor,
        sent_with: Option<String>,
    ) -> ApiResult<ApiResponse> {
        descriptor.retried = true;

        let credentials = &self.inner.credentials;
        let admission = self
            .inner
            .coordinator
            .admit(&descriptor, sent_with.as_deref(), || credentials.access_token());

        match admission {
            Admission::Replay(token) => {
                debug!(path = %descriptor.path, "Access token changed since send, replaying");
                self.replay(&descriptor, &token).await
            }
            Admission::Wait(receiver) => receiver.await.unwrap_or_else(|_| {
                Err(ApiError::Refresh(RefreshError::Transport(
                    "refresh cycle ended without settling this request".to_string(),
                )))
            }),
            Admission::Lead => self.run_refresh_cycle(descriptor).await,
        }
    }

    async fn run_refresh_cycle(&self, descriptor: RequestDescriptor) -> ApiResult<ApiResponse> {
        let client = self.clone();
        let cycle = tokio::spawn(async move { client.refresh_cycle(descriptor).await });

        match cycle.await {
            Ok(result) => result,
            Err(join_error) => {
                let err =
                    RefreshError::Transport(format!("refresh task aborted: {join_error}"));
                if self.refresh_phase().is_refreshing() {
                    Err(ApiError::Refresh(self.fail_refresh(err)))
                } else {
                    Err(ApiError::Refresh(err))
                }
            }
        }
    }

    /// Refresh, then replay the queue and finally the leader's own request.
    async fn refresh_cycle(&self, descriptor: RequestDescriptor) -> ApiResult<ApiResponse> {
        let pair = match self.obtain_tokens().await {
            Ok(pair) => pair,
            Err(e) => return Err(ApiError::Refresh(self.fail_refresh(e))),
        };

        let pending = self.inner.coordinator.settle();
        info!(replaying = pending.len(), "Access token refreshed");

        // `join` polls the queued replays before the leader's, and
        // `join_all` polls them in queue order, so sends start FIFO with
        // the leader last.
        let (_, result) = join(
            self.replay_pending(pending, &pair.access),
            self.replay(&descriptor, &pair.access),
        )
        .await;
        result
    }

    /// Refresh, persist, and publish the new pair.
    async fn obtain_tokens(&self) -> Result<TokenPair, RefreshError> {
        let refresh_token = self
            .inner
            .credentials
            .refresh_token()
            .ok_or(RefreshError::MissingRefreshToken)?;

        let call = self.inner.refresher.refresh(&refresh_token);
        let refreshed = match self.inner.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| RefreshError::TimedOut(limit))??,
            None => call.await?,
        };

        // The backend is not required to rotate the refresh token.
        let refresh = refreshed
            .refresh
            .filter(|token| !token.trim().is_empty())
            .unwrap_or(refresh_token);
        let pair = TokenPair::new(refreshed.access, refresh);

        self.inner
            .credentials
            .save(&pair)
            .map_err(|e| RefreshError::Storage(e.to_string()))?;
        self.inner
            .session
            .dispatch(AuthAction::SetTokens(pair.clone()));
        Ok(pair)
    }

    /// Replay queued requests with the new token, settling each as it
    /// completes.
    async fn replay_pending(&self, pending: Vec<PendingRequest>, token: &str) {
        let replays = pending.into_iter().map(|request| async move {
            let result = self.replay(&request.descriptor, token).await;
            request.settle(result);
        });
        join_all(replays).await;
    }

    /// Tear the session down and reject every waiter.
    fn fail_refresh(&self, err: RefreshError) -> RefreshError {
        error!(error = %err, "Token refresh failed, logging out");

        if let Err(e) = self.inner.credentials.clear() {
            warn!(error = %e, "Failed to clear persisted tokens");
        }
        self.inner.session.dispatch(AuthAction::Logout);

        let pending = self.inner.coordinator.settle();
        if !pending.is_empty() {
            debug!(rejected = pending.len(), "Rejecting queued requests");
        }
        for request in pending {
            request.settle(Err(ApiError::Refresh(err.clone())));
        }
        err
    }
}
