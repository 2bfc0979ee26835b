//! Shared fixtures for API client integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use mockito::ServerGuard;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taskdesk_api::{ApiClient, AuthStore, ClientConfig, CredentialStore, TokenPair};
use taskdesk_auth::{RefreshError, RefreshResult, RefreshedTokens, TokenRefresher};
use taskdesk_storage::MemoryStorage;
use tokio::sync::Notify;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use url::Url;

pub fn base_url(server: &ServerGuard) -> Url {
    Url::parse(&format!("{}/api/", server.url())).unwrap()
}

pub fn credentials(pair: Option<TokenPair>) -> Arc<CredentialStore> {
    let store = CredentialStore::new(Box::new(MemoryStorage::new()));
    if let Some(pair) = pair {
        store.save(&pair).unwrap();
    }
    Arc::new(store)
}

/// Client refreshing against the mock server's refresh endpoint.
pub fn http_client(
    server: &ServerGuard,
    credentials: Arc<CredentialStore>,
    session: Arc<AuthStore>,
) -> ApiClient {
    ApiClient::new(ClientConfig::new(base_url(server)), credentials, session).unwrap()
}

/// Client with a test-controlled refresher.
pub fn gated_client(
    server: &ServerGuard,
    credentials: Arc<CredentialStore>,
    session: Arc<AuthStore>,
    refresher: Arc<GatedRefresher>,
    timeout: Option<Duration>,
) -> ApiClient {
    let mut config = ClientConfig::new(base_url(server));
    config.refresh_timeout = timeout;
    ApiClient::with_refresher(config, credentials, session, refresher).unwrap()
}

/// Refresher that blocks until released, then returns a fixed outcome.
pub struct GatedRefresher {
    outcome: RefreshResult<RefreshedTokens>,
    release: Notify,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl GatedRefresher {
    pub fn succeeding(access: &str, refresh: Option<&str>) -> Arc<Self> {
        Self::with_outcome(Ok(RefreshedTokens {
            access: access.to_string(),
            refresh: refresh.map(str::to_string),
        }))
    }

    pub fn failing(error: RefreshError) -> Arc<Self> {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: RefreshResult<RefreshedTokens>) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            release: Notify::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh tokens the refresher was called with.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for GatedRefresher {
    async fn refresh(&self, refresh_token: &str) -> RefreshResult<RefreshedTokens> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(refresh_token.to_string());
        self.release.notified().await;
        self.outcome.clone()
    }
}

/// Layer recording the path of every retried request, in the order the
/// client started sending them.
#[derive(Clone, Default)]
pub struct ReplayLog(Arc<Mutex<Vec<String>>>);

impl ReplayLog {
    pub fn paths(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Default)]
struct SendFields {
    message: String,
    path: String,
    retried: bool,
}

impl Visit for SendFields {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "retried" {
            self.retried = value;
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "path" => self.path = format!("{value:?}"),
            _ => {}
        }
    }
}

impl<S: Subscriber> Layer<S> for ReplayLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = SendFields::default();
        event.record(&mut fields);
        if fields.message == "Sending request" && fields.retried {
            self.0.lock().unwrap().push(fields.path);
        }
    }
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

pub fn task_json(id: i64) -> String {
    format!(
        r#"{{
            "id": {id},
            "user": 1,
            "title": "Task {id}",
            "description": "Details for task {id}",
            "status": "pending",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T08:30:00Z"
        }}"#
    )
}

pub fn page_json(ids: &[i64]) -> String {
    let results: Vec<String> = ids.iter().map(|id| task_json(*id)).collect();
    format!(
        r#"{{"count": {}, "next": null, "previous": null, "results": [{}]}}"#,
        ids.len(),
        results.join(",")
    )
}

pub const PROFILE_JSON: &str = r#"{"id": 1, "full_name": "Ada Lovelace", "email": "ada@example.com"}"#;

pub const EXPIRED_JSON: &str =
    r#"{"detail": "Given token not valid for any token type", "code": "token_not_valid"}"#;
