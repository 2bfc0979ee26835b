//! Per-run application state.

use std::sync::Arc;
use taskdesk_api::{ApiClient, AuthStore, SessionService};
use taskdesk_config::{Config, Paths};

/// Everything a command needs, built once per run.
pub struct AppState {
    pub config: Config,
    pub paths: Paths,
    pub store: Arc<AuthStore>,
    pub session: SessionService,
}

impl AppState {
    pub fn client(&self) -> &ApiClient {
        self.session.client()
    }
}
