//! Startup: paths, config, logging, credentials, client, session restore.

use crate::app::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use taskdesk_api::{ApiClient, AuthStore, ClientConfig, SessionService};
use taskdesk_config::{init_logging, Config, LogConfig, Paths};
use taskdesk_storage::create_credential_store;
use tracing::{debug, info};

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct BootstrapOptions {
    pub base_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub api_url: Option<String>,
}

/// Build the application state and restore any persisted session.
pub fn bootstrap(options: BootstrapOptions) -> Result<AppState, Box<dyn std::error::Error>> {
    let paths = match options.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };

    let mut config = Config::load(&paths)?;
    let verbose = options.log_level.is_some();
    if let Some(level) = options.log_level {
        config.log_level = level;
    }
    if let Some(url) = options.api_url {
        config.api_base_url = url;
    }

    paths.ensure_dirs()?;
    init_logging(&LogConfig {
        default_level: config.log_level.clone(),
        log_path: Some(paths.log_file()),
        also_stderr: verbose,
    });

    info!(
        api_base_url = %config.api_base_url,
        refresh_timeout_secs = ?config.refresh_timeout_secs,
        "Configuration loaded"
    );

    let credentials = Arc::new(create_credential_store(&paths)?);
    let store = Arc::new(AuthStore::new());
    store.subscribe(Box::new(|session| {
        debug!(
            is_authenticated = session.is_authenticated,
            has_user = session.user.is_some(),
            "Session changed"
        );
    }));

    let client = ApiClient::new(
        ClientConfig::from_config(&config)?,
        credentials,
        store.clone(),
    )?;
    let session = SessionService::new(client, store.clone());

    if session.restore() {
        debug!("Using persisted session");
    }

    Ok(AppState {
        config,
        paths,
        store,
        session,
    })
}
