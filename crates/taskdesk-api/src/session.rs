//! Login, logout and session bootstrap.

use crate::types::{LoginCredentials, RegisterPayload, UserProfile};
use crate::{ApiClient, ApiResult};
use std::sync::Arc;
use taskdesk_auth::{AuthAction, AuthSession, AuthStore};
use tracing::{info, warn};

/// Ties the API client, the credential store and the session state together.
///
/// `store` must be the same [`AuthStore`] the client publishes to.
#[derive(Clone)]
pub struct SessionService {
    client: ApiClient,
    store: Arc<AuthStore>,
}

impl SessionService {
    pub fn new(client: ApiClient, store: Arc<AuthStore>) -> Self {
        Self { client, store }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn snapshot(&self) -> AuthSession {
        self.store.snapshot()
    }

    /// Publish persisted tokens, if any, into the session.
    ///
    /// Returns whether a session was restored. Corrupt persisted data is
    /// cleared by the credential store and reported as no session.
    pub fn restore(&self) -> bool {
        match self.client.credentials().load() {
            Some(pair) => {
                self.store.dispatch(AuthAction::SetTokens(pair));
                info!("Restored persisted session");
                true
            }
            None => false,
        }
    }

    /// Log in, persist the tokens and load the profile.
    ///
    /// If the profile cannot be fetched the new session is torn down again
    /// and the error returned.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<UserProfile> {
        let pair = self.client.login(credentials).await?;
        self.client.credentials().save(&pair)?;
        self.store.dispatch(AuthAction::SetTokens(pair));

        match self.client.fetch_profile().await {
            Ok(profile) => {
                self.store.dispatch(AuthAction::SetUser(Some(profile.clone())));
                info!(user_id = profile.id, "Logged in");
                Ok(profile)
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch after login failed, discarding session");
                self.discard_session();
                Err(e)
            }
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, payload: &RegisterPayload) -> ApiResult<UserProfile> {
        let profile = self.client.register(payload).await?;
        info!(user_id = profile.id, "Registered account");
        Ok(profile)
    }

    /// Reload the profile into the session.
    ///
    /// On failure the profile is cleared, which marks the session
    /// unauthenticated.
    pub async fn refresh_profile(&self) -> ApiResult<UserProfile> {
        match self.client.fetch_profile().await {
            Ok(profile) => {
                self.store.dispatch(AuthAction::SetUser(Some(profile.clone())));
                Ok(profile)
            }
            Err(e) => {
                self.store.dispatch(AuthAction::SetUser(None));
                Err(e)
            }
        }
    }

    /// Forget the persisted tokens and reset the session.
    pub fn logout(&self) -> ApiResult<()> {
        self.client.credentials().clear()?;
        self.store.dispatch(AuthAction::Logout);
        info!("Logged out");
        Ok(())
    }

    fn discard_session(&self) {
        if let Err(e) = self.client.credentials().clear() {
            warn!(error = %e, "Failed to clear persisted tokens");
        }
        self.store.dispatch(AuthAction::Logout);
    }
}
