//! User and authentication resource calls.

use crate::endpoints::{LOGIN_PATH, PROFILE_PATH, REGISTER_PATH};
use crate::types::{LoginCredentials, RegisterPayload, UserProfile};
use crate::{ApiClient, ApiError, ApiResult};
use taskdesk_storage::TokenPair;

fn require(value: &str, field: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}

impl ApiClient {
    /// `POST /users/login/`. Returns the issued token pair without storing it.
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<TokenPair> {
        require(&credentials.username, "Username")?;
        require(&credentials.password, "Password")?;

        let pair: TokenPair = self.post_json(LOGIN_PATH, credentials).await?;
        if !pair.is_valid() {
            return Err(ApiError::InvalidResponse(
                "login response is missing a token".to_string(),
            ));
        }
        Ok(pair)
    }

    /// `POST /users/register/`
    pub async fn register(&self, payload: &RegisterPayload) -> ApiResult<UserProfile> {
        require(&payload.full_name, "Full name")?;
        require(&payload.email, "Email")?;
        require(&payload.password, "Password")?;

        self.post_json(REGISTER_PATH, payload).await
    }

    /// `GET /users/me/`
    pub async fn fetch_profile(&self) -> ApiResult<UserProfile> {
        self.get_json(PROFILE_PATH).await
    }
}
