//! Error types for API calls.

use taskdesk_auth::RefreshError;
use taskdesk_config::CoreError;
use taskdesk_storage::StorageError;
use thiserror::Error;

/// Failure of an API call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport failure, no response received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401 that the refresh protocol could not recover
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rejected locally before any request was sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// The token refresh failed and the session was logged out
    #[error("Session expired: {0}")]
    Refresh(#[from] RefreshError),

    /// Any other non-2xx response
    #[error("HTTP {status}: {message}")]
    Application { status: u16, message: String },

    /// 2xx response whose body does not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),
}

impl ApiError {
    /// Build the error for a non-2xx response.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        let message = error_message(status, body);
        if status == reqwest::StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Application {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// HTTP status behind this error, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Application { status, .. } => Some(*status),
            ApiError::Refresh(e) => e.status(),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// True when the session was torn down by a failed refresh.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Refresh(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }
}

/// Human-readable message for an error response.
///
/// Prefers the `detail` field the backend puts on its error bodies, then the
/// raw body, then the status reason.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(serde_json::Value::Object(fields)) = serde_json::from_str(body) {
        if let Some(serde_json::Value::String(detail)) = fields.get("detail") {
            return detail.clone();
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("unknown status")
        .to_string()
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
