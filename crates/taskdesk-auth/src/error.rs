//! Token refresh error types.

use std::time::Duration;
use thiserror::Error;

/// Failure of a token refresh cycle.
///
/// Always terminal for the session. Cloneable so a single failure can be
/// delivered to every request that was waiting on the refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// No refresh token was persisted
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The backend rejected the refresh token (expired, revoked, malformed)
    #[error("Refresh rejected: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The refresh endpoint could not be reached
    #[error("Refresh request failed: {0}")]
    Transport(String),

    /// The backend answered 2xx with an unusable body
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The refresh call exceeded the configured bound
    #[error("Refresh timed out after {0:?}")]
    TimedOut(Duration),

    /// The new tokens could not be persisted
    #[error("Failed to persist refreshed tokens: {0}")]
    Storage(String),
}

impl RefreshError {
    /// HTTP status of the refresh response, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RefreshError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RefreshError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RefreshError::InvalidResponse(e.to_string())
        } else {
            RefreshError::Transport(e.to_string())
        }
    }
}

/// Result type alias using RefreshError.
pub type RefreshResult<T> = Result<T, RefreshError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_rejections() {
        let rejected = RefreshError::Rejected {
            status: 401,
            body: "token_not_valid".to_string(),
        };
        assert_eq!(rejected.status(), Some(401));
        assert_eq!(RefreshError::MissingRefreshToken.status(), None);
        assert_eq!(RefreshError::Transport("refused".to_string()).status(), None);
    }

    #[test]
    fn test_display_carries_response() {
        let rejected = RefreshError::Rejected {
            status: 401,
            body: "token_not_valid".to_string(),
        };
        assert_eq!(
            rejected.to_string(),
            "Refresh rejected: HTTP 401: token_not_valid"
        );
    }

    #[test]
    fn test_clone_preserves_equality() {
        let err = RefreshError::TimedOut(Duration::from_secs(5));
        assert_eq!(err.clone(), err);
    }
}
