//! Endpoint paths, relative to the API base URL.

use crate::types::TaskId;

pub use taskdesk_auth::REFRESH_PATH;

pub const LOGIN_PATH: &str = "users/login/";
pub const REGISTER_PATH: &str = "users/register/";
pub const PROFILE_PATH: &str = "users/me/";
pub const TASKS_PATH: &str = "tasks/";

/// Path of a single task.
pub fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}{id}/")
}

const PUBLIC_SUFFIXES: [&str; 3] = [
    "/users/login/",
    "/users/register/",
    "/users/login/refresh/",
];

/// Whether a resolved URL path is reachable without a bearer token.
///
/// Public endpoints never get an `Authorization` header and never take part
/// in token refresh, whatever status they answer with.
pub fn is_public_path(url_path: &str) -> bool {
    PUBLIC_SUFFIXES
        .iter()
        .any(|suffix| url_path.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/api/users/login/"));
        assert!(is_public_path("/api/users/register/"));
        assert!(is_public_path("/api/users/login/refresh/"));
    }

    #[test]
    fn test_protected_paths() {
        assert!(!is_public_path("/api/users/me/"));
        assert!(!is_public_path("/api/tasks/"));
        assert!(!is_public_path("/api/tasks/3/"));
        // No trailing slash, no match.
        assert!(!is_public_path("/api/users/login"));
    }

    #[test]
    fn test_task_path() {
        assert_eq!(task_path(42), "tasks/42/");
    }
}
