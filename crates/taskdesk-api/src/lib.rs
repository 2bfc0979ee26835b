//! Authenticated REST client for the task service.
//!
//! Every call goes through [`ApiClient`], which attaches the bearer token,
//! and on a 401 coordinates a single-flight token refresh: one refresh call
//! per expiry, every other failed request queued behind it and replayed with
//! the new token, everyone rejected and the session logged out if it fails.
//!
//! Resource calls (`login`, `list_tasks`, `create_task`, ...) are thin typed
//! wrappers implemented on [`ApiClient`]; [`SessionService`] combines them
//! with the credential store and session notifier into the login/logout
//! workflow.

mod client;
mod coordinator;
pub mod endpoints;
mod error;
mod request;
mod session;
mod tasks;
pub mod types;
mod users;

pub use client::{ApiClient, ClientConfig};
pub use error::{ApiError, ApiResult};
pub use request::{ApiResponse, RequestDescriptor};
pub use session::SessionService;
pub use types::{
    CreateTaskPayload, LoginCredentials, Page, RegisterPayload, Task, TaskId, TaskOrdering,
    TaskQuery, TaskStatus, UpdateTaskPayload,
};

pub use taskdesk_auth::{
    AuthAction, AuthSession, AuthStore, RefreshError, RefreshPhase, SessionDispatch, TokenPair,
    TokenRefresher, UserProfile,
};
pub use taskdesk_storage::CredentialStore;
