//! Authentication state and token refresh for the taskdesk client.
//!
//! This crate provides:
//! - The process-wide auth session notifier ([`AuthStore`]) and its three transitions
//! - The token refresh client ([`TokenRefresher`], [`HttpTokenRefresher`])
//! - The explicit refresh-coordination state machine ([`refresh_machine`])

mod error;
mod refresh;
mod refresh_fsm;
mod session;

pub use error::{RefreshError, RefreshResult};
pub use refresh::{HttpTokenRefresher, RefreshedTokens, TokenRefresher, REFRESH_PATH};
pub use refresh_fsm::refresh_machine;
pub use refresh_fsm::{RefreshMachine, RefreshMachineInput, RefreshMachineState, RefreshPhase};
pub use session::{
    AuthAction, AuthSession, AuthStore, SessionDispatch, SessionSubscriber, SubscriptionId,
    UserProfile,
};
pub use taskdesk_storage::TokenPair;
