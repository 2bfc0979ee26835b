//! Process-wide authentication session state.
//!
//! [`AuthStore`] holds the current [`AuthSession`] and applies exactly three
//! transitions to it: set-tokens, set-user, and logout. Subscribers are called
//! synchronously, in subscription order, after every transition. Concurrent
//! transitions are serialized together with their notifications, so
//! subscribers observe them in the order they were applied.

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use taskdesk_storage::TokenPair;
use tracing::debug;

/// Profile of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
}

/// Snapshot of the authentication session.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub is_authenticated: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("is_authenticated", &self.is_authenticated)
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("user", &self.user)
            .finish()
    }
}

/// The only mutations an [`AuthSession`] accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Replace both tokens and mark the session authenticated. `user` is untouched.
    SetTokens(TokenPair),
    /// Set or clear the profile; authentication follows profile presence.
    SetUser(Option<UserProfile>),
    /// Reset every field to its initial value.
    Logout,
}

impl AuthSession {
    /// Apply one transition.
    pub fn apply(&mut self, action: AuthAction) {
        match action {
            AuthAction::SetTokens(pair) => {
                self.access_token = Some(pair.access);
                self.refresh_token = Some(pair.refresh);
                self.is_authenticated = true;
            }
            AuthAction::SetUser(user) => {
                self.is_authenticated = user.is_some();
                self.user = user;
            }
            AuthAction::Logout => {
                *self = AuthSession::default();
            }
        }
    }
}

/// Receiver of session transitions.
///
/// The HTTP layer is handed one of these at construction so it can publish
/// refreshed tokens and forced logouts without owning the session container.
pub trait SessionDispatch: Send + Sync {
    fn dispatch(&self, action: AuthAction);
}

/// Callback type for session change notifications.
pub type SessionSubscriber = Box<dyn Fn(&AuthSession) + Send + Sync>;

/// Handle returned by [`AuthStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(SubscriptionId, Arc<dyn Fn(&AuthSession) + Send + Sync>)>,
}

/// Observable holder of the process-wide [`AuthSession`].
#[derive(Default)]
pub struct AuthStore {
    state: Mutex<AuthSession>,
    subscribers: Mutex<Subscribers>,
    /// Held from apply through notify; re-entrant so callbacks may dispatch.
    transition: ReentrantMutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AuthStore {
    /// Create a store in the logged-out state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> AuthSession {
        lock(&self.state).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).is_authenticated
    }

    /// Register a callback invoked after every transition.
    pub fn subscribe(&self, subscriber: SessionSubscriber) -> SubscriptionId {
        let mut subscribers = lock(&self.subscribers);
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        subscribers.entries.push((id, Arc::from(subscriber)));
        id
    }

    /// Remove a callback. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = lock(&self.subscribers);
        let before = subscribers.entries.len();
        subscribers.entries.retain(|(entry_id, _)| *entry_id != id);
        subscribers.entries.len() != before
    }

    /// Apply a transition and notify subscribers with the resulting snapshot.
    pub fn dispatch(&self, action: AuthAction) {
        let _transition = self.transition.lock();
        let snapshot = {
            let mut state = lock(&self.state);
            let label = action_label(&action);
            state.apply(action);
            debug!(
                action = label,
                is_authenticated = state.is_authenticated,
                "Auth session transition"
            );
            state.clone()
        };

        // Callbacks run outside the state and subscriber locks so they may
        // read or dispatch.
        let callbacks: Vec<_> = lock(&self.subscribers)
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(&snapshot);
        }
    }
}

impl SessionDispatch for AuthStore {
    fn dispatch(&self, action: AuthAction) {
        AuthStore::dispatch(self, action);
    }
}

fn action_label(action: &AuthAction) -> &'static str {
    match action {
        AuthAction::SetTokens(_) => "set_tokens",
        AuthAction::SetUser(_) => "set_user",
        AuthAction::Logout => "logout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn profile() -> UserProfile {
        UserProfile {
            id: 7,
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_initial_session_is_logged_out() {
        let store = AuthStore::new();
        assert_eq!(store.snapshot(), AuthSession::default());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_tokens_keeps_user() {
        let mut session = AuthSession::default();
        session.apply(AuthAction::SetUser(Some(profile())));
        session.apply(AuthAction::SetTokens(TokenPair::new("A1", "R1")));

        assert!(session.is_authenticated);
        assert_eq!(session.access_token.as_deref(), Some("A1"));
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert_eq!(session.user, Some(profile()));
    }

    #[test]
    fn test_set_user_none_flips_authentication_off() {
        let mut session = AuthSession::default();
        session.apply(AuthAction::SetTokens(TokenPair::new("A1", "R1")));
        session.apply(AuthAction::SetUser(None));

        assert!(!session.is_authenticated);
        // Tokens are only cleared by logout.
        assert_eq!(session.access_token.as_deref(), Some("A1"));
    }

    #[test]
    fn test_set_user_some_marks_authenticated() {
        let mut session = AuthSession::default();
        session.apply(AuthAction::SetUser(Some(profile())));
        assert!(session.is_authenticated);
    }

    #[test]
    fn test_logout_clears_everything() {
        let mut session = AuthSession::default();
        session.apply(AuthAction::SetTokens(TokenPair::new("A1", "R1")));
        session.apply(AuthAction::SetUser(Some(profile())));
        session.apply(AuthAction::Logout);

        assert_eq!(session, AuthSession::default());
    }

    #[test]
    fn test_subscribers_see_post_transition_state() {
        let store = AuthStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        store.subscribe(Box::new(move |session| {
            seen_clone.lock().unwrap().push(session.is_authenticated);
        }));

        store.dispatch(AuthAction::SetTokens(TokenPair::new("A1", "R1")));
        store.dispatch(AuthAction::Logout);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = AuthStore::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();

        let id = store.subscribe(Box::new(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        }));

        store.dispatch(AuthAction::Logout);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.dispatch(AuthAction::Logout);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_transitions_notify_in_applied_order() {
        let store = Arc::new(AuthStore::new());
        let mismatches = Arc::new(AtomicUsize::new(0));
        let weak = Arc::downgrade(&store);
        let mismatches_clone = mismatches.clone();

        store.subscribe(Box::new(move |session| {
            if let Some(store) = weak.upgrade() {
                if store.snapshot() != *session {
                    mismatches_clone.fetch_add(1, Ordering::SeqCst);
                }
            }
        }));

        let threads: Vec<_> = (0..4)
            .map(|thread| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for round in 0..200 {
                        if round % 3 == 0 {
                            store.dispatch(AuthAction::Logout);
                        } else {
                            let access = format!("A{thread}-{round}");
                            store.dispatch(AuthAction::SetTokens(TokenPair::new(access, "R")));
                        }
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }

        assert_eq!(mismatches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscriber_may_dispatch() {
        let store = Arc::new(AuthStore::new());
        let weak = Arc::downgrade(&store);

        store.subscribe(Box::new(move |session| {
            if session.is_authenticated && session.user.is_none() {
                if let Some(store) = weak.upgrade() {
                    store.dispatch(AuthAction::Logout);
                }
            }
        }));

        store.dispatch(AuthAction::SetTokens(TokenPair::new("A1", "R1")));

        assert_eq!(store.snapshot(), AuthSession::default());
    }

    #[test]
    fn test_dispatch_through_trait_object() {
        let store = Arc::new(AuthStore::new());
        let dispatcher: Arc<dyn SessionDispatch> = store.clone();

        dispatcher.dispatch(AuthAction::SetTokens(TokenPair::new("A1", "R1")));

        assert!(store.is_authenticated());
    }

    #[test]
    fn test_debug_hides_tokens() {
        let mut session = AuthSession::default();
        session.apply(AuthAction::SetTokens(TokenPair::new("secret-a", "secret-r")));

        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-a"));
        assert!(!rendered.contains("secret-r"));
    }
}
