//! The persisted credential slot.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Access/refresh token pair.
///
/// Both fields are non-empty for a usable pair; absence of a pair means
/// "unauthenticated".
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Returns true if both tokens are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.access.trim().is_empty() && !self.refresh.trim().is_empty()
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// High-level API over the single durable slot holding the current token pair.
pub struct CredentialStore {
    storage: Box<dyn SecureStorage>,
}

impl CredentialStore {
    /// Create a new credential store with the given storage backend
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted token pair.
    ///
    /// Never fails: unreadable storage is reported as absent, and a corrupt
    /// or incomplete value is cleared before returning `None`.
    pub fn load(&self) -> Option<TokenPair> {
        let raw = match self.storage.get(StorageKeys::AUTH_TOKENS) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted tokens, treating as absent");
                return None;
            }
        };

        match serde_json::from_str::<Option<TokenPair>>(&raw) {
            Ok(Some(pair)) if pair.is_valid() => Some(pair),
            Ok(None) => {
                debug!("Persisted token slot holds null, clearing");
                self.clear_quietly();
                None
            }
            Ok(Some(_)) => {
                warn!("Persisted token pair has an empty field, clearing");
                self.clear_quietly();
                None
            }
            Err(e) => {
                warn!(error = %e, "Persisted tokens are malformed, clearing");
                self.clear_quietly();
                None
            }
        }
    }

    /// Persist a token pair, replacing any previous one.
    pub fn save(&self, pair: &TokenPair) -> StorageResult<()> {
        if !pair.is_valid() {
            return Err(StorageError::Encoding(
                "token pair must have non-empty access and refresh tokens".to_string(),
            ));
        }
        let encoded =
            serde_json::to_string(pair).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::AUTH_TOKENS, &encoded)
    }

    /// Remove the persisted token pair.
    pub fn clear(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::AUTH_TOKENS)?;
        Ok(())
    }

    /// Current access token, read fresh from storage.
    pub fn access_token(&self) -> Option<String> {
        self.load().map(|pair| pair.access)
    }

    /// Current refresh token, read fresh from storage.
    pub fn refresh_token(&self) -> Option<String> {
        self.load().map(|pair| pair.refresh)
    }

    fn clear_quietly(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Failed to clear corrupt token slot");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use std::sync::Arc;

    /// Storage handle shared between the store under test and the assertions.
    struct SharedStorage(Arc<MemoryStorage>);

    impl SecureStorage for SharedStorage {
        fn set(&self, key: &str, value: &str) -> StorageResult<()> {
            self.0.set(key, value)
        }

        fn get(&self, key: &str) -> StorageResult<Option<String>> {
            self.0.get(key)
        }

        fn delete(&self, key: &str) -> StorageResult<bool> {
            self.0.delete(key)
        }
    }

    fn store_with_raw(raw: Option<&str>) -> (CredentialStore, Arc<MemoryStorage>) {
        let backing = Arc::new(MemoryStorage::new());
        if let Some(raw) = raw {
            backing.set(StorageKeys::AUTH_TOKENS, raw).unwrap();
        }
        let store = CredentialStore::new(Box::new(SharedStorage(backing.clone())));
        (store, backing)
    }

    #[test]
    fn test_load_empty_slot() {
        let (store, _) = store_with_raw(None);
        assert_eq!(store.load(), None);
        assert_eq!(store.access_token(), None);
        assert_eq!(store.refresh_token(), None);
    }

    #[test]
    fn test_save_load_clear() {
        let (store, backing) = store_with_raw(None);

        store.save(&TokenPair::new("A1", "R1")).unwrap();
        assert_eq!(store.load(), Some(TokenPair::new("A1", "R1")));
        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));

        let raw = backing.get(StorageKeys::AUTH_TOKENS).unwrap().unwrap();
        assert_eq!(raw, r#"{"access":"A1","refresh":"R1"}"#);

        store.clear().unwrap();
        assert_eq!(store.load(), None);
        assert!(!backing.has(StorageKeys::AUTH_TOKENS).unwrap());
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let (store, _) = store_with_raw(None);
        store.save(&TokenPair::new("A1", "R1")).unwrap();
        store.save(&TokenPair::new("A2", "R2")).unwrap();
        assert_eq!(store.load(), Some(TokenPair::new("A2", "R2")));
    }

    #[test]
    fn test_corrupt_value_is_cleared() {
        let (store, backing) = store_with_raw(Some("{\"access\": \"A1\", "));

        assert_eq!(store.load(), None);
        assert!(!backing.has(StorageKeys::AUTH_TOKENS).unwrap());
    }

    #[test]
    fn test_wrong_shape_is_cleared() {
        let (store, backing) = store_with_raw(Some(r#"{"token": "abc"}"#));

        assert_eq!(store.load(), None);
        assert!(!backing.has(StorageKeys::AUTH_TOKENS).unwrap());
    }

    #[test]
    fn test_null_value_is_cleared() {
        let (store, backing) = store_with_raw(Some("null"));

        assert_eq!(store.load(), None);
        assert!(!backing.has(StorageKeys::AUTH_TOKENS).unwrap());
    }

    #[test]
    fn test_empty_field_is_cleared() {
        let (store, backing) = store_with_raw(Some(r#"{"access":"","refresh":"R1"}"#));

        assert_eq!(store.load(), None);
        assert!(!backing.has(StorageKeys::AUTH_TOKENS).unwrap());
    }

    #[test]
    fn test_save_rejects_incomplete_pair() {
        let (store, _) = store_with_raw(None);
        assert!(store.save(&TokenPair::new("A1", "")).is_err());
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", TokenPair::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret-access"));
        assert!(!rendered.contains("secret-refresh"));
    }
}
