//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// Serialized token pair (JSON `{"access": .., "refresh": ..}`)
    pub const AUTH_TOKENS: &'static str = "authTokens";
}
