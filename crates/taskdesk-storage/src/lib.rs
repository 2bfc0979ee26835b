//! Durable credential storage for the taskdesk client.
//!
//! This crate provides:
//! - A [`SecureStorage`] key-value trait with file and in-memory backends
//! - [`CredentialStore`], the single persisted slot holding the current [`TokenPair`]

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{CredentialStore, TokenPair};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::SecureStorage;

use taskdesk_config::Paths;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific storage error
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Create the default file-backed storage under the client's base directory.
pub fn create_storage(paths: &Paths) -> StorageResult<Box<dyn SecureStorage>> {
    paths
        .ensure_dirs()
        .map_err(|e| StorageError::Backend(e.to_string()))?;
    Ok(Box::new(FileStorage::new(paths.credentials_file())))
}

/// Create a CredentialStore with the default file storage.
pub fn create_credential_store(paths: &Paths) -> StorageResult<CredentialStore> {
    let storage = create_storage(paths)?;
    Ok(CredentialStore::new(storage))
}
