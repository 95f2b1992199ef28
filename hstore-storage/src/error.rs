use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum HstoreStorageError {
    /// The storage arrangement was constructed incorrectly
    #[error("Invalid storage configuration: {0}")]
    Configuration(String),

    /// An error that occurs when working with a storage backend
    #[error("Storage backend error: {0}")]
    StorageBackend(String),
}
