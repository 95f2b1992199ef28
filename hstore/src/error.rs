use hstore_storage::HstoreStorageError;
use thiserror::Error;

/// The common error type used by this crate
#[derive(Error, Debug)]
pub enum HstoreError {
    /// The schema rejected a value offered for commit
    #[error("Schema rejected the value: {0}")]
    Validation(String),

    /// An error that occurs while encoding a node or version
    #[error("Failed to encode a block: {0}")]
    EncodeFailed(String),

    /// Bytes retrieved from storage are not a well-formed canonical encoding
    #[error("Failed to decode a block: {0}")]
    DecodeFailed(String),

    /// A value or stored DAG nests deeper than the supported maximum
    #[error("Value exceeds the maximum supported depth of {0}")]
    DepthLimit(usize),

    /// There was a problem in the storage layer
    #[error("Storage error: {0}")]
    Storage(HstoreStorageError),
}

impl From<HstoreStorageError> for HstoreError {
    fn from(value: HstoreStorageError) -> Self {
        HstoreError::Storage(value)
    }
}
