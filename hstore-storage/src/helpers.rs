//! Helpers for testing and development.

use crate::MemoryBlockAdapter;

#[cfg(not(target_arch = "wasm32"))]
use crate::{FileSystemBlockAdapter, HstoreStorageError};

/// Creates a persisted [`crate::BlockAdapter`] rooted in a temporary
/// directory, for use in tests. The [`tempfile::TempDir`] must be kept alive
/// for as long as the adapter is in use.
#[cfg(not(target_arch = "wasm32"))]
pub async fn make_target_adapter()
-> Result<(FileSystemBlockAdapter, tempfile::TempDir), HstoreStorageError> {
    let root = tempfile::tempdir()
        .map_err(|error| HstoreStorageError::StorageBackend(format!("{error}")))?;
    let adapter = FileSystemBlockAdapter::new(root.path()).await?;
    Ok((adapter, root))
}

/// Creates a volatile in-memory adapter, for use in tests on targets without
/// a filesystem.
pub fn make_memory_adapter() -> MemoryBlockAdapter {
    MemoryBlockAdapter::new()
}
