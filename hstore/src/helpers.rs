//! Helpers for testing and development.

use hstore_storage::{Blake3Hasher, MemoryBlockAdapter};

use crate::{AnySchema, HstoreError, Store};

/// Creates a volatile, permissive store over a fresh in-memory adapter, for
/// use in tests.
pub async fn make_memory_store()
-> Result<Store<AnySchema, Blake3Hasher, MemoryBlockAdapter>, HstoreError> {
    Store::open(Blake3Hasher, MemoryBlockAdapter::new(), AnySchema).await
}
