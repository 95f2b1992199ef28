use std::sync::Arc;

use async_trait::async_trait;
use hstore_common::{ConditionalSend, ConditionalSync};
use tokio::sync::Mutex;

use crate::{Block, BlockHash, HstoreStorageError};

mod memory;
pub use memory::*;

#[cfg(not(target_arch = "wasm32"))]
mod fs;
#[cfg(not(target_arch = "wasm32"))]
pub use fs::*;

/// A [`BlockAdapter`] persists opaque byte blocks keyed by their hash.
///
/// All implementations must satisfy the same observable contract:
///
/// - `read` returns exactly the bytes previously written under the hash, or
///   nothing. No transformation, no interpretation.
/// - `write` is idempotent: storing the same hash with the same bytes twice
///   is semantically a no-op. The same hash with *different* bytes is a
///   caller error the adapter is not required to detect.
/// - Bytes are opaque. An adapter must not assume UTF-8, JSON, or any other
///   shape.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait BlockAdapter: ConditionalSync {
    /// The error type produced by this [`BlockAdapter`]
    type Error: Into<HstoreStorageError> + ConditionalSend;

    /// Retrieve the block stored under `key`, if any.
    async fn read(&self, key: &BlockHash) -> Result<Option<Block>, Self::Error>;

    /// Store `block` under its hash.
    async fn write(&mut self, block: Block) -> Result<(), Self::Error>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<T> BlockAdapter for Arc<Mutex<T>>
where
    T: BlockAdapter + ConditionalSend + ?Sized,
{
    type Error = T::Error;

    async fn read(&self, key: &BlockHash) -> Result<Option<Block>, Self::Error> {
        let inner = self.lock().await;
        inner.read(key).await
    }

    async fn write(&mut self, block: Block) -> Result<(), Self::Error> {
        let mut inner = self.lock().await;
        inner.write(block).await
    }
}
