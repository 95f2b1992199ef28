use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Block, BlockAdapter, BlockHash, HstoreStorageError};

/// A trivial [`BlockAdapter`] backed by a [`HashMap`]; all blocks are kept in
/// memory and never persisted.
///
/// Clones share the same underlying map, so an instance may be handed to
/// several components as a cheap handle.
#[derive(Clone, Default)]
pub struct MemoryBlockAdapter {
    blocks: Arc<RwLock<HashMap<BlockHash, Vec<u8>>>>,
}

impl MemoryBlockAdapter {
    /// Create a new, empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of blocks currently stored.
    pub async fn len(&self) -> usize {
        self.blocks.read().await.len()
    }

    /// Whether the adapter holds no blocks.
    pub async fn is_empty(&self) -> bool {
        self.blocks.read().await.is_empty()
    }

    /// Whether a block is stored under `key`.
    pub async fn contains(&self, key: &BlockHash) -> bool {
        self.blocks.read().await.contains_key(key)
    }

    /// Remove all blocks.
    pub async fn clear(&self) {
        self.blocks.write().await.clear();
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlockAdapter for MemoryBlockAdapter {
    type Error = HstoreStorageError;

    async fn read(&self, key: &BlockHash) -> Result<Option<Block>, Self::Error> {
        let blocks = self.blocks.read().await;
        Ok(blocks
            .get(key)
            .map(|bytes| Block::new(key.clone(), bytes.clone())))
    }

    async fn write(&mut self, block: Block) -> Result<(), Self::Error> {
        let mut blocks = self.blocks.write().await;
        blocks.insert(block.hash, block.bytes);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryBlockAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlockAdapter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn it_writes_and_reads_a_block() -> Result<()> {
        let mut adapter = MemoryBlockAdapter::new();
        adapter.write(Block::new("abc", vec![1, 2, 3])).await?;

        let block = adapter.read(&BlockHash::from("abc")).await?;
        assert_eq!(block, Some(Block::new("abc", vec![1, 2, 3])));

        Ok(())
    }

    #[tokio::test]
    async fn it_returns_none_for_a_missing_block() -> Result<()> {
        let adapter = MemoryBlockAdapter::new();
        assert_eq!(adapter.read(&BlockHash::from("missing")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn it_is_idempotent_for_repeated_writes() -> Result<()> {
        let mut adapter = MemoryBlockAdapter::new();
        adapter.write(Block::new("abc", vec![1, 2, 3])).await?;
        adapter.write(Block::new("abc", vec![1, 2, 3])).await?;

        assert_eq!(adapter.len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn it_shares_blocks_between_clones() -> Result<()> {
        let adapter = MemoryBlockAdapter::new();
        let mut handle = adapter.clone();
        handle.write(Block::new("abc", vec![1])).await?;

        assert!(adapter.contains(&BlockHash::from("abc")).await);

        adapter.clear().await;
        assert!(handle.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn it_overwrites_the_same_key() -> Result<()> {
        // The content-addressed caller never does this for derived hashes,
        // but the single mutable head record depends on it.
        let mut adapter = MemoryBlockAdapter::new();
        adapter.write(Block::new("head", vec![1])).await?;
        adapter.write(Block::new("head", vec![2])).await?;

        let block = adapter.read(&BlockHash::from("head")).await?;
        assert_eq!(block.map(|block| block.bytes), Some(vec![2]));
        Ok(())
    }
}
