use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base58::ToBase58;

use crate::{Block, BlockAdapter, BlockHash, HstoreStorageError};

/// A basic file-system-based [`BlockAdapter`]. Every block is stored inside a
/// root directory as a file named after its (base58-encoded) key.
///
/// Writes are not fsync'd; durability is best-effort, matching the
/// write-once, re-writable-idempotently lifecycle of content-addressed
/// blocks.
#[derive(Clone, Debug)]
pub struct FileSystemBlockAdapter {
    root_dir: PathBuf,
}

impl FileSystemBlockAdapter {
    /// Create an adapter rooted at `root_dir`, creating the directory if
    /// necessary.
    pub async fn new<Pathlike>(root_dir: Pathlike) -> Result<Self, HstoreStorageError>
    where
        Pathlike: AsRef<Path>,
    {
        let root_dir = root_dir.as_ref().to_owned();
        tokio::fs::create_dir_all(&root_dir)
            .await
            .map_err(|error| HstoreStorageError::StorageBackend(format!("{error}")))?;
        Ok(Self { root_dir })
    }

    /// Keys may contain characters that are unsafe in file names, so every
    /// key is base58-encoded before it touches the filesystem.
    fn block_path(&self, key: &BlockHash) -> PathBuf {
        self.root_dir.join(key.as_ref().to_base58())
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlockAdapter for FileSystemBlockAdapter {
    type Error = HstoreStorageError;

    async fn read(&self, key: &BlockHash) -> Result<Option<Block>, Self::Error> {
        match tokio::fs::read(self.block_path(key)).await {
            Ok(bytes) => Ok(Some(Block::new(key.clone(), bytes))),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(HstoreStorageError::StorageBackend(format!("{error}"))),
        }
    }

    async fn write(&mut self, block: Block) -> Result<(), Self::Error> {
        tokio::fs::write(self.block_path(&block.hash), block.bytes)
            .await
            .map_err(|error| HstoreStorageError::StorageBackend(format!("{error}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[tokio::test]
    async fn it_persists_blocks_across_adapter_instances() -> Result<()> {
        let root = tempfile::tempdir()?;

        let mut adapter = FileSystemBlockAdapter::new(root.path()).await?;
        adapter.write(Block::new("abc123", b"payload".to_vec())).await?;
        drop(adapter);

        let adapter = FileSystemBlockAdapter::new(root.path()).await?;
        let block = adapter.read(&BlockHash::from("abc123")).await?;
        assert_eq!(block.map(|block| block.bytes), Some(b"payload".to_vec()));

        Ok(())
    }

    #[tokio::test]
    async fn it_returns_none_for_a_missing_block() -> Result<()> {
        let root = tempfile::tempdir()?;
        let adapter = FileSystemBlockAdapter::new(root.path()).await?;

        assert_eq!(adapter.read(&BlockHash::from("nope")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn it_stores_keys_with_unsafe_characters() -> Result<()> {
        let root = tempfile::tempdir()?;
        let mut adapter = FileSystemBlockAdapter::new(root.path()).await?;

        let key = BlockHash::from("../escape/attempt");
        adapter.write(Block::new(key.clone(), vec![7])).await?;

        let block = adapter.read(&key).await?;
        assert_eq!(block.map(|block| block.bytes), Some(vec![7]));
        Ok(())
    }
}
