use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use hstore_common::ConditionalSync;

use crate::{Block, BlockAdapter, BlockHash};

/// A [`MeasuredAdapter`] acts as a proxy over a [`BlockAdapter`]
/// implementation that counts reads and writes passing through it.
///
/// Counters are shared across clones, so a handle can be retained for
/// assertions while the proxy itself is handed to a store or cascade.
#[derive(Clone)]
pub struct MeasuredAdapter<Backend>
where
    Backend: BlockAdapter,
{
    reads: Arc<AtomicUsize>,
    read_bytes: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    write_bytes: Arc<AtomicUsize>,
    backend: Backend,
}

impl<Backend> MeasuredAdapter<Backend>
where
    Backend: BlockAdapter,
{
    /// Wrap the provided [`BlockAdapter`] so that reads and writes to it may
    /// be measured.
    pub fn new(backend: Backend) -> Self {
        Self {
            reads: Arc::new(AtomicUsize::default()),
            read_bytes: Arc::new(AtomicUsize::default()),
            writes: Arc::new(AtomicUsize::default()),
            write_bytes: Arc::new(AtomicUsize::default()),
            backend,
        }
    }

    /// The aggregate number of reads against the wrapped adapter.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// The total payload bytes returned by reads that hit.
    pub fn read_bytes(&self) -> usize {
        self.read_bytes.load(Ordering::Relaxed)
    }

    /// The aggregate number of writes against the wrapped adapter.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// The total payload bytes written.
    pub fn write_bytes(&self) -> usize {
        self.write_bytes.load(Ordering::Relaxed)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<Backend> BlockAdapter for MeasuredAdapter<Backend>
where
    Backend: BlockAdapter + ConditionalSync,
{
    type Error = Backend::Error;

    async fn read(&self, key: &BlockHash) -> Result<Option<Block>, Self::Error> {
        self.reads.fetch_add(1, Ordering::Relaxed);

        let block = self.backend.read(key).await?;

        self.read_bytes.fetch_add(
            block.as_ref().map(|block| block.len()).unwrap_or_default(),
            Ordering::Relaxed,
        );

        Ok(block)
    }

    async fn write(&mut self, block: Block) -> Result<(), Self::Error> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.write_bytes.fetch_add(block.len(), Ordering::Relaxed);
        self.backend.write(block).await
    }
}
