use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use tokio::sync::Mutex;

use crate::{Block, BlockAdapter, BlockHash, HstoreStorageError};

/// One tier of a [`Cascade`]: any [`BlockAdapter`] behind a shared async
/// lock, so a single backend may participate in several compositions.
pub type CascadeLayer = Arc<Mutex<dyn BlockAdapter<Error = HstoreStorageError>>>;

/// A [`Cascade`] composes an ordered sequence of [`BlockAdapter`]s - fastest
/// first, slowest last - into a single adapter with tiered-cache semantics.
///
/// Reads probe the layers in order and return the first hit; before the hit
/// is returned, the block is hydrated up into every faster layer so that
/// subsequent reads are satisfied near the top. Writes fan out to every
/// layer and complete only when all of them have acknowledged, which makes
/// read latency track the fastest layer holding a block while durability
/// tracks the slowest layer in the stack.
#[derive(Clone)]
pub struct Cascade {
    layers: Vec<CascadeLayer>,
}

impl Cascade {
    /// Compose `layers` into a single adapter.
    ///
    /// Fails when `layers` is empty: a cascade with no tiers could neither
    /// store nor retrieve anything.
    pub fn new(layers: Vec<CascadeLayer>) -> Result<Self, HstoreStorageError> {
        if layers.is_empty() {
            return Err(HstoreStorageError::Configuration(
                "a cascade requires at least one layer".into(),
            ));
        }
        Ok(Self { layers })
    }

    /// Wrap a concrete adapter as a [`CascadeLayer`].
    pub fn layer<A>(adapter: A) -> CascadeLayer
    where
        A: BlockAdapter<Error = HstoreStorageError> + 'static,
    {
        Arc::new(Mutex::new(adapter))
    }

    /// The number of layers in this cascade.
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlockAdapter for Cascade {
    type Error = HstoreStorageError;

    async fn read(&self, key: &BlockHash) -> Result<Option<Block>, Self::Error> {
        for (index, layer) in self.layers.iter().enumerate() {
            let Some(block) = layer.read(key).await? else {
                continue;
            };

            if index > 0 {
                tracing::debug!(%key, layer = index, "hydrating block into faster layers");
                try_join_all(self.layers[..index].iter().map(|faster| {
                    let mut faster = Arc::clone(faster);
                    let block = block.clone();
                    async move { faster.write(block).await }
                }))
                .await?;
            }

            return Ok(Some(block));
        }

        Ok(None)
    }

    async fn write(&mut self, block: Block) -> Result<(), Self::Error> {
        try_join_all(self.layers.iter().map(|layer| {
            let mut layer = Arc::clone(layer);
            let block = block.clone();
            async move { layer.write(block).await }
        }))
        .await?;

        Ok(())
    }
}
