use std::collections::HashMap;

use hstore_common::SharedCell;
use hstore_storage::{Block, BlockAdapter, BlockHash, BlockHasher};

use crate::version::{VersionBlock, decode_head, decode_version, encode_head, encode_version};
use crate::{HEAD_KEY, HstoreError, ObjectStore, Schema, StateVersion, Value};

/// Memoized store state: the current head and every version materialized so
/// far, keyed by version hash.
struct StoreState {
    head: Option<BlockHash>,
    versions: HashMap<BlockHash, StateVersion>,
}

/// A [`Store`] maintains schema-validated JSON state as an append-only chain
/// of content-addressed versions over a [`BlockAdapter`].
///
/// Each successful [`commit`](Store::commit) persists the value's DAG, links
/// a new version block to the previous head, and advances the head pointer -
/// in that order, so that a crash at any point leaves the store at a
/// consistent (at worst, slightly stale) head.
///
/// A store instance assumes it is the only writer against its adapter;
/// sharing one adapter between two live stores is undefined.
pub struct Store<S, H, A>
where
    S: Schema,
    H: BlockHasher,
    A: BlockAdapter + Clone,
{
    schema: S,
    objects: ObjectStore<H, A>,
    adapter: A,
    state: SharedCell<StoreState>,
}

impl<S, H, A> Store<S, H, A>
where
    S: Schema,
    H: BlockHasher,
    A: BlockAdapter + Clone,
{
    /// Open a store over `adapter`.
    ///
    /// Construction probes the head record: an absent record is initialized
    /// to an empty head, a malformed one is repaired to an empty head, and a
    /// well-formed one is adopted as-is.
    pub async fn open(hasher: H, adapter: A, schema: S) -> Result<Self, HstoreError> {
        let head = Self::initialize_head(&adapter).await?;
        tracing::debug!(head = ?head, "opened store");

        Ok(Self {
            schema,
            objects: ObjectStore::new(hasher, adapter.clone()),
            adapter,
            state: SharedCell::new(StoreState {
                head,
                versions: HashMap::new(),
            }),
        })
    }

    /// The object store persisting this store's value DAGs.
    pub fn objects(&self) -> &ObjectStore<H, A> {
        &self.objects
    }

    /// Validate `value`, persist it, and advance the head to a new version
    /// linked to the previous one.
    ///
    /// Nothing observable changes when validation fails. A failure after
    /// validation can leave orphaned blocks behind, but the head - and with
    /// it every reachable version - is only touched once the new version is
    /// fully persisted.
    pub async fn commit(&self, value: impl Into<Value>) -> Result<StateVersion, HstoreError> {
        let validated = self.schema.parse(value.into()).await?;

        let value_hash = self.objects.write(&validated).await?;
        let value = self.objects.cached(&value_hash).unwrap_or(validated);

        let previous = self.state.read().head.clone();
        let timestamp = hstore_common::time::epoch_millis();
        let version = VersionBlock {
            value: value_hash,
            previous: previous.clone(),
            timestamp,
        };

        let bytes = encode_version(&version)?;
        let hash = self.objects.hasher().hash_bytes(&bytes).await;

        let already_persisted = self.state.read().versions.contains_key(&hash);
        if !already_persisted {
            let mut adapter = self.adapter.clone();
            adapter
                .write(Block::new(hash.clone(), bytes))
                .await
                .map_err(|error| HstoreError::Storage(error.into()))?;
        }

        Self::write_head(&self.adapter, &Some(hash.clone())).await?;

        let snapshot = StateVersion {
            hash: hash.clone(),
            value,
            previous,
            timestamp,
        };
        {
            let mut state = self.state.write();
            state.head = Some(hash.clone());
            state.versions.insert(hash, snapshot.clone());
        }

        tracing::debug!(version = ?snapshot.hash, "committed version");
        Ok(snapshot)
    }

    /// The version the head currently points at, or `None` for an empty
    /// store.
    pub async fn head(&self) -> Result<Option<StateVersion>, HstoreError> {
        let head = self.state.read().head.clone();
        match head {
            Some(hash) => self.get(&hash).await,
            None => Ok(None),
        }
    }

    /// Walk the version chain from the head back to the first commit,
    /// newest first. Empty for an empty store.
    ///
    /// A link that no longer resolves ends the walk at the last version
    /// that did.
    pub async fn history(&self) -> Result<Vec<StateVersion>, HstoreError> {
        let mut versions = Vec::new();
        let mut cursor = self.head().await?;

        while let Some(version) = cursor {
            let previous = version.previous.clone();
            versions.push(version);
            cursor = match previous {
                Some(hash) => self.get(&hash).await?,
                None => None,
            };
        }

        Ok(versions)
    }

    /// Materialize the version stored under `hash`.
    ///
    /// Returns `None` when no such block exists, when the block is not a
    /// well-formed version, or when the referenced value is missing or
    /// undecodable - a hash that does not resolve to a version is a miss,
    /// never a panic.
    pub async fn get(&self, hash: &BlockHash) -> Result<Option<StateVersion>, HstoreError> {
        {
            let state = self.state.read();
            if let Some(version) = state.versions.get(hash) {
                return Ok(Some(version.clone()));
            }
        }

        let block = self
            .adapter
            .read(hash)
            .await
            .map_err(|error| HstoreError::Storage(error.into()))?;
        let Some(block) = block else {
            return Ok(None);
        };
        let Ok(version) = decode_version(&block.bytes) else {
            return Ok(None);
        };

        let value = match self.objects.read(&version.value).await {
            Ok(Some(value)) => value,
            Ok(None) => return Ok(None),
            Err(HstoreError::DecodeFailed(_)) => return Ok(None),
            Err(error) => return Err(error),
        };

        let snapshot = StateVersion {
            hash: hash.clone(),
            value,
            previous: version.previous,
            timestamp: version.timestamp,
        };
        self.state
            .write()
            .versions
            .insert(hash.clone(), snapshot.clone());
        Ok(Some(snapshot))
    }

    async fn initialize_head(adapter: &A) -> Result<Option<BlockHash>, HstoreError> {
        let head_key = BlockHash::from(HEAD_KEY);
        let existing = adapter
            .read(&head_key)
            .await
            .map_err(|error| HstoreError::Storage(error.into()))?;

        match existing {
            Some(block) => match decode_head(&block.bytes) {
                Ok(head) => Ok(head),
                Err(error) => {
                    tracing::warn!(%error, "repairing corrupted head record");
                    Self::write_head(adapter, &None).await?;
                    Ok(None)
                }
            },
            None => {
                Self::write_head(adapter, &None).await?;
                Ok(None)
            }
        }
    }

    async fn write_head(adapter: &A, head: &Option<BlockHash>) -> Result<(), HstoreError> {
        let bytes = encode_head(head)?;
        let mut adapter = adapter.clone();
        adapter
            .write(Block::new(HEAD_KEY, bytes))
            .await
            .map_err(|error| HstoreError::Storage(error.into()))
    }
}
