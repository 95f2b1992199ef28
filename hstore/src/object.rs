use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Weak};

use futures_util::future::try_join_all;
use hstore_common::{BoxedFuture, SharedCell};
use hstore_storage::{Block, BlockAdapter, BlockHash, BlockHasher};

use crate::{
    CanonicalHasher, HstoreError, MAX_VALUE_DEPTH, Node, Primitive, Value, deserialize_node,
    serialize_node,
};

/// Hint and hydration caches, shared by every clone of an [`ObjectStore`] and
/// alive for as long as the store is.
///
/// `by_hash` doubles as the source of shared value identity: repeated reads
/// of one hash hand out clones of the same underlying value. `known` is the
/// set of hashes proven to exist in storage, consulted to skip redundant
/// block writes. The remaining maps are pure fast paths - scalars keyed by
/// value, composites keyed by allocation identity - and correctness never
/// depends on them.
#[derive(Default)]
struct Caches {
    by_hash: HashMap<BlockHash, Value>,
    known: HashSet<BlockHash>,
    primitives: HashMap<Primitive, BlockHash>,
    arrays: HashMap<usize, (Weak<[Value]>, BlockHash)>,
    objects: HashMap<usize, (Weak<BTreeMap<String, Value>>, BlockHash)>,
}

/// An [`ObjectStore`] projects JSON values onto a DAG of content-addressed
/// nodes persisted through a [`BlockAdapter`], and materializes values back
/// from a root hash.
///
/// Structurally equal values always resolve to the same root hash, so a
/// subtree that appears many times - within one value or across many writes -
/// is stored exactly once.
pub struct ObjectStore<Hasher, Adapter>
where
    Hasher: BlockHasher,
    Adapter: BlockAdapter + Clone,
{
    hasher: CanonicalHasher<Hasher>,
    adapter: Adapter,
    caches: Arc<SharedCell<Caches>>,
}

impl<Hasher, Adapter> Clone for ObjectStore<Hasher, Adapter>
where
    Hasher: BlockHasher,
    Adapter: BlockAdapter + Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            adapter: self.adapter.clone(),
            caches: Arc::clone(&self.caches),
        }
    }
}

impl<Hasher, Adapter> ObjectStore<Hasher, Adapter>
where
    Hasher: BlockHasher,
    Adapter: BlockAdapter + Clone,
{
    /// Create an object store over `adapter`, addressing blocks with
    /// `hasher`.
    pub fn new(hasher: Hasher, adapter: Adapter) -> Self {
        Self {
            hasher: CanonicalHasher::new(hasher),
            adapter,
            caches: Arc::new(SharedCell::new(Caches::default())),
        }
    }

    /// The canonical hasher this store addresses blocks with.
    pub fn hasher(&self) -> &CanonicalHasher<Hasher> {
        &self.hasher
    }

    /// Persist `value` as a DAG of blocks and return the root hash.
    ///
    /// Child subtrees are written before their parent node, siblings in
    /// parallel; a node whose hash is already known to exist is not written
    /// again.
    pub async fn write(&self, value: &Value) -> Result<BlockHash, HstoreError> {
        self.write_at_depth(value, 0).await
    }

    /// Materialize the value rooted at `hash`.
    ///
    /// Returns `None` when the root block - or, transitively, any child
    /// block - is absent from storage. Undecodable bytes are an error, not a
    /// miss.
    pub async fn read(&self, hash: &BlockHash) -> Result<Option<Value>, HstoreError> {
        self.read_at_depth(hash, 0).await
    }

    /// The cached value for `hash`, when one has passed through this store.
    pub fn cached(&self, hash: &BlockHash) -> Option<Value> {
        self.caches.read().by_hash.get(hash).cloned()
    }

    fn write_at_depth<'a>(
        &'a self,
        value: &'a Value,
        depth: usize,
    ) -> BoxedFuture<'a, Result<BlockHash, HstoreError>> {
        Box::pin(async move {
            if depth > MAX_VALUE_DEPTH {
                return Err(HstoreError::DepthLimit(MAX_VALUE_DEPTH));
            }

            if let Some(hash) = self.hint_for(value) {
                return Ok(hash);
            }

            let node = match value {
                Value::Array(items) => {
                    let children = try_join_all(
                        items
                            .iter()
                            .map(|item| self.write_at_depth(item, depth + 1)),
                    )
                    .await?;
                    Node::Array(children)
                }
                Value::Object(entries) => {
                    let hashes = try_join_all(
                        entries
                            .values()
                            .map(|child| self.write_at_depth(child, depth + 1)),
                    )
                    .await?;
                    Node::Object(entries.keys().cloned().zip(hashes).collect())
                }
                scalar => Node::Primitive(
                    scalar.as_primitive().expect("composite in scalar arm"),
                ),
            };

            let bytes = serialize_node(&node)?;
            let hash = self.hasher.hash_bytes(&bytes).await;

            // A hash enters `known` only once its block is in storage, so a
            // failed write leaves every cache untouched and no peer ever
            // learns the hash from it. Siblings racing on an equal subtree
            // may both reach the adapter; identical writes are idempotent.
            let exists = self.caches.read().known.contains(&hash);
            if !exists {
                let mut adapter = self.adapter.clone();
                adapter
                    .write(Block::new(hash.clone(), bytes))
                    .await
                    .map_err(|error| HstoreError::Storage(error.into()))?;
                self.caches.write().known.insert(hash.clone());
            }

            self.record(value, hash.clone());
            Ok(hash)
        })
    }

    fn read_at_depth<'a>(
        &'a self,
        hash: &'a BlockHash,
        depth: usize,
    ) -> BoxedFuture<'a, Result<Option<Value>, HstoreError>> {
        Box::pin(async move {
            if depth > MAX_VALUE_DEPTH {
                return Err(HstoreError::DepthLimit(MAX_VALUE_DEPTH));
            }

            if let Some(value) = self.cached(hash) {
                return Ok(Some(value));
            }

            let block = self
                .adapter
                .read(hash)
                .await
                .map_err(|error| HstoreError::Storage(error.into()))?;
            let Some(block) = block else {
                return Ok(None);
            };

            let value = match deserialize_node(&block.bytes)? {
                Node::Primitive(primitive) => Value::from(primitive),
                Node::Array(children) => {
                    let items = try_join_all(
                        children
                            .iter()
                            .map(|child| self.read_at_depth(child, depth + 1)),
                    )
                    .await?;
                    let Some(items) = items.into_iter().collect::<Option<Vec<_>>>() else {
                        return Ok(None);
                    };
                    Value::Array(items.into())
                }
                Node::Object(entries) => {
                    let children = try_join_all(
                        entries
                            .iter()
                            .map(|(_, child)| self.read_at_depth(child, depth + 1)),
                    )
                    .await?;
                    let Some(children) = children.into_iter().collect::<Option<Vec<_>>>() else {
                        return Ok(None);
                    };
                    Value::Object(Arc::new(
                        entries
                            .into_iter()
                            .map(|(key, _)| key)
                            .zip(children)
                            .collect(),
                    ))
                }
            };

            {
                let mut caches = self.caches.write();
                caches.known.insert(hash.clone());
            }
            self.record(&value, hash.clone());
            Ok(Some(value))
        })
    }

    /// The cached hash for `value`, consulted before any hashing or I/O:
    /// scalars by value equality, composites by allocation identity.
    fn hint_for(&self, value: &Value) -> Option<BlockHash> {
        let caches = self.caches.read();
        match value {
            Value::Array(items) => {
                let (weak, hash) = caches.arrays.get(&composite_identity(items))?;
                let strong = weak.upgrade()?;
                Arc::ptr_eq(&strong, items).then(|| hash.clone())
            }
            Value::Object(entries) => {
                let (weak, hash) = caches.objects.get(&composite_identity(entries))?;
                let strong = weak.upgrade()?;
                Arc::ptr_eq(&strong, entries).then(|| hash.clone())
            }
            scalar => {
                let primitive = scalar.as_primitive()?;
                caches.primitives.get(&primitive).cloned()
            }
        }
    }

    fn record(&self, value: &Value, hash: BlockHash) {
        let mut caches = self.caches.write();

        caches
            .by_hash
            .entry(hash.clone())
            .or_insert_with(|| value.clone());

        match value {
            Value::Array(items) => {
                caches
                    .arrays
                    .insert(composite_identity(items), (Arc::downgrade(items), hash));
            }
            Value::Object(entries) => {
                caches
                    .objects
                    .insert(composite_identity(entries), (Arc::downgrade(entries), hash));
            }
            scalar => {
                if let Some(primitive) = scalar.as_primitive() {
                    caches.primitives.insert(primitive, hash);
                }
            }
        }
    }
}

fn composite_identity<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc).cast::<u8>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use hstore_storage::{Blake3Hasher, MeasuredAdapter, MemoryBlockAdapter};
    use serde_json::json;

    fn make_store() -> (
        ObjectStore<Blake3Hasher, MeasuredAdapter<MemoryBlockAdapter>>,
        MeasuredAdapter<MemoryBlockAdapter>,
        MemoryBlockAdapter,
    ) {
        let backing = MemoryBlockAdapter::new();
        let adapter = MeasuredAdapter::new(backing.clone());
        let store = ObjectStore::new(Blake3Hasher, adapter.clone());
        (store, adapter, backing)
    }

    #[tokio::test]
    async fn it_round_trips_values() -> Result<()> {
        let (store, _, _) = make_store();

        let cases = [
            json!(null),
            json!(true),
            json!(42),
            json!(""),
            json!("hello"),
            json!([]),
            json!({}),
            json!({ "foo": "bar", "nested": { "value": 42 }, "items": [1, [2, 3], null] }),
        ];

        for case in cases {
            let value = Value::from(case);
            let hash = store.write(&value).await?;
            let read_back = store.read(&hash).await?;
            assert_eq!(read_back, Some(value));
        }
        Ok(())
    }

    #[tokio::test]
    async fn it_produces_equal_hashes_for_equal_values() -> Result<()> {
        let (store, _, _) = make_store();

        let first = store
            .write(&Value::from(json!({ "a": 1, "b": [true] })))
            .await?;
        let second = store
            .write(&Value::from(json!({ "b": [true], "a": 1 })))
            .await?;
        assert_eq!(first, second);

        let different = store
            .write(&Value::from(json!({ "a": 1, "b": [false] })))
            .await?;
        assert_ne!(first, different);
        Ok(())
    }

    #[tokio::test]
    async fn it_matches_the_canonical_hasher() -> Result<()> {
        let (store, _, _) = make_store();
        let value = Value::from(json!({ "foo": ["bar", { "baz": 0 }] }));

        let written = store.write(&value).await?;
        let computed = store.hasher().hash_value(&value).await?;
        assert_eq!(written, computed);
        Ok(())
    }

    #[tokio::test]
    async fn it_skips_writes_for_known_blocks() -> Result<()> {
        let (store, adapter, _) = make_store();
        let value = Value::from(json!({ "foo": "bar", "nested": { "value": 42 } }));

        store.write(&value).await?;
        let after_first = adapter.writes();

        // A structurally equal but freshly allocated value: no new blocks.
        store
            .write(&Value::from(json!({ "nested": { "value": 42 }, "foo": "bar" })))
            .await?;
        assert_eq!(adapter.writes(), after_first);
        Ok(())
    }

    #[tokio::test]
    async fn it_writes_repeated_subtrees_once() -> Result<()> {
        let (store, adapter, _) = make_store();

        store
            .write(&Value::from(json!({ "greetings": ["hi", "hi", "hi"] })))
            .await?;

        // One block for "hi", one for the array, one for the object.
        assert_eq!(adapter.writes(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn it_skips_hashing_for_identical_references() -> Result<()> {
        let (store, adapter, _) = make_store();

        let value = Value::from(json!({ "big": [1, 2, 3] }));
        let hash = store.write(&value).await?;

        let reads_before = adapter.reads();
        let again = store.write(&value).await?;
        assert_eq!(again, hash);
        assert_eq!(adapter.reads(), reads_before);
        assert_eq!(adapter.writes(), 5);
        Ok(())
    }

    #[tokio::test]
    async fn it_returns_none_for_absent_roots() -> Result<()> {
        let (store, _, _) = make_store();
        assert_eq!(store.read(&BlockHash::from("missing")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn it_propagates_absence_of_children() -> Result<()> {
        let (store, _, backing) = make_store();

        // An array node referencing a child that was never written.
        let node = Node::Array(vec![BlockHash::from("dangling")]);
        let bytes = serialize_node(&node)?;
        let hash = store.hasher().hash_bytes(&bytes).await;
        backing
            .clone()
            .write(Block::new(hash.clone(), bytes))
            .await?;

        assert_eq!(store.read(&hash).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn it_surfaces_corrupt_blocks_as_errors() -> Result<()> {
        let (store, _, backing) = make_store();

        backing
            .clone()
            .write(Block::new("garbage", b"[9,null]".to_vec()))
            .await?;

        assert!(matches!(
            store.read(&BlockHash::from("garbage")).await,
            Err(HstoreError::DecodeFailed(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn it_shares_value_identity_across_reads() -> Result<()> {
        let (store, _, _) = make_store();

        let hash = store
            .write(&Value::from(json!({ "items": [1, 2] })))
            .await?;

        let first = store.read(&hash).await?.expect("value should exist");
        let second = store.read(&hash).await?.expect("value should exist");

        let (Value::Object(left), Value::Object(right)) = (&first, &second) else {
            panic!("expected objects");
        };
        assert!(Arc::ptr_eq(left, right));
        Ok(())
    }

    #[tokio::test]
    async fn it_limits_write_depth() -> Result<()> {
        let (store, _, _) = make_store();

        let mut value = Value::Null;
        for _ in 0..(MAX_VALUE_DEPTH + 2) {
            value = Value::array([value]);
        }

        assert!(matches!(
            store.write(&value).await,
            Err(HstoreError::DepthLimit(_))
        ));
        Ok(())
    }
}
