use futures_util::future::try_join_all;
use hstore_common::BoxedFuture;
use hstore_storage::{BlockHash, BlockHasher};
use serde_json::json;

use crate::{HstoreError, Node, Primitive, Value};

/// Nesting depth ceiling for values and their persisted DAGs.
///
/// Traversal is recursive in both directions; the ceiling turns a
/// pathological or malicious nesting into an error instead of a stack
/// overflow.
pub const MAX_VALUE_DEPTH: usize = 4096;

/// Encode a [`Node`] into its canonical byte representation.
///
/// The wire format is minified JSON in UTF-8, tagged by variant:
/// `[0,<primitive>]`, `[1,[<hash>,…]]`, or `[2,[[<key>,<hash>],…]]` with
/// object entries in code-point key order. Identical nodes always produce
/// identical bytes; this is the compatibility surface shared with every
/// other implementation of the format.
pub fn serialize_node(node: &Node) -> Result<Vec<u8>, HstoreError> {
    let representation = match node {
        Node::Primitive(primitive) => json!([0, primitive_representation(primitive)]),
        Node::Array(children) => json!([
            1,
            children
                .iter()
                .map(|hash| hash.as_str())
                .collect::<Vec<_>>()
        ]),
        Node::Object(entries) => {
            let mut entries: Vec<&(String, BlockHash)> = entries.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            json!([
                2,
                entries
                    .iter()
                    .map(|(key, hash)| json!([key, hash.as_str()]))
                    .collect::<Vec<_>>()
            ])
        }
    };

    serde_json::to_vec(&representation)
        .map_err(|error| HstoreError::EncodeFailed(format!("{error}")))
}

fn primitive_representation(primitive: &Primitive) -> serde_json::Value {
    match primitive {
        Primitive::Null => serde_json::Value::Null,
        Primitive::Bool(value) => serde_json::Value::Bool(*value),
        Primitive::Number(value) => serde_json::Value::Number(value.clone()),
        Primitive::String(value) => serde_json::Value::String(value.to_string()),
    }
}

/// Decode canonical bytes back into a [`Node`].
///
/// Fails when the bytes are not a well-formed canonical encoding: invalid
/// UTF-8 or JSON, an unknown tag, a payload whose shape does not match its
/// tag, or object entries out of key order.
pub fn deserialize_node(bytes: &[u8]) -> Result<Node, HstoreError> {
    let representation: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|error| HstoreError::DecodeFailed(format!("{error}")))?;

    let serde_json::Value::Array(parts) = representation else {
        return Err(HstoreError::DecodeFailed(
            "node encoding must be a two-element array".into(),
        ));
    };
    let [tag, payload] = parts.as_slice() else {
        return Err(HstoreError::DecodeFailed(
            "node encoding must be a two-element array".into(),
        ));
    };

    match tag.as_u64() {
        Some(0) => Ok(Node::Primitive(decode_primitive(payload)?)),
        Some(1) => {
            let children = payload
                .as_array()
                .ok_or_else(|| HstoreError::DecodeFailed("array payload must be a list".into()))?;
            let children = children
                .iter()
                .map(|child| {
                    child
                        .as_str()
                        .map(BlockHash::from)
                        .ok_or_else(|| HstoreError::DecodeFailed("child hash must be a string".into()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::Array(children))
        }
        Some(2) => {
            let pairs = payload
                .as_array()
                .ok_or_else(|| HstoreError::DecodeFailed("object payload must be a list".into()))?;
            let mut entries: Vec<(String, BlockHash)> = Vec::with_capacity(pairs.len());
            for pair in pairs {
                let Some([key, hash]) = pair.as_array().map(Vec::as_slice) else {
                    return Err(HstoreError::DecodeFailed(
                        "object entry must be a key/hash pair".into(),
                    ));
                };
                let (Some(key), Some(hash)) = (key.as_str(), hash.as_str()) else {
                    return Err(HstoreError::DecodeFailed(
                        "object entry must be a pair of strings".into(),
                    ));
                };
                if let Some((previous, _)) = entries.last() {
                    if key <= previous.as_str() {
                        return Err(HstoreError::DecodeFailed(
                            "object entries out of key order".into(),
                        ));
                    }
                }
                entries.push((key.to_owned(), BlockHash::from(hash)));
            }
            Ok(Node::Object(entries))
        }
        _ => Err(HstoreError::DecodeFailed(format!(
            "unknown node tag: {tag}"
        ))),
    }
}

fn decode_primitive(payload: &serde_json::Value) -> Result<Primitive, HstoreError> {
    match payload {
        serde_json::Value::Null => Ok(Primitive::Null),
        serde_json::Value::Bool(value) => Ok(Primitive::Bool(*value)),
        serde_json::Value::Number(value) => Ok(Primitive::Number(value.clone())),
        serde_json::Value::String(value) => Ok(Primitive::String(value.as_str().into())),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
            HstoreError::DecodeFailed("primitive payload must be a scalar".into()),
        ),
    }
}

/// A [`CanonicalHasher`] pairs a [`BlockHasher`] with the canonical encoding,
/// so the hash of a node - or of a whole value - is well defined.
///
/// [`hash_value`](CanonicalHasher::hash_value) produces exactly the root
/// hash that [`crate::ObjectStore::write`] would produce for the same value,
/// without persisting anything.
#[derive(Clone, Debug)]
pub struct CanonicalHasher<Hasher>
where
    Hasher: BlockHasher,
{
    hasher: Hasher,
}

impl<Hasher> CanonicalHasher<Hasher>
where
    Hasher: BlockHasher,
{
    /// Wrap `hasher` for canonical use.
    pub fn new(hasher: Hasher) -> Self {
        Self { hasher }
    }

    /// Hash raw bytes with the underlying hash function.
    pub async fn hash_bytes(&self, bytes: &[u8]) -> BlockHash {
        self.hasher.hash_bytes(bytes).await
    }

    /// Hash a node's canonical encoding.
    pub async fn hash_node(&self, node: &Node) -> Result<BlockHash, HstoreError> {
        let bytes = serialize_node(node)?;
        Ok(self.hash_bytes(&bytes).await)
    }

    /// Decompose `value` bottom-up and return the hash of its root node.
    pub async fn hash_value(&self, value: &Value) -> Result<BlockHash, HstoreError> {
        self.hash_value_at(value, 0).await
    }

    fn hash_value_at<'a>(
        &'a self,
        value: &'a Value,
        depth: usize,
    ) -> BoxedFuture<'a, Result<BlockHash, HstoreError>> {
        Box::pin(async move {
            if depth > MAX_VALUE_DEPTH {
                return Err(HstoreError::DepthLimit(MAX_VALUE_DEPTH));
            }

            let node = match value {
                Value::Array(items) => {
                    let children = try_join_all(
                        items
                            .iter()
                            .map(|item| self.hash_value_at(item, depth + 1)),
                    )
                    .await?;
                    Node::Array(children)
                }
                Value::Object(entries) => {
                    let hashes = try_join_all(
                        entries
                            .values()
                            .map(|child| self.hash_value_at(child, depth + 1)),
                    )
                    .await?;
                    Node::Object(entries.keys().cloned().zip(hashes).collect())
                }
                scalar => Node::Primitive(
                    scalar.as_primitive().expect("composite in scalar arm"),
                ),
            };

            self.hash_node(&node).await
        })
    }
}
