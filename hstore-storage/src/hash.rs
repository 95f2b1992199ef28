use async_trait::async_trait;
use base58::ToBase58;
use hstore_common::ConditionalSync;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An opaque block identifier, rendered as a string.
///
/// The storage layer never inspects the contents of a hash; uniqueness and
/// collision resistance are the producing [`BlockHasher`]'s responsibility.
/// Reserved, non-content-derived keys (such as a store's head pointer) share
/// this type by convention.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHash(String);

impl BlockHash {
    /// The hash rendered as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BlockHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BlockHash {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<[u8]> for BlockHash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abbreviated: String = self.0.chars().take(8).collect();
        write!(f, "#{abbreviated}...")
    }
}

/// A [`BlockHasher`] derives the content address of a byte sequence.
///
/// Implementations must be pure: the same bytes always produce the same
/// [`BlockHash`]. The deferred signature accommodates hash functions hosted
/// behind an async boundary (hardware tokens, workers); most implementations
/// resolve immediately.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait BlockHasher: Clone + ConditionalSync {
    /// Hash `bytes` into an opaque identifier.
    async fn hash_bytes(&self, bytes: &[u8]) -> BlockHash;
}

/// The default [`BlockHasher`]: BLAKE3, rendered as base58.
#[derive(Clone, Debug, Default)]
pub struct Blake3Hasher;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlockHasher for Blake3Hasher {
    async fn hash_bytes(&self, bytes: &[u8]) -> BlockHash {
        BlockHash::from(blake3::hash(bytes).as_bytes().to_base58())
    }
}

/// A SHA-256 [`BlockHasher`], rendered as lowercase hex.
#[derive(Clone, Debug, Default)]
pub struct Sha256Hasher;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlockHasher for Sha256Hasher {
    async fn hash_bytes(&self, bytes: &[u8]) -> BlockHash {
        BlockHash::from(hex::encode(Sha256::digest(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn it_hashes_deterministically() {
        let blake3 = Blake3Hasher;
        let first = blake3.hash_bytes(b"same bytes").await;
        let second = blake3.hash_bytes(b"same bytes").await;
        assert_eq!(first, second);

        let different = blake3.hash_bytes(b"other bytes").await;
        assert_ne!(first, different);
    }

    #[tokio::test]
    async fn it_produces_well_known_sha256_digests() {
        let sha256 = Sha256Hasher;
        let empty = sha256.hash_bytes(b"").await;
        assert_eq!(
            empty.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn it_abbreviates_debug_output() {
        let hash = BlockHash::from("abcdefghijklmnop");
        assert_eq!(format!("{hash:?}"), "#abcdefgh...");
        assert_eq!(format!("{hash}"), "abcdefghijklmnop");
    }
}
