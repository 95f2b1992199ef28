use crate::BlockHash;

/// The unit of adapter-level persistence: opaque bytes stored under a hash.
///
/// A block owns its bytes. Moving a block into an adapter (or cloning one out
/// of it) transfers or duplicates the whole buffer, so no caller can mutate
/// persisted state through a retained reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// The key this block is stored under
    pub hash: BlockHash,
    /// The block's payload, opaque to the storage layer
    pub bytes: Vec<u8>,
}

impl Block {
    /// Assemble a block from a hash and its payload bytes.
    ///
    /// The storage layer does not verify that `hash` was derived from
    /// `bytes`; that is the producing codec's contract.
    pub fn new(hash: impl Into<BlockHash>, bytes: Vec<u8>) -> Self {
        Self {
            hash: hash.into(),
            bytes,
        }
    }

    /// The byte length of this block's payload.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this block has an empty payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
