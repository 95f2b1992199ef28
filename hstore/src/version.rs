use hstore_storage::BlockHash;
use serde::{Deserialize, Serialize};

use crate::{HstoreError, Value};

/// The reserved adapter key under which the head record is stored.
///
/// This is the one key in an adapter whose block is not content-derived and
/// whose bytes are overwritten in place; by convention it lies outside the
/// image of any sensible hash function, so no user value can ever collide
/// with it.
pub const HEAD_KEY: &str = "__hstore_head__";

/// The persisted form of one version: a link from a value to its
/// predecessor, stamped with its creation time.
///
/// A version block is content-addressed like any node block, which is what
/// makes history immutable: re-committing the same value against the same
/// predecessor in the same millisecond reproduces the same block.
///
/// Field order is wire order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct VersionBlock {
    pub value: BlockHash,
    pub previous: Option<BlockHash>,
    pub timestamp: u64,
}

/// The persisted form of the head pointer, stored under [`HEAD_KEY`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HeadRecord {
    pub head: Option<BlockHash>,
}

/// A caller-visible snapshot of one committed state.
///
/// The carried [`Value`] is immutable and structurally shared with the
/// store's caches; holding a snapshot costs a handful of reference counts,
/// not a copy of the state.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVersion {
    /// The hash of this version's block
    pub hash: BlockHash,
    /// The committed state
    pub value: Value,
    /// The hash of the predecessor version, or `None` for the first commit
    pub previous: Option<BlockHash>,
    /// Milliseconds since the Unix epoch at commit time
    pub timestamp: u64,
}

pub(crate) fn encode_version(version: &VersionBlock) -> Result<Vec<u8>, HstoreError> {
    serde_json::to_vec(version).map_err(|error| HstoreError::EncodeFailed(format!("{error}")))
}

pub(crate) fn decode_version(bytes: &[u8]) -> Result<VersionBlock, HstoreError> {
    serde_json::from_slice(bytes).map_err(|error| HstoreError::DecodeFailed(format!("{error}")))
}

pub(crate) fn encode_head(head: &Option<BlockHash>) -> Result<Vec<u8>, HstoreError> {
    serde_json::to_vec(&HeadRecord { head: head.clone() })
        .map_err(|error| HstoreError::EncodeFailed(format!("{error}")))
}

pub(crate) fn decode_head(bytes: &[u8]) -> Result<Option<BlockHash>, HstoreError> {
    let record: HeadRecord = serde_json::from_slice(bytes)
        .map_err(|error| HstoreError::DecodeFailed(format!("{error}")))?;
    Ok(record.head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn it_encodes_versions_in_wire_order() -> Result<()> {
        let version = VersionBlock {
            value: BlockHash::from("abc"),
            previous: None,
            timestamp: 1700000000000,
        };
        assert_eq!(
            String::from_utf8(encode_version(&version)?)?,
            r#"{"value":"abc","previous":null,"timestamp":1700000000000}"#
        );

        let linked = VersionBlock {
            previous: Some(BlockHash::from("parent")),
            ..version
        };
        assert_eq!(
            String::from_utf8(encode_version(&linked)?)?,
            r#"{"value":"abc","previous":"parent","timestamp":1700000000000}"#
        );
        Ok(())
    }

    #[test]
    fn it_round_trips_version_blocks() -> Result<()> {
        let version = VersionBlock {
            value: BlockHash::from("abc"),
            previous: Some(BlockHash::from("def")),
            timestamp: 42,
        };
        assert_eq!(decode_version(&encode_version(&version)?)?, version);
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_version_blocks() {
        let malformed: [&[u8]; 5] = [
            br#"{"value":1}"#,
            br#"{"value":"abc"}"#,
            br#"{"value":"abc","previous":7,"timestamp":1}"#,
            br#"{"value":"abc","previous":null,"timestamp":"soon"}"#,
            br#"{"value":"abc","previous":null,"timestamp":1,"extra":true}"#,
        ];

        for bytes in malformed {
            assert!(
                decode_version(bytes).is_err(),
                "expected decode failure for {:?}",
                String::from_utf8_lossy(bytes)
            );
        }
    }

    #[test]
    fn it_encodes_head_records() -> Result<()> {
        assert_eq!(encode_head(&None)?, br#"{"head":null}"#);
        assert_eq!(
            encode_head(&Some(BlockHash::from("tip")))?,
            br#"{"head":"tip"}"#
        );
        Ok(())
    }

    #[test]
    fn it_decodes_well_formed_head_records() -> Result<()> {
        assert_eq!(decode_head(br#"{"head":null}"#)?, None);
        assert_eq!(
            decode_head(br#"{"head":"tip"}"#)?,
            Some(BlockHash::from("tip"))
        );
        Ok(())
    }

    #[test]
    fn it_rejects_malformed_head_records() {
        assert!(decode_head(br#"{"head":42}"#).is_err());
        assert!(decode_head(br#"[]"#).is_err());
        assert!(decode_head(b"not json").is_err());
    }
}
