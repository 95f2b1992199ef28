#![warn(missing_docs)]

//! A content-addressable store for evolving, schema-validated JSON state.
//!
//! JSON values are decomposed into a Merkle-style DAG of canonically-encoded
//! nodes, each persisted as a block under its content hash through any
//! [`hstore_storage::BlockAdapter`]. On top of the DAG sits an append-only
//! chain of versions - immutable snapshots linked to their predecessor - with
//! a single movable head pointer.
//!
//! ```rust
//! # async fn example() -> Result<(), hstore::HstoreError> {
//! use hstore::{AnySchema, Store};
//! use hstore_storage::{Blake3Hasher, MemoryBlockAdapter};
//! use serde_json::json;
//!
//! let store = Store::open(Blake3Hasher, MemoryBlockAdapter::new(), AnySchema).await?;
//!
//! let version = store.commit(json!({ "name": "Alice" })).await?;
//! let head = store.head().await?.expect("just committed");
//!
//! assert_eq!(head.hash, version.hash);
//! # Ok(())
//! # }
//! ```
//!
//! Structurally equal values share blocks: committing the same state twice
//! writes no new nodes, and a small change to a large tree re-writes only the
//! path from the changed leaves to the root.

mod codec;
pub use codec::*;

mod error;
pub use error::*;

mod node;
pub use node::*;

mod object;
pub use object::*;

mod schema;
pub use schema::*;

mod store;
pub use store::*;

mod value;
pub use value::*;

mod version;
pub use version::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
