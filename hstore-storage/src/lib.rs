#![warn(missing_docs)]

//! Block-level storage for content-addressed systems.
//!
//! This crate defines the [`BlockAdapter`] contract - opaque byte blocks
//! persisted under their hash - together with a set of implementations:
//! an in-memory backend, a filesystem backend, a measuring proxy, and
//! [`Cascade`], which composes any number of adapters into a tiered
//! write-through cache.
//!
//! ```rust
//! # async fn example() -> Result<(), hstore_storage::HstoreStorageError> {
//! use hstore_storage::{Block, BlockAdapter, Cascade, MemoryBlockAdapter};
//!
//! let fast = MemoryBlockAdapter::new();
//! let slow = MemoryBlockAdapter::new();
//! let mut cascade = Cascade::new(vec![Cascade::layer(fast), Cascade::layer(slow)])?;
//!
//! cascade
//!     .write(Block::new("abc123", b"block bytes".to_vec()))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! Hashing is pluggable through [`BlockHasher`]; [`Blake3Hasher`] is the
//! default and [`Sha256Hasher`] is provided as an alternative.

mod adapter;
pub use adapter::*;

mod block;
pub use block::*;

mod cascade;
pub use cascade::*;

mod error;
pub use error::*;

mod hash;
pub use hash::*;

mod measure;
pub use measure::*;

#[cfg(any(test, feature = "helpers"))]
mod helpers;
#[cfg(any(test, feature = "helpers"))]
pub use helpers::*;
