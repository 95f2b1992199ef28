//! Cross-target future helpers.

use std::future::Future;
use std::pin::Pin;

/// A pinned, heap-allocated future, as produced by recursive async calls.
///
/// `Send` on native targets; single-threaded wasm drops the bound, matching
/// the [`crate::ConditionalSend`] family of traits.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;
