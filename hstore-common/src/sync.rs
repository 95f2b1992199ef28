//! Cross-target bound compatibility traits.
//!
//! Async trait methods in this workspace are shared across threads on native
//! targets but run on a single thread on `wasm32-unknown-unknown`. These
//! traits express that difference as a bound: on native targets they alias
//! `Send` / `Send + Sync`, on wasm they are satisfied by every type.

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSend: Send {}

#[cfg(not(target_arch = "wasm32"))]
impl<S: ?Sized> ConditionalSend for S where S: Send {}

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S: ?Sized> ConditionalSync for S where S: Send + Sync {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSend {}

#[cfg(target_arch = "wasm32")]
impl<S: ?Sized> ConditionalSend for S {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<S: ?Sized> ConditionalSync for S {}

/// Shared interior mutability over plain (non-async) state.
///
/// A thin wrapper over [`std::sync::RwLock`] that recovers the usual ergonomic
/// cost of lock poisoning: a panic while holding the lock is already fatal to
/// the operation in progress, so guards are acquired infallibly.
///
/// Guards must never be held across an `.await`.
#[derive(Debug, Default)]
pub struct SharedCell<T>(std::sync::RwLock<T>);

impl<T> SharedCell<T> {
    /// Wrap `value` in a new cell.
    pub fn new(value: T) -> Self {
        Self(std::sync::RwLock::new(value))
    }

    /// Acquire a read guard, blocking until available.
    pub fn read(&self) -> std::sync::RwLockReadGuard<'_, T> {
        self.0.read().expect("lock poisoned")
    }

    /// Acquire a write guard, blocking until available.
    pub fn write(&self) -> std::sync::RwLockWriteGuard<'_, T> {
        self.0.write().expect("lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_reads_and_writes_through_the_cell() {
        let cell = SharedCell::new(1);
        assert_eq!(*cell.read(), 1);
        *cell.write() += 41;
        assert_eq!(*cell.read(), 42);
    }
}
