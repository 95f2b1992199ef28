#![warn(missing_docs)]

//! Lightweight helpers shared across the `hstore` crates: cross-target bound
//! traits for writing async code that compiles for both native and
//! `wasm32-unknown-unknown` targets, a shared interior-mutability cell, and
//! time utilities.

mod future;
pub use future::*;

mod sync;
pub use sync::*;

pub mod time;
