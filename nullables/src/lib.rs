//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies (clock, storage, the authority) sit behind traits. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod authority;
pub mod chain;
pub mod clock;
pub mod store;

pub use authority::{CallCounts, NullAuthority};
pub use chain::{test_key, ChainBuilder};
pub use clock::NullClock;
pub use store::{null_store, MemoryBackend, NullStore};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A poisoned nullable is still usable: the data is test state, not an invariant.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
