//! LMDB storage backend for the Tessera ledger replica.
//!
//! Implements [`tessera_store::KvBackend`] with the `heed` LMDB bindings. Each logical
//! table maps to one named database within a single environment, and a committed
//! write-set becomes exactly one LMDB write transaction.

pub mod backend;
pub mod environment;
pub mod error;

pub use backend::{open_store, LmdbBackend, LmdbStore};
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
