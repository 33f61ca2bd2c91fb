//! Storage contracts for the Tessera ledger replica.
//!
//! Every storage backend (LMDB, in-memory for testing) implements [`KvBackend`]. The
//! repository traits are implemented once, over [`StagedTxn`], so every backend gets the
//! same transaction semantics. The rest of the codebase depends only on the traits.

pub mod account;
pub mod backend;
pub mod block;
pub mod error;
pub mod keys;
pub mod meta;
pub mod pending;
pub mod token;
pub mod transaction;

pub use account::{Account, AccountFilter, AccountStore};
pub use backend::{KvBackend, Table, WriteSet};
pub use block::{BlockStore, GenesisStore};
pub use error::StoreError;
pub use meta::ChainStateStore;
pub use pending::PendingTxStore;
pub use token::{Token, TokenStore};
pub use transaction::{KvStore, LedgerStore, LedgerTxn, StagedTxn};
