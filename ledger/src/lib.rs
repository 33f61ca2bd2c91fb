//! Ledger value types for the Tessera proof-of-authority chain.
//!
//! Every record here is immutable once built and canonically serializable. Identity
//! hashes are stamps (see `tessera_crypto::stamp`) of the record's logical content, and
//! the binary [`codec`] is shared by persistence and the authority wire protocol.

pub mod block;
pub mod codec;
pub mod error;
pub mod genesis;
pub mod pending;
pub mod state;
pub mod transaction;

pub use block::{BlockData, BlockHeader, BlockTransaction};
pub use codec::{decode, encode, encode_opt};
pub use error::LedgerError;
pub use genesis::{build_genesis, GenesisBlockData, GenesisConfig};
pub use pending::{MempoolTransaction, PendingTransaction};
pub use state::BlockchainState;
pub use transaction::{SignedTransaction, Transaction, TxKind};
