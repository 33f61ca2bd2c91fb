//! Fundamental types for the Tessera ledger.
//!
//! This crate defines the primitive identifiers shared across every other crate in the
//! workspace: chain ids, addresses, hashes, token ids, arbitrary-precision nonces,
//! timestamps and key material.

pub mod address;
pub mod chain;
pub mod error;
pub mod hash;
pub mod keys;
pub mod nonce;
pub mod time;

pub use address::Address;
pub use chain::{Amount, ChainId, TokenId};
pub use error::TesseraError;
pub use hash::{BlockHash, TxHash};
pub use keys::{KeyPair, PrivateKey, PublicKey};
pub use nonce::Nonce;
pub use time::Timestamp;
