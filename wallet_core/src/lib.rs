//! Wallet core library for Tessera.
//!
//! Provides what a wallet or faucet needs on top of a synced replica:
//! - Key generation, import and export
//! - Transaction building against the local ledger (coin transfer, token transfer, burn)
//! - The one-outstanding-transaction admission gate and submission to the authority
//! - Local balance, token and pending queries

pub mod error;
pub mod keys;
pub mod portfolio;
pub mod transaction_builder;
pub mod wallet;

pub use error::WalletError;
pub use portfolio::{PendingSummary, Portfolio};
pub use wallet::{Submission, Wallet};
