//! Read-only summary of what the wallet holds locally.

use serde::Serialize;
use tessera_types::{Address, Amount, ChainId, Nonce, TokenId, TxHash};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub chain_id: ChainId,
    pub address: Address,
    pub balance: Amount,
    pub nonce: Nonce,
    pub tokens: Vec<TokenId>,
    /// The outstanding transaction, if any.
    pub pending: Option<PendingSummary>,
    /// Local head the figures above were read at.
    pub synced_block: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PendingSummary {
    pub hash: TxHash,
    pub nonce: Nonce,
    pub to: Address,
    pub value: Amount,
}
