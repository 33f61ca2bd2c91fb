//! Events published after a sync cycle commits.

use serde::Serialize;
use tessera_ledger::TxKind;
use tessera_types::{Address, Amount, BlockHash, ChainId, Nonce, TxHash};

/// A transaction sent by this node's wallet, observed in a synced block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmedTransaction {
    pub hash: TxHash,
    pub nonce: Nonce,
    pub kind: TxKind,
    pub from: Address,
    pub to: Address,
    pub value: Amount,
    pub block_number: u64,
    pub block_hash: BlockHash,
}

/// Broadcast to subscribers of the sync manager. Never emitted for a discarded cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// The local replica advanced to a new head.
    Synced {
        chain_id: ChainId,
        head: BlockHash,
        number: u64,
        blocks_applied: u64,
    },
    Confirmed(ConfirmedTransaction),
}
