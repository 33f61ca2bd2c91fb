//! Sync-progress cursor.

use serde::{Deserialize, Serialize};
use tessera_types::{Amount, BlockHash, ChainId, TokenId};

use crate::block::BlockHeader;

/// Where a replica (or the authority) stands on a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainState {
    pub chain_id: ChainId,
    pub latest_hash: BlockHash,
    pub latest_block_number: u64,
    pub latest_token_id: TokenId,
    pub transaction_fee: Amount,
    pub account_hash_state: BlockHash,
    pub token_hash_state: BlockHash,
}

impl BlockchainState {
    /// Cursor positioned on the block with `hash` and `header`.
    pub fn at_block(hash: BlockHash, header: &BlockHeader) -> Self {
        Self {
            chain_id: header.chain_id,
            latest_hash: hash,
            latest_block_number: header.number,
            latest_token_id: header.latest_token_id,
            transaction_fee: header.transaction_fee,
            account_hash_state: header.state_root,
            token_hash_state: header.tokens_root,
        }
    }
}
