//! Span constructors for sync operations, so every cycle and block carries the same
//! field names.

use tessera_types::{BlockHash, ChainId};
use tracing::{debug_span, info_span, Span};

pub fn sync_cycle_span(chain_id: ChainId) -> Span {
    info_span!("sync_cycle", chain = %chain_id)
}

pub fn block_apply_span(number: u64, hash: &BlockHash) -> Span {
    debug_span!("block_apply", number, hash = %hash)
}

pub fn subscription_span(chain_id: ChainId) -> Span {
    info_span!("subscription", chain = %chain_id)
}
