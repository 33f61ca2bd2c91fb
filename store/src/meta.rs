//! Sync cursor storage.

use tessera_ledger::BlockchainState;
use tessera_types::ChainId;

use crate::backend::{KvBackend, Table};
use crate::transaction::StagedTxn;
use crate::{keys, StoreError};

pub trait ChainStateStore {
    fn get_chain_state(&self, chain_id: ChainId) -> Result<Option<BlockchainState>, StoreError>;
    fn put_chain_state(&mut self, state: &BlockchainState) -> Result<(), StoreError>;
}

impl<B: KvBackend> ChainStateStore for StagedTxn<B> {
    fn get_chain_state(&self, chain_id: ChainId) -> Result<Option<BlockchainState>, StoreError> {
        self.get_value(Table::ChainState, &keys::chain(chain_id))
    }

    fn put_chain_state(&mut self, state: &BlockchainState) -> Result<(), StoreError> {
        self.put_value(Table::ChainState, keys::chain(state.chain_id), state)
    }
}
