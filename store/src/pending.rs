//! Locally originated transactions awaiting confirmation.

use tessera_ledger::PendingTransaction;
use tessera_types::{ChainId, Nonce};

use crate::backend::{KvBackend, Table};
use crate::transaction::StagedTxn;
use crate::{keys, StoreError};

/// Keys are `(chain_id, nonce)`.
pub trait PendingTxStore {
    /// Pending transactions on the chain, in nonce order.
    fn list_pending(&self, chain_id: ChainId) -> Result<Vec<PendingTransaction>, StoreError>;

    fn upsert_pending(&mut self, pending: &PendingTransaction) -> Result<(), StoreError>;

    fn get_pending(
        &self,
        chain_id: ChainId,
        nonce: &Nonce,
    ) -> Result<Option<PendingTransaction>, StoreError>;

    /// Deleting an absent record is not an error.
    fn delete_pending(&mut self, chain_id: ChainId, nonce: &Nonce) -> Result<(), StoreError>;
}

impl<B: KvBackend> PendingTxStore for StagedTxn<B> {
    fn list_pending(&self, chain_id: ChainId) -> Result<Vec<PendingTransaction>, StoreError> {
        self.scan_values(Table::Pending, &keys::chain(chain_id))
    }

    fn upsert_pending(&mut self, pending: &PendingTransaction) -> Result<(), StoreError> {
        let key = keys::pending(pending.signed.transaction.chain_id, pending.nonce());
        self.put_value(Table::Pending, key, pending)
    }

    fn get_pending(
        &self,
        chain_id: ChainId,
        nonce: &Nonce,
    ) -> Result<Option<PendingTransaction>, StoreError> {
        self.get_value(Table::Pending, &keys::pending(chain_id, nonce))
    }

    fn delete_pending(&mut self, chain_id: ChainId, nonce: &Nonce) -> Result<(), StoreError> {
        self.delete_raw(Table::Pending, keys::pending(chain_id, nonce));
        Ok(())
    }
}
