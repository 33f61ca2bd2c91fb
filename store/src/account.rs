//! Account storage.

use serde::{Deserialize, Serialize};
use tessera_types::{Address, Amount, BlockHash, ChainId, Nonce};

use crate::backend::{KvBackend, Table};
use crate::transaction::StagedTxn;
use crate::{keys, StoreError};

/// Balance and replay-protection counter of one address on one chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub chain_id: ChainId,
    pub address: Address,
    pub balance: Amount,
    /// Incremented by the sync engine on every applied debit or credit.
    pub nonce: Nonce,
}

impl Account {
    /// A zero-balance account, as created on first reference.
    pub fn new(chain_id: ChainId, address: Address) -> Self {
        Self {
            chain_id,
            address,
            balance: 0,
            nonce: Nonce::zero(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AccountFilter {
    pub chain_id: ChainId,
    pub min_balance: Option<Amount>,
    pub limit: Option<usize>,
}

impl AccountFilter {
    pub fn chain(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            min_balance: None,
            limit: None,
        }
    }
}

pub trait AccountStore {
    fn get_account(&self, chain_id: ChainId, address: &Address)
        -> Result<Option<Account>, StoreError>;

    /// Full replace. Callers read, modify, then write.
    fn upsert_account(&mut self, account: &Account) -> Result<(), StoreError>;

    /// Matching accounts in address order.
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError>;

    /// Aggregate hash of every account on the chain, comparable with a header's
    /// `state_root`.
    fn account_hash_state(&self, chain_id: ChainId) -> Result<BlockHash, StoreError>;
}

impl<B: KvBackend> AccountStore for StagedTxn<B> {
    fn get_account(
        &self,
        chain_id: ChainId,
        address: &Address,
    ) -> Result<Option<Account>, StoreError> {
        self.get_value(Table::Accounts, &keys::account(chain_id, address))
    }

    fn upsert_account(&mut self, account: &Account) -> Result<(), StoreError> {
        let key = keys::account(account.chain_id, &account.address);
        self.put_value(Table::Accounts, key, account)
    }

    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>, StoreError> {
        let accounts: Vec<Account> =
            self.scan_values(Table::Accounts, &keys::chain(filter.chain_id))?;
        let min = filter.min_balance.unwrap_or(0);
        let matching = accounts.into_iter().filter(|a| a.balance >= min);
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn account_hash_state(&self, chain_id: ChainId) -> Result<BlockHash, StoreError> {
        self.aggregate_hash(Table::Accounts, &keys::chain(chain_id))
    }
}
