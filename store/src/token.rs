//! Token ownership storage.

use serde::{Deserialize, Serialize};
use tessera_types::{Address, BlockHash, ChainId, Nonce, TokenId};

use crate::backend::{KvBackend, Table};
use crate::transaction::StagedTxn;
use crate::{keys, StoreError};

/// Current owner of a token. Not a history: each write replaces the previous owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: ChainId,
    pub id: TokenId,
    pub owner: Address,
    pub metadata_uri: String,
    /// Version counter carried by the transaction that last moved the token.
    pub nonce: Nonce,
}

pub trait TokenStore {
    fn get_token(&self, chain_id: ChainId, id: TokenId) -> Result<Option<Token>, StoreError>;

    /// Full replace.
    fn upsert_token(&mut self, token: &Token) -> Result<(), StoreError>;

    /// Writes only when `token.nonce` is at least the stored nonce, so applying blocks
    /// in any order converges on the latest owner. Returns whether it wrote.
    fn upsert_token_if_not_older(&mut self, token: &Token) -> Result<bool, StoreError> {
        if let Some(stored) = self.get_token(token.chain_id, token.id)? {
            if stored.nonce > token.nonce {
                return Ok(false);
            }
        }
        self.upsert_token(token)?;
        Ok(true)
    }

    fn list_tokens_by_owner(&self, chain_id: ChainId, owner: &Address)
        -> Result<Vec<Token>, StoreError>;

    fn count_tokens_by_owner(&self, chain_id: ChainId, owner: &Address) -> Result<u64, StoreError> {
        self.list_tokens_by_owner(chain_id, owner)
            .map(|tokens| tokens.len() as u64)
    }

    /// Aggregate hash of every token on the chain, comparable with `tokens_root`.
    fn token_hash_state(&self, chain_id: ChainId) -> Result<BlockHash, StoreError>;
}

impl<B: KvBackend> TokenStore for StagedTxn<B> {
    fn get_token(&self, chain_id: ChainId, id: TokenId) -> Result<Option<Token>, StoreError> {
        self.get_value(Table::Tokens, &keys::token(chain_id, id))
    }

    fn upsert_token(&mut self, token: &Token) -> Result<(), StoreError> {
        let key = keys::token(token.chain_id, token.id);
        self.put_value(Table::Tokens, key, token)
    }

    fn list_tokens_by_owner(
        &self,
        chain_id: ChainId,
        owner: &Address,
    ) -> Result<Vec<Token>, StoreError> {
        let tokens: Vec<Token> = self.scan_values(Table::Tokens, &keys::chain(chain_id))?;
        Ok(tokens.into_iter().filter(|t| t.owner == *owner).collect())
    }

    fn token_hash_state(&self, chain_id: ChainId) -> Result<BlockHash, StoreError> {
        self.aggregate_hash(Table::Tokens, &keys::chain(chain_id))
    }
}
