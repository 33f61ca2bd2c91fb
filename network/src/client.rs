//! The authority contract consumed by the sync engine and the wallet.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tessera_ledger::{BlockData, BlockchainState, GenesisBlockData, MempoolTransaction};
use tessera_types::{BlockHash, ChainId};

use crate::AuthorityError;

/// Pushed by the authority whenever a chain advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainNotification {
    pub chain_id: ChainId,
}

/// Ends when the authority closes the channel.
pub type NotificationStream =
    Pin<Box<dyn Stream<Item = Result<ChainNotification, AuthorityError>> + Send>>;

/// Remote oracle holding the authoritative chain.
///
/// Lookups answer `Ok(None)` when the authority does not have the record.
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    async fn get_genesis_block(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<GenesisBlockData>, AuthorityError>;

    async fn get_chain_state(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<BlockchainState>, AuthorityError>;

    async fn get_block_by_hash(
        &self,
        chain_id: ChainId,
        hash: &BlockHash,
    ) -> Result<Option<BlockData>, AuthorityError>;

    async fn get_block_by_number(
        &self,
        chain_id: ChainId,
        number: u64,
    ) -> Result<Option<BlockData>, AuthorityError>;

    /// `Err(AuthorityError::Rejected)` when the authority refuses the transaction.
    async fn submit_transaction(&self, tx: &MempoolTransaction) -> Result<(), AuthorityError>;

    async fn subscribe_state_changes(
        &self,
        chain_id: ChainId,
    ) -> Result<NotificationStream, AuthorityError>;
}

#[async_trait]
impl<T: AuthorityClient + ?Sized> AuthorityClient for Arc<T> {
    async fn get_genesis_block(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<GenesisBlockData>, AuthorityError> {
        (**self).get_genesis_block(chain_id).await
    }

    async fn get_chain_state(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<BlockchainState>, AuthorityError> {
        (**self).get_chain_state(chain_id).await
    }

    async fn get_block_by_hash(
        &self,
        chain_id: ChainId,
        hash: &BlockHash,
    ) -> Result<Option<BlockData>, AuthorityError> {
        (**self).get_block_by_hash(chain_id, hash).await
    }

    async fn get_block_by_number(
        &self,
        chain_id: ChainId,
        number: u64,
    ) -> Result<Option<BlockData>, AuthorityError> {
        (**self).get_block_by_number(chain_id, number).await
    }

    async fn submit_transaction(&self, tx: &MempoolTransaction) -> Result<(), AuthorityError> {
        (**self).submit_transaction(tx).await
    }

    async fn subscribe_state_changes(
        &self,
        chain_id: ChainId,
    ) -> Result<NotificationStream, AuthorityError> {
        (**self).subscribe_state_changes(chain_id).await
    }
}
