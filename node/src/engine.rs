//! The catch-up algorithm shared by every replica role.
//!
//! A cycle runs against one open [`LedgerTxn`]:
//!
//! 1. Bootstrap the genesis block if the replica has none, applying its seed mints.
//! 2. Seed the local chain state from genesis if absent.
//! 3. Compare with the authority's chain state; equal heads end the cycle with no writes.
//! 4. Fetch blocks `local + 1 ..= remote` by number, checking each block's signature and
//!    its link to the previously applied block, and apply their transactions.
//! 5. Require the walk to end on the advertised head, then persist the remote state.
//!
//! The engine never commits. Its caller commits on `Ok` and discards on `Err`.

use std::time::Duration;

use serde::Serialize;
use tessera_ledger::{BlockData, BlockTransaction, BlockchainState, GenesisBlockData};
use tessera_network::AuthorityClient;
use tessera_store::{Account, LedgerTxn, Token};
use tessera_types::{BlockHash, ChainId};

use crate::apply::{apply_transaction, credit, Missing};
use crate::config::SyncConfig;
use crate::error::{StoreContext, SyncError};
use crate::events::ConfirmedTransaction;
use crate::tracing_spans::block_apply_span;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    /// Local head already matched the authority's; nothing was written.
    InSync,
    /// Missing blocks were applied.
    CaughtUp,
}

#[derive(Clone, Debug)]
pub struct SyncOutcome {
    pub status: SyncStatus,
    pub blocks_applied: u64,
    pub confirmed: Vec<ConfirmedTransaction>,
    /// Local chain state at the end of the cycle.
    pub head: BlockchainState,
    /// This node's wallet account as of the end of the cycle.
    pub local_account: Option<Account>,
}

pub struct SyncEngine<A> {
    config: SyncConfig,
    authority: A,
}

impl<A: AuthorityClient> SyncEngine<A> {
    pub fn new(config: SyncConfig, authority: A) -> Result<Self, SyncError> {
        if !config.chain_id.is_valid() {
            return Err(SyncError::ZeroChainId);
        }
        Ok(Self { config, authority })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    pub fn chain_id(&self) -> ChainId {
        self.config.chain_id
    }

    /// Bring the replica in `txn` up to the authority's head.
    pub async fn sync<T: LedgerTxn>(&self, txn: &mut T) -> Result<SyncOutcome, SyncError> {
        let chain_id = self.config.chain_id;
        let genesis = self.ensure_genesis(txn).await?;

        let local = match txn.get_chain_state(chain_id).during("chain state read")? {
            Some(state) => state,
            None => {
                let state = BlockchainState::at_block(genesis.hash(), &genesis.block().header);
                txn.put_chain_state(&state).during("chain state seed")?;
                state
            }
        };

        let remote = self
            .authority
            .get_chain_state(chain_id)
            .await?
            .ok_or(SyncError::StateUnavailable(chain_id))?;
        if remote.chain_id != chain_id {
            return Err(SyncError::ChainMismatch {
                expected: chain_id,
                actual: remote.chain_id,
            });
        }

        if local.latest_hash == remote.latest_hash {
            tracing::debug!(head = %local.latest_hash, number = local.latest_block_number, "in sync");
            return Ok(SyncOutcome {
                status: SyncStatus::InSync,
                blocks_applied: 0,
                confirmed: Vec::new(),
                local_account: self.local_account(txn)?,
                head: local,
            });
        }

        let head_block = self
            .authority
            .get_block_by_hash(chain_id, &remote.latest_hash)
            .await?
            .ok_or(SyncError::HeadUnavailable {
                chain_id,
                hash: remote.latest_hash,
            })?;
        if head_block.number() != remote.latest_block_number {
            return Err(SyncError::HeadNumberMismatch {
                hash: remote.latest_hash,
                claimed: remote.latest_block_number,
                actual: head_block.number(),
            });
        }
        if remote.latest_block_number < local.latest_block_number {
            return Err(SyncError::RemoteBehind {
                chain_id,
                local: local.latest_block_number,
                remote: remote.latest_block_number,
            });
        }

        tracing::info!(
            from = local.latest_block_number,
            to = remote.latest_block_number,
            "catching up"
        );

        let mut head_block = Some(head_block);
        let mut prev_hash = local.latest_hash;
        let mut confirmed = Vec::new();
        let mut blocks_applied = 0u64;
        for number in (local.latest_block_number + 1)..=remote.latest_block_number {
            let block = if number == remote.latest_block_number {
                head_block.take().ok_or(SyncError::BlockUnavailable { chain_id, number })?
            } else {
                self.pause().await;
                self.authority
                    .get_block_by_number(chain_id, number)
                    .await?
                    .ok_or(SyncError::BlockUnavailable { chain_id, number })?
            };
            self.apply_block(txn, &block, number, prev_hash, &mut confirmed)?;
            prev_hash = block.hash;
            blocks_applied += 1;
        }

        if prev_hash != remote.latest_hash {
            return Err(SyncError::HeadNotReached {
                expected: remote.latest_hash,
                reached: prev_hash,
            });
        }
        if self.config.verify_state_hashes {
            self.verify_state_hashes(txn, &remote)?;
        }

        txn.put_chain_state(&remote).during("chain state write")?;
        tracing::info!(
            head = %remote.latest_hash,
            number = remote.latest_block_number,
            blocks_applied,
            confirmed = confirmed.len(),
            "caught up"
        );
        Ok(SyncOutcome {
            status: SyncStatus::CaughtUp,
            blocks_applied,
            confirmed,
            local_account: self.local_account(txn)?,
            head: remote,
        })
    }

    /// Load the local genesis, or fetch, store and apply the authority's.
    async fn ensure_genesis<T: LedgerTxn>(&self, txn: &mut T) -> Result<GenesisBlockData, SyncError> {
        let chain_id = self.config.chain_id;
        if let Some(genesis) = txn.get_genesis(chain_id).during("genesis read")? {
            return Ok(genesis);
        }

        let genesis = self
            .authority
            .get_genesis_block(chain_id)
            .await?
            .ok_or(SyncError::GenesisUnavailable(chain_id))?;
        genesis.check_shape()?;
        genesis
            .block()
            .validate(chain_id, self.config.authority_address)
            .map_err(|source| SyncError::InvalidBlock { number: 0, source })?;

        txn.put_genesis(&genesis).during("genesis write")?;
        txn.put_block(genesis.block()).during("genesis block write")?;

        let mint = genesis.coinbase_mint();
        credit(txn, chain_id, mint.to, mint.value, Missing::Create)?;

        let token_mint = genesis.token_mint();
        txn.upsert_token_if_not_older(&Token {
            chain_id,
            id: token_mint.token_id,
            owner: token_mint.to,
            metadata_uri: token_mint.token_metadata_uri.clone(),
            nonce: token_mint.token_nonce.clone(),
        })
        .during("genesis token write")?;

        tracing::info!(
            %chain_id,
            hash = %genesis.hash(),
            coinbase = %mint.to,
            supply = mint.value,
            "genesis bootstrapped"
        );
        Ok(genesis)
    }

    fn apply_block<T: LedgerTxn>(
        &self,
        txn: &mut T,
        block: &BlockData,
        number: u64,
        prev_hash: BlockHash,
        confirmed: &mut Vec<ConfirmedTransaction>,
    ) -> Result<(), SyncError> {
        let _span = block_apply_span(number, &block.hash).entered();
        if block.number() != number {
            return Err(SyncError::UnexpectedBlockNumber {
                expected: number,
                actual: block.number(),
            });
        }
        block
            .validate(self.config.chain_id, self.config.authority_address)
            .map_err(|source| SyncError::InvalidBlock { number, source })?;
        if block.prev_hash() != prev_hash {
            return Err(SyncError::BrokenHashChain {
                number,
                expected: prev_hash,
                actual: block.prev_hash(),
            });
        }

        for block_tx in &block.transactions {
            apply_transaction(txn, &block.header, block_tx.transaction())?;
            self.reconcile_pending(txn, block, block_tx, confirmed)?;
        }
        txn.put_block(block).during("block write")?;
        tracing::debug!(transactions = block.transactions.len(), "block applied");
        Ok(())
    }

    /// Drop the local pending record this transaction confirms, and report it when it
    /// was sent by this node's wallet. Pending cleanup is best effort.
    fn reconcile_pending<T: LedgerTxn>(
        &self,
        txn: &mut T,
        block: &BlockData,
        block_tx: &BlockTransaction,
        confirmed: &mut Vec<ConfirmedTransaction>,
    ) -> Result<(), SyncError> {
        let chain_id = self.config.chain_id;
        let signed = &block_tx.signed;
        match txn.get_pending(chain_id, signed.nonce()) {
            Ok(Some(pending)) if pending.signed.equals(signed) => {
                if let Err(e) = txn.delete_pending(chain_id, signed.nonce()) {
                    tracing::warn!(nonce = %signed.nonce(), error = %e, "failed to drop confirmed pending transaction");
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(nonce = %signed.nonce(), error = %e, "failed to look up pending transaction");
            }
        }

        if self.config.wallet_address == Some(signed.sender()) {
            let tx = &signed.transaction;
            confirmed.push(ConfirmedTransaction {
                hash: signed.hash()?,
                nonce: tx.nonce.clone(),
                kind: tx.kind,
                from: tx.from,
                to: tx.to,
                value: tx.value,
                block_number: block.number(),
                block_hash: block.hash,
            });
        }
        Ok(())
    }

    fn verify_state_hashes<T: LedgerTxn>(
        &self,
        txn: &T,
        remote: &BlockchainState,
    ) -> Result<(), SyncError> {
        let chain_id = self.config.chain_id;
        if !remote.account_hash_state.is_zero() {
            let local = txn.account_hash_state(chain_id).during("account hash")?;
            if local != remote.account_hash_state {
                return Err(SyncError::StateHashMismatch {
                    table: "account",
                    local,
                    remote: remote.account_hash_state,
                });
            }
        }
        if !remote.token_hash_state.is_zero() {
            let local = txn.token_hash_state(chain_id).during("token hash")?;
            if local != remote.token_hash_state {
                return Err(SyncError::StateHashMismatch {
                    table: "token",
                    local,
                    remote: remote.token_hash_state,
                });
            }
        }
        Ok(())
    }

    fn local_account<T: LedgerTxn>(&self, txn: &T) -> Result<Option<Account>, SyncError> {
        match self.config.wallet_address {
            Some(address) => txn
                .get_account(self.config.chain_id, &address)
                .during("wallet account read"),
            None => Ok(None),
        }
    }

    async fn pause(&self) {
        if self.config.block_fetch_delay > Duration::ZERO {
            tokio::time::sleep(self.config.block_fetch_delay).await;
        }
    }
}
