//! Nullable authority: a scripted in-memory chain oracle.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tessera_ledger::{BlockData, BlockchainState, GenesisBlockData, MempoolTransaction};
use tessera_network::{AuthorityClient, AuthorityError, ChainNotification, NotificationStream};
use tessera_types::{BlockHash, ChainId};
use tokio::sync::{mpsc, Semaphore};

use crate::lock;

/// How often each operation was called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub genesis: usize,
    pub chain_state: usize,
    pub block_by_hash: usize,
    pub block_by_number: usize,
    pub submit: usize,
    pub subscribe: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.genesis
            + self.chain_state
            + self.block_by_hash
            + self.block_by_number
            + self.submit
            + self.subscribe
    }
}

type Subscriber = mpsc::UnboundedSender<Result<ChainNotification, AuthorityError>>;

#[derive(Default)]
struct Inner {
    genesis: HashMap<ChainId, GenesisBlockData>,
    blocks: HashMap<(ChainId, BlockHash), BlockData>,
    numbers: HashMap<(ChainId, u64), BlockHash>,
    states: HashMap<ChainId, BlockchainState>,
    submitted: Vec<MempoolTransaction>,
    reject_reason: Option<String>,
    failures: VecDeque<AuthorityError>,
    subscribe_failures: VecDeque<AuthorityError>,
    subscribers: Vec<(ChainId, Subscriber)>,
    block_gate: Option<Arc<Semaphore>>,
    calls: CallCounts,
}

/// Serves whatever the test published. Never touches the network.
#[derive(Default)]
pub struct NullAuthority {
    inner: Mutex<Inner>,
}

impl NullAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `genesis` and advance the chain state to it.
    pub fn set_genesis(&self, genesis: GenesisBlockData) {
        let block = genesis.block().clone();
        lock(&self.inner)
            .genesis
            .insert(block.header.chain_id, genesis);
        self.publish_block(block);
    }

    /// Serve `block` and advance the advertised chain state to it.
    pub fn publish_block(&self, block: BlockData) {
        let state = BlockchainState::at_block(block.hash, &block.header);
        self.insert_block(block);
        lock(&self.inner).states.insert(state.chain_id, state);
    }

    /// Serve `block` without touching the advertised chain state.
    pub fn insert_block(&self, block: BlockData) {
        let chain_id = block.header.chain_id;
        let mut inner = lock(&self.inner);
        inner.numbers.insert((chain_id, block.number()), block.hash);
        inner.blocks.insert((chain_id, block.hash), block);
    }

    /// Stop serving a block by hash (the number index still points at it).
    pub fn forget_block(&self, chain_id: ChainId, hash: &BlockHash) {
        lock(&self.inner).blocks.remove(&(chain_id, *hash));
    }

    pub fn set_chain_state(&self, state: BlockchainState) {
        lock(&self.inner).states.insert(state.chain_id, state);
    }

    /// Answer chain-state queries for `chain_id` with `state`, whatever chain it names.
    pub fn serve_chain_state(&self, chain_id: ChainId, state: BlockchainState) {
        lock(&self.inner).states.insert(chain_id, state);
    }

    /// Reject every submission with `reason`, or accept again with `None`.
    pub fn reject_submissions(&self, reason: Option<String>) {
        lock(&self.inner).reject_reason = reason;
    }

    /// The next request (of any kind except subscribe) fails with `error`.
    pub fn fail_next(&self, error: AuthorityError) {
        lock(&self.inner).failures.push_back(error);
    }

    /// The next subscribe call fails with `error`.
    pub fn fail_next_subscribe(&self, error: AuthorityError) {
        lock(&self.inner).subscribe_failures.push_back(error);
    }

    /// Park every `get_block_by_number` call until [`Self::release_block_fetches`].
    pub fn hold_block_fetches(&self) {
        lock(&self.inner).block_gate = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_block_fetches(&self) {
        if let Some(gate) = lock(&self.inner).block_gate.take() {
            gate.close();
        }
    }

    /// Push a notification to every live subscriber of `chain_id`. Returns how many got it.
    pub fn notify(&self, chain_id: ChainId) -> usize {
        let mut inner = lock(&self.inner);
        inner.subscribers.retain(|(_, tx)| !tx.is_closed());
        let mut delivered = 0;
        for (id, tx) in &inner.subscribers {
            if *id == chain_id && tx.send(Ok(ChainNotification { chain_id })).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Drop every subscriber, ending their streams.
    pub fn close_subscriptions(&self) {
        lock(&self.inner).subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        let mut inner = lock(&self.inner);
        inner.subscribers.retain(|(_, tx)| !tx.is_closed());
        inner.subscribers.len()
    }

    pub fn submitted(&self) -> Vec<MempoolTransaction> {
        lock(&self.inner).submitted.clone()
    }

    pub fn calls(&self) -> CallCounts {
        lock(&self.inner).calls
    }

    fn next_failure(&self) -> Result<(), AuthorityError> {
        match lock(&self.inner).failures.pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthorityClient for NullAuthority {
    async fn get_genesis_block(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<GenesisBlockData>, AuthorityError> {
        lock(&self.inner).calls.genesis += 1;
        self.next_failure()?;
        Ok(lock(&self.inner).genesis.get(&chain_id).cloned())
    }

    async fn get_chain_state(
        &self,
        chain_id: ChainId,
    ) -> Result<Option<BlockchainState>, AuthorityError> {
        lock(&self.inner).calls.chain_state += 1;
        self.next_failure()?;
        Ok(lock(&self.inner).states.get(&chain_id).cloned())
    }

    async fn get_block_by_hash(
        &self,
        chain_id: ChainId,
        hash: &BlockHash,
    ) -> Result<Option<BlockData>, AuthorityError> {
        lock(&self.inner).calls.block_by_hash += 1;
        self.next_failure()?;
        Ok(lock(&self.inner).blocks.get(&(chain_id, *hash)).cloned())
    }

    async fn get_block_by_number(
        &self,
        chain_id: ChainId,
        number: u64,
    ) -> Result<Option<BlockData>, AuthorityError> {
        let gate = {
            let mut inner = lock(&self.inner);
            inner.calls.block_by_number += 1;
            inner.block_gate.clone()
        };
        if let Some(gate) = gate {
            // Closed on release; the error is the wake-up.
            let _ = gate.acquire().await;
        }
        self.next_failure()?;
        let inner = lock(&self.inner);
        Ok(inner
            .numbers
            .get(&(chain_id, number))
            .and_then(|hash| inner.blocks.get(&(chain_id, *hash)))
            .cloned())
    }

    async fn submit_transaction(&self, tx: &MempoolTransaction) -> Result<(), AuthorityError> {
        lock(&self.inner).calls.submit += 1;
        self.next_failure()?;
        let mut inner = lock(&self.inner);
        if let Some(reason) = &inner.reject_reason {
            return Err(AuthorityError::Rejected(reason.clone()));
        }
        inner.submitted.push(tx.clone());
        Ok(())
    }

    async fn subscribe_state_changes(
        &self,
        chain_id: ChainId,
    ) -> Result<NotificationStream, AuthorityError> {
        let mut inner = lock(&self.inner);
        inner.calls.subscribe += 1;
        if let Some(e) = inner.subscribe_failures.pop_front() {
            return Err(e);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        inner.subscribers.push((chain_id, tx));
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }
}
