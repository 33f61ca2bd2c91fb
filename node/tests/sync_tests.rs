//! Sync engine scenarios against the scripted authority and the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use tessera_ledger::{BlockchainState, PendingTransaction, SignedTransaction};
use tessera_network::AuthorityError;
use tessera_node::{SyncConfig, SyncEngine, SyncError, SyncOutcome, SyncStatus};
use tessera_nullables::{null_store, test_key, ChainBuilder, NullAuthority, NullStore};
use tessera_store::{
    AccountFilter, AccountStore, ChainStateStore, GenesisStore, LedgerStore, LedgerTxn,
    PendingTxStore, TokenStore,
};
use tessera_types::{Address, Amount, BlockHash, ChainId, Nonce, TokenId};

const CHAIN: ChainId = ChainId::new(1);
const SUPPLY: Amount = 1_000_000;
const FEE: Amount = 5;

struct Harness {
    chain: ChainBuilder,
    authority: Arc<NullAuthority>,
    store: NullStore,
}

impl Harness {
    fn new() -> Self {
        let chain = ChainBuilder::new(CHAIN, SUPPLY, FEE).unwrap();
        let authority = Arc::new(NullAuthority::new());
        authority.set_genesis(chain.genesis().clone());
        Self {
            chain,
            authority,
            store: null_store(),
        }
    }

    fn config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(CHAIN);
        config.block_fetch_delay = Duration::ZERO;
        config.authority_address = Some(self.chain.authority());
        config
    }

    fn engine(&self) -> SyncEngine<Arc<NullAuthority>> {
        SyncEngine::new(self.config(), Arc::clone(&self.authority)).unwrap()
    }

    /// One cycle, committed on success and discarded on failure.
    async fn sync_with(&self, engine: &SyncEngine<Arc<NullAuthority>>) -> Result<SyncOutcome, SyncError> {
        let mut txn = self.store.begin().unwrap();
        match engine.sync(&mut txn).await {
            Ok(outcome) => {
                txn.commit().unwrap();
                Ok(outcome)
            }
            Err(e) => {
                txn.discard();
                Err(e)
            }
        }
    }

    async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        self.sync_with(&self.engine()).await
    }

    fn publish(&mut self, transactions: Vec<SignedTransaction>) {
        let block = self.chain.block(transactions).unwrap();
        self.authority.publish_block(block);
    }

    fn authority_state(&self) -> BlockchainState {
        BlockchainState::at_block(self.chain.head().hash, &self.chain.head().header)
    }

    fn balance(&self, address: Address) -> Option<Amount> {
        let txn = self.store.begin().unwrap();
        txn.get_account(CHAIN, &address).unwrap().map(|a| a.balance)
    }

    fn head_number(&self) -> Option<u64> {
        let txn = self.store.begin().unwrap();
        txn.get_chain_state(CHAIN)
            .unwrap()
            .map(|s| s.latest_block_number)
    }

    fn total_supply(&self) -> Amount {
        let txn = self.store.begin().unwrap();
        txn.list_accounts(&AccountFilter::chain(CHAIN))
            .unwrap()
            .iter()
            .map(|a| a.balance)
            .sum()
    }
}

#[tokio::test]
async fn genesis_bootstrap_seeds_coinbase_and_token() {
    let h = Harness::new();
    let outcome = h.sync().await.unwrap();

    assert_eq!(outcome.status, SyncStatus::InSync);
    let coinbase = h.chain.authority();
    assert_eq!(h.balance(coinbase), Some(SUPPLY));

    let txn = h.store.begin().unwrap();
    let token = txn.get_token(CHAIN, TokenId::GENESIS).unwrap().unwrap();
    assert_eq!(token.owner, coinbase);
    assert!(txn.get_genesis(CHAIN).unwrap().is_some());
    assert_eq!(
        txn.get_chain_state(CHAIN).unwrap().unwrap().latest_hash,
        h.chain.genesis().hash()
    );
}

#[tokio::test]
async fn authority_without_genesis_is_fatal() {
    let h = Harness::new();
    let engine = SyncEngine::new(h.config(), Arc::new(NullAuthority::new())).unwrap();
    let err = h.sync_with(&engine).await.unwrap_err();
    assert!(matches!(err, SyncError::GenesisUnavailable(id) if id == CHAIN));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn sync_at_head_writes_nothing() {
    let mut h = Harness::new();
    let (_, alice) = test_key(1).unwrap();
    let grant = h.chain.coin(h.chain.authority_key(), 1, alice, 500).unwrap();
    h.publish(vec![grant]);
    h.sync().await.unwrap();
    let before = h.authority.calls();

    let mut txn = h.store.begin().unwrap();
    let outcome = h.engine().sync(&mut txn).await.unwrap();
    assert_eq!(outcome.status, SyncStatus::InSync);
    assert_eq!(outcome.blocks_applied, 0);
    assert_eq!(txn.pending_writes(), 0);
    txn.discard();

    let after = h.authority.calls();
    assert_eq!(after.chain_state, before.chain_state + 1);
    assert_eq!(after.block_by_number, before.block_by_number);
    assert_eq!(after.block_by_hash, before.block_by_hash);
}

#[tokio::test]
async fn catch_up_conserves_supply_and_collects_fees() {
    let mut h = Harness::new();
    let coinbase = h.chain.authority();
    let (alice_key, alice) = test_key(1).unwrap();
    let (_, bob) = test_key(2).unwrap();

    let grant = h.chain.coin(h.chain.authority_key(), 1, alice, 10_000).unwrap();
    h.publish(vec![grant]);
    let pay = h.chain.coin(&alice_key, 0, bob, 1_000).unwrap();
    h.publish(vec![pay]);

    let outcome = h.sync().await.unwrap();
    assert_eq!(outcome.status, SyncStatus::CaughtUp);
    assert_eq!(outcome.blocks_applied, 2);
    assert_eq!(h.head_number(), Some(2));

    assert_eq!(h.balance(coinbase), Some(SUPPLY - 10_000 + FEE + FEE));
    assert_eq!(h.balance(alice), Some(10_000 - FEE - 1_000));
    assert_eq!(h.balance(bob), Some(1_000 - FEE));
    assert_eq!(h.total_supply(), SUPPLY);
}

#[tokio::test]
async fn sync_resumes_from_local_head() {
    let mut h = Harness::new();
    let (_, alice) = test_key(1).unwrap();
    let grant = h.chain.coin(h.chain.authority_key(), 1, alice, 100).unwrap();
    h.publish(vec![grant]);
    h.sync().await.unwrap();

    let grant = h.chain.coin(h.chain.authority_key(), 2, alice, 100).unwrap();
    h.publish(vec![grant]);
    let outcome = h.sync().await.unwrap();
    assert_eq!(outcome.blocks_applied, 1);
    assert_eq!(h.balance(alice), Some(2 * (100 - FEE)));
}

#[tokio::test]
async fn broken_hash_chain_aborts_before_applying() {
    let mut h = Harness::new();
    let (_, alice) = test_key(1).unwrap();
    let grant = h.chain.coin(h.chain.authority_key(), 1, alice, 100).unwrap();
    h.publish(vec![grant]);
    let grant = h.chain.coin(h.chain.authority_key(), 2, alice, 100).unwrap();
    let forged = h
        .chain
        .block_with(vec![grant], |header| {
            header.prev_block_hash = BlockHash::new([0xEE; 32]);
        })
        .unwrap();
    h.authority.publish_block(forged);

    let err = h.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::BrokenHashChain { number: 2, .. }));
    // The whole cycle was discarded, genesis bootstrap included.
    assert_eq!(h.balance(alice), None);
    assert_eq!(h.head_number(), None);
}

#[tokio::test]
async fn advertised_head_that_cannot_be_served_is_fatal() {
    let mut h = Harness::new();
    h.publish(vec![]);
    let head = h.chain.head().hash;
    h.authority.forget_block(CHAIN, &head);

    let err = h.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::HeadUnavailable { hash, .. } if hash == head));
}

#[tokio::test]
async fn debit_from_unknown_account_is_fatal() {
    let mut h = Harness::new();
    let (stranger_key, _) = test_key(7).unwrap();
    let (_, bob) = test_key(2).unwrap();
    let tx = h.chain.coin(&stranger_key, 0, bob, 50).unwrap();
    h.publish(vec![tx]);

    let err = h.sync().await.unwrap_err();
    assert!(matches!(err, SyncError::MissingAccount { operation: "coin debit", .. }));
    assert_eq!(h.balance(bob), None);
}

#[tokio::test]
async fn foreign_validator_is_rejected() {
    let h = Harness::new();
    let (_, impostor) = test_key(9).unwrap();
    let mut config = h.config();
    config.authority_address = Some(impostor);
    let engine = SyncEngine::new(config, Arc::clone(&h.authority)).unwrap();
    let err = h.sync_with(&engine).await.unwrap_err();
    assert!(matches!(err, SyncError::InvalidBlock { number: 0, .. }));
}

#[tokio::test]
async fn zero_chain_id_is_rejected_before_any_request() {
    let h = Harness::new();
    let result = SyncEngine::new(SyncConfig::new(ChainId::new(0)), Arc::clone(&h.authority));
    assert!(matches!(result, Err(SyncError::ZeroChainId)));
    assert_eq!(h.authority.calls().total(), 0);
}

#[tokio::test]
async fn state_for_another_chain_is_rejected() {
    let mut h = Harness::new();
    h.sync().await.unwrap();
    h.publish(vec![]);
    let mut state = h.authority_state();
    state.chain_id = ChainId::new(2);
    h.authority.serve_chain_state(CHAIN, state);

    let err = h.sync().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::ChainMismatch { expected, actual } if expected == CHAIN && actual == ChainId::new(2)
    ));
    assert!(!err.is_transient());
    assert_eq!(h.head_number(), Some(0));
    assert_eq!(h.authority.calls().block_by_hash, 0);
}

#[tokio::test]
async fn transient_failure_discards_then_recovers() {
    let mut h = Harness::new();
    let (_, alice) = test_key(1).unwrap();
    h.sync().await.unwrap();
    for nonce in 1..=2 {
        let grant = h.chain.coin(h.chain.authority_key(), nonce, alice, 100).unwrap();
        h.publish(vec![grant]);
    }

    h.authority.fail_next(AuthorityError::Timeout {
        operation: "get_chain_state",
    });
    let err = h.sync().await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(h.head_number(), Some(0));

    let outcome = h.sync().await.unwrap();
    assert_eq!(outcome.blocks_applied, 2);
    assert_eq!(h.balance(alice), Some(2 * (100 - FEE)));
}

#[tokio::test]
async fn token_moves_to_recipient() {
    let mut h = Harness::new();
    let coinbase = h.chain.authority();
    let (_, alice) = test_key(1).unwrap();
    let give = h
        .chain
        .token(h.chain.authority_key(), 1, alice, TokenId::GENESIS, 1)
        .unwrap();
    h.publish(vec![give]);
    h.sync().await.unwrap();

    let txn = h.store.begin().unwrap();
    let token = txn.get_token(CHAIN, TokenId::GENESIS).unwrap().unwrap();
    assert_eq!(token.owner, alice);
    assert_eq!(token.nonce, Nonce::from(1u64));
    assert_eq!(txn.count_tokens_by_owner(CHAIN, &coinbase).unwrap(), 0);
    drop(txn);
    // The coinbase paid the fee to itself.
    assert_eq!(h.balance(coinbase), Some(SUPPLY));
    assert_eq!(h.balance(alice), Some(0));
}

#[tokio::test]
async fn confirmed_pending_transaction_is_removed_and_reported() {
    let mut h = Harness::new();
    let (alice_key, alice) = test_key(1).unwrap();
    let (bob_key, bob) = test_key(2).unwrap();
    let grant = h.chain.coin(h.chain.authority_key(), 1, alice, 1_000).unwrap();
    h.publish(vec![grant]);
    let mut config = h.config();
    config.wallet_address = Some(alice);
    let engine = SyncEngine::new(config, Arc::clone(&h.authority)).unwrap();
    h.sync_with(&engine).await.unwrap();

    let ours = h.chain.coin(&alice_key, 1, bob, 300).unwrap();
    let mut txn = h.store.begin().unwrap();
    txn.upsert_pending(&PendingTransaction::new(ours.clone())).unwrap();
    txn.commit().unwrap();

    // Another sender reusing the same nonce must not clear our record.
    let grant_bob = h.chain.coin(h.chain.authority_key(), 2, bob, 50).unwrap();
    h.publish(vec![grant_bob]);
    let theirs = h.chain.coin(&bob_key, 1, alice, 10).unwrap();
    h.publish(vec![theirs]);
    let outcome = h.sync_with(&engine).await.unwrap();
    assert!(outcome.confirmed.is_empty());
    assert_eq!(h.store.begin().unwrap().list_pending(CHAIN).unwrap().len(), 1);

    h.publish(vec![ours.clone()]);
    let outcome = h.sync_with(&engine).await.unwrap();
    assert_eq!(outcome.confirmed.len(), 1);
    assert_eq!(outcome.confirmed[0].hash, ours.hash().unwrap());
    assert_eq!(outcome.local_account.unwrap().balance, 1_000 - FEE - 300 + 10 - FEE);
    assert!(h.store.begin().unwrap().list_pending(CHAIN).unwrap().is_empty());
}

#[tokio::test]
async fn state_hashes_are_cross_checked_when_enabled() {
    let mut h = Harness::new();
    let (_, alice) = test_key(1).unwrap();
    let grant = h.chain.coin(h.chain.authority_key(), 1, alice, 100).unwrap();
    h.publish(vec![grant]);

    // A plain replica computes the hashes the authority should advertise.
    h.sync().await.unwrap();
    let txn = h.store.begin().unwrap();
    let accounts = txn.account_hash_state(CHAIN).unwrap();
    let tokens = txn.token_hash_state(CHAIN).unwrap();
    drop(txn);

    let mut config = h.config();
    config.verify_state_hashes = true;
    let verifying = SyncEngine::new(config, Arc::clone(&h.authority)).unwrap();

    let mut state = h.authority_state();
    state.account_hash_state = accounts;
    state.token_hash_state = tokens;
    h.authority.set_chain_state(state.clone());
    let fresh = null_store();
    let mut txn = fresh.begin().unwrap();
    verifying.sync(&mut txn).await.unwrap();
    txn.discard();

    state.account_hash_state = BlockHash::new([3; 32]);
    h.authority.set_chain_state(state);
    let mut txn = fresh.begin().unwrap();
    let err = verifying.sync(&mut txn).await.unwrap_err();
    assert!(matches!(err, SyncError::StateHashMismatch { table: "account", .. }));
}
