//! Whatever blocks the authority serves, a cycle either commits a state that conserves
//! the coinbase supply or commits nothing.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tessera_node::{SyncConfig, SyncEngine, SyncManager};
use tessera_nullables::{null_store, test_key, ChainBuilder, NullAuthority};
use tessera_store::{AccountFilter, AccountStore, ChainStateStore, LedgerStore};
use tessera_types::{Amount, ChainId};

const CHAIN: ChainId = ChainId::new(5);
const SUPPLY: Amount = 10_000;
const FEE: Amount = 3;

/// (sender, recipient, value); index 0 is the coinbase.
fn transfers() -> impl Strategy<Value = Vec<(usize, usize, Amount)>> {
    prop::collection::vec((0usize..3, 0usize..3, 0u64..4_000), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn supply_is_conserved_or_cycle_discarded(plan in transfers()) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let mut chain = ChainBuilder::new(CHAIN, SUPPLY, FEE).unwrap();
            let authority = Arc::new(NullAuthority::new());
            authority.set_genesis(chain.genesis().clone());
            let (alice_key, alice) = test_key(1).unwrap();
            let (bob_key, bob) = test_key(2).unwrap();
            let accounts = [chain.authority(), alice, bob];

            let mut txs = Vec::new();
            for (nonce, (from, to, value)) in plan.iter().enumerate() {
                let key = match from {
                    0 => chain.authority_key(),
                    1 => &alice_key,
                    _ => &bob_key,
                };
                txs.push(chain.coin(key, nonce as u64 + 1, accounts[*to], *value).unwrap());
            }
            for pair in txs.chunks(2) {
                let block = chain.block(pair.to_vec()).unwrap();
                authority.publish_block(block);
            }

            let mut config = SyncConfig::new(CHAIN);
            config.block_fetch_delay = Duration::ZERO;
            let manager = SyncManager::new(SyncEngine::new(config, authority).unwrap(), null_store());
            let result = manager.sync_now().await;

            let txn = manager.store().begin().unwrap();
            let total: Amount = txn
                .list_accounts(&AccountFilter::chain(CHAIN))
                .unwrap()
                .iter()
                .map(|a| a.balance)
                .sum();
            let head = txn.get_chain_state(CHAIN).unwrap();
            match result {
                Ok(outcome) => {
                    assert_eq!(total, SUPPLY);
                    assert_eq!(head.unwrap().latest_hash, outcome.head.latest_hash);
                }
                Err(_) => {
                    assert_eq!(total, 0);
                    assert!(head.is_none());
                }
            }
        });
    }
}
