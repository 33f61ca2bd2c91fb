//! Sync manager and supervisor behaviour over the nullable authority.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tessera_network::AuthorityError;
use tessera_node::{ShutdownController, Supervisor, SyncConfig, SyncEngine, SyncError, SyncEvent, SyncManager};
use tessera_nullables::{null_store, test_key, ChainBuilder, NullAuthority, NullStore};
use tessera_store::{ChainStateStore, GenesisStore, LedgerStore, StoreError};
use tessera_types::{Address, ChainId};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::timeout;

const CHAIN: ChainId = ChainId::new(3);
const WAIT: Duration = Duration::from_secs(5);

type TestManager = SyncManager<NullStore, Arc<NullAuthority>>;

fn setup(wallet: Option<Address>) -> (ChainBuilder, Arc<NullAuthority>, Arc<TestManager>) {
    let chain = ChainBuilder::new(CHAIN, 10_000, 2).unwrap();
    let authority = Arc::new(NullAuthority::new());
    authority.set_genesis(chain.genesis().clone());
    let manager = manager_for(&chain, &authority, wallet);
    (chain, authority, manager)
}

fn manager_for(
    chain: &ChainBuilder,
    authority: &Arc<NullAuthority>,
    wallet: Option<Address>,
) -> Arc<TestManager> {
    let mut config = SyncConfig::new(CHAIN);
    config.block_fetch_delay = Duration::ZERO;
    config.authority_address = Some(chain.authority());
    config.wallet_address = wallet;
    let engine = SyncEngine::new(config, Arc::clone(authority)).unwrap();
    Arc::new(SyncManager::new(engine, null_store()).with_resubscribe_delay(Duration::from_millis(10)))
}

fn spawn_run(
    manager: &Arc<TestManager>,
    shutdown: &ShutdownController,
) -> tokio::task::JoinHandle<Result<(), SyncError>> {
    let manager = Arc::clone(manager);
    let receiver = shutdown.subscribe();
    tokio::spawn(async move { manager.run(receiver).await })
}

async fn eventually(mut condition: impl FnMut() -> bool) {
    timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

async fn within<T>(future: impl Future<Output = T>) -> T {
    timeout(WAIT, future).await.expect("timed out")
}

async fn next_synced(events: &mut tokio::sync::broadcast::Receiver<SyncEvent>) -> u64 {
    loop {
        if let SyncEvent::Synced { number, .. } = within(events.recv()).await.unwrap() {
            return number;
        }
    }
}

fn head_number(manager: &TestManager) -> Option<u64> {
    let txn = manager.store().begin().unwrap();
    txn.get_chain_state(CHAIN)
        .unwrap()
        .map(|s| s.latest_block_number)
}

fn grant(chain: &mut ChainBuilder, authority: &NullAuthority, nonce: u64) {
    let (_, alice) = test_key(1).unwrap();
    let tx = chain.coin(chain.authority_key(), nonce, alice, 100).unwrap();
    authority.publish_block(chain.block(vec![tx]).unwrap());
}

#[tokio::test]
async fn notifications_drive_cycles_until_shutdown() {
    let (mut chain, authority, manager) = setup(None);
    let mut events = manager.subscribe_events();
    let shutdown = ShutdownController::new();
    let handle = spawn_run(&manager, &shutdown);

    eventually(|| authority.subscriber_count() == 1).await;
    assert_eq!(head_number(&manager), Some(0));

    grant(&mut chain, &authority, 1);
    assert_eq!(authority.notify(CHAIN), 1);
    assert_eq!(next_synced(&mut events).await, 1);

    // Notifications for other chains are ignored.
    grant(&mut chain, &authority, 2);
    authority.notify(ChainId::new(99));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(head_number(&manager), Some(1));

    shutdown.shutdown();
    within(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_lets_an_in_flight_cycle_commit() {
    let (mut chain, authority, manager) = setup(None);
    let shutdown = ShutdownController::new();
    let handle = spawn_run(&manager, &shutdown);
    eventually(|| authority.subscriber_count() == 1).await;

    // Block 1 is fetched by number and parks there; block 2 is the head.
    authority.hold_block_fetches();
    grant(&mut chain, &authority, 1);
    grant(&mut chain, &authority, 2);
    authority.notify(CHAIN);
    eventually(|| authority.calls().block_by_number == 1).await;

    shutdown.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!handle.is_finished());
    assert_eq!(head_number(&manager), Some(0));

    authority.release_block_fetches();
    within(handle).await.unwrap().unwrap();
    assert_eq!(head_number(&manager), Some(2));
}

#[tokio::test]
async fn closed_subscription_resubscribes_and_catches_up() {
    let (mut chain, authority, manager) = setup(None);
    let mut events = manager.subscribe_events();
    let shutdown = ShutdownController::new();
    let handle = spawn_run(&manager, &shutdown);
    eventually(|| authority.subscriber_count() == 1).await;

    // Published while nobody listens; the post-subscribe cycle picks it up.
    grant(&mut chain, &authority, 1);
    authority.close_subscriptions();

    assert_eq!(next_synced(&mut events).await, 1);
    eventually(|| authority.subscriber_count() == 1).await;
    assert_eq!(authority.calls().subscribe, 2);

    shutdown.shutdown();
    within(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn subscription_timeout_backs_off_and_retries() {
    let (_, authority, manager) = setup(None);
    authority.fail_next_subscribe(AuthorityError::Timeout {
        operation: "subscribe_state_changes",
    });
    let shutdown = ShutdownController::new();
    let handle = spawn_run(&manager, &shutdown);

    eventually(|| authority.subscriber_count() == 1).await;
    assert_eq!(authority.calls().subscribe, 2);

    shutdown.shutdown();
    within(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn other_subscription_errors_end_the_run() {
    let (_, authority, manager) = setup(None);
    authority.fail_next_subscribe(AuthorityError::Transport {
        operation: "subscribe_state_changes",
        message: "connection refused".into(),
    });
    let shutdown = ShutdownController::new();
    let result = within(spawn_run(&manager, &shutdown)).await.unwrap();
    assert!(matches!(
        result,
        Err(SyncError::Authority(AuthorityError::Transport { .. }))
    ));
}

#[tokio::test]
async fn fatal_startup_cycle_ends_the_run() {
    let chain = ChainBuilder::new(CHAIN, 10_000, 2).unwrap();
    let authority = Arc::new(NullAuthority::new());
    let manager = manager_for(&chain, &authority, None);
    let shutdown = ShutdownController::new();
    let result = within(spawn_run(&manager, &shutdown)).await.unwrap();
    assert!(matches!(result, Err(SyncError::GenesisUnavailable(_))));
    assert_eq!(authority.calls().subscribe, 0);
}

#[tokio::test]
async fn transient_cycle_failure_waits_for_next_notification() {
    let (mut chain, authority, manager) = setup(None);
    let mut events = manager.subscribe_events();
    let shutdown = ShutdownController::new();
    let handle = spawn_run(&manager, &shutdown);
    eventually(|| authority.subscriber_count() == 1).await;
    // Startup and post-subscribe cycles have both read the chain state.
    eventually(|| authority.calls().chain_state >= 2).await;

    grant(&mut chain, &authority, 1);
    let before = authority.calls().chain_state;
    authority.fail_next(AuthorityError::Timeout {
        operation: "get_chain_state",
    });
    authority.notify(CHAIN);
    eventually(|| authority.calls().chain_state > before).await;
    assert_eq!(head_number(&manager), Some(0));

    authority.notify(CHAIN);
    assert_eq!(next_synced(&mut events).await, 1);
    assert!(!handle.is_finished());

    shutdown.shutdown();
    within(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn shutdown_during_backoff_returns_promptly() {
    let (chain, authority, _) = setup(None);
    let mut config = SyncConfig::new(CHAIN);
    config.block_fetch_delay = Duration::ZERO;
    config.authority_address = Some(chain.authority());
    let manager = Arc::new(
        SyncManager::new(SyncEngine::new(config, Arc::clone(&authority)).unwrap(), null_store())
            .with_resubscribe_delay(Duration::from_secs(3600)),
    );
    authority.fail_next_subscribe(AuthorityError::Timeout {
        operation: "subscribe_state_changes",
    });
    let shutdown = ShutdownController::new();
    let handle = spawn_run(&manager, &shutdown);
    eventually(|| authority.calls().subscribe == 1).await;

    shutdown.shutdown();
    within(handle).await.unwrap().unwrap();
}

#[tokio::test]
async fn failed_commit_publishes_nothing() {
    let (_, alice) = test_key(1).unwrap();
    let (mut chain, authority, manager) = setup(Some(alice));
    let mut events = manager.subscribe_events();
    grant(&mut chain, &authority, 1);

    manager.store().backend().fail_commits(true);
    let err = manager.sync_now().await.unwrap_err();
    assert!(matches!(err, SyncError::Store { source: StoreError::Backend(_), .. }));
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    assert!(manager.local_account().is_none());
    assert!(manager
        .store()
        .begin()
        .unwrap()
        .get_genesis(CHAIN)
        .unwrap()
        .is_none());

    manager.store().backend().fail_commits(false);
    let outcome = manager.sync_now().await.unwrap();
    assert_eq!(outcome.blocks_applied, 1);
    assert_eq!(manager.local_account().unwrap().balance, 98);
    assert!(matches!(events.try_recv(), Ok(SyncEvent::Synced { number: 1, .. })));
}

#[tokio::test]
async fn supervisor_restarts_until_the_authority_recovers() {
    let chain = ChainBuilder::new(CHAIN, 10_000, 2).unwrap();
    let authority = Arc::new(NullAuthority::new());
    let manager = manager_for(&chain, &authority, None);
    let shutdown = Arc::new(ShutdownController::new());

    let handle = tokio::spawn({
        let manager = Arc::clone(&manager);
        let shutdown = Arc::clone(&shutdown);
        async move {
            let manager = &manager;
            Supervisor::new(Duration::from_millis(10))
                .run(&shutdown, move |receiver| manager.run(receiver))
                .await
        }
    });

    eventually(|| authority.calls().genesis >= 2).await;
    authority.set_genesis(chain.genesis().clone());
    eventually(|| authority.subscriber_count() == 1).await;
    assert_eq!(head_number(&manager), Some(0));

    shutdown.shutdown();
    within(handle).await.unwrap().unwrap();
}
