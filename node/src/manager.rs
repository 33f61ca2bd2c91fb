//! Schedules sync cycles and keeps each one transactional.
//!
//! A cycle is begin → [`SyncEngine::sync`] → commit on success, discard on error. Cycles
//! never interleave: startup, notification-driven and manual cycles all take the same
//! cycle lock. The notification wait is cancelable through the shutdown signal; a
//! running cycle always finishes.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::StreamExt;
use tessera_network::{AuthorityClient, NotificationStream};
use tessera_store::{Account, LedgerStore, LedgerTxn};
use tessera_types::ChainId;
use tokio::sync::{broadcast, Mutex};
use tracing::Instrument;

use crate::engine::{SyncEngine, SyncOutcome, SyncStatus};
use crate::error::{StoreContext, SyncError};
use crate::events::SyncEvent;
use crate::metrics::SyncMetrics;
use crate::tracing_spans::{subscription_span, sync_cycle_span};

const DEFAULT_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(10);
const EVENT_CAPACITY: usize = 256;

pub struct SyncManager<S, A> {
    engine: SyncEngine<A>,
    store: S,
    cycle_lock: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
    snapshot: RwLock<Option<Account>>,
    metrics: Option<Arc<SyncMetrics>>,
    resubscribe_delay: Duration,
}

/// How a notification stream ended.
enum StreamEnd {
    Shutdown,
    Resubscribe,
}

impl<S: LedgerStore, A: AuthorityClient> SyncManager<S, A> {
    pub fn new(engine: SyncEngine<A>, store: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            store,
            cycle_lock: Mutex::new(()),
            events,
            snapshot: RwLock::new(None),
            metrics: None,
            resubscribe_delay: DEFAULT_RESUBSCRIBE_DELAY,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<SyncMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Backoff after a subscription timeout.
    pub fn with_resubscribe_delay(mut self, delay: Duration) -> Self {
        self.resubscribe_delay = delay;
        self
    }

    pub fn chain_id(&self) -> ChainId {
        self.engine.chain_id()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Cached wallet account as of the last committed cycle.
    pub fn local_account(&self) -> Option<Account> {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Run one cycle now, waiting for any cycle in progress to finish first.
    pub async fn sync_now(&self) -> Result<SyncOutcome, SyncError> {
        let _cycle = self.cycle_lock.lock().await;
        self.run_cycle()
            .instrument(sync_cycle_span(self.chain_id()))
            .await
    }

    async fn run_cycle(&self) -> Result<SyncOutcome, SyncError> {
        let mut txn = self.store.begin().during("begin cycle")?;
        match self.engine.sync(&mut txn).await {
            Ok(outcome) => {
                let writes = txn.pending_writes();
                txn.commit().during("commit cycle")?;
                tracing::debug!(writes, status = ?outcome.status, "cycle committed");
                self.publish(&outcome);
                Ok(outcome)
            }
            Err(e) => {
                txn.discard();
                if let Some(metrics) = &self.metrics {
                    metrics.cycle_failures.inc();
                }
                tracing::warn!(error = %e, transient = e.is_transient(), "cycle discarded");
                Err(e)
            }
        }
    }

    /// Side effects that must only follow a commit.
    fn publish(&self, outcome: &SyncOutcome) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = outcome.local_account.clone(),
            Err(poisoned) => *poisoned.into_inner() = outcome.local_account.clone(),
        }
        if let Some(metrics) = &self.metrics {
            metrics.cycles.inc();
            metrics.blocks_applied.inc_by(outcome.blocks_applied);
            metrics.confirmations.inc_by(outcome.confirmed.len() as u64);
            metrics
                .head_block_number
                .set(i64::try_from(outcome.head.latest_block_number).unwrap_or(i64::MAX));
        }
        if outcome.status == SyncStatus::CaughtUp {
            let _ = self.events.send(SyncEvent::Synced {
                chain_id: outcome.head.chain_id,
                head: outcome.head.latest_hash,
                number: outcome.head.latest_block_number,
                blocks_applied: outcome.blocks_applied,
            });
        }
        for confirmed in &outcome.confirmed {
            tracing::info!(hash = %confirmed.hash, block = confirmed.block_number, "transaction confirmed");
            let _ = self.events.send(SyncEvent::Confirmed(confirmed.clone()));
        }
    }

    /// Startup cycle, then one cycle per state-change notification until shutdown.
    ///
    /// Returns `Ok` on shutdown. Fatal cycle errors and non-timeout subscription errors
    /// are returned for the supervisor to handle.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<(), SyncError> {
        self.sync_now().await?;

        loop {
            let subscribed = tokio::select! {
                _ = shutdown.recv() => return Ok(()),
                result = self.engine.authority().subscribe_state_changes(self.chain_id()) => result,
            };
            let stream = match subscribed {
                Ok(stream) => stream,
                Err(e) if e.is_timeout() => {
                    tracing::warn!(error = %e, delay = ?self.resubscribe_delay, "subscription timed out, retrying");
                    if self.backoff(&mut shutdown).await {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            // Anything published while unsubscribed.
            self.tolerate(self.sync_now().await)?;

            let end = self
                .drain(stream, &mut shutdown)
                .instrument(subscription_span(self.chain_id()))
                .await?;
            match end {
                StreamEnd::Shutdown => return Ok(()),
                StreamEnd::Resubscribe => continue,
            }
        }
    }

    async fn drain(
        &self,
        mut stream: NotificationStream,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<StreamEnd, SyncError> {
        loop {
            let next = tokio::select! {
                _ = shutdown.recv() => return Ok(StreamEnd::Shutdown),
                item = stream.next() => item,
            };
            match next {
                Some(Ok(notification)) if notification.chain_id == self.chain_id() => {
                    tracing::debug!("authority advanced");
                    self.tolerate(self.sync_now().await)?;
                }
                Some(Ok(notification)) => {
                    tracing::trace!(chain = %notification.chain_id, "notification for another chain");
                }
                Some(Err(e)) if e.is_timeout() => {
                    tracing::warn!(error = %e, "subscription timed out, resubscribing");
                    if self.backoff(shutdown).await {
                        return Ok(StreamEnd::Shutdown);
                    }
                    return Ok(StreamEnd::Resubscribe);
                }
                Some(Err(e)) => return Err(e.into()),
                None => {
                    tracing::info!("subscription closed by authority, resubscribing");
                    return Ok(StreamEnd::Resubscribe);
                }
            }
        }
    }

    /// Transient cycle failures are retried by the next notification.
    fn tolerate(&self, result: Result<SyncOutcome, SyncError>) -> Result<(), SyncError> {
        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "transient sync failure, waiting for next notification");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Sleep for the resubscribe delay. Returns `true` if shutdown arrived first.
    async fn backoff(&self, shutdown: &mut broadcast::Receiver<()>) -> bool {
        tokio::select! {
            _ = shutdown.recv() => true,
            _ = tokio::time::sleep(self.resubscribe_delay) => false,
        }
    }
}
