//! Restarts a failed sync manager until shutdown.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::error::SyncError;
use crate::metrics::SyncMetrics;
use crate::shutdown::ShutdownController;

pub struct Supervisor {
    restart_delay: Duration,
    /// Give up after this many restarts over the supervisor's lifetime. `None` restarts forever.
    max_restarts: Option<u32>,
    metrics: Option<Arc<SyncMetrics>>,
}

impl Supervisor {
    pub fn new(restart_delay: Duration) -> Self {
        Self {
            restart_delay,
            max_restarts: None,
            metrics: None,
        }
    }

    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = Some(max);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<SyncMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run `task` with a fresh shutdown receiver, restarting it after `restart_delay`
    /// whenever it fails. Returns `Ok` once the task exits cleanly or shutdown is
    /// requested, and the last error once the restart budget is spent.
    pub async fn run<F, Fut>(&self, shutdown: &ShutdownController, mut task: F) -> Result<(), SyncError>
    where
        F: FnMut(broadcast::Receiver<()>) -> Fut,
        Fut: Future<Output = Result<(), SyncError>>,
    {
        let mut restarts = 0u32;
        loop {
            let receiver = shutdown.subscribe();
            if shutdown.is_shutdown() {
                return Ok(());
            }
            let error = match task(receiver).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            if self.max_restarts.is_some_and(|max| restarts >= max) {
                tracing::error!(error = %error, restarts, "sync manager failed, giving up");
                return Err(error);
            }
            restarts += 1;
            if let Some(metrics) = &self.metrics {
                metrics.restarts.inc();
            }
            tracing::error!(
                error = %error,
                restarts,
                delay = ?self.restart_delay,
                "sync manager failed, restarting"
            );

            let mut waiter = shutdown.subscribe();
            if shutdown.is_shutdown() {
                return Ok(());
            }
            tokio::select! {
                _ = waiter.recv() => return Ok(()),
                _ = tokio::time::sleep(self.restart_delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tessera_types::ChainId;

    #[tokio::test]
    async fn restarts_until_budget_spent() {
        let controller = ShutdownController::new();
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let supervisor = Supervisor::new(Duration::ZERO).with_max_restarts(2);
        let result = supervisor
            .run(&controller, move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(SyncError::GenesisUnavailable(ChainId::new(1)))
            })
            .await;
        assert!(matches!(result, Err(SyncError::GenesisUnavailable(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn clean_exit_is_not_restarted() {
        let controller = ShutdownController::new();
        let attempts = AtomicU32::new(0);
        let counter = &attempts;
        let supervisor = Supervisor::new(Duration::ZERO);
        supervisor
            .run(&controller, move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_interrupts_restart_delay() {
        let controller = ShutdownController::new();
        let supervisor = Supervisor::new(Duration::from_secs(3600));
        let run = supervisor.run(&controller, |_| async {
            Err(SyncError::GenesisUnavailable(ChainId::new(1)))
        });
        let stop = async {
            tokio::task::yield_now().await;
            controller.shutdown();
        };
        let (result, ()) = tokio::join!(run, stop);
        assert!(result.is_ok());
    }
}
