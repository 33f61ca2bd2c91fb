//! Production wiring: LMDB store, HTTP authority, supervised sync manager.

use std::sync::Arc;
use std::time::Duration;

use tessera_network::HttpAuthority;
use tessera_store_lmdb::{open_store, LmdbStore};
use tokio::net::TcpListener;

use crate::config::NodeConfig;
use crate::engine::{SyncEngine, SyncOutcome};
use crate::error::NodeError;
use crate::manager::SyncManager;
use crate::metrics::SyncMetrics;
use crate::metrics_server::serve_metrics;
use crate::shutdown::ShutdownController;
use crate::supervisor::Supervisor;

pub type HttpSyncManager = SyncManager<LmdbStore, Arc<HttpAuthority>>;

pub struct TesseraNode {
    config: NodeConfig,
    manager: HttpSyncManager,
    authority: Arc<HttpAuthority>,
    metrics: Arc<SyncMetrics>,
}

impl TesseraNode {
    pub fn open(config: NodeConfig) -> Result<Self, NodeError> {
        let sync_config = config.sync_config()?;
        let store = open_store(&config.data_dir, Some(config.map_size()))?;
        let authority = Arc::new(HttpAuthority::new(config.authority_config())?);
        let metrics = Arc::new(SyncMetrics::new()?);
        let manager = SyncManager::new(SyncEngine::new(sync_config, Arc::clone(&authority))?, store)
            .with_metrics(Arc::clone(&metrics))
            .with_resubscribe_delay(Duration::from_secs(config.resubscribe_delay_secs));
        tracing::info!(
            chain = config.chain_id,
            authority = %config.authority_url,
            data_dir = %config.data_dir.display(),
            "node opened"
        );
        Ok(Self {
            config,
            manager,
            authority,
            metrics,
        })
    }

    pub fn manager(&self) -> &HttpSyncManager {
        &self.manager
    }

    pub fn authority(&self) -> Arc<HttpAuthority> {
        Arc::clone(&self.authority)
    }

    pub fn store(&self) -> &LmdbStore {
        self.manager.store()
    }

    pub fn metrics(&self) -> &SyncMetrics {
        &self.metrics
    }

    /// One sync cycle, then return.
    pub async fn sync_once(&self) -> Result<SyncOutcome, NodeError> {
        Ok(self.manager.sync_now().await?)
    }

    /// Keep the replica in sync until `shutdown` fires.
    pub async fn run(&self, shutdown: &ShutdownController) -> Result<(), NodeError> {
        let supervisor = Supervisor::new(Duration::from_secs(self.config.restart_delay_secs))
            .with_metrics(Arc::clone(&self.metrics));
        let server = if self.config.enable_metrics {
            let addr = self.config.metrics_addr()?;
            let listener = TcpListener::bind(addr)
                .await
                .map_err(NodeError::MetricsServer)?;
            Some(tokio::spawn(serve_metrics(
                listener,
                Arc::clone(&self.metrics),
                shutdown.subscribe(),
            )))
        } else {
            None
        };

        let manager = &self.manager;
        let result = supervisor
            .run(shutdown, move |receiver| manager.run(receiver))
            .await;
        // The supervisor can give up without a shutdown signal.
        if let Some(server) = server {
            server.abort();
        }
        Ok(result?)
    }
}
