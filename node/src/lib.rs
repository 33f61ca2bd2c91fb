//! Tessera replica node.
//!
//! Keeps a local copy of a proof-of-authority chain consistent with the authority:
//! - [`SyncEngine`] bootstraps genesis, walks missing blocks and applies them
//! - [`SyncManager`] runs each cycle inside one storage transaction, on startup and on
//!   every state-change notification
//! - [`Supervisor`] restarts a failed manager until shutdown
//!
//! The same engine serves every role (authority mirror, faucet, wallet); role
//! differences are carried by [`SyncConfig`].

mod apply;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod manager;
pub mod metrics;
pub mod metrics_server;
pub mod node;
pub mod shutdown;
pub mod supervisor;
pub mod tracing_spans;

pub use config::{NodeConfig, SyncConfig};
pub use engine::{SyncEngine, SyncOutcome, SyncStatus};
pub use error::{NodeError, SyncError};
pub use events::{ConfirmedTransaction, SyncEvent};
pub use logging::{init_logging, LogFormat};
pub use manager::SyncManager;
pub use metrics::SyncMetrics;
pub use metrics_server::{metrics_router, serve_metrics};
pub use node::{HttpSyncManager, TesseraNode};
pub use shutdown::ShutdownController;
pub use supervisor::Supervisor;
