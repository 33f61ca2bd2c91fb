//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tessera_network::HttpAuthorityConfig;
use tessera_types::{Address, ChainId};

use crate::logging::LogFormat;
use crate::NodeError;

/// Per-role knobs of the sync engine.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub chain_id: ChainId,
    /// This node's own wallet. Enables confirmation tracking for its transactions.
    pub wallet_address: Option<Address>,
    /// Expected block validator. Blocks sealed by anyone else are rejected.
    pub authority_address: Option<Address>,
    /// Pause between consecutive block fetches.
    pub block_fetch_delay: Duration,
    /// Compare local aggregate hashes with the authority's after catching up.
    pub verify_state_hashes: bool,
}

impl SyncConfig {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            wallet_address: None,
            authority_address: None,
            block_fetch_delay: Duration::from_millis(default_block_fetch_delay_ms()),
            verify_state_hashes: false,
        }
    }
}

/// Configuration for a Tessera replica node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Base URL of the authority's HTTP API.
    #[serde(default = "default_authority_url")]
    pub authority_url: String,

    /// Hex address of the expected block validator.
    #[serde(default)]
    pub authority_address: Option<String>,

    /// Hex address of the wallet this node tracks confirmations for.
    #[serde(default)]
    pub wallet_address: Option<String>,

    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    #[serde(default = "default_block_fetch_delay_ms")]
    pub block_fetch_delay_ms: u64,

    /// Backoff before resubscribing after a subscription timeout.
    #[serde(default = "default_resubscribe_delay_secs")]
    pub resubscribe_delay_secs: u64,

    /// Delay before the supervisor restarts a failed manager.
    #[serde(default = "default_restart_delay_secs")]
    pub restart_delay_secs: u64,

    #[serde(default)]
    pub verify_state_hashes: bool,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Silence tolerated on the state-change stream before resubscribing.
    #[serde(default = "default_subscription_idle_timeout_secs")]
    pub subscription_idle_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Serve Prometheus metrics on `metrics_addr`.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_chain_id() -> u64 {
    1
}

fn default_authority_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tessera_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_block_fetch_delay_ms() -> u64 {
    1000
}

fn default_resubscribe_delay_secs() -> u64 {
    10
}

fn default_restart_delay_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_subscription_idle_timeout_secs() -> u64 {
    60
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9100".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn chain_id(&self) -> Result<ChainId, NodeError> {
        let chain_id = ChainId::new(self.chain_id);
        if !chain_id.is_valid() {
            return Err(NodeError::Config("chain_id must be nonzero".into()));
        }
        Ok(chain_id)
    }

    pub fn sync_config(&self) -> Result<SyncConfig, NodeError> {
        Ok(SyncConfig {
            chain_id: self.chain_id()?,
            wallet_address: parse_address("wallet_address", self.wallet_address.as_deref())?,
            authority_address: parse_address(
                "authority_address",
                self.authority_address.as_deref(),
            )?,
            block_fetch_delay: Duration::from_millis(self.block_fetch_delay_ms),
            verify_state_hashes: self.verify_state_hashes,
        })
    }

    pub fn authority_config(&self) -> HttpAuthorityConfig {
        HttpAuthorityConfig {
            base_url: self.authority_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            idle_timeout: Duration::from_secs(self.subscription_idle_timeout_secs),
        }
    }

    pub fn metrics_addr(&self) -> Result<SocketAddr, NodeError> {
        self.metrics_addr
            .parse()
            .map_err(|e| NodeError::Config(format!("metrics_addr: {e}")))
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn map_size(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

fn parse_address(field: &str, value: Option<&str>) -> Result<Option<Address>, NodeError> {
    value
        .map(|s| {
            s.parse::<Address>()
                .map_err(|e| NodeError::Config(format!("{field}: {e}")))
        })
        .transpose()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            authority_url: default_authority_url(),
            authority_address: None,
            wallet_address: None,
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            block_fetch_delay_ms: default_block_fetch_delay_ms(),
            resubscribe_delay_secs: default_resubscribe_delay_secs(),
            restart_delay_secs: default_restart_delay_secs(),
            verify_state_hashes: false,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            subscription_idle_timeout_secs: default_subscription_idle_timeout_secs(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            metrics_addr: default_metrics_addr(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.authority_url, config.authority_url);
        assert_eq!(parsed.block_fetch_delay_ms, config.block_fetch_delay_ms);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.resubscribe_delay_secs, 10);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.metrics_addr().unwrap().port(), 9100);
        let sync = config.sync_config().unwrap();
        assert_eq!(sync.block_fetch_delay, Duration::from_secs(1));
        assert!(sync.wallet_address.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            chain_id = 7
            wallet_address = "0x0101010101010101010101010101010101010101"
            block_fetch_delay_ms = 0
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        let sync = config.sync_config().unwrap();
        assert_eq!(sync.chain_id, ChainId::new(7));
        assert_eq!(sync.wallet_address, Some(Address::new([1; 20])));
        assert_eq!(sync.block_fetch_delay, Duration::ZERO);
        assert_eq!(config.log_format, "human"); // default
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let config = NodeConfig::from_toml_str("chain_id = 0").unwrap();
        assert!(matches!(config.sync_config(), Err(NodeError::Config(_))));
        let config = NodeConfig::from_toml_str("wallet_address = \"zz\"").unwrap();
        assert!(matches!(config.sync_config(), Err(NodeError::Config(_))));
        let config = NodeConfig::from_toml_str("metrics_addr = \"nowhere\"").unwrap();
        assert!(matches!(config.metrics_addr(), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file(Path::new("/nonexistent/tessera.toml"));
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
