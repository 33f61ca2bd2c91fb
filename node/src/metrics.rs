//! Prometheus metrics for the sync manager.
//!
//! [`SyncMetrics`] owns a dedicated [`Registry`]; [`SyncMetrics::encode`] renders it in
//! the Prometheus text exposition format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, IntCounter,
    IntGauge, Opts, Registry, TextEncoder,
};

pub struct SyncMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Sync cycles that committed.
    pub cycles: IntCounter,
    /// Sync cycles that were discarded.
    pub cycle_failures: IntCounter,
    pub blocks_applied: IntCounter,
    /// Locally originated transactions seen in a synced block.
    pub confirmations: IntCounter,
    /// Times the supervisor restarted the manager.
    pub restarts: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Number of the latest locally applied block.
    pub head_block_number: IntGauge,
}

impl SyncMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let cycles = register_int_counter_with_registry!(
            Opts::new("tessera_sync_cycles_total", "Sync cycles committed"),
            registry
        )?;
        let cycle_failures = register_int_counter_with_registry!(
            Opts::new(
                "tessera_sync_cycle_failures_total",
                "Sync cycles discarded after an error"
            ),
            registry
        )?;
        let blocks_applied = register_int_counter_with_registry!(
            Opts::new("tessera_blocks_applied_total", "Blocks applied to the local ledger"),
            registry
        )?;
        let confirmations = register_int_counter_with_registry!(
            Opts::new(
                "tessera_confirmations_total",
                "Locally originated transactions confirmed"
            ),
            registry
        )?;
        let restarts = register_int_counter_with_registry!(
            Opts::new("tessera_sync_restarts_total", "Supervisor restarts of the sync manager"),
            registry
        )?;
        let head_block_number = register_int_gauge_with_registry!(
            Opts::new("tessera_head_block_number", "Latest locally applied block number"),
            registry
        )?;

        Ok(Self {
            registry,
            cycles,
            cycle_failures,
            blocks_applied,
            confirmations,
            restarts,
            head_block_number,
        })
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
