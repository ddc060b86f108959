//! Prometheus metrics for the node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`]; [`NodeMetrics::encode_text`]
//! renders it in the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};
use vigil_ledger::LedgerSummary;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Top-level requests that completed.
    pub requests_processed: IntCounter,
    /// Top-level requests that returned an error.
    pub requests_rejected: IntCounter,
    /// Blocks forged and appended, sub-requests included.
    pub blocks_forged: IntCounter,
    /// Forge attempts that failed after a forger was chosen.
    pub forge_failures: IntCounter,
    /// Reward credits appended to stakeholder and forger chains.
    pub payout_credits: IntCounter,
    /// Reward credits that could not be applied.
    pub payout_warnings: IntCounter,
    /// Forging rounds started by the DPoS layer.
    pub rounds_started: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub block_count: IntGauge,
    /// Accounts with at least one block.
    pub account_count: IntGauge,
    pub delegate_count: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of one top-level request, in milliseconds.
    pub process_time_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_processed = register_int_counter_with_registry!(
            Opts::new("vigil_requests_processed_total", "Requests processed successfully"),
            registry
        )?;
        let requests_rejected = register_int_counter_with_registry!(
            Opts::new("vigil_requests_rejected_total", "Requests rejected with an error"),
            registry
        )?;
        let blocks_forged = register_int_counter_with_registry!(
            Opts::new("vigil_blocks_forged_total", "Blocks forged and appended"),
            registry
        )?;
        let forge_failures = register_int_counter_with_registry!(
            Opts::new("vigil_forge_failures_total", "Forge attempts that failed"),
            registry
        )?;
        let payout_credits = register_int_counter_with_registry!(
            Opts::new("vigil_payout_credits_total", "Reward credits applied"),
            registry
        )?;
        let payout_warnings = register_int_counter_with_registry!(
            Opts::new("vigil_payout_warnings_total", "Reward credits that failed"),
            registry
        )?;
        let rounds_started = register_int_counter_with_registry!(
            Opts::new("vigil_rounds_started_total", "Forging rounds started"),
            registry
        )?;

        let block_count = register_int_gauge_with_registry!(
            Opts::new("vigil_block_count", "Blocks in the ledger"),
            registry
        )?;
        let account_count = register_int_gauge_with_registry!(
            Opts::new("vigil_account_count", "Opened accounts"),
            registry
        )?;
        let delegate_count = register_int_gauge_with_registry!(
            Opts::new("vigil_delegate_count", "Registered delegates"),
            registry
        )?;

        let process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new("vigil_process_time_ms", "Request processing time in milliseconds")
                .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0]),
            registry
        )?;

        Ok(Self {
            registry,
            requests_processed,
            requests_rejected,
            blocks_forged,
            forge_failures,
            payout_credits,
            payout_warnings,
            rounds_started,
            block_count,
            account_count,
            delegate_count,
            process_time_ms,
        })
    }

    /// Refresh the ledger gauges.
    pub fn observe_ledger(&self, summary: &LedgerSummary) {
        self.block_count.set(summary.blocks as i64);
        self.account_count.set(summary.opened as i64);
        self.delegate_count.set(summary.delegates as i64);
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_encode() {
        let metrics = NodeMetrics::new().unwrap();
        metrics.blocks_forged.inc();
        metrics.observe_ledger(&LedgerSummary {
            accounts: 3,
            opened: 2,
            blocks: 7,
            delegates: 1,
            received_sends: 1,
        });

        assert_eq!(metrics.blocks_forged.get(), 1);
        assert_eq!(metrics.block_count.get(), 7);
        let text = metrics.encode_text().unwrap();
        assert!(text.contains("vigil_blocks_forged_total 1"));
        assert!(text.contains("vigil_account_count 2"));
    }

    #[test]
    fn separate_instances_do_not_share_state() {
        let a = NodeMetrics::new().unwrap();
        let b = NodeMetrics::new().unwrap();
        a.requests_rejected.inc();
        assert_eq!(b.requests_rejected.get(), 0);
    }
}
