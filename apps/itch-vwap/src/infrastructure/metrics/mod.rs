//! Prometheus Metrics Module
//!
//! Counters describing one decoding run. The recorder is only installed when
//! a metrics snapshot is requested; without it every `counter!` call is a
//! no-op.
//!
//! # Metrics
//!
//! - **Input**: frames and bytes consumed, messages decoded by type
//! - **Skips**: recoverable faults by reason
//! - **Trades**: executed trades by source, trades outside the session

use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::{RunMetricsPort, SkipReason};
use crate::domain::trade::TradeSource;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder, once per process.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Render the current snapshot in Prometheus text format.
#[must_use]
pub fn render_snapshot() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(PrometheusHandle::render)
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "itch_vwap_frames_total",
        "Total length-prefixed frames read from the input"
    );
    describe_counter!(
        "itch_vwap_bytes_total",
        "Total input bytes consumed, length prefixes included"
    );
    describe_counter!(
        "itch_vwap_messages_decoded_total",
        "Total messages decoded by message type"
    );
    describe_counter!(
        "itch_vwap_messages_skipped_total",
        "Total messages skipped by reason"
    );
    describe_counter!(
        "itch_vwap_trades_total",
        "Total executed trades aggregated by source"
    );
    describe_counter!(
        "itch_vwap_trades_outside_windows_total",
        "Total executed trades discarded for falling outside the session"
    );
}

// =============================================================================
// Run Metrics Adapter
// =============================================================================

/// [`RunMetricsPort`] backed by the global `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusRunMetrics;

impl RunMetricsPort for PrometheusRunMetrics {
    fn record_frame(&self, bytes: usize) {
        counter!("itch_vwap_frames_total").increment(1);
        counter!("itch_vwap_bytes_total").increment(bytes as u64);
    }

    fn record_message_decoded(&self, tag: u8) {
        counter!(
            "itch_vwap_messages_decoded_total",
            "message_type" => char::from(tag).to_string()
        )
        .increment(1);
    }

    fn record_skip(&self, reason: SkipReason) {
        counter!(
            "itch_vwap_messages_skipped_total",
            "reason" => reason.as_str()
        )
        .increment(1);
    }

    fn record_trade(&self, source: TradeSource) {
        counter!(
            "itch_vwap_trades_total",
            "source" => source.as_str()
        )
        .increment(1);
    }

    fn record_trade_outside_windows(&self) {
        counter!("itch_vwap_trades_outside_windows_total").increment(1);
    }
}

// =============================================================================
// Tests
// =============================================================================
