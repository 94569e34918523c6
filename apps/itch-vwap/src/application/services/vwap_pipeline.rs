//! VWAP Pipeline Service
//!
//! Drives feed records through order resolution, trade extraction and
//! window aggregation in strict file order, then emits VWAP rows.
//!
//! # Fault Policy
//!
//! - Truncated frames and frames that do not match their layout abort the
//!   run with the byte offset.
//! - Unknown message types, out-of-range field bytes and order-state
//!   inconsistencies are counted, logged and skipped.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::run_report::{RunReport, format_timestamp, tag_label};
use crate::application::ports::{
    FeedError, FeedItem, FeedRecord, MessageFeedPort, NoOpRunMetrics, RunMetricsPort, SkipReason,
};
use crate::domain::aggregation::{Absorbed, WindowAggregator};
use crate::domain::messages::{ItchMessage, Symbol, SystemEvent, SystemEventCode};
use crate::domain::order_book::{OrderResolver, Resolution, ResolveError, ResolverOptions};
use crate::domain::trade::TradeExtractor;
use crate::domain::vwap::{DEFAULT_PRICE_DECIMALS, EmitError, OutputMode, VwapEmitter, VwapRow};
use crate::domain::window::TradingWindows;

/// Occurrences of each skip reason logged at `warn` before dropping to `debug`.
const WARN_LIMIT: u64 = 10;

/// Default progress log interval (100 MB).
pub const DEFAULT_PROGRESS_INTERVAL_BYTES: u64 = 100 * 1024 * 1024;

// ============================================================================
// Types
// ============================================================================

/// Pipeline settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Window schedule.
    pub windows: TradingWindows,
    /// Order resolver settings.
    pub resolver: ResolverOptions,
    /// Count `Q` cross prints.
    pub include_cross_trades: bool,
    /// Window or running totals.
    pub mode: OutputMode,
    /// VWAP decimals.
    pub price_decimals: u32,
    /// Bytes between progress log lines.
    pub progress_interval_bytes: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            windows: TradingWindows::default(),
            resolver: ResolverOptions::default(),
            include_cross_trades: true,
            mode: OutputMode::Window,
            price_decimals: DEFAULT_PRICE_DECIMALS,
            progress_interval_bytes: DEFAULT_PROGRESS_INTERVAL_BYTES,
        }
    }
}

/// Fatal pipeline failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input ended inside a frame, could not be read, or was malformed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// VWAP could not be computed.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl PipelineError {
    /// Byte offset of the failing frame, when the failure is tied to one.
    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        match self {
            Self::Feed(err) => Some(err.offset()),
            Self::Emit(_) => None,
        }
    }
}

/// Rows and report from a completed run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Ordered VWAP rows.
    pub rows: Vec<VwapRow>,
    /// Run counters.
    pub report: RunReport,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Single-threaded feed-to-VWAP pipeline for one day file.
#[derive(Debug)]
pub struct VwapPipeline<M = NoOpRunMetrics> {
    resolver: OrderResolver,
    extractor: TradeExtractor,
    aggregator: WindowAggregator,
    emitter: VwapEmitter,
    report: RunReport,
    listed: BTreeSet<Symbol>,
    progress_interval: u64,
    next_progress: u64,
    metrics: M,
}

impl Default for VwapPipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

impl VwapPipeline {
    /// Create a pipeline that reports no metrics.
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        let progress_interval = options.progress_interval_bytes.max(1);
        Self {
            resolver: OrderResolver::with_options(options.resolver),
            extractor: TradeExtractor::new().with_cross_trades(options.include_cross_trades),
            aggregator: WindowAggregator::new(options.windows),
            emitter: VwapEmitter::new()
                .with_mode(options.mode)
                .with_price_decimals(options.price_decimals),
            report: RunReport::default(),
            listed: BTreeSet::new(),
            progress_interval,
            next_progress: progress_interval,
            metrics: NoOpRunMetrics,
        }
    }
}

impl<M: RunMetricsPort> VwapPipeline<M> {
    /// Report run counters to `metrics`.
    #[must_use]
    pub fn with_metrics<N: RunMetricsPort>(self, metrics: N) -> VwapPipeline<N> {
        VwapPipeline {
            resolver: self.resolver,
            extractor: self.extractor,
            aggregator: self.aggregator,
            emitter: self.emitter,
            report: self.report,
            listed: self.listed,
            progress_interval: self.progress_interval,
            next_progress: self.next_progress,
            metrics,
        }
    }

    /// Read every record, then emit rows.
    pub fn run<F: MessageFeedPort>(
        mut self,
        feed: &mut F,
    ) -> Result<PipelineOutput, PipelineError> {
        info!(
            windows = self.aggregator.windows().count(),
            mode = ?self.emitter.mode(),
            "Processing ITCH feed"
        );
        while let Some(record) = feed.next_record()? {
            self.process_record(&record);
            self.log_progress();
        }
        self.finish()
    }

    fn process_record(&mut self, record: &FeedRecord) {
        self.report.frames += 1;
        self.report.bytes += record.encoded_len as u64;
        self.metrics.record_frame(record.encoded_len);

        match record.item {
            FeedItem::Message(message) => self.process_message(&message),
            FeedItem::UnknownType { tag } => {
                let count = self
                    .report
                    .unknown_message_types
                    .entry(tag_label(tag))
                    .or_default();
                *count += 1;
                self.metrics.record_skip(SkipReason::UnknownMessageType);
                if *count == 1 {
                    warn!(
                        offset = record.offset,
                        tag = %tag_label(tag),
                        "Skipping unknown message type"
                    );
                }
            }
            FeedItem::InvalidField { tag, field, value } => {
                let count = self
                    .report
                    .invalid_fields
                    .entry(format!("{}.{field}", tag_label(tag)))
                    .or_default();
                *count += 1;
                self.metrics.record_skip(SkipReason::InvalidField);
                if *count <= WARN_LIMIT {
                    warn!(
                        offset = record.offset,
                        tag = %tag_label(tag),
                        field,
                        value,
                        "Skipping message with invalid field"
                    );
                }
            }
        }
    }

    fn process_message(&mut self, message: &ItchMessage) {
        let tag = message.tag();
        self.report.messages_decoded += 1;
        *self
            .report
            .messages_by_type
            .entry(tag_label(tag))
            .or_default() += 1;
        self.metrics.record_message_decoded(tag);

        match message {
            ItchMessage::SystemEvent(event) => self.observe_system_event(event),
            ItchMessage::StockDirectory(directory) => {
                self.listed.insert(directory.stock);
            }
            ItchMessage::BrokenTrade(broken) => {
                self.report.broken_trades += 1;
                debug!(match_number = broken.match_number, "Broken trade ignored");
            }
            _ => {}
        }

        let resolved = match self.resolver.apply(message) {
            Ok(Resolution::NonPrintable) => {
                self.report.non_printable_executions += 1;
                self.metrics.record_skip(SkipReason::NonPrintable);
                None
            }
            Ok(resolution) => resolution.trade(),
            Err(err) => {
                self.record_resolve_error(&err, message);
                return;
            }
        };

        let Some(trade) = self.extractor.extract(message, resolved) else {
            return;
        };
        match self.aggregator.absorb(&trade) {
            Absorbed::Window(_) => {
                *self
                    .report
                    .trades_by_source
                    .entry(trade.source.as_str().to_string())
                    .or_default() += 1;
                self.metrics.record_trade(trade.source);
            }
            Absorbed::OutsideSession => {
                self.report.trades_outside_windows += 1;
                self.metrics.record_trade_outside_windows();
            }
        }
    }

    fn finish(mut self) -> Result<PipelineOutput, PipelineError> {
        let rows = self.emitter.finalize(&self.aggregator)?;

        self.report.securities_listed = self.listed.len() as u64;
        self.report.securities_traded = self.aggregator.security_count() as u64;
        self.report.live_orders_at_end = self.resolver.live_count() as u64;
        self.report.rows_emitted = rows.len() as u64;

        info!(
            frames = self.report.frames,
            bytes = self.report.bytes,
            trades = self.report.trades(),
            skipped = self.report.skipped(),
            securities_traded = self.report.securities_traded,
            rows = self.report.rows_emitted,
            "ITCH feed processed"
        );

        Ok(PipelineOutput {
            rows,
            report: self.report,
        })
    }

    fn observe_system_event(&mut self, event: &SystemEvent) {
        let timestamp = event.header.timestamp;
        match event.event_code {
            SystemEventCode::StartOfMarketHours => {
                self.report.market_open_ns.get_or_insert(timestamp);
                info!(time = %format_timestamp(timestamp), "Market open");
            }
            SystemEventCode::EndOfMarketHours => {
                self.report.market_close_ns.get_or_insert(timestamp);
                info!(time = %format_timestamp(timestamp), "Market close");
            }
            code => debug!(?code, time = %format_timestamp(timestamp), "System event"),
        }
    }

    fn record_resolve_error(&mut self, err: &ResolveError, message: &ItchMessage) {
        let (count, reason) = match err {
            ResolveError::UnknownOrderReference { .. } => (
                &mut self.report.unknown_order_references,
                SkipReason::UnknownOrderReference,
            ),
            ResolveError::DuplicateOrderReference { .. } => (
                &mut self.report.duplicate_order_references,
                SkipReason::DuplicateOrderReference,
            ),
            ResolveError::SharesExceedRemaining { .. } => (
                &mut self.report.shares_exceed_remaining,
                SkipReason::SharesExceedRemaining,
            ),
        };
        *count += 1;
        self.metrics.record_skip(reason);

        if *count <= WARN_LIMIT {
            warn!(
                reason = reason.as_str(),
                timestamp = message.timestamp(),
                error = %err,
                "Skipping message"
            );
        } else {
            debug!(
                reason = reason.as_str(),
                timestamp = message.timestamp(),
                error = %err,
                "Skipping message"
            );
        }
    }

    fn log_progress(&mut self) {
        if self.report.bytes < self.next_progress {
            return;
        }
        info!(
            mb = self.report.bytes / (1024 * 1024),
            frames = self.report.frames,
            live_orders = self.resolver.live_count(),
            "Parse progress"
        );
        while self.next_progress <= self.report.bytes {
            self.next_progress += self.progress_interval;
        }
    }
}
