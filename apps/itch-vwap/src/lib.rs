#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::cast_possible_wrap,
        clippy::items_after_statements
    )
)]

//! ITCH VWAP - Hourly VWAP from NASDAQ TotalView-ITCH 5.0
//!
//! Decodes a full trading day of ITCH 5.0 messages and computes the
//! volume-weighted average price of executed shares per security and per
//! trading window, written as CSV.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: ITCH message types and the VWAP computation
//!   - `messages`: Typed ITCH records, prices, symbols
//!   - `order_book`: Live orders needed to price executions
//!   - `trade`, `window`, `aggregation`, `vwap`: Trade extraction to rows
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Message feed, output sink and run metrics interfaces
//!   - `services`: The decode-to-VWAP pipeline and its run report
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `itch`: Length-prefixed framing, the binary codec, the feed adapter
//!   - `input`: Day file opening with gzip detection
//!   - `output`: CSV writer and atomic file sink
//!   - `config`, `metrics`, `telemetry`: Ambient services
//!
//! # Data Flow
//!
//! ```text
//! day file ─► ItchFeed ─► OrderResolver ─► TradeExtractor
//!                                               │
//!         CSV ◄─ VwapEmitter ◄─ WindowAggregator ◄┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - ITCH messages and VWAP computation with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::aggregation::{AggregationCell, WindowAggregator};
pub use domain::messages::{ItchMessage, Nanos, OrderRef, Price, Side, Symbol};
pub use domain::order_book::{LiveOrder, OrderResolver, ResolveError, ResolverOptions};
pub use domain::trade::{ExecutedTrade, TradeExtractor, TradeSource};
pub use domain::vwap::{EmitError, OutputMode, VwapEmitter, VwapRow};
pub use domain::window::{TradingWindows, WindowBounds, WindowError};

// Application
pub use application::ports::{
    FeedError, FeedItem, FeedRecord, MessageFeedPort, NoOpRunMetrics, RunMetricsPort, SinkError,
    SkipReason, VwapSinkPort,
};
pub use application::services::{
    PipelineError, PipelineOptions, PipelineOutput, RunReport, VwapPipeline,
};

// Wire format
pub use infrastructure::itch::{
    DecodeError, Frame, FrameError, FrameReader, FrameWriter, ItchFeed, decode, encode,
    encode_frame,
};

// Input / output
pub use infrastructure::input::{FeedSource, InputError, default_output_path, open_feed};
pub use infrastructure::output::{CsvFileSink, CsvVwapWriter};

// Configuration
pub use infrastructure::config::{ConfigError, VwapConfig, load_config, load_config_from_string};

// Metrics
pub use infrastructure::metrics::{PrometheusRunMetrics, init_metrics, render_snapshot};

// Telemetry
pub use infrastructure::telemetry::{
    LogFormat, TelemetryConfig, TelemetryError, init_with_config as init_telemetry,
};
