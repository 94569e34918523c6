//! Application Ports
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driven Ports** (Secondary/Outbound): where messages come from, where
//!   finished VWAP rows go, and where run counters are reported

mod message_feed_port;
mod run_metrics_port;
mod vwap_sink_port;

pub use message_feed_port::{FeedError, FeedItem, FeedRecord, MessageFeedPort};
pub use run_metrics_port::{NoOpRunMetrics, RunMetricsPort, SkipReason};
pub use vwap_sink_port::{SinkError, VwapSinkPort};
