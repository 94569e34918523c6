//! Infrastructure Layer - Adapters and external integrations.
//!
//! Concrete implementations around the pipeline: the ITCH wire format, file
//! input and CSV output, configuration, metrics and logging.

/// ITCH 5.0 framing and binary codec.
pub mod itch;

/// Day file opening with gzip detection.
pub mod input;

/// CSV output adapters.
pub mod output;

/// Configuration loading and validation.
pub mod config;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// Logging initialisation.
pub mod telemetry;
