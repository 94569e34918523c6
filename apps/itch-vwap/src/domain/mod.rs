//! Domain Layer - ITCH messages and VWAP computation.
//!
//! Pure, synchronous types with no I/O. The pipeline service feeds decoded
//! messages through these components in file order.

/// Typed ITCH 5.0 messages and value types.
pub mod messages;

/// Live order table used to price executions.
pub mod order_book;

/// Executed trades and the trade extractor.
pub mod trade;

/// Trading window schedule.
pub mod window;

/// Per-security, per-window accumulation.
pub mod aggregation;

/// VWAP row emission.
pub mod vwap;
