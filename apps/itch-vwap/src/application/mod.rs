//! Application Layer - Use cases and port definitions.
//!
//! Orchestrates the domain components over a message feed and defines the
//! ports the infrastructure layer implements.

/// Port interfaces for the feed, output and metrics.
pub mod ports;

/// Pipeline service and run report.
pub mod services;
