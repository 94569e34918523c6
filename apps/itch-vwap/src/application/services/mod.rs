//! Application Services
//!
//! - `VwapPipeline`: decodes a day file and produces ordered VWAP rows
//! - `RunReport`: counters for one run

mod run_report;
mod vwap_pipeline;

pub use run_report::{RunReport, format_timestamp};
pub use vwap_pipeline::{
    DEFAULT_PROGRESS_INTERVAL_BYTES, PipelineError, PipelineOptions, PipelineOutput, VwapPipeline,
};
