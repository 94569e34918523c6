//! ITCH VWAP Binary
//!
//! Computes per-security, per-window VWAP from one ITCH 5.0 day file.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --bin itch-vwap -- 01302020.NASDAQ_ITCH50.gz \
//!     --output vwap.csv --report report.json
//! ```
//!
//! # Environment Variables
//!
//! - `ITCH_VWAP_CONFIG`: YAML configuration path (same as `--config`)
//! - `RUST_LOG`: Log filter (overrides `logging.level`)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use itch_vwap::{
    CsvFileSink, ItchFeed, PipelineOptions, PrometheusRunMetrics, ResolverOptions, RunReport,
    TelemetryConfig, VwapConfig, VwapPipeline, VwapSinkPort, default_output_path, init_metrics,
    init_telemetry, load_config, open_feed, render_snapshot,
};

#[derive(Parser, Debug)]
#[command(name = "itch-vwap")]
#[command(version, about = "Hourly VWAP per security from a NASDAQ ITCH 5.0 day file")]
struct Args {
    /// ITCH 5.0 day file, plain or gzip-compressed
    input: PathBuf,

    /// CSV output path (default: input with `.gz` stripped and extension `.csv`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML configuration file
    #[arg(short, long, env = "ITCH_VWAP_CONFIG")]
    config: Option<PathBuf>,

    /// Write the JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write a Prometheus text snapshot of the run metrics here
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Log level override, e.g. `debug` or `itch_vwap=trace`
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();

    let config_path = args.config.as_deref().map(Path::to_string_lossy);
    let config = load_config(config_path.as_deref()).context("loading configuration")?;

    let mut telemetry = TelemetryConfig::from_logging(&config.logging)?;
    if let Some(level) = &args.log_level {
        telemetry = telemetry.with_level(level.clone());
    }
    init_telemetry(&telemetry)?;

    if args.metrics.is_some() {
        init_metrics().context("installing metrics recorder")?;
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    log_config(&config, &args.input, &output);

    let report = run(&config, &args.input, &output)?;

    if let Some(path) = &args.report {
        let json = report.to_json().context("serializing run report")?;
        fs::write(path, json)
            .with_context(|| format!("writing run report to {}", path.display()))?;
    }

    if let Some(path) = &args.metrics {
        let snapshot = render_snapshot().unwrap_or_default();
        fs::write(path, snapshot)
            .with_context(|| format!("writing metrics snapshot to {}", path.display()))?;
    }

    Ok(())
}

/// Decode the feed and write the CSV. Nothing is written if decoding fails.
fn run(config: &VwapConfig, input: &Path, output: &Path) -> Result<RunReport> {
    let options = pipeline_options(config)?;
    let source = open_feed(input, config.processing.read_buffer_bytes)?;
    let mut feed = ItchFeed::new(source);
    let result = VwapPipeline::new(options)
        .with_metrics(PrometheusRunMetrics)
        .run(&mut feed)
        .with_context(|| format!("processing {}", input.display()))?;

    CsvFileSink::new(output)
        .write_rows(&result.rows)
        .with_context(|| format!("writing {}", output.display()))?;

    if let (Some(open), Some(close)) = (result.report.market_open(), result.report.market_close())
    {
        tracing::info!(open = %open, close = %close, "Market hours");
    }
    Ok(result.report)
}

/// Pipeline settings described by the configuration.
fn pipeline_options(config: &VwapConfig) -> Result<PipelineOptions> {
    Ok(PipelineOptions {
        windows: config.trading_windows()?,
        resolver: ResolverOptions {
            count_non_printable: config.trades.count_non_printable,
        },
        include_cross_trades: config.trades.include_cross_trades,
        mode: config.output.mode,
        price_decimals: config.output.price_decimals,
        progress_interval_bytes: config.processing.progress_interval_bytes,
    })
}

/// Log the effective configuration.
fn log_config(config: &VwapConfig, input: &Path, output: &Path) {
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        window_start = %config.windows.start,
        window_end = %config.windows.end,
        width_minutes = config.windows.width_minutes,
        mode = ?config.output.mode,
        "Configuration loaded"
    );
    tracing::debug!(
        include_cross_trades = config.trades.include_cross_trades,
        count_non_printable = config.trades.count_non_printable,
        price_decimals = config.output.price_decimals,
        "Trade rules"
    );
}

/// Load .env from the current directory or any ancestor.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}
