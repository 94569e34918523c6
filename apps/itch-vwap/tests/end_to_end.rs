//! End-to-End Integration Tests
//!
//! Builds a synthetic ITCH day file, runs it through the library pipeline and
//! the `itch-vwap` binary, and checks the CSV and run report.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;

use itch_vwap::domain::messages::{
    AddOrder, CrossTrade, Header, OrderCancel, OrderExecuted, OrderExecutedWithPrice,
    OrderReplace, StockDirectory, SystemEvent, SystemEventCode, Trade,
};
use itch_vwap::domain::window::hms;
use itch_vwap::{
    CsvFileSink, FrameWriter, ItchFeed, ItchMessage, Nanos, PipelineOptions, Price, RunReport,
    Side, Symbol, VwapPipeline, VwapSinkPort, encode, open_feed,
};

const EXPECTED_CSV: &str = "symbol,window_start,window_end,vwap,volume\n\
AAPL,10:00,11:00,150.3000,100\n\
AAPL,15:00,16:00,151.0000,1000\n\
MSFT,11:00,12:00,401.6667,300\n";

fn header(timestamp: Nanos) -> Header {
    Header {
        stock_locate: 0,
        tracking_number: 0,
        timestamp,
    }
}

fn sym(ticker: &str) -> Symbol {
    Symbol::new(ticker).unwrap()
}

fn directory(ticker: &str) -> ItchMessage {
    ItchMessage::StockDirectory(StockDirectory {
        header: header(hms(3, 0, 0)),
        stock: sym(ticker),
        market_category: b'Q',
        financial_status: b'N',
        round_lot_size: 100,
        round_lots_only: b'N',
        issue_classification: b'C',
        issue_sub_type: *b"Z ",
        authenticity: b'P',
        short_sale_threshold: b'N',
        ipo_flag: b' ',
        luld_reference_price_tier: b'1',
        etp_flag: b'N',
        etp_leverage_factor: 0,
        inverse_indicator: b'N',
    })
}

fn system_event(code: SystemEventCode, timestamp: Nanos) -> ItchMessage {
    ItchMessage::SystemEvent(SystemEvent {
        header: header(timestamp),
        event_code: code,
    })
}

fn add(order_ref: u64, ticker: &str, side: Side, shares: u32, price: u32, ts: Nanos) -> ItchMessage {
    ItchMessage::AddOrder(AddOrder {
        header: header(ts),
        order_ref,
        side,
        shares,
        stock: sym(ticker),
        price: Price::from_raw(price),
    })
}

fn execute(order_ref: u64, shares: u32, ts: Nanos) -> ItchMessage {
    ItchMessage::OrderExecuted(OrderExecuted {
        header: header(ts),
        order_ref,
        executed_shares: shares,
        match_number: order_ref * 1000 + u64::from(shares),
    })
}

fn execute_with_price(
    order_ref: u64,
    shares: u32,
    price: u32,
    printable: bool,
    ts: Nanos,
) -> ItchMessage {
    ItchMessage::OrderExecutedWithPrice(OrderExecutedWithPrice {
        header: header(ts),
        order_ref,
        executed_shares: shares,
        match_number: order_ref * 1000 + u64::from(shares) + 1,
        printable,
        execution_price: Price::from_raw(price),
    })
}

fn trade(ticker: &str, shares: u32, price: u32, ts: Nanos) -> ItchMessage {
    ItchMessage::Trade(Trade {
        header: header(ts),
        order_ref: 0,
        side: Side::Buy,
        shares,
        stock: sym(ticker),
        price: Price::from_raw(price),
        match_number: 5_000 + u64::from(shares),
    })
}

fn cross(ticker: &str, shares: u64, price: u32, ts: Nanos) -> ItchMessage {
    ItchMessage::CrossTrade(CrossTrade {
        header: header(ts),
        shares,
        stock: sym(ticker),
        cross_price: Price::from_raw(price),
        match_number: 9_000 + shares,
        cross_type: b'C',
    })
}

/// A small but complete trading day for two securities.
fn day_feed() -> Vec<u8> {
    let mut w = FrameWriter::new(Vec::new());
    let messages = [
        system_event(SystemEventCode::StartOfMessages, hms(3, 0, 0)),
        directory("AAPL"),
        directory("MSFT"),
        system_event(SystemEventCode::StartOfMarketHours, hms(9, 30, 0)),
        add(1, "AAPL", Side::Buy, 100, 1_500_000, hms(10, 15, 0)),
        execute(1, 40, hms(10, 20, 0)),
        execute_with_price(1, 60, 1_505_000, true, hms(10, 45, 0)),
        add(2, "MSFT", Side::Sell, 500, 4_000_000, hms(10, 50, 0)),
        ItchMessage::OrderReplace(OrderReplace {
            header: header(hms(11, 5, 0)),
            original_order_ref: 2,
            new_order_ref: 3,
            shares: 300,
            price: Price::from_raw(4_010_000),
        }),
        execute(3, 100, hms(11, 10, 0)),
        ItchMessage::OrderCancel(OrderCancel {
            header: header(hms(11, 20, 0)),
            order_ref: 3,
            canceled_shares: 50,
        }),
        // Never added.
        execute(9, 10, hms(11, 30, 0)),
        trade("MSFT", 200, 4_020_000, hms(11, 40, 0)),
    ];
    for message in &messages {
        w.write_message(message).unwrap();
    }

    // Unsupported message type (Net Order Imbalance Indicator).
    let mut imbalance = vec![b'I'];
    imbalance.resize(50, 0);
    w.write_payload(&imbalance).unwrap();

    // Add Order with a side byte that is neither 'B' nor 'S'.
    let mut bad_side = encode(&add(50, "AAPL", Side::Buy, 10, 1_500_000, hms(11, 45, 0)));
    bad_side[19] = b'Z';
    w.write_payload(&bad_side).unwrap();

    let rest = [
        execute_with_price(3, 150, 3_990_000, false, hms(12, 0, 0)),
        cross("AAPL", 1_000, 1_510_000, hms(15, 59, 59)),
        cross("MSFT", 0, 4_000_000, hms(16, 0, 0)),
        trade("AAPL", 10, 1_490_000, hms(16, 0, 0)),
        system_event(SystemEventCode::EndOfMarketHours, hms(16, 0, 0)),
        system_event(SystemEventCode::EndOfMessages, hms(20, 0, 0)),
    ];
    for message in &rest {
        w.write_message(message).unwrap();
    }
    w.into_inner().unwrap()
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Run the library pipeline on `input` and write the CSV to `output`.
fn run_library(input: &Path, output: &Path) -> RunReport {
    let source = open_feed(input, 64 * 1024).unwrap();
    let mut feed = ItchFeed::new(source);
    let result = VwapPipeline::new(PipelineOptions::default())
        .run(&mut feed)
        .unwrap();
    CsvFileSink::new(output).write_rows(&result.rows).unwrap();
    result.report
}

fn binary() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_itch-vwap"));
    cmd.env("RUST_LOG", "warn").env_remove("ITCH_VWAP_CONFIG");
    cmd
}

// =============================================================================
// Library
// =============================================================================

#[test]
fn plain_day_file_produces_expected_csv() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("day.itch");
    let output = dir.path().join("day.csv");
    fs::write(&input, day_feed()).unwrap();

    let report = run_library(&input, &output);

    assert_eq!(fs::read_to_string(&output).unwrap(), EXPECTED_CSV);
    assert_eq!(report.unknown_order_references, 1);
    assert_eq!(report.non_printable_executions, 1);
    assert_eq!(report.unknown_message_types.get("I"), Some(&1));
    assert_eq!(report.invalid_fields.get("A.side"), Some(&1));
    assert_eq!(report.trades_outside_windows, 1);
    assert_eq!(report.securities_listed, 2);
    assert_eq!(report.securities_traded, 2);
    assert_eq!(report.live_orders_at_end, 0);
    assert_eq!(report.market_open_ns, Some(hms(9, 30, 0)));
    assert_eq!(report.market_close_ns, Some(hms(16, 0, 0)));
    assert_eq!(report.rows_emitted, 3);
}

#[test]
fn gzip_day_file_matches_plain() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("day.itch.gz");
    let output = dir.path().join("day.csv");
    fs::write(&input, gzip(&day_feed())).unwrap();

    let report = run_library(&input, &output);

    assert_eq!(fs::read_to_string(&output).unwrap(), EXPECTED_CSV);
    assert_eq!(report.bytes, day_feed().len() as u64);
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("day.itch");
    fs::write(&input, day_feed()).unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    run_library(&input, &first);
    run_library(&input, &second);

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

// =============================================================================
// Binary
// =============================================================================

#[test]
fn binary_writes_csv_report_and_metrics() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("20200130.itch.gz");
    fs::write(&input, gzip(&day_feed())).unwrap();
    let report_path = dir.path().join("report.json");
    let metrics_path = dir.path().join("metrics.prom");

    let status = binary()
        .arg(&input)
        .arg("--report")
        .arg(&report_path)
        .arg("--metrics")
        .arg(&metrics_path)
        .status()
        .unwrap();

    assert!(status.success());
    // Default output: `.gz` stripped, extension replaced.
    let csv = fs::read_to_string(dir.path().join("20200130.csv")).unwrap();
    assert_eq!(csv, EXPECTED_CSV);

    let report: RunReport =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report.rows_emitted, 3);
    assert_eq!(report.unknown_order_references, 1);

    let metrics = fs::read_to_string(&metrics_path).unwrap();
    assert!(metrics.contains("itch_vwap_frames_total"));
}

#[test]
fn binary_running_mode_from_config() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("day.itch");
    let output = dir.path().join("running.csv");
    let config = dir.path().join("vwap.yaml");
    fs::write(&input, day_feed()).unwrap();
    fs::write(&config, "output:\n  mode: running\nlogging:\n  level: warn\n").unwrap();

    let status = binary()
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .status()
        .unwrap();

    assert!(status.success());
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "symbol,window_start,window_end,vwap,volume\n\
         AAPL,10:00,11:00,150.3000,100\n\
         AAPL,15:00,16:00,150.9364,1100\n\
         MSFT,11:00,12:00,401.6667,300\n"
    );
}

#[test]
fn truncated_file_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("day.itch");
    let output = dir.path().join("day.csv");
    let mut bytes = day_feed();
    bytes.truncate(bytes.len() - 3);
    fs::write(&input, bytes).unwrap();

    let result = binary()
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();

    assert!(!result.status.success());
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("truncated frame"), "stderr: {stderr}");
}

#[test]
fn invalid_config_fails_before_processing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("day.itch");
    let output = dir.path().join("day.csv");
    let config = dir.path().join("bad.yaml");
    fs::write(&input, day_feed()).unwrap();
    fs::write(&config, "windows:\n  start: \"17:00\"\n").unwrap();

    let result = binary()
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert!(!result.status.success());
    assert!(!output.exists());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Config validation failed"), "stderr: {stderr}");
}
