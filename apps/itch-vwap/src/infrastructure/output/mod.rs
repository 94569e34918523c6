//! CSV Output
//!
//! Writes VWAP rows as `symbol,window_start,window_end,vwap,volume`. The file
//! sink writes to a temporary sibling and renames it into place, so a failed
//! run never leaves a partial CSV at the destination.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::application::ports::{SinkError, VwapSinkPort};
use crate::domain::vwap::VwapRow;

/// CSV header row.
pub const CSV_HEADER: [&str; 5] = ["symbol", "window_start", "window_end", "vwap", "volume"];

fn csv_error(e: csv::Error) -> SinkError {
    SinkError::Serialization {
        message: e.to_string(),
    }
}

/// Streams rows to any writer.
pub struct CsvVwapWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> CsvVwapWriter<W> {
    /// Wrap a writer and emit the header.
    pub fn new(writer: W) -> Result<Self, SinkError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        writer.write_record(CSV_HEADER).map_err(csv_error)?;
        Ok(Self { writer, rows: 0 })
    }

    /// Write one row.
    pub fn write_row(&mut self, row: &VwapRow) -> Result<(), SinkError> {
        self.writer
            .write_record([
                row.symbol.as_str().to_string(),
                row.window.start_label(),
                row.window.end_label(),
                row.vwap.to_string(),
                row.volume.to_string(),
            ])
            .map_err(csv_error)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far.
    #[must_use]
    pub const fn rows_written(&self) -> u64 {
        self.rows
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write> VwapSinkPort for CsvVwapWriter<W> {
    fn write_rows(&mut self, rows: &[VwapRow]) -> Result<(), SinkError> {
        for row in rows {
            self.write_row(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes a complete CSV file atomically.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    /// Sink targeting `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".partial");
        self.path.with_file_name(name)
    }

    fn write_to(path: &Path, rows: &[VwapRow]) -> Result<(), SinkError> {
        let file = BufWriter::new(File::create(path)?);
        let mut writer = CsvVwapWriter::new(file)?;
        writer.write_rows(rows)?;
        let file = writer.into_inner()?;
        file.into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))?
            .sync_all()?;
        Ok(())
    }
}

impl VwapSinkPort for CsvFileSink {
    fn write_rows(&mut self, rows: &[VwapRow]) -> Result<(), SinkError> {
        let temp = self.temp_path();
        let result = Self::write_to(&temp, rows)
            .and_then(|()| fs::rename(&temp, &self.path).map_err(SinkError::from));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        info!(path = %self.path.display(), rows = rows.len(), "VWAP CSV written");
        Ok(())
    }
}
