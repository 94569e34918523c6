//! VWAP Sink Port (Driven Port)
//!
//! Interface for delivering finished VWAP rows to an output.

use crate::domain::vwap::VwapRow;

/// Sink error.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// Underlying I/O failed.
    #[error("VWAP sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row could not be serialized.
    #[error("VWAP sink serialization error: {message}")]
    Serialization {
        /// Serializer message.
        message: String,
    },
}

/// Port for writing ordered VWAP rows.
///
/// Rows arrive already ordered by symbol, then window start. Implementations
/// must either persist all of them or none.
pub trait VwapSinkPort {
    /// Write every row.
    fn write_rows(&mut self, rows: &[VwapRow]) -> Result<(), SinkError>;
}
