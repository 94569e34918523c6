//! Feed Input
//!
//! Opens a day file for sequential reading. Gzip input is recognised by its
//! magic bytes rather than the file name, since day files are commonly
//! distributed compressed under varying names.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use thiserror::Error;
use tracing::debug;

/// First two bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Default read buffer capacity.
pub const DEFAULT_BUFFER_BYTES: usize = 1024 * 1024;

/// Failure opening the feed.
#[derive(Debug, Error)]
pub enum InputError {
    /// File could not be opened or sniffed.
    #[error("Failed to open feed '{path}': {source}")]
    Open {
        /// Input path.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: io::Error,
    },
}

/// Compression detected on the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Raw frames.
    None,
    /// Gzip-wrapped frames.
    Gzip,
}

/// Byte source over an opened feed.
pub struct FeedSource {
    inner: Box<dyn Read + Send>,
    compression: Compression,
}

impl std::fmt::Debug for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSource")
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

impl FeedSource {
    /// Wrap any buffered reader, detecting gzip from its first bytes.
    pub fn from_reader<R>(mut reader: R, buffer_bytes: usize) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let compression = if reader.fill_buf()?.starts_with(&GZIP_MAGIC) {
            Compression::Gzip
        } else {
            Compression::None
        };
        let inner: Box<dyn Read + Send> = match compression {
            // Decompressed bytes get their own buffer; frames are read in small pieces.
            Compression::Gzip => Box::new(BufReader::with_capacity(
                buffer_bytes,
                MultiGzDecoder::new(reader),
            )),
            Compression::None => Box::new(reader),
        };
        Ok(Self { inner, compression })
    }

    /// Compression detected on open.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }
}

impl Read for FeedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Open a day file with a read buffer of `buffer_bytes`.
pub fn open_feed(path: &Path, buffer_bytes: usize) -> Result<FeedSource, InputError> {
    let open_error = |source| InputError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(open_error)?;
    let reader = BufReader::with_capacity(buffer_bytes.max(1), file);
    let source = FeedSource::from_reader(reader, buffer_bytes.max(1)).map_err(open_error)?;
    debug!(path = %path.display(), compression = ?source.compression(), "Opened feed");
    Ok(source)
}

/// Default CSV path for an input: strip `.gz`, then set the extension to `csv`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stripped = if input.extension().is_some_and(|ext| ext == "gz") {
        input.with_extension("")
    } else {
        input.to_path_buf()
    };
    stripped.with_extension("csv")
}
