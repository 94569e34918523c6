//! Length-Prefixed Framing
//!
//! An ITCH day file is a sequence of frames, each a 2-byte big-endian payload
//! length followed by that many payload bytes. [`FrameReader`] yields one
//! payload at a time from a reused buffer; [`FrameWriter`] produces the same
//! layout for fixtures and synthetic feeds.

use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

use thiserror::Error;

use super::codec;
use crate::domain::messages::ItchMessage;

/// Width of the length prefix.
pub const LENGTH_PREFIX_BYTES: usize = 2;

/// Which part of a frame the input ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePart {
    /// The 2-byte length prefix.
    LengthPrefix,
    /// The payload.
    Payload,
}

impl fmt::Display for FramePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthPrefix => f.write_str("length prefix"),
            Self::Payload => f.write_str("payload"),
        }
    }
}

/// Framing failures. Both are fatal for a run.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Input ended inside a frame.
    #[error(
        "truncated frame at byte offset {offset}: {part} needs {declared} bytes, {available} available"
    )]
    Truncated {
        /// Offset of the frame's length prefix.
        offset: u64,
        /// Where the input ran out.
        part: FramePart,
        /// Bytes the part required.
        declared: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// Underlying read failed.
    #[error("read error at byte offset {offset}: {source}")]
    Io {
        /// Offset of the frame being read.
        offset: u64,
        /// I/O error.
        #[source]
        source: io::Error,
    },
}

impl FrameError {
    /// Byte offset of the failing frame.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        match self {
            Self::Truncated { offset, .. } | Self::Io { offset, .. } => *offset,
        }
    }
}

/// One frame, borrowed from the reader's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Offset of the length prefix in the input.
    pub offset: u64,
    /// Payload, starting with the message tag.
    pub payload: &'a [u8],
}

impl Frame<'_> {
    /// Bytes this frame occupied in the input, prefix included.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        LENGTH_PREFIX_BYTES + self.payload.len()
    }
}

/// Reads frames sequentially from any byte source.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: Vec<u8>,
    offset: u64,
    frames: u64,
}

impl<R: Read> FrameReader<R> {
    /// Wrap a reader. Buffer the reader for file input.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(usize::from(u16::MAX)),
            offset: 0,
            frames: 0,
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// Frames returned so far.
    #[must_use]
    pub const fn frames_read(&self) -> u64 {
        self.frames
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` when the input ends exactly on a frame boundary.
    pub fn next_frame(&mut self) -> Result<Option<Frame<'_>>, FrameError> {
        let offset = self.offset;

        let mut prefix = [0u8; LENGTH_PREFIX_BYTES];
        let got = fill(&mut self.reader, &mut prefix).map_err(|source| FrameError::Io {
            offset,
            source,
        })?;
        if got == 0 {
            return Ok(None);
        }
        if got < LENGTH_PREFIX_BYTES {
            return Err(FrameError::Truncated {
                offset,
                part: FramePart::LengthPrefix,
                declared: LENGTH_PREFIX_BYTES,
                available: got,
            });
        }

        let declared = usize::from(u16::from_be_bytes(prefix));
        self.buffer.resize(declared, 0);
        let got = fill(&mut self.reader, &mut self.buffer).map_err(|source| FrameError::Io {
            offset,
            source,
        })?;
        if got < declared {
            return Err(FrameError::Truncated {
                offset,
                part: FramePart::Payload,
                declared,
                available: got,
            });
        }

        self.offset += (LENGTH_PREFIX_BYTES + declared) as u64;
        self.frames += 1;
        Ok(Some(Frame {
            offset,
            payload: &self.buffer,
        }))
    }
}

/// Read until `buf` is full or the input ends. Returns bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Writes length-prefixed ITCH frames.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
    frames: u64,
}

impl<W: Write> FrameWriter<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    /// Encode and write one message.
    pub fn write_message(&mut self, message: &ItchMessage) -> io::Result<()> {
        self.write_payload(&codec::encode(message))
    }

    /// Write a raw payload with its length prefix.
    pub fn write_payload(&mut self, payload: &[u8]) -> io::Result<()> {
        let len = u16::try_from(payload.len()).map_err(|_| {
            io::Error::new(ErrorKind::InvalidInput, "payload longer than 65535 bytes")
        })?;
        self.writer.write_all(&len.to_be_bytes())?;
        self.writer.write_all(payload)?;
        self.frames += 1;
        Ok(())
    }

    /// Frames written so far.
    #[must_use]
    pub const fn frames_written(&self) -> u64 {
        self.frames
    }

    /// Flush and return the inner writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
