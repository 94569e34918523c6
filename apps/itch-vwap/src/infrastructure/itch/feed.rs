//! ITCH Feed Adapter
//!
//! Implements [`MessageFeedPort`] over a [`FrameReader`]: each frame is
//! decoded and classified. Truncation, read failures and frames whose length
//! disagrees with their layout are fatal; unknown tags and out-of-range field
//! bytes are handed back for the pipeline to count and skip.

use std::io::Read;

use super::codec::{DecodeError, decode};
use super::framing::{FrameError, FrameReader};
use crate::application::ports::{FeedError, FeedItem, FeedRecord, MessageFeedPort};

/// Decoded ITCH messages from a length-prefixed byte stream.
#[derive(Debug)]
pub struct ItchFeed<R> {
    frames: FrameReader<R>,
}

impl<R: Read> ItchFeed<R> {
    /// Wrap a reader. Buffer the reader for file input.
    pub fn new(reader: R) -> Self {
        Self {
            frames: FrameReader::new(reader),
        }
    }
}

impl<R: Read> MessageFeedPort for ItchFeed<R> {
    fn next_record(&mut self) -> Result<Option<FeedRecord>, FeedError> {
        let Some(frame) = self.frames.next_frame()? else {
            return Ok(None);
        };
        let item = match decode(frame.payload) {
            Ok(message) => FeedItem::Message(message),
            Err(DecodeError::UnknownMessageType { tag }) => FeedItem::UnknownType { tag },
            Err(DecodeError::InvalidField { tag, field, value }) => {
                FeedItem::InvalidField { tag, field, value }
            }
            Err(err @ (DecodeError::EmptyFrame | DecodeError::LengthMismatch { .. })) => {
                return Err(FeedError::Malformed {
                    offset: frame.offset,
                    detail: err.to_string(),
                });
            }
        };
        Ok(Some(FeedRecord {
            offset: frame.offset,
            encoded_len: frame.encoded_len(),
            item,
        }))
    }
}

impl From<FrameError> for FeedError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Truncated {
                offset,
                part,
                declared,
                available,
            } => Self::Truncated {
                offset,
                detail: format!("{part} needs {declared} bytes, {available} available"),
            },
            FrameError::Io { offset, source } => Self::Io { offset, source },
        }
    }
}
