use std::io::Read;

use bytes::Bytes;
use tracing::trace;
use tunmux_wire::Message;

use crate::capture::FrameLog;
use crate::error::{FrameError, Result};
use crate::{LENGTH_PREFIX_SIZE, MAX_PAYLOAD};

/// Reads framed messages from any `Read` stream.
///
/// Each call reads exactly one length prefix and one payload; there is no
/// internal buffering beyond the frame being read, so a `FrameReader` can be
/// dropped between frames without losing stream position.
pub struct FrameReader<T> {
    inner: T,
    capture: Option<FrameLog>,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            capture: None,
        }
    }

    /// Capture every raw frame payload into `log`.
    pub fn set_capture(&mut self, log: FrameLog) {
        self.capture = Some(log);
    }

    /// Read the next complete message (blocking).
    ///
    /// An oversized length claim fails without reading the payload; after it
    /// the stream has no usable frame boundary and must be abandoned.
    pub fn read_message(&mut self) -> Result<Message> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        self.inner
            .read_exact(&mut prefix)
            .map_err(FrameError::ShortRead)?;
        let length = u16::from_be_bytes(prefix) as usize;

        if length > MAX_PAYLOAD {
            return Err(FrameError::FrameTooLarge {
                size: length,
                max: MAX_PAYLOAD,
            });
        }

        let mut payload = vec![0u8; length];
        self.inner
            .read_exact(&mut payload)
            .map_err(FrameError::ShortRead)?;
        let payload = Bytes::from(payload);
        trace!(length, "read frame");

        if let Some(capture) = &self.capture {
            capture.push(payload.clone());
        }

        Message::decode(&payload).map_err(FrameError::from)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
