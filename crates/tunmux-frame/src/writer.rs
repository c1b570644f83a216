use std::io::Write;

use tracing::trace;
use tunmux_wire::Message;

use crate::capture::FrameLog;
use crate::error::{FrameError, Result};
use crate::MAX_PAYLOAD;

/// Writes framed messages to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    capture: Option<FrameLog>,
}

impl<T: Write> FrameWriter<T> {
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

    /// Encode and write one message as a single frame (blocking).
    ///
    /// A conforming producer never emits a payload over the cap, so an
    /// oversized message is rejected before anything reaches the wire.
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        let payload = message.encode();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::FrameTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        if let Some(capture) = &self.capture {
            capture.push(payload.clone());
        }

        let prefix = (payload.len() as u16).to_be_bytes();
        self.inner
            .write_all(&prefix)
            .map_err(FrameError::WriteFailed)?;
        self.inner
            .write_all(&payload)
            .map_err(FrameError::WriteFailed)?;
        self.inner.flush().map_err(FrameError::WriteFailed)?;
        trace!(length = payload.len(), "wrote frame");
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
