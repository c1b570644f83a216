use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use bytes::Bytes;

/// Shared capture of raw frame payloads, for postmortem inspection.
///
/// When attached to a [`FrameReader`](crate::FrameReader) or
/// [`FrameWriter`](crate::FrameWriter), every frame payload that crosses the
/// stream is appended here. After a decode failure the captured frames show
/// exactly what was on the wire.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    frames: Arc<Mutex<Vec<Bytes>>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, payload: Bytes) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.push(payload);
        }
    }

    /// Copy of every captured frame, in capture order.
    pub fn snapshot(&self) -> Vec<Bytes> {
        self.frames
            .lock()
            .map(|frames| frames.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().map(|frames| frames.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hex dump of every captured frame, one line per frame.
    pub fn hex_dump(&self) -> String {
        let mut out = String::new();
        for (index, frame) in self.snapshot().iter().enumerate() {
            let _ = write!(out, "frame {index} ({} bytes):", frame.len());
            for byte in frame.iter() {
                let _ = write!(out, " {byte:02x}");
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_in_order() {
        let log = FrameLog::new();
        assert!(log.is_empty());

        log.push(Bytes::from_static(b"\x0B"));
        log.push(Bytes::from_static(b"\x02\x00"));

        let frames = log.snapshot();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref(), b"\x0B");
        assert_eq!(frames[1].as_ref(), b"\x02\x00");
    }

    #[test]
    fn clones_share_the_same_capture() {
        let log = FrameLog::new();
        let clone = log.clone();
        clone.push(Bytes::from_static(b"\x0B"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn hex_dump_lists_each_frame() {
        let log = FrameLog::new();
        log.push(Bytes::from_static(&[0x02, 0x2A]));
        let dump = log.hex_dump();
        assert_eq!(dump, "frame 0 (2 bytes): 02 2a\n");
    }
}
