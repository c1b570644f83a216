//! Length-prefixed message framing for the tunmux tunneling protocol.
//!
//! Every message travels as one frame: a 2-byte big-endian payload length,
//! then that many payload bytes, decoded by `tunmux-wire`. There is no
//! resynchronization point — any framing or decode failure is terminal for
//! the byte stream that produced it.

pub mod capture;
pub mod error;
pub mod reader;
pub mod writer;

pub use capture::FrameLog;
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

/// Maximum frame payload a conforming peer accepts or produces, in bytes.
pub const MAX_PAYLOAD: usize = 1600;

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 2;
