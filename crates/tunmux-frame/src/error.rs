use tunmux_wire::WireError;

/// Errors that can occur while framing messages over a byte stream.
///
/// All of them are terminal for the connection that owns the stream: the
/// protocol has no way to find the next frame boundary after a failure.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame length exceeds the protocol maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// The stream ended or failed before a complete frame was read.
    #[error("short read: {0}")]
    ShortRead(#[source] std::io::Error),

    /// Writing a frame to the transport failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// The frame payload did not decode as a message.
    #[error("malformed message: {0}")]
    Malformed(#[from] WireError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
