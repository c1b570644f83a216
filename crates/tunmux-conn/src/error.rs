/// Errors that can occur while establishing a tunnel connection.
///
/// Once a connection is running, pump failures are not surfaced here — the
/// application observes them as `receive` returning `None` and `send`
/// becoming a no-op.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] tunmux_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] tunmux_frame::FrameError),

    /// Failed to spawn a pump thread.
    #[error("failed to spawn pump thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConnectionError>;
