/// Errors that can occur while decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The endpoint bytes are the wrong size for their address family.
    #[error("malformed endpoint")]
    MalformedEndpoint,

    /// The message body was empty — not even a tag byte.
    #[error("empty message")]
    EmptyMessage,

    /// The tag byte does not name a known message type.
    #[error("unknown message type {0}")]
    UnknownMessageType(u8),

    /// The message body ended before its fixed fields were complete.
    #[error("truncated message")]
    TruncatedMessage,

    /// Surplus bytes followed the body of a fixed-size message.
    #[error("{0} trailing bytes after message body")]
    TrailingBytes(usize),
}

pub type Result<T> = std::result::Result<T, WireError>;
