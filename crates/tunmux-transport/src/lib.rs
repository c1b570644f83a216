//! Byte-stream transport for tunmux tunnel connections.
//!
//! The framing and connection layers only need four things from a transport:
//! blocking reads, blocking writes, a shutdown that fails in-flight I/O
//! promptly, and (server side) accept. [`TunnelStream`] and [`TcpTransport`]
//! provide those over TCP. Everything else in the workspace builds on this
//! crate.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::TunnelStream;
pub use tcp::TcpTransport;
