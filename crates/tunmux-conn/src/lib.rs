//! Pumped tunnel connections for the tunmux protocol.
//!
//! This is the layer applications talk to. A [`TunnelConnection`] owns a
//! transport stream plus two pump threads: the reader pump decodes frames
//! into an inbound queue, the writer pump drains an outbound queue onto the
//! wire. `send` and `receive` only ever touch the queues, so application
//! calls are decoupled from the pace of the socket.

pub mod connection;
pub mod connector;
pub mod error;
pub mod listener;

pub use connection::{ConnectionConfig, TunnelConnection};
pub use connector::{connect, connect_with_config};
pub use error::{ConnectionError, Result};
pub use listener::TunnelListener;
