use std::fmt::Display;
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::stream::TunnelStream;

/// TCP transport.
///
/// Provides bind/accept for a tunnel server and connect for a tunnel client.
pub struct TcpTransport {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + Display) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening for tunnel connections");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<TunnelStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        let stream = TunnelStream::from_tcp(stream);
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted tunnel connection");
        Ok(stream)
    }

    /// Connect to a listening tunnel server (blocking).
    pub fn connect(addr: impl ToSocketAddrs + Display) -> Result<TunnelStream> {
        let tcp = TcpStream::connect(&addr).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        let stream = TunnelStream::from_tcp(tcp);
        stream.set_nodelay(true)?;
        debug!(%addr, "connected to tunnel server");
        Ok(stream)
    }

    /// The address this transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
