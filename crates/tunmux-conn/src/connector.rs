use std::fmt::Display;
use std::net::ToSocketAddrs;

use tunmux_transport::TcpTransport;

use crate::connection::{ConnectionConfig, TunnelConnection};
use crate::error::Result;

/// Connect to a listening tunnel server.
pub fn connect(addr: impl ToSocketAddrs + Display) -> Result<TunnelConnection> {
    connect_with_config(addr, ConnectionConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(
    addr: impl ToSocketAddrs + Display,
    config: ConnectionConfig,
) -> Result<TunnelConnection> {
    let stream = TcpTransport::connect(addr)?;
    TunnelConnection::with_config(stream, config)
}
