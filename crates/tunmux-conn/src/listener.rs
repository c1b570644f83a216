use std::fmt::Display;
use std::net::{SocketAddr, ToSocketAddrs};

use tunmux_transport::TcpTransport;

use crate::connection::{ConnectionConfig, TunnelConnection};
use crate::error::Result;

/// Accepts incoming tunnel connections.
///
/// Wraps each accepted transport stream in a pumped [`TunnelConnection`].
/// Accept failures propagate to the caller; the listener does not retry.
pub struct TunnelListener {
    transport: TcpTransport,
    config: ConnectionConfig,
}

impl TunnelListener {
    /// Bind to a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + Display) -> Result<Self> {
        Ok(Self {
            transport: TcpTransport::bind(addr)?,
            config: ConnectionConfig::default(),
        })
    }

    /// Apply `config` to every accepted connection.
    pub fn with_config(mut self, config: ConnectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Block until the next tunnel client connects.
    pub fn accept(&self) -> Result<TunnelConnection> {
        let stream = self.transport.accept()?;
        TunnelConnection::with_config(stream, self.config.clone())
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use tunmux_wire::Message;

    use super::*;
    use crate::connector::connect;

    #[test]
    fn accepted_connections_are_pumped() {
        let listener = TunnelListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let server_thread = std::thread::spawn(move || {
            let connection = listener.accept().unwrap();
            assert_eq!(connection.receive(), Some(Message::IpRequestV4));
            connection.send(Message::IpAssignV4(Ipv4Addr::new(10, 8, 0, 2)));
            // Keep the connection alive until the reply has been read.
            assert_eq!(connection.receive(), None);
        });

        let client = connect(addr).unwrap();
        client.send(Message::IpRequestV4);
        assert_eq!(
            client.receive(),
            Some(Message::IpAssignV4(Ipv4Addr::new(10, 8, 0, 2)))
        );
        client.close();

        server_thread.join().unwrap();
    }

    #[test]
    fn listener_config_applies_to_accepted_connections() {
        let listener = TunnelListener::bind("127.0.0.1:0")
            .unwrap()
            .with_config(ConnectionConfig {
                log_reads: true,
                log_writes: true,
            });
        let addr = listener.local_addr();

        let server_thread = std::thread::spawn(move || {
            let connection = listener.accept().unwrap();
            assert_eq!(connection.receive(), Some(Message::IpRequestV6));
            assert_eq!(connection.read_log().unwrap().len(), 1);
            assert!(connection.write_log().is_some());
        });

        let client = connect(addr).unwrap();
        assert!(client.read_log().is_none());
        client.send(Message::IpRequestV6);

        server_thread.join().unwrap();
        client.close();
    }

    #[test]
    fn accepts_multiple_connections() {
        let listener = TunnelListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr();

        let server_thread = std::thread::spawn(move || {
            for expected in [1u64, 2] {
                let connection = listener.accept().unwrap();
                assert_eq!(connection.receive(), Some(Message::TcpClose(expected)));
            }
        });

        for id in [1u64, 2] {
            let client = connect(addr).unwrap();
            client.send(Message::TcpClose(id));
            // Wait for the peer to consume before tearing the socket down.
            assert_eq!(client.receive(), None);
        }

        server_thread.join().unwrap();
    }
}
