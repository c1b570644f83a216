use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};

use crate::error::Result;

/// A connected tunnel transport stream.
///
/// Wraps a TCP stream. The layers above rely only on `Read`, `Write`,
/// [`try_clone`](Self::try_clone) (one handle per pump direction), and
/// [`shutdown`](Self::shutdown).
#[derive(Debug)]
pub struct TunnelStream {
    inner: TcpStream,
}

impl TunnelStream {
    pub(crate) fn from_tcp(stream: TcpStream) -> Self {
        Self { inner: stream }
    }

    /// Clone this stream (a new handle to the same socket).
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            inner: self.inner.try_clone()?,
        })
    }

    /// Shut down both directions, failing any in-flight blocking read or
    /// write on any clone of this stream promptly.
    ///
    /// Idempotent: shutting down a stream that is already down succeeds.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Set read timeout on the underlying socket.
    pub fn set_read_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_read_timeout(timeout).map_err(Into::into)
    }

    /// Set write timeout on the underlying socket.
    pub fn set_write_timeout(&self, timeout: Option<std::time::Duration>) -> Result<()> {
        self.inner.set_write_timeout(timeout).map_err(Into::into)
    }

    /// Disable or enable Nagle's algorithm. Tunnel traffic is latency
    /// sensitive, so connect/accept paths turn it off by default.
    pub fn set_nodelay(&self, nodelay: bool) -> Result<()> {
        self.inner.set_nodelay(nodelay).map_err(Into::into)
    }

    /// The address of the connected peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }
}

impl Read for TunnelStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for TunnelStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;
    use crate::tcp::TcpTransport;

    #[test]
    fn clones_share_one_socket() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || {
            let mut client = TcpTransport::connect(addr).unwrap();
            client.write_all(b"ping").unwrap();
            let mut buf = [0u8; 4];
            client.read_exact(&mut buf).unwrap();
            buf
        });

        let server = transport.accept().unwrap();
        let mut read_half = server.try_clone().unwrap();
        let mut write_half = server.try_clone().unwrap();

        let mut buf = [0u8; 4];
        read_half.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        write_half.write_all(b"pong").unwrap();

        assert_eq!(&client_thread.join().unwrap(), b"pong");
    }

    #[test]
    fn shutdown_unblocks_a_reader() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || TcpTransport::connect(addr).unwrap());
        let server = transport.accept().unwrap();
        let client = client_thread.join().unwrap();

        let mut blocked = server.try_clone().unwrap();
        let reader_thread = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            blocked.read(&mut buf)
        });

        std::thread::sleep(std::time::Duration::from_millis(50));
        server.shutdown().unwrap();

        // A shut-down socket surfaces EOF or an error, never a hang.
        let outcome = reader_thread.join().unwrap();
        match outcome {
            Ok(n) => assert_eq!(n, 0),
            Err(_) => {}
        }
        drop(client);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || TcpTransport::connect(addr).unwrap());
        let server = transport.accept().unwrap();
        let _client = client_thread.join().unwrap();

        server.shutdown().unwrap();
        server.shutdown().unwrap();
    }
}
