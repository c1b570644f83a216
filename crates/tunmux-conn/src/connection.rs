use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use tracing::{debug, warn};
use tunmux_frame::{FrameLog, FrameReader, FrameWriter};
use tunmux_transport::TunnelStream;
use tunmux_wire::Message;

use crate::error::{ConnectionError, Result};

/// Behavior knobs for a tunnel connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionConfig {
    /// Capture every raw frame read, for postmortem inspection of a
    /// malformed stream.
    pub log_reads: bool,
    /// Capture every raw frame written.
    pub log_writes: bool,
}

/// State shared by the two pumps and the public API.
struct Shared {
    /// Extra handle to the socket, used only for shutdown. Each pump owns
    /// its own clone for I/O.
    stream: TunnelStream,
    open: AtomicBool,
}

impl Shared {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Transition open -> closed exactly once and fail in-flight pump I/O.
    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!("closing tunnel connection");
            if let Err(err) = self.stream.shutdown() {
                warn!(%err, "transport shutdown failed");
            }
        }
    }
}

/// One session-multiplexed tunnel connection.
///
/// Owns the transport stream and two pump threads. The application talks to
/// the pumps only through two FIFO queues: [`send`](Self::send) enqueues
/// without touching the network, [`receive`](Self::receive) dequeues
/// whatever the reader pump has decoded. Messages keep their order in both
/// directions; the first I/O failure or malformed frame closes the whole
/// connection.
pub struct TunnelConnection {
    shared: Arc<Shared>,
    inbound: Mutex<Receiver<Message>>,
    /// Dropped on close so a writer pump blocked on an empty queue exits.
    outbound: Mutex<Option<Sender<Message>>>,
    read_log: Option<FrameLog>,
    write_log: Option<FrameLog>,
    reader_handle: Option<JoinHandle<()>>,
    writer_handle: Option<JoinHandle<()>>,
}

impl TunnelConnection {
    /// Wrap a transport stream and start the reader and writer pumps.
    pub fn new(stream: TunnelStream) -> Result<Self> {
        Self::with_config(stream, ConnectionConfig::default())
    }

    /// Wrap a transport stream with explicit configuration.
    pub fn with_config(stream: TunnelStream, config: ConnectionConfig) -> Result<Self> {
        let reader_stream = stream.try_clone()?;
        let writer_stream = stream.try_clone()?;

        let shared = Arc::new(Shared {
            stream,
            open: AtomicBool::new(true),
        });

        let read_log = config.log_reads.then(FrameLog::new);
        let write_log = config.log_writes.then(FrameLog::new);

        let mut frame_reader = FrameReader::new(reader_stream);
        if let Some(log) = &read_log {
            frame_reader.set_capture(log.clone());
        }
        let mut frame_writer = FrameWriter::new(writer_stream);
        if let Some(log) = &write_log {
            frame_writer.set_capture(log.clone());
        }

        let (inbound_tx, inbound_rx) = mpsc::channel();
        let (outbound_tx, outbound_rx) = mpsc::channel();

        let reader_shared = Arc::clone(&shared);
        let reader_handle = std::thread::Builder::new()
            .name("tunmux-reader".into())
            .spawn(move || reader_pump(frame_reader, inbound_tx, reader_shared))
            .map_err(ConnectionError::Spawn)?;

        let writer_shared = Arc::clone(&shared);
        let writer_handle = std::thread::Builder::new()
            .name("tunmux-writer".into())
            .spawn(move || writer_pump(frame_writer, outbound_rx, writer_shared))
            .map_err(ConnectionError::Spawn)?;

        Ok(Self {
            shared,
            inbound: Mutex::new(inbound_rx),
            outbound: Mutex::new(Some(outbound_tx)),
            read_log,
            write_log,
            reader_handle: Some(reader_handle),
            writer_handle: Some(writer_handle),
        })
    }

    /// Queue a message for transmission. Never blocks on network I/O.
    ///
    /// Messages are written to the wire in the order they were queued. Once
    /// the connection is closed this is a no-op and the message is dropped.
    pub fn send(&self, message: Message) {
        if !self.shared.is_open() {
            return;
        }
        if let Ok(guard) = self.outbound.lock() {
            if let Some(sender) = guard.as_ref() {
                // The writer pump holding the other end only exits after the
                // connection closes, so a send failure just means we raced a
                // close — same outcome as the guard above.
                let _ = sender.send(message);
            }
        }
    }

    /// Pop the next inbound message.
    ///
    /// Blocks the caller (not the pumps) until a message arrives. Returns
    /// `None` once the connection has closed and the inbound queue is
    /// drained — receivers never hang on a dead connection.
    pub fn receive(&self) -> Option<Message> {
        let inbound = self.inbound.lock().ok()?;
        if self.shared.is_open() {
            inbound.recv().ok()
        } else {
            inbound.try_recv().ok()
        }
    }

    /// Pop the next inbound message without blocking.
    pub fn try_receive(&self) -> Option<Message> {
        self.inbound.lock().ok()?.try_recv().ok()
    }

    /// Close the connection and stop both pumps.
    ///
    /// Idempotent. Messages still queued for transmission are dropped; there
    /// is no graceful drain.
    pub fn close(&self) {
        self.shared.close();
        if let Ok(mut guard) = self.outbound.lock() {
            // Unblocks a writer pump waiting on an empty outbound queue.
            guard.take();
        }
    }

    /// Whether the connection is still open.
    pub fn is_open(&self) -> bool {
        self.shared.is_open()
    }

    /// Raw frames read so far, when `log_reads` was enabled.
    pub fn read_log(&self) -> Option<&FrameLog> {
        self.read_log.as_ref()
    }

    /// Raw frames written so far, when `log_writes` was enabled.
    pub fn write_log(&self) -> Option<&FrameLog> {
        self.write_log.as_ref()
    }
}

impl Drop for TunnelConnection {
    fn drop(&mut self) {
        self.close();
        // Shutdown above fails any in-flight pump I/O, so these joins are
        // prompt.
        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.writer_handle.take() {
            let _ = handle.join();
        }
    }
}

/// Reader pump: frames off the wire into the inbound queue, in order.
///
/// Any framing or decode error closes the connection; there is no skipping
/// bytes or resynchronizing after a malformed frame.
fn reader_pump(
    mut reader: FrameReader<TunnelStream>,
    inbound: Sender<Message>,
    shared: Arc<Shared>,
) {
    while shared.is_open() {
        match reader.read_message() {
            Ok(message) => {
                debug!(%message, "received");
                if inbound.send(message).is_err() {
                    // Application dropped the connection.
                    break;
                }
            }
            Err(err) => {
                if shared.is_open() {
                    warn!(%err, "reader pump stopping");
                }
                break;
            }
        }
    }
    shared.close();
    // The inbound sender drops here, unblocking any receive() in progress.
}

/// Writer pump: outbound queue onto the wire, in order.
fn writer_pump(
    mut writer: FrameWriter<TunnelStream>,
    outbound: Receiver<Message>,
    shared: Arc<Shared>,
) {
    while shared.is_open() {
        // Blocks the pump, never the caller. Errors when close() drops the
        // sender.
        let message = match outbound.recv() {
            Ok(message) => message,
            Err(_) => break,
        };
        if let Err(err) = writer.write_message(&message) {
            if shared.is_open() {
                warn!(%err, "writer pump stopping");
            }
            break;
        }
        debug!(%message, "sent");
    }
    shared.close();
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    use bytes::Bytes;
    use tunmux_transport::TcpTransport;
    use tunmux_wire::{EndpointV4, Message};

    use super::*;

    /// A connected (server, client) pair of pumped connections.
    fn connection_pair() -> (TunnelConnection, TunnelConnection) {
        connection_pair_with(ConnectionConfig::default(), ConnectionConfig::default())
    }

    fn connection_pair_with(
        server_config: ConnectionConfig,
        client_config: ConnectionConfig,
    ) -> (TunnelConnection, TunnelConnection) {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || TcpTransport::connect(addr).unwrap());
        let server_stream = transport.accept().unwrap();
        let client_stream = client_thread.join().unwrap();

        let server = TunnelConnection::with_config(server_stream, server_config).unwrap();
        let client = TunnelConnection::with_config(client_stream, client_config).unwrap();
        (server, client)
    }

    #[test]
    fn messages_arrive_in_send_order() {
        let (server, client) = connection_pair();

        let a = Message::TcpOpenV4(EndpointV4::new(Ipv4Addr::new(10, 0, 0, 1), 80), 1);
        let b = Message::TcpData(1, Bytes::from_static(b"GET / HTTP/1.1\r\n"));
        let c = Message::TcpClose(1);

        client.send(a.clone());
        client.send(b.clone());
        client.send(c.clone());

        assert_eq!(server.receive(), Some(a));
        assert_eq!(server.receive(), Some(b));
        assert_eq!(server.receive(), Some(c));
    }

    #[test]
    fn both_directions_carry_traffic() {
        let (server, client) = connection_pair();

        client.send(Message::IpRequestV4);
        assert_eq!(server.receive(), Some(Message::IpRequestV4));

        server.send(Message::IpAssignV4(Ipv4Addr::new(10, 8, 0, 2)));
        assert_eq!(
            client.receive(),
            Some(Message::IpAssignV4(Ipv4Addr::new(10, 8, 0, 2)))
        );
    }

    #[test]
    fn close_makes_receive_return_none() {
        let (server, client) = connection_pair();

        client.close();
        assert!(!client.is_open());
        assert_eq!(client.receive(), None);

        // The peer sees the closed socket and its receive unblocks too.
        assert_eq!(server.receive(), None);
    }

    #[test]
    fn send_after_close_is_a_noop() {
        let (server, client) = connection_pair();

        client.send(Message::IpRequestV4);
        assert_eq!(server.receive(), Some(Message::IpRequestV4));

        client.close();
        client.send(Message::IpRequestV6);
        client.send(Message::TcpClose(9));

        assert_eq!(server.receive(), None);
    }

    #[test]
    fn close_is_idempotent() {
        let (_server, client) = connection_pair();
        client.close();
        client.close();
        client.close();
        assert!(!client.is_open());
    }

    #[test]
    fn peer_disconnect_closes_the_connection() {
        let (server, client) = connection_pair();
        drop(client);

        assert_eq!(server.receive(), None);
        // The reader pump noticed the failure and closed the whole connection.
        assert!(!server.is_open());
    }

    #[test]
    fn try_receive_does_not_block() {
        let (server, client) = connection_pair();

        assert_eq!(server.try_receive(), None);

        client.send(Message::IpRequestDualStack);
        let mut received = None;
        for _ in 0..100 {
            received = server.try_receive();
            if received.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(received, Some(Message::IpRequestDualStack));
    }

    #[test]
    fn malformed_frame_closes_the_connection() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || TcpTransport::connect(addr).unwrap());
        let server_stream = transport.accept().unwrap();
        let mut raw_client = client_thread.join().unwrap();

        let server = TunnelConnection::new(server_stream).unwrap();

        // A frame claiming an unknown tag: length 1, tag 0xFF.
        raw_client.write_all(&[0x00, 0x01, 0xFF]).unwrap();

        assert_eq!(server.receive(), None);
        assert!(!server.is_open());
    }

    #[test]
    fn read_log_captures_the_malformed_frame() {
        let transport = TcpTransport::bind("127.0.0.1:0").unwrap();
        let addr = transport.local_addr();

        let client_thread = std::thread::spawn(move || TcpTransport::connect(addr).unwrap());
        let server_stream = transport.accept().unwrap();
        let mut raw_client = client_thread.join().unwrap();

        let server = TunnelConnection::with_config(
            server_stream,
            ConnectionConfig {
                log_reads: true,
                log_writes: false,
            },
        )
        .unwrap();

        raw_client.write_all(&[0x00, 0x02, 0xFF, 0x00]).unwrap();
        assert_eq!(server.receive(), None);

        let log = server.read_log().expect("read log was enabled");
        let frames = log.snapshot();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), &[0xFF, 0x00]);
        assert!(log.hex_dump().contains("ff 00"));
    }

    #[test]
    fn write_log_captures_outbound_frames() {
        let (server, client) = connection_pair_with(
            ConnectionConfig::default(),
            ConnectionConfig {
                log_reads: false,
                log_writes: true,
            },
        );

        client.send(Message::TcpClose(42));
        assert_eq!(server.receive(), Some(Message::TcpClose(42)));

        let frames = client.write_log().unwrap().snapshot();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref(), Message::TcpClose(42).encode().as_ref());
    }

    #[test]
    fn bulk_transfer_keeps_order_and_content() {
        let (server, client) = connection_pair();

        for i in 0..200u64 {
            client.send(Message::TcpData(
                i,
                Bytes::from(i.to_be_bytes().to_vec()),
            ));
        }

        for i in 0..200u64 {
            let message = server.receive().expect("stream ended early");
            assert_eq!(
                message,
                Message::TcpData(i, Bytes::from(i.to_be_bytes().to_vec()))
            );
        }
    }

    #[test]
    fn drop_joins_the_pumps() {
        let (server, client) = connection_pair();
        drop(server);
        drop(client);
        // Nothing to assert: the test passes by not hanging.
    }
}
