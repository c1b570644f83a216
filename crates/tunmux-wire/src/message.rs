use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::endpoint::{
    EndpointV4, EndpointV6, ADDRESS_SIZE_V4, ADDRESS_SIZE_V6, ENDPOINT_SIZE_V4, ENDPOINT_SIZE_V6,
};
use crate::error::{Result, WireError};
use crate::stream_id::StreamIdentifier;

/// Wire width of a stream identifier.
///
/// Uniform for every message that carries one; never the width of an
/// endpoint.
pub const STREAM_ID_SIZE: usize = 8;

/// The tag byte of each message variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    TcpOpenV4 = 0,
    TcpOpenV6 = 1,
    TcpClose = 2,
    TcpData = 3,
    UdpDataV4 = 4,
    UdpDataV6 = 5,
    IpAssignV4 = 6,
    IpAssignV6 = 7,
    IpAssignDualStack = 8,
    IpDataV4 = 9,
    IpDataV6 = 10,
    IpRequestV4 = 11,
    IpRequestV6 = 12,
    IpRequestDualStack = 13,
    IpReuseV4 = 14,
    IpReuseV6 = 15,
    IpReuseDualStack = 16,
    IcmpDataV4 = 17,
    IcmpDataV6 = 18,
}

impl MessageType {
    /// Map a tag byte to its message type, if the tag is known.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::TcpOpenV4),
            1 => Some(Self::TcpOpenV6),
            2 => Some(Self::TcpClose),
            3 => Some(Self::TcpData),
            4 => Some(Self::UdpDataV4),
            5 => Some(Self::UdpDataV6),
            6 => Some(Self::IpAssignV4),
            7 => Some(Self::IpAssignV6),
            8 => Some(Self::IpAssignDualStack),
            9 => Some(Self::IpDataV4),
            10 => Some(Self::IpDataV6),
            11 => Some(Self::IpRequestV4),
            12 => Some(Self::IpRequestV6),
            13 => Some(Self::IpRequestDualStack),
            14 => Some(Self::IpReuseV4),
            15 => Some(Self::IpReuseV6),
            16 => Some(Self::IpReuseDualStack),
            17 => Some(Self::IcmpDataV4),
            18 => Some(Self::IcmpDataV6),
            _ => None,
        }
    }

    /// The tag byte for this message type.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// One protocol message.
///
/// The closed set of flows a tunnel connection multiplexes: TCP stream
/// control and data, UDP datagrams, raw IP packets, ICMP traffic, and
/// IP-address-assignment negotiation. Each variant owns its payload outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Open a TCP flow to an IPv4 destination under a sender-assigned stream id.
    TcpOpenV4(EndpointV4, StreamIdentifier),
    /// Open a TCP flow to an IPv6 destination under a sender-assigned stream id.
    TcpOpenV6(EndpointV6, StreamIdentifier),
    /// Close the TCP flow with this stream id.
    TcpClose(StreamIdentifier),
    /// Carry stream bytes for an open TCP flow.
    TcpData(StreamIdentifier, Bytes),
    /// Carry one UDP datagram for an IPv4 destination.
    UdpDataV4(EndpointV4, Bytes),
    /// Carry one UDP datagram for an IPv6 destination.
    UdpDataV6(EndpointV6, Bytes),
    /// Server assigns the client an IPv4 address.
    IpAssignV4(Ipv4Addr),
    /// Server assigns the client an IPv6 address.
    IpAssignV6(Ipv6Addr),
    /// Server assigns the client both an IPv4 and an IPv6 address.
    IpAssignDualStack(Ipv4Addr, Ipv6Addr),
    /// Carry one raw IPv4 packet.
    IpDataV4(Bytes),
    /// Carry one raw IPv6 packet.
    IpDataV6(Bytes),
    /// Client requests an IPv4 address assignment.
    IpRequestV4,
    /// Client requests an IPv6 address assignment.
    IpRequestV6,
    /// Client requests a dual-stack address assignment.
    IpRequestDualStack,
    /// Client asks to keep a previously assigned IPv4 address.
    IpReuseV4(Ipv4Addr),
    /// Client asks to keep a previously assigned IPv6 address.
    IpReuseV6(Ipv6Addr),
    /// Client asks to keep a previously assigned dual-stack pair.
    IpReuseDualStack(Ipv4Addr, Ipv6Addr),
    /// Carry ICMP traffic for an IPv4 source or target address.
    IcmpDataV4(Ipv4Addr, Bytes),
    /// Carry ICMP traffic for an IPv6 source or target address.
    IcmpDataV6(Ipv6Addr, Bytes),
}

impl Message {
    /// The type of this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::TcpOpenV4(..) => MessageType::TcpOpenV4,
            Message::TcpOpenV6(..) => MessageType::TcpOpenV6,
            Message::TcpClose(..) => MessageType::TcpClose,
            Message::TcpData(..) => MessageType::TcpData,
            Message::UdpDataV4(..) => MessageType::UdpDataV4,
            Message::UdpDataV6(..) => MessageType::UdpDataV6,
            Message::IpAssignV4(..) => MessageType::IpAssignV4,
            Message::IpAssignV6(..) => MessageType::IpAssignV6,
            Message::IpAssignDualStack(..) => MessageType::IpAssignDualStack,
            Message::IpDataV4(..) => MessageType::IpDataV4,
            Message::IpDataV6(..) => MessageType::IpDataV6,
            Message::IpRequestV4 => MessageType::IpRequestV4,
            Message::IpRequestV6 => MessageType::IpRequestV6,
            Message::IpRequestDualStack => MessageType::IpRequestDualStack,
            Message::IpReuseV4(..) => MessageType::IpReuseV4,
            Message::IpReuseV6(..) => MessageType::IpReuseV6,
            Message::IpReuseDualStack(..) => MessageType::IpReuseDualStack,
            Message::IcmpDataV4(..) => MessageType::IcmpDataV4,
            Message::IcmpDataV6(..) => MessageType::IcmpDataV6,
        }
    }

    /// Encode into the wire format: tag byte, then the variant's fields.
    ///
    /// Integers are big-endian, endpoints are port-then-address, and payload
    /// bytes are appended verbatim with no length of their own — a payload
    /// runs to the end of the enclosing frame.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(64);
        buf.put_u8(self.message_type().tag());

        match self {
            Message::TcpOpenV4(dst, stream_id) => {
                dst.encode_into(&mut buf);
                buf.put_u64(*stream_id);
            }
            Message::TcpOpenV6(dst, stream_id) => {
                dst.encode_into(&mut buf);
                buf.put_u64(*stream_id);
            }
            Message::TcpClose(stream_id) => {
                buf.put_u64(*stream_id);
            }
            Message::TcpData(stream_id, payload) => {
                buf.put_u64(*stream_id);
                buf.put_slice(payload);
            }
            Message::UdpDataV4(dst, payload) => {
                dst.encode_into(&mut buf);
                buf.put_slice(payload);
            }
            Message::UdpDataV6(dst, payload) => {
                dst.encode_into(&mut buf);
                buf.put_slice(payload);
            }
            Message::IpAssignV4(addr) => {
                buf.put_slice(&addr.octets());
            }
            Message::IpAssignV6(addr) => {
                buf.put_slice(&addr.octets());
            }
            Message::IpAssignDualStack(v4, v6) => {
                buf.put_slice(&v4.octets());
                buf.put_slice(&v6.octets());
            }
            Message::IpDataV4(packet) => {
                buf.put_slice(packet);
            }
            Message::IpDataV6(packet) => {
                buf.put_slice(packet);
            }
            Message::IpRequestV4 | Message::IpRequestV6 | Message::IpRequestDualStack => {}
            Message::IpReuseV4(addr) => {
                buf.put_slice(&addr.octets());
            }
            Message::IpReuseV6(addr) => {
                buf.put_slice(&addr.octets());
            }
            Message::IpReuseDualStack(v4, v6) => {
                buf.put_slice(&v4.octets());
                buf.put_slice(&v6.octets());
            }
            Message::IcmpDataV4(addr, payload) => {
                buf.put_slice(&addr.octets());
                buf.put_slice(payload);
            }
            Message::IcmpDataV6(addr, payload) => {
                buf.put_slice(&addr.octets());
                buf.put_slice(payload);
            }
        }

        buf.freeze()
    }

    /// Decode one complete message body.
    ///
    /// Fixed-size variants must consume their input exactly; the four
    /// payload-carrying families (`TCPData`, `UDPData*`, `IPData*`,
    /// `ICMPData*`) take everything after their fixed fields as payload.
    pub fn decode(src: &[u8]) -> Result<Message> {
        let (&tag, body) = src.split_first().ok_or(WireError::EmptyMessage)?;
        let message_type = MessageType::from_tag(tag).ok_or(WireError::UnknownMessageType(tag))?;

        match message_type {
            MessageType::TcpOpenV4 => {
                let (endpoint, rest) = split_fixed(body, ENDPOINT_SIZE_V4)?;
                let dst = EndpointV4::decode(endpoint)?;
                let stream_id = decode_stream_id(take_exact(rest, STREAM_ID_SIZE)?);
                Ok(Message::TcpOpenV4(dst, stream_id))
            }
            MessageType::TcpOpenV6 => {
                let (endpoint, rest) = split_fixed(body, ENDPOINT_SIZE_V6)?;
                let dst = EndpointV6::decode(endpoint)?;
                let stream_id = decode_stream_id(take_exact(rest, STREAM_ID_SIZE)?);
                Ok(Message::TcpOpenV6(dst, stream_id))
            }
            MessageType::TcpClose => {
                let stream_id = decode_stream_id(take_exact(body, STREAM_ID_SIZE)?);
                Ok(Message::TcpClose(stream_id))
            }
            MessageType::TcpData => {
                let (id_bytes, payload) = split_fixed(body, STREAM_ID_SIZE)?;
                let stream_id = decode_stream_id(id_bytes);
                Ok(Message::TcpData(stream_id, Bytes::copy_from_slice(payload)))
            }
            MessageType::UdpDataV4 => {
                let (endpoint, payload) = split_fixed(body, ENDPOINT_SIZE_V4)?;
                let dst = EndpointV4::decode(endpoint)?;
                Ok(Message::UdpDataV4(dst, Bytes::copy_from_slice(payload)))
            }
            MessageType::UdpDataV6 => {
                let (endpoint, payload) = split_fixed(body, ENDPOINT_SIZE_V6)?;
                let dst = EndpointV6::decode(endpoint)?;
                Ok(Message::UdpDataV6(dst, Bytes::copy_from_slice(payload)))
            }
            MessageType::IpAssignV4 => {
                let addr = decode_ipv4(take_exact(body, ADDRESS_SIZE_V4)?);
                Ok(Message::IpAssignV4(addr))
            }
            MessageType::IpAssignV6 => {
                let addr = decode_ipv6(take_exact(body, ADDRESS_SIZE_V6)?);
                Ok(Message::IpAssignV6(addr))
            }
            MessageType::IpAssignDualStack => {
                let (v4_bytes, rest) = split_fixed(body, ADDRESS_SIZE_V4)?;
                let v4 = decode_ipv4(v4_bytes);
                let v6 = decode_ipv6(take_exact(rest, ADDRESS_SIZE_V6)?);
                Ok(Message::IpAssignDualStack(v4, v6))
            }
            MessageType::IpDataV4 => Ok(Message::IpDataV4(Bytes::copy_from_slice(body))),
            MessageType::IpDataV6 => Ok(Message::IpDataV6(Bytes::copy_from_slice(body))),
            MessageType::IpRequestV4 => {
                take_exact(body, 0)?;
                Ok(Message::IpRequestV4)
            }
            MessageType::IpRequestV6 => {
                take_exact(body, 0)?;
                Ok(Message::IpRequestV6)
            }
            MessageType::IpRequestDualStack => {
                take_exact(body, 0)?;
                Ok(Message::IpRequestDualStack)
            }
            MessageType::IpReuseV4 => {
                let addr = decode_ipv4(take_exact(body, ADDRESS_SIZE_V4)?);
                Ok(Message::IpReuseV4(addr))
            }
            MessageType::IpReuseV6 => {
                let addr = decode_ipv6(take_exact(body, ADDRESS_SIZE_V6)?);
                Ok(Message::IpReuseV6(addr))
            }
            MessageType::IpReuseDualStack => {
                let (v4_bytes, rest) = split_fixed(body, ADDRESS_SIZE_V4)?;
                let v4 = decode_ipv4(v4_bytes);
                let v6 = decode_ipv6(take_exact(rest, ADDRESS_SIZE_V6)?);
                Ok(Message::IpReuseDualStack(v4, v6))
            }
            MessageType::IcmpDataV4 => {
                let (addr_bytes, payload) = split_fixed(body, ADDRESS_SIZE_V4)?;
                let addr = decode_ipv4(addr_bytes);
                Ok(Message::IcmpDataV4(addr, Bytes::copy_from_slice(payload)))
            }
            MessageType::IcmpDataV6 => {
                let (addr_bytes, payload) = split_fixed(body, ADDRESS_SIZE_V6)?;
                let addr = decode_ipv6(addr_bytes);
                Ok(Message::IcmpDataV6(addr, Bytes::copy_from_slice(payload)))
            }
        }
    }
}

/// Split `size` fixed-field bytes off the front, leaving the rest.
fn split_fixed(body: &[u8], size: usize) -> Result<(&[u8], &[u8])> {
    if body.len() < size {
        return Err(WireError::TruncatedMessage);
    }
    Ok(body.split_at(size))
}

/// Require `body` to be exactly `size` bytes.
fn take_exact(body: &[u8], size: usize) -> Result<&[u8]> {
    match body.len().cmp(&size) {
        Ordering::Less => Err(WireError::TruncatedMessage),
        Ordering::Greater => Err(WireError::TrailingBytes(body.len() - size)),
        Ordering::Equal => Ok(body),
    }
}

/// Callers guarantee `bytes` is exactly `STREAM_ID_SIZE` long.
fn decode_stream_id(bytes: &[u8]) -> StreamIdentifier {
    let mut raw = [0u8; STREAM_ID_SIZE];
    raw.copy_from_slice(bytes);
    u64::from_be_bytes(raw)
}

/// Callers guarantee `bytes` is exactly `ADDRESS_SIZE_V4` long.
fn decode_ipv4(bytes: &[u8]) -> Ipv4Addr {
    let mut octets = [0u8; ADDRESS_SIZE_V4];
    octets.copy_from_slice(bytes);
    Ipv4Addr::from(octets)
}

/// Callers guarantee `bytes` is exactly `ADDRESS_SIZE_V6` long.
fn decode_ipv6(bytes: &[u8]) -> Ipv6Addr {
    let mut octets = [0u8; ADDRESS_SIZE_V6];
    octets.copy_from_slice(bytes);
    Ipv6Addr::from(octets)
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::TcpOpenV4(dst, id) => write!(f, "TCPOpenV4 {dst} stream {id}"),
            Message::TcpOpenV6(dst, id) => write!(f, "TCPOpenV6 {dst} stream {id}"),
            Message::TcpClose(id) => write!(f, "TCPClose stream {id}"),
            Message::TcpData(id, payload) => {
                write!(f, "TCPData stream {id}, {} bytes", payload.len())
            }
            Message::UdpDataV4(dst, payload) => {
                write!(f, "UDPDataV4 {dst}, {} bytes", payload.len())
            }
            Message::UdpDataV6(dst, payload) => {
                write!(f, "UDPDataV6 {dst}, {} bytes", payload.len())
            }
            Message::IpAssignV4(addr) => write!(f, "IPAssignV4 {addr}"),
            Message::IpAssignV6(addr) => write!(f, "IPAssignV6 {addr}"),
            Message::IpAssignDualStack(v4, v6) => write!(f, "IPAssignDualStack {v4} {v6}"),
            Message::IpDataV4(packet) => write!(f, "IPDataV4 {} bytes", packet.len()),
            Message::IpDataV6(packet) => write!(f, "IPDataV6 {} bytes", packet.len()),
            Message::IpRequestV4 => write!(f, "IPRequestV4"),
            Message::IpRequestV6 => write!(f, "IPRequestV6"),
            Message::IpRequestDualStack => write!(f, "IPRequestDualStack"),
            Message::IpReuseV4(addr) => write!(f, "IPReuseV4 {addr}"),
            Message::IpReuseV6(addr) => write!(f, "IPReuseV6 {addr}"),
            Message::IpReuseDualStack(v4, v6) => write!(f, "IPReuseDualStack {v4} {v6}"),
            Message::IcmpDataV4(addr, payload) => {
                write!(f, "ICMPDataV4 {addr}, {} bytes", payload.len())
            }
            Message::IcmpDataV6(addr, payload) => {
                write!(f, "ICMPDataV6 {addr}, {} bytes", payload.len())
            }
        }
    }
}
