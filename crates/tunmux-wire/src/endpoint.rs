use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};

/// Encoded size of an IPv4 address.
pub const ADDRESS_SIZE_V4: usize = 4;

/// Encoded size of an IPv6 address.
pub const ADDRESS_SIZE_V6: usize = 16;

/// Encoded size of a port number.
pub const PORT_SIZE: usize = 2;

/// Encoded size of an [`EndpointV4`]: port then address.
pub const ENDPOINT_SIZE_V4: usize = PORT_SIZE + ADDRESS_SIZE_V4;

/// Encoded size of an [`EndpointV6`]: port then address.
pub const ENDPOINT_SIZE_V6: usize = PORT_SIZE + ADDRESS_SIZE_V6;

/// One side of an IPv4 TCP or UDP flow.
///
/// Wire format is the port as a 2-byte big-endian integer followed by the
/// four raw address octets, 6 bytes total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointV4 {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl EndpointV4 {
    pub fn new(host: Ipv4Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Append the wire encoding to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.put_u16(self.port);
        dst.put_slice(&self.host.octets());
    }

    /// The wire encoding as an owned buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ENDPOINT_SIZE_V4);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Decode from exactly [`ENDPOINT_SIZE_V4`] bytes.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != ENDPOINT_SIZE_V4 {
            return Err(WireError::MalformedEndpoint);
        }
        let port = u16::from_be_bytes([src[0], src[1]]);
        let octets: [u8; ADDRESS_SIZE_V4] =
            src[PORT_SIZE..].try_into().map_err(|_| WireError::MalformedEndpoint)?;
        Ok(Self {
            host: Ipv4Addr::from(octets),
            port,
        })
    }
}

impl Ord for EndpointV4 {
    /// Lexicographic on address octets, then port.
    fn cmp(&self, other: &Self) -> Ordering {
        self.host
            .octets()
            .cmp(&other.host.octets())
            .then(self.port.cmp(&other.port))
    }
}

impl PartialOrd for EndpointV4 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EndpointV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One side of an IPv6 TCP or UDP flow.
///
/// Wire format is the port as a 2-byte big-endian integer followed by the
/// sixteen raw address octets, 18 bytes total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointV6 {
    pub host: Ipv6Addr,
    pub port: u16,
}

impl EndpointV6 {
    pub fn new(host: Ipv6Addr, port: u16) -> Self {
        Self { host, port }
    }

    /// Append the wire encoding to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        dst.put_u16(self.port);
        dst.put_slice(&self.host.octets());
    }

    /// The wire encoding as an owned buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ENDPOINT_SIZE_V6);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Decode from exactly [`ENDPOINT_SIZE_V6`] bytes.
    pub fn decode(src: &[u8]) -> Result<Self> {
        if src.len() != ENDPOINT_SIZE_V6 {
            return Err(WireError::MalformedEndpoint);
        }
        let port = u16::from_be_bytes([src[0], src[1]]);
        let octets: [u8; ADDRESS_SIZE_V6] =
            src[PORT_SIZE..].try_into().map_err(|_| WireError::MalformedEndpoint)?;
        Ok(Self {
            host: Ipv6Addr::from(octets),
            port,
        })
    }
}

impl Ord for EndpointV6 {
    /// Lexicographic on address octets, then port.
    fn cmp(&self, other: &Self) -> Ordering {
        self.host
            .octets()
            .cmp(&other.host.octets())
            .then(self.port.cmp(&other.port))
    }
}

impl PartialOrd for EndpointV6 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EndpointV6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]:{}", self.host, self.port)
    }
}
