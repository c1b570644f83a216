//! Binary wire codec for the tunmux tunneling protocol.
//!
//! One tunnel connection multiplexes many logical flows — TCP streams, UDP
//! datagrams, raw IP packets, ICMP traffic, and address-assignment
//! negotiation — as a closed set of tagged messages. This crate is the pure
//! encode/decode layer: no I/O, no partial values, every failure is a typed
//! [`WireError`].

pub mod endpoint;
pub mod error;
pub mod message;
pub mod stream_id;

pub use endpoint::{
    EndpointV4, EndpointV6, ADDRESS_SIZE_V4, ADDRESS_SIZE_V6, ENDPOINT_SIZE_V4, ENDPOINT_SIZE_V6,
};
pub use error::{Result, WireError};
pub use message::{Message, MessageType, STREAM_ID_SIZE};
pub use stream_id::{StreamIdAllocator, StreamIdentifier};
