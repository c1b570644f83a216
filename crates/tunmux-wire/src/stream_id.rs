use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one multiplexed TCP flow on a tunnel connection.
pub type StreamIdentifier = u64;

/// Allocates process-unique stream identifiers.
///
/// Stream ids are peer-assigned: the side that opens a flow picks the id in
/// its `TCPOpen` message and the other side echoes it back in `TCPData` and
/// `TCPClose`. The two peers never derive an id independently, so a monotonic
/// counter is sufficient.
#[derive(Debug)]
pub struct StreamIdAllocator {
    next: AtomicU64,
}

impl StreamIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Hand out the next unused stream identifier.
    pub fn next_id(&self) -> StreamIdentifier {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for StreamIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
