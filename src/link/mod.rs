//! Link-layer interface
//!
//! Packet buffers come from a bounded [`PacketPool`]; dropping a
//! [`PacketBuffer`] returns its slot, so a buffer acquired on a failing path
//! is released simply by letting it go out of scope.

mod loopback;

pub use loopback::LoopbackLink;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

/// Link-layer send failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("interface down")]
    Down,
    #[error("send rejected: {0}")]
    Rejected(String),
}

/// Trait for link-layer drivers.
///
/// Allocation is synchronous and may fail under memory pressure; sending may
/// wait on the radio.
#[async_trait::async_trait]
pub trait LinkLayer: Send + Sync + 'static {
    /// Allocate a buffer of `len` bytes, or `None` when the pool is exhausted.
    fn allocate(&self, len: usize) -> Option<PacketBuffer>;

    /// Hand a packet to the interface.
    async fn send(&self, packet: LinkPacket) -> Result<(), LinkError>;
}

/// Fixed number of packet buffers shared by all senders.
#[derive(Debug, Clone)]
pub struct PacketPool {
    free: Arc<AtomicUsize>,
    size: usize,
}

impl PacketPool {
    pub fn new(buffers: usize) -> Self {
        Self { free: Arc::new(AtomicUsize::new(buffers)), size: buffers }
    }

    /// Take one buffer of `len` zeroed bytes.
    pub fn try_alloc(&self, len: usize) -> Option<PacketBuffer> {
        self.free
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |free| free.checked_sub(1))
            .ok()?;
        Some(PacketBuffer { data: vec![0; len], pool: Arc::clone(&self.free) })
    }

    /// Buffers currently free.
    pub fn available(&self) -> usize {
        self.free.load(Ordering::Acquire)
    }

    /// Total buffers in the pool.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// One pooled buffer. Returns to its pool on drop.
#[derive(Debug)]
pub struct PacketBuffer {
    data: Vec<u8>,
    pool: Arc<AtomicUsize>,
}

impl PacketBuffer {
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Drop for PacketBuffer {
    fn drop(&mut self) {
        self.pool.fetch_add(1, Ordering::AcqRel);
    }
}

/// Header flag marking a link-layer broadcast.
pub const FLAG_BROADCAST: u8 = 0x01;

/// Link header plus payload, ready for the interface.
///
/// The header buffer holds the flags byte followed by the destination address
/// (empty for broadcasts).
#[derive(Debug)]
pub struct LinkPacket {
    pub header: PacketBuffer,
    pub payload: PacketBuffer,
}

impl LinkPacket {
    pub fn is_broadcast(&self) -> bool {
        self.header.as_slice().first().is_some_and(|flags| flags & FLAG_BROADCAST != 0)
    }
}
