//! Loopback link delivering broadcasts to in-process listeners

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::trace;

use super::{LinkError, LinkLayer, LinkPacket, PacketBuffer, PacketPool};

/// Frames kept for slow listeners before they start lagging.
const LISTENER_BACKLOG: usize = 64;

/// Shared broadcast medium backed by a bounded packet pool.
///
/// Every sent payload is delivered to all current listeners. Pool exhaustion
/// and link rejection can be forced for testing failure paths.
#[derive(Debug)]
pub struct LoopbackLink {
    pool: PacketPool,
    medium: broadcast::Sender<Arc<[u8]>>,
    rejecting: AtomicBool,
    sent: AtomicUsize,
}

impl LoopbackLink {
    pub fn new(buffers: usize) -> Self {
        let (medium, _) = broadcast::channel(LISTENER_BACKLOG);
        Self { pool: PacketPool::new(buffers), medium, rejecting: AtomicBool::new(false), sent: AtomicUsize::new(0) }
    }

    /// Listen for every payload sent from now on.
    pub fn listen(&self) -> broadcast::Receiver<Arc<[u8]>> {
        self.medium.subscribe()
    }

    /// Payloads sent from now on, as a stream.
    pub fn frames(&self) -> BroadcastStream<Arc<[u8]>> {
        BroadcastStream::new(self.medium.subscribe())
    }

    /// Make the interface refuse packets.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::Release);
    }

    /// Packets accepted so far.
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Acquire)
    }

    pub fn pool(&self) -> &PacketPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl LinkLayer for LoopbackLink {
    fn allocate(&self, len: usize) -> Option<PacketBuffer> {
        self.pool.try_alloc(len)
    }

    async fn send(&self, packet: LinkPacket) -> Result<(), LinkError> {
        if self.rejecting.load(Ordering::Acquire) {
            return Err(LinkError::Rejected("loopback rejecting".into()));
        }
        let payload: Arc<[u8]> = Arc::from(packet.payload.as_slice());
        let listeners = self.medium.send(payload).unwrap_or(0);
        self.sent.fetch_add(1, Ordering::AcqRel);
        trace!(len = packet.payload.len(), listeners, broadcast = packet.is_broadcast(), "Loopback send");
        Ok(())
    }
}
