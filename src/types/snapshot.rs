//! Node identity, link addresses and the state snapshot read by the encoder

use serde::{Deserialize, Serialize};

use crate::cache::ContentCache;
use crate::{Result, TelemetryError};

/// Longest node id the identity record can carry.
pub const MAX_NODE_ID_LEN: usize = 32;

/// Longest link-layer address in this deployment (IEEE 802.15.4 long address).
pub const MAX_LINK_ADDR_LEN: usize = 8;

/// Largest count a single-byte cache record can carry.
pub const MAX_RECORD_COUNT: usize = u8::MAX as usize;

/// Short device label sent in the identity record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Validate and wrap a node id.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.len() > MAX_NODE_ID_LEN {
            return Err(TelemetryError::InvalidNodeId { len: id.len(), max: MAX_NODE_ID_LEN });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for NodeId {
    type Error = TelemetryError;

    fn try_from(value: String) -> Result<Self> {
        NodeId::new(value)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link-layer address of at most [`MAX_LINK_ADDR_LEN`] bytes.
///
/// Stored inline so snapshots stay `Copy`-cheap and allocation free.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinkAddr {
    bytes: [u8; MAX_LINK_ADDR_LEN],
    len: u8,
}

impl LinkAddr {
    /// The empty address (no parent).
    pub const EMPTY: LinkAddr = LinkAddr { bytes: [0; MAX_LINK_ADDR_LEN], len: 0 };

    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_LINK_ADDR_LEN {
            return Err(TelemetryError::InvalidLinkAddress {
                len: bytes.len(),
                max: MAX_LINK_ADDR_LEN,
            });
        }
        let mut addr = LinkAddr::EMPTY;
        addr.bytes[..bytes.len()].copy_from_slice(bytes);
        addr.len = bytes.len() as u8;
        Ok(addr)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for LinkAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LinkAddr({self})")
    }
}

/// Colon separated lowercase hex, the way collectors print addresses.
impl std::fmt::Display for LinkAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, byte) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for LinkAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Routing state published by the routing collaborator.
///
/// When a parent is dropped the collaborator keeps `parent` pointing at the
/// dropped parent so the parent-dropped record can still report it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutingState {
    /// DODAG rank, `None` until a valid parent advertisement arrived.
    pub rank: Option<u16>,
    /// No currently valid parent route.
    pub floating: bool,
    /// Current (or last dropped) parent link address.
    pub parent: LinkAddr,
    /// Name prefix handed out by the DODAG root.
    pub prefix: Option<String>,
}

impl RoutingState {
    /// State of a node that has not joined any DODAG yet.
    pub fn detached() -> Self {
        Self { rank: None, floating: true, parent: LinkAddr::EMPTY, prefix: None }
    }

    /// Whether the node has a usable parent: rank defined and not floating.
    pub fn has_route(&self) -> bool {
        self.rank.is_some() && !self.floating
    }
}

/// Immutable view of everything a telemetry frame reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSnapshot {
    pub node_id: NodeId,
    pub rank: Option<u16>,
    pub floating: bool,
    pub parent: LinkAddr,
    pub cache_occupied: usize,
    pub cache_capacity: usize,
}

impl StateSnapshot {
    /// Build a snapshot, clamping occupancy to capacity.
    pub fn new(node_id: NodeId, routing: &RoutingState, occupied: usize, capacity: usize) -> Self {
        Self {
            node_id,
            rank: routing.rank,
            floating: routing.floating,
            parent: routing.parent,
            cache_occupied: occupied.min(capacity),
            cache_capacity: capacity,
        }
    }

    /// Capture routing state and rescan the cache table for in-use slots.
    pub fn capture(node_id: &NodeId, routing: &RoutingState, cache: &dyn ContentCache) -> Self {
        let occupied = crate::cache::count_in_use(cache);
        Self::new(node_id.clone(), routing, occupied, cache.capacity())
    }

    pub fn has_route(&self) -> bool {
        self.rank.is_some() && !self.floating
    }

    /// Occupancy as carried on the wire.
    pub fn occupied_byte(&self) -> u8 {
        self.cache_occupied.min(MAX_RECORD_COUNT) as u8
    }

    /// Capacity as carried on the wire.
    pub fn capacity_byte(&self) -> u8 {
        self.cache_capacity.min(MAX_RECORD_COUNT) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_rejects_long_labels() {
        assert!(NodeId::new("Node A").is_ok());
        assert!(NodeId::new("x".repeat(MAX_NODE_ID_LEN)).is_ok());
        let err = NodeId::new("x".repeat(MAX_NODE_ID_LEN + 1)).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidNodeId { len: 33, max: 32 }));
    }

    #[test]
    fn link_addr_bounds_and_display() {
        let addr = LinkAddr::new(&[0xd3, 0xc1, 0x6d, 0x73]).unwrap();
        assert_eq!(addr.len(), 4);
        assert_eq!(addr.to_string(), "d3:c1:6d:73");
        assert!(LinkAddr::EMPTY.is_empty());
        assert!(LinkAddr::new(&[0; 9]).is_err());
    }

    #[test]
    fn snapshot_clamps_occupancy_to_capacity() {
        let id = NodeId::new("n").unwrap();
        let snapshot = StateSnapshot::new(id, &RoutingState::detached(), 40, 16);
        assert_eq!(snapshot.cache_occupied, 16);
        assert_eq!(snapshot.occupied_byte(), 16);
    }

    #[test]
    fn wire_counts_saturate_at_one_byte() {
        let id = NodeId::new("n").unwrap();
        let snapshot = StateSnapshot::new(id, &RoutingState::detached(), 300, 1000);
        assert_eq!(snapshot.occupied_byte(), 255);
        assert_eq!(snapshot.capacity_byte(), 255);
    }

    #[test]
    fn route_requires_rank_and_parent() {
        let mut state = RoutingState::detached();
        assert!(!state.has_route());
        state.rank = Some(3);
        assert!(!state.has_route());
        state.floating = false;
        assert!(state.has_route());
    }
}
