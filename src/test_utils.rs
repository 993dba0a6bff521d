//! Shared fixtures for unit tests and benchmarks

#![cfg(any(test, feature = "benchmark"))]

use crate::types::{LinkAddr, NodeId, RoutingState, StateSnapshot};

/// Parent address used by the fixtures.
pub const PARENT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

/// A node with a route and a prefix.
pub fn routed_state(prefix: &str) -> RoutingState {
    RoutingState {
        rank: Some(3),
        floating: false,
        parent: LinkAddr::new(&PARENT).expect("fixture address fits"),
        prefix: Some(prefix.to_string()),
    }
}

pub fn snapshot_with(
    id: &str,
    routing: &RoutingState,
    occupied: usize,
    capacity: usize,
) -> StateSnapshot {
    let node_id = NodeId::new(id).expect("fixture id fits");
    StateSnapshot::new(node_id, routing, occupied, capacity)
}

/// "Node A" at rank 3 under parent 01:..:08, two of sixteen names cached.
pub fn node_a_snapshot() -> StateSnapshot {
    snapshot_with("Node A", &routed_state("/HAW"), 2, 16)
}
