//! Core types for node telemetry.
//!
//! - [`Event`] is the payload-free trigger the router receives
//! - [`StateSnapshot`] is the read-only state a frame reports, composed from
//!   the routing collaborator's [`RoutingState`] and a fresh cache scan
//! - [`TelemetryFrame`] and [`FrameWriter`] hold the bounded wire encoding
//! - [`ContentName`] and [`PublishedContent`] describe locally produced content
//! - [`DeviceRole`] selects per-node behavior at startup

mod content;
mod event;
mod frame;
mod role;
mod snapshot;

pub use content::{ContentName, MAX_NAME_LEN, PublishedContent};
pub use event::{Event, RecordSet};
pub use frame::{
    FRAME_CAPACITY, FrameWriter, RECORD_HEADER_LEN, RecordType, TelemetryFrame,
    WORST_CASE_FRAME_LEN,
};
pub use role::DeviceRole;
pub use snapshot::{
    LinkAddr, MAX_LINK_ADDR_LEN, MAX_NODE_ID_LEN, MAX_RECORD_COUNT, NodeId, RoutingState,
    StateSnapshot,
};
