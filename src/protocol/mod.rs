//! Telemetry wire format.
//!
//! Frames are a flat sequence of type-length-value records, one byte each for
//! type and length:
//!
//! | code | record                | value                   |
//! |------|-----------------------|-------------------------|
//! | 0x00 | frame start           | empty                   |
//! | 0x01 | node identity         | raw id bytes            |
//! | 0x02 | current cache count   | one byte                |
//! | 0x03 | max cache capacity    | one byte                |
//! | 0x04 | parent added/refreshed| raw link address        |
//! | 0x05 | parent dropped        | raw link address        |
//!
//! ```rust
//! use nodemeta::protocol::{encode_frame, NodeReport};
//! use nodemeta::{Event, LinkAddr, NodeId, RoutingState, StateSnapshot};
//!
//! let routing = RoutingState {
//!     rank: Some(3),
//!     floating: false,
//!     parent: LinkAddr::new(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
//!     prefix: None,
//! };
//! let snapshot = StateSnapshot::new(NodeId::new("Node A").unwrap(), &routing, 2, 16);
//! let frame = encode_frame(Event::ParentAdded, &snapshot).unwrap();
//! assert_eq!(&frame.as_bytes()[..4], &[0x00, 0x00, 0x01, 0x06]);
//!
//! let report = NodeReport::decode(frame.as_bytes()).unwrap();
//! assert_eq!(report.id.as_deref(), Some("NodeA"));
//! ```

mod decode;
mod encode;

pub use decode::{CacheInfo, NodeReport, TelemetryRecord, decode_frame};
pub use encode::encode_frame;
