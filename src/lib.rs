//! Event-driven telemetry exporter and content publisher for constrained ICN nodes.
//!
//! A node runs one router task that owns a bounded mailbox of [`Event`]s. Routing
//! and cache collaborators raise events; the router captures a
//! [`StateSnapshot`], encodes it into a TLV [`TelemetryFrame`] and broadcasts it
//! on the link. A re-armed five second tick keeps frames flowing while nothing
//! else happens. Originator nodes additionally publish named content on request.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use nodemeta::link::LoopbackLink;
//! use nodemeta::stream::DecodeFramesExt;
//! use nodemeta::{Node, NodeConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let link = Arc::new(LoopbackLink::new(8));
//!     let mut reports = link.frames().decode_frames();
//!
//!     let node = Node::new(NodeConfig::load("node.yaml")?, link).start()?;
//!     if let Some(report) = reports.next().await {
//!         println!("{:?}", report);
//!     }
//!     node.shutdown().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire format
pub mod protocol;
pub mod stream;

// Event loop and its collaborators
pub mod cache;
pub mod link;
pub mod mailbox;
pub mod rearm;
pub mod router;
pub mod routing;
pub mod transmitter;

// Node roles and assembly
pub mod config;
pub mod display;
pub mod gate;
pub mod node;
pub mod producer;

// Core exports
pub use error::*;
pub use types::*;

pub use config::NodeConfig;
pub use node::{Node, NodeHandle};
pub use protocol::{NodeReport, decode_frame, encode_frame};
pub use router::{Router, RouterHandle, RouterStats};
