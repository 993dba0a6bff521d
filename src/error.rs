//! Error types for telemetry export and content publication.
//!
//! Every failure in this crate is local to a single event-processing pass of the
//! router. Errors are logged and the offending event is dropped; nothing here is
//! ever escalated to process termination.
//!
//! ## Error Categories
//!
//! - **Encoding Errors**: a frame would exceed its fixed buffer (unreachable under
//!   the static record bounds)
//! - **Transmit Errors**: link buffer exhaustion or link-layer rejection
//! - **Publish Errors**: guard not met, malformed name, or cache/index rejection
//! - **Mailbox Errors**: non-blocking raise into a full or closed mailbox
//! - **Validation Errors**: node ids, link addresses and names out of bounds
//! - **Decode/Config Errors**: collector-side parsing and node configuration
//!
//! ## Recovery
//!
//! ```rust
//! use nodemeta::{TelemetryError, TransmitFailure};
//!
//! let error = TelemetryError::transmit_failed(TransmitFailure::PayloadExhausted);
//! assert!(error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use thiserror::Error;

use crate::types::Event;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Why a frame could not be handed to the link layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitFailure {
    /// No packet buffer was available for the frame payload.
    PayloadExhausted,
    /// The payload was allocated but no buffer was left for the link header.
    HeaderExhausted,
    /// The link layer refused the packet.
    LinkRejected,
}

impl std::fmt::Display for TransmitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransmitFailure::PayloadExhausted => f.write_str("packet buffer full"),
            TransmitFailure::HeaderExhausted => f.write_str("no buffer left for link header"),
            TransmitFailure::LinkRejected => f.write_str("unable to send"),
        }
    }
}

/// Why a publication did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishRejection {
    /// Rank undefined or node floating: no usable prefix yet.
    NoRoute,
    /// The routing collaborator has not handed out a prefix.
    NoPrefix,
    /// The device role does not originate content.
    NotOriginator,
    /// The synthesized name could not be decomposed into components.
    MalformedName(String),
    /// The content store refused the object.
    CacheRejected(String),
    /// The name index refused the registration.
    IndexRejected(String),
}

impl std::fmt::Display for PublishRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishRejection::NoRoute => f.write_str("rank undefined or node floating"),
            PublishRejection::NoPrefix => f.write_str("no routing prefix available"),
            PublishRejection::NotOriginator => f.write_str("device role does not publish"),
            PublishRejection::MalformedName(details) => write!(f, "malformed name: {details}"),
            PublishRejection::CacheRejected(details) => write!(f, "cache rejected content: {details}"),
            PublishRejection::IndexRejected(details) => write!(f, "name index rejected: {details}"),
        }
    }
}

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Frame overflow: record needs {needed} bytes, {remaining} remaining")]
    FrameOverflow { needed: usize, remaining: usize },

    #[error("Transmit failed: {reason}")]
    TransmitFailed { reason: TransmitFailure },

    #[error("Publish rejected: {reason}")]
    PublishRejected { reason: PublishRejection },

    #[error("Mailbox full, dropped {event:?}")]
    MailboxFull { event: Event },

    #[error("Mailbox closed, dropped {event:?}")]
    MailboxClosed { event: Event },

    #[error("Event {event:?} does not produce a telemetry frame")]
    NotEncodable { event: Event },

    #[error("Invalid node id ({len} bytes, max {max})")]
    InvalidNodeId { len: usize, max: usize },

    #[error("Invalid link address ({len} bytes, max {max})")]
    InvalidLinkAddress { len: usize, max: usize },

    #[error("Invalid content name '{name}': {details}")]
    InvalidName { name: String, details: String },

    #[error("Decode error at offset {offset}: {details}")]
    Decode { offset: usize, details: String },

    #[error("Configuration error: {details}")]
    Config { details: String },
}

impl TelemetryError {
    /// Returns whether the next pass of the router can be expected to succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TelemetryError::FrameOverflow { .. } => false,
            TelemetryError::TransmitFailed { .. } => true,
            TelemetryError::PublishRejected { reason } => {
                matches!(reason, PublishRejection::NoRoute | PublishRejection::NoPrefix)
            }
            TelemetryError::MailboxFull { .. } => true,
            TelemetryError::MailboxClosed { .. } => false,
            TelemetryError::NotEncodable { .. } => false,
            TelemetryError::InvalidNodeId { .. } => false,
            TelemetryError::InvalidLinkAddress { .. } => false,
            TelemetryError::InvalidName { .. } => false,
            TelemetryError::Decode { .. } => false,
            TelemetryError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::FrameOverflow { .. } => vec![
                "Check node id and link address bounds",
                "Verify the frame capacity covers the worst-case record set",
            ],
            TelemetryError::TransmitFailed { .. } => vec![
                "Wait for the next periodic tick to resend fresher state",
                "Increase the packet pool size",
            ],
            TelemetryError::PublishRejected { .. } => vec![
                "Wait for a parent advertisement before publishing",
                "Check the routing prefix and publisher category",
                "Check name cache capacity",
            ],
            TelemetryError::MailboxFull { .. } => vec![
                "Raise events less frequently",
                "Increase mailbox capacity in the node configuration",
            ],
            TelemetryError::MailboxClosed { .. } => vec!["Restart the node runtime"],
            TelemetryError::NotEncodable { .. } => {
                vec!["Route publish requests to the producer instead of the encoder"]
            }
            TelemetryError::InvalidNodeId { .. } => vec!["Shorten the configured node id"],
            TelemetryError::InvalidLinkAddress { .. } => {
                vec!["Use link addresses of at most eight bytes"]
            }
            TelemetryError::InvalidName { .. } => vec![
                "Names must start with '/' and have non-empty components",
                "Shorten the routing prefix or category",
            ],
            TelemetryError::Decode { .. } => vec![
                "Check the frame was captured completely",
                "Verify the sender speaks the same telemetry format",
            ],
            TelemetryError::Config { .. } => vec![
                "Check the YAML configuration file",
                "Compare against NodeConfig::default()",
            ],
        }
    }

    /// Helper constructor for transmit failures.
    pub fn transmit_failed(reason: TransmitFailure) -> Self {
        TelemetryError::TransmitFailed { reason }
    }

    /// Helper constructor for publish rejections.
    pub fn publish_rejected(reason: PublishRejection) -> Self {
        TelemetryError::PublishRejected { reason }
    }

    /// Helper constructor for invalid content names.
    pub fn invalid_name(name: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::InvalidName { name: name.into(), details: details.into() }
    }

    /// Helper constructor for decode errors.
    pub fn decode_error(offset: usize, details: impl Into<String>) -> Self {
        TelemetryError::Decode { offset, details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(details: impl Into<String>) -> Self {
        TelemetryError::Config { details: details.into() }
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::Config { details: err.to_string() }
    }
}
