//! Node configuration
//!
//! Loaded from YAML; every field has a default matching the deployed nodes.
//!
//! ```yaml
//! node_id: Node A
//! role: originator
//! telemetry:
//!   interval_secs: 5
//!   mailbox_capacity: 8
//! publisher:
//!   category: 1/gas
//!   interval_secs: 30
//! gate:
//!   threshold: 500
//!   primary_channel: 17
//!   alternate_channel: 11
//!   poll_interval_secs: 5
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mailbox::DEFAULT_MAILBOX_CAPACITY;
use crate::producer::DEFAULT_CATEGORY;
use crate::types::{DeviceRole, NodeId};
use crate::{Result, TelemetryError};

/// Longest interval any timer accepts, one week.
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Label carried in the identity record.
    pub node_id: String,
    pub role: DeviceRole,
    pub telemetry: TelemetryConfig,
    pub publisher: PublisherConfig,
    pub gate: GateConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "forwarder".to_string(),
            role: DeviceRole::default(),
            telemetry: TelemetryConfig::default(),
            publisher: PublisherConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

/// Telemetry router settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seconds between periodic frames when nothing else happens.
    pub interval_secs: u64,
    /// Events the mailbox holds before dropping.
    pub mailbox_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { interval_secs: 5, mailbox_capacity: DEFAULT_MAILBOX_CAPACITY }
    }
}

/// Content producer settings (originators only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Path inserted between the routing prefix and the counter.
    pub category: String,
    /// Publish periodically every this many seconds; button-only when unset.
    pub interval_secs: Option<u64>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self { category: DEFAULT_CATEGORY.to_string(), interval_secs: None }
    }
}

/// Light-driven channel gate settings (sensor gates only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// RGB sum below which the node goes dark and above which it comes back.
    pub threshold: u32,
    pub primary_channel: u16,
    pub alternate_channel: u16,
    pub poll_interval_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { threshold: 500, primary_channel: 17, alternate_channel: 11, poll_interval_secs: 5 }
    }
}

impl NodeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: NodeConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading node config {}", path.display()))?;
        let config = Self::from_yaml_str(&yaml)
            .with_context(|| format!("parsing node config {}", path.display()))?;
        debug!(node_id = %config.node_id, role = %config.role, "Loaded node config");
        Ok(config)
    }

    /// Check bounds the runtime relies on.
    pub fn validate(&self) -> Result<()> {
        self.node_id()?;
        check_interval("telemetry.interval_secs", self.telemetry.interval_secs)?;
        if self.telemetry.mailbox_capacity == 0 {
            return Err(TelemetryError::config_error("telemetry.mailbox_capacity must be > 0"));
        }
        if let Some(secs) = self.publisher.interval_secs {
            check_interval("publisher.interval_secs", secs)?;
        }
        if self.publisher.category.is_empty() {
            return Err(TelemetryError::config_error("publisher.category must not be empty"));
        }
        check_interval("gate.poll_interval_secs", self.gate.poll_interval_secs)?;
        Ok(())
    }

    pub fn node_id(&self) -> Result<NodeId> {
        NodeId::new(self.node_id.clone())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry.interval_secs)
    }

    /// Periodic publication interval, only for originators that configured one.
    pub fn publish_interval(&self) -> Option<Duration> {
        self.role.publishes().then_some(self.publisher.interval_secs).flatten().map(Duration::from_secs)
    }

    pub fn gate_poll_interval(&self) -> Duration {
        Duration::from_secs(self.gate.poll_interval_secs)
    }
}

fn check_interval(field: &str, secs: u64) -> Result<()> {
    if secs == 0 || secs > MAX_INTERVAL_SECS {
        return Err(TelemetryError::config_error(format!(
            "{field} must be between 1 and {MAX_INTERVAL_SECS}, got {secs}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = NodeConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.telemetry.mailbox_capacity, 8);
        assert_eq!(config.publish_interval(), None);
    }

    #[test]
    fn partial_document_overrides_fields() {
        let yaml = "node_id: Node A\nrole: originator\npublisher:\n  interval_secs: 30\n";
        let config = NodeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.node_id().unwrap().as_str(), "Node A");
        assert_eq!(config.role, DeviceRole::Originator);
        assert_eq!(config.publisher.category, "1/gas");
        assert_eq!(config.publish_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.gate, GateConfig::default());
    }

    #[test]
    fn publish_interval_requires_originator() {
        let yaml = "role: sensor_gate\npublisher:\n  interval_secs: 30\n";
        let config = NodeConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.publish_interval(), None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for yaml in [
            "telemetry:\n  interval_secs: 0\n",
            "telemetry:\n  mailbox_capacity: 0\n",
            "publisher:\n  interval_secs: 0\n",
            "publisher:\n  category: ''\n",
            "gate:\n  poll_interval_secs: 0\n",
            "telemetry:\n  interval_secs: 18446744073709551615\n",
            "publisher:\n  interval_secs: 604801\n",
            "gate:\n  poll_interval_secs: 18446744073709551615\n",
        ] {
            let err = NodeConfig::from_yaml_str(yaml).unwrap_err();
            assert!(matches!(err, TelemetryError::Config { .. }), "{yaml}");
        }
        let long_id = format!("node_id: {}\n", "x".repeat(40));
        assert!(matches!(
            NodeConfig::from_yaml_str(&long_id),
            Err(TelemetryError::InvalidNodeId { .. })
        ));
        assert!(NodeConfig::from_yaml_str("role: [").is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let err = NodeConfig::load("/nonexistent/node.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/node.yaml"));
    }
}
