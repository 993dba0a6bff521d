//! Light-driven radio channel gate for sensor gate nodes
//!
//! Darkness takes the node off the shared channel so neighbors see it vanish;
//! light brings it back. Both transitions compare against the same threshold,
//! so readings hovering around it can flip the channel on consecutive polls.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::GateConfig;
use crate::display::StatusDisplay;
use crate::link::LinkError;

/// Ambient light sensor failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("light sensor: {0}")]
pub struct SensorError(pub String);

/// One RGB reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgbReading {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl RgbReading {
    pub fn sum(&self) -> u32 {
        self.red.saturating_add(self.green).saturating_add(self.blue)
    }
}

/// Ambient light sensor driver.
#[async_trait::async_trait]
pub trait LightSensor: Send + 'static {
    async fn read(&mut self) -> Result<RgbReading, SensorError>;
}

/// Radio channel control of the link driver.
pub trait RadioControl: Send + Sync + 'static {
    fn set_channel(&self, channel: u16) -> Result<(), LinkError>;
}

/// Online/offline state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGate {
    threshold: u32,
    primary: u16,
    alternate: u16,
    online: bool,
}

impl ChannelGate {
    /// Initial state from a first reading, with the channel to start on.
    pub fn initial(config: &GateConfig, sum: u32) -> (Self, u16) {
        let online = sum >= config.threshold;
        let gate = Self {
            threshold: config.threshold,
            primary: config.primary_channel,
            alternate: config.alternate_channel,
            online,
        };
        let channel = gate.channel();
        (gate, channel)
    }

    /// Feed a reading; returns the channel to switch to on a transition.
    pub fn evaluate(&mut self, sum: u32) -> Option<u16> {
        if self.online && sum < self.threshold {
            self.online = false;
            Some(self.alternate)
        } else if !self.online && sum > self.threshold {
            self.online = true;
            Some(self.primary)
        } else {
            None
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn channel(&self) -> u16 {
        if self.online { self.primary } else { self.alternate }
    }
}

/// Periodic task polling the light sensor and switching channels.
pub struct LightGate<S: LightSensor> {
    config: GateConfig,
    sensor: S,
    radio: Arc<dyn RadioControl>,
    display: Arc<dyn StatusDisplay>,
    poll_interval: Duration,
}

impl<S: LightSensor> LightGate<S> {
    pub fn new(
        config: GateConfig,
        sensor: S,
        radio: Arc<dyn RadioControl>,
        display: Arc<dyn StatusDisplay>,
    ) -> Self {
        let poll_interval = Duration::from_secs(config.poll_interval_secs);
        Self { config, sensor, radio, display, poll_interval }
    }

    fn apply(&self, channel: u16) {
        info!("Set RF channel to {}", channel);
        if let Err(e) = self.radio.set_channel(channel) {
            warn!("Failed to set RF channel {}: {}", channel, e);
        }
        self.display.show_channel(channel);
    }

    /// Poll until cancelled.
    ///
    /// A failed first reading starts the node online on the primary channel.
    pub async fn run(mut self, cancel: CancellationToken) {
        let first = match self.sensor.read().await {
            Ok(reading) => reading.sum(),
            Err(e) => {
                warn!("Initial light reading failed: {}", e);
                self.config.threshold
            }
        };
        let (mut gate, channel) = ChannelGate::initial(&self.config, first);
        self.apply(channel);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Light gate cancelled");
                    break;
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }

            let sum = match self.sensor.read().await {
                Ok(reading) => reading.sum(),
                Err(e) => {
                    warn!("Skipping light poll: {}", e);
                    continue;
                }
            };
            info!(sum, threshold = self.config.threshold, "RGB light value");
            if let Some(channel) = gate.evaluate(sum) {
                self.apply(channel);
            }
        }
    }
}
