//! Node assembly: wires mailbox, routing, cache, router and role extras

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cache::SlotCache;
use crate::config::NodeConfig;
use crate::display::{self, StatusDisplay};
use crate::gate::{LightGate, LightSensor, RadioControl};
use crate::link::LinkLayer;
use crate::mailbox::{EventSender, mailbox};
use crate::producer::{ClockSampler, Producer, Sampler};
use crate::router::{Router, RouterHandle, RouterStats};
use crate::routing::RoutingHandle;
use crate::types::{Event, RoutingState};
use crate::{Result, TelemetryError};

/// Name slots of the default cache.
pub const DEFAULT_NAME_SLOTS: usize = 16;

/// Builder for a running node.
pub struct Node {
    config: NodeConfig,
    link: Arc<dyn LinkLayer>,
    sampler: Option<Box<dyn Sampler>>,
    display: Option<Arc<dyn StatusDisplay>>,
    name_slots: usize,
    initial: RoutingState,
}

impl Node {
    pub fn new(config: NodeConfig, link: Arc<dyn LinkLayer>) -> Self {
        Self {
            config,
            link,
            sampler: None,
            display: None,
            name_slots: DEFAULT_NAME_SLOTS,
            initial: RoutingState::detached(),
        }
    }

    /// Value source for published content. Defaults to the microsecond clock.
    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Override the display picked from the role.
    pub fn with_display(mut self, display: Arc<dyn StatusDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_name_slots(mut self, name_slots: usize) -> Self {
        self.name_slots = name_slots;
        self
    }

    /// Routing state before the first transition.
    pub fn with_routing(mut self, initial: RoutingState) -> Self {
        self.initial = initial;
        self
    }

    /// Validate the configuration and spawn the router.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> Result<NodeHandle> {
        self.config.validate()?;
        let node_id = self.config.node_id()?;
        let role = self.config.role;

        let (events, inbox) = mailbox(self.config.telemetry.mailbox_capacity);
        let cache = Arc::new(SlotCache::new(self.name_slots).with_notifier(events.clone()));
        let (routing, view) = RoutingHandle::new(self.initial, events.clone());
        let display = self.display.unwrap_or_else(|| display::for_role(role));

        let mut router = Router::new(
            node_id.clone(),
            (events, inbox),
            view,
            cache.clone(),
            self.link,
            display.clone(),
        )
        .with_tick_interval(self.config.tick_interval());

        if role.publishes() {
            let sampler = self.sampler.unwrap_or_else(|| Box::new(ClockSampler::default()));
            let producer = Producer::new(self.config.publisher.category.clone(), sampler);
            router = router.with_producer(producer, self.config.publish_interval());
        }

        let router = router.spawn();
        info!(%node_id, %role, "Node started");

        Ok(NodeHandle { config: self.config, routing, cache, display, router, gate: None })
    }
}

/// A running node.
pub struct NodeHandle {
    config: NodeConfig,
    /// Handle the routing protocol drives.
    pub routing: RoutingHandle,
    /// Name index and content store.
    pub cache: Arc<SlotCache>,
    pub display: Arc<dyn StatusDisplay>,
    router: RouterHandle,
    gate: Option<JoinHandle<()>>,
}

impl NodeHandle {
    pub fn events(&self) -> EventSender {
        self.router.events.clone()
    }

    /// User button: request one publication. Returns whether it was queued.
    pub fn press_button(&self) -> bool {
        self.router.events.raise_or_log(Event::PublishRequested)
    }

    pub fn stats(&self) -> watch::Receiver<RouterStats> {
        self.router.stats.clone()
    }

    /// Token cancelling the router and the gate.
    pub fn cancel_token(&self) -> CancellationToken {
        self.router.cancel.clone()
    }

    /// Start the light-driven channel gate. Sensor gate nodes only.
    pub fn start_gate<S: LightSensor>(
        &mut self,
        sensor: S,
        radio: Arc<dyn RadioControl>,
    ) -> Result<()> {
        if !self.config.role.gates_channel() {
            return Err(TelemetryError::config_error(format!(
                "role {} has no light gate",
                self.config.role
            )));
        }
        if self.gate.is_some() {
            return Err(TelemetryError::config_error("light gate already running"));
        }

        let gate = LightGate::new(self.config.gate.clone(), sensor, radio, self.display.clone());
        self.gate = Some(tokio::spawn(gate.run(self.router.cancel.child_token())));
        Ok(())
    }

    /// Stop the router and the gate, waiting for both.
    pub async fn shutdown(self) {
        let NodeHandle { router, gate, .. } = self;
        router.shutdown().await;
        if let Some(gate) = gate {
            if let Err(e) = gate.await {
                error!("Light gate task failed: {}", e);
            }
        }
        info!("Node stopped");
    }
}
