//! Router owns the mailbox and turns events into broadcast telemetry frames

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::cache::ContentCache;
use crate::display::StatusDisplay;
use crate::link::LinkLayer;
use crate::mailbox::{EventSender, Mailbox};
use crate::producer::Producer;
use crate::protocol::encode_frame;
use crate::rearm::{self, DEFAULT_TICK_INTERVAL, PeriodicRearmer};
use crate::routing::RoutingView;
use crate::transmitter::Transmitter;
use crate::types::{ContentName, Event, NodeId, StateSnapshot};
use crate::{PublishRejection, TelemetryError};

/// Counters describing what the router has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterStats {
    /// Passes through the loop, one per event.
    pub events: u64,
    pub periodic_ticks: u64,
    pub frames_sent: u64,
    pub transmit_failures: u64,
    pub encode_failures: u64,
    pub publications: u64,
    pub publish_rejections: u64,
    pub last_event: Option<Event>,
}

/// What one pass through the loop did.
#[derive(Debug)]
pub enum PassOutcome {
    /// A frame of this many bytes was broadcast.
    Sent(usize),
    /// Content was published under this name.
    Published(ContentName),
    /// The event was dropped.
    Dropped(TelemetryError),
}

impl RouterStats {
    fn record(&mut self, event: Event, outcome: &PassOutcome) {
        self.events += 1;
        self.last_event = Some(event);
        if event == Event::PeriodicTick {
            self.periodic_ticks += 1;
        }
        match outcome {
            PassOutcome::Sent(_) => self.frames_sent += 1,
            PassOutcome::Published(_) => self.publications += 1,
            PassOutcome::Dropped(TelemetryError::TransmitFailed { .. }) => {
                self.transmit_failures += 1
            }
            PassOutcome::Dropped(TelemetryError::PublishRejected { .. }) => {
                self.publish_rejections += 1
            }
            PassOutcome::Dropped(_) => self.encode_failures += 1,
        }
    }
}

/// Handles returned by [`Router::spawn`].
pub struct RouterHandle {
    /// Sender for raising events into the router's mailbox.
    pub events: EventSender,
    /// Receiver for router statistics, updated after every pass.
    pub stats: watch::Receiver<RouterStats>,
    /// Cancellation token for tearing the router down.
    pub cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RouterHandle {
    /// Cancel the router and wait for its task to end.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            error!("Telemetry router task failed: {}", e);
        }
    }
}

impl Drop for RouterHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Single-consumer telemetry event loop.
///
/// Processes exactly one event per pass, in arrival order. Each pass either
/// runs the producer (publish requests) or captures a snapshot, encodes a
/// frame and broadcasts it. Failures drop the event and are logged; the loop
/// keeps going. After every pass the periodic tick is re-armed.
pub struct Router {
    node_id: NodeId,
    mailbox: Mailbox,
    events: EventSender,
    routing: RoutingView,
    cache: Arc<dyn ContentCache>,
    transmitter: Transmitter,
    display: Arc<dyn StatusDisplay>,
    producer: Option<Producer>,
    tick_interval: Duration,
    publish_interval: Option<Duration>,
}

impl Router {
    /// Create a router without a producer, ticking every five seconds.
    ///
    /// `events` must be a sender of `mailbox`; the router raises follow-up
    /// events through it.
    pub fn new(
        node_id: NodeId,
        (events, mailbox): (EventSender, Mailbox),
        routing: RoutingView,
        cache: Arc<dyn ContentCache>,
        link: Arc<dyn LinkLayer>,
        display: Arc<dyn StatusDisplay>,
    ) -> Self {
        Self {
            node_id,
            mailbox,
            events,
            routing,
            cache,
            transmitter: Transmitter::new(link),
            display,
            producer: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            publish_interval: None,
        }
    }

    /// Attach a producer; with an interval it also publishes periodically.
    ///
    /// Button presses publish in between without moving the periodic schedule.
    pub fn with_producer(mut self, producer: Producer, interval: Option<Duration>) -> Self {
        self.producer = Some(producer);
        self.publish_interval = interval;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Spawn the router loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(self) -> RouterHandle {
        let events = self.events.clone();
        let (stats_tx, stats_rx) = watch::channel(RouterStats::default());
        let cancel = CancellationToken::new();
        let cancel_router = cancel.clone();

        let task = tokio::spawn(async move {
            self.run(stats_tx, cancel_router).await;
        });

        RouterHandle { events, stats: stats_rx, cancel, task }
    }

    async fn run(mut self, stats: watch::Sender<RouterStats>, cancel: CancellationToken) {
        info!(node_id = %self.node_id, "Telemetry router started");
        let mut ticker = PeriodicRearmer::new(self.tick_interval);
        let mut publish_timer = self.publish_interval.map(PeriodicRearmer::new);

        loop {
            let (event, publish_due) = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Telemetry router cancelled");
                    break;
                }
                event = self.mailbox.recv() => match event {
                    Some(event) => (event, false),
                    None => {
                        info!("Mailbox closed, telemetry router stopping");
                        break;
                    }
                },
                _ = ticker.expired() => (Event::PeriodicTick, false),
                _ = rearm::expired(&mut publish_timer) => (Event::PublishRequested, true),
            };

            let outcome = self.process(event).await;
            stats.send_modify(|stats| stats.record(event, &outcome));

            if publish_due {
                if let Some(timer) = publish_timer.as_mut() {
                    timer.rearm();
                }
            }
            ticker.rearm();
        }

        let processed = stats.borrow().events;
        info!("Telemetry router ended (processed {} events)", processed);
    }

    /// Run one pass for `event`. Does not re-arm timers.
    pub async fn process(&mut self, event: Event) -> PassOutcome {
        debug!(?event, "Processing event");
        match event {
            Event::PublishRequested => self.publish(),
            _ => self.emit(event).await,
        }
    }

    fn publish(&mut self) -> PassOutcome {
        let Some(producer) = self.producer.as_mut() else {
            warn!("Ignoring publish request, node does not originate content");
            return PassOutcome::Dropped(TelemetryError::publish_rejected(
                PublishRejection::NotOriginator,
            ));
        };

        let routing = self.routing.borrow().clone();
        match producer.publish(&routing, self.cache.as_ref()) {
            Ok(content) => {
                self.events.raise_or_log(Event::ContentCacheNotify);
                PassOutcome::Published(content.name)
            }
            Err(e) => {
                warn!("Publication failed: {}", e);
                PassOutcome::Dropped(e)
            }
        }
    }

    async fn emit(&mut self, event: Event) -> PassOutcome {
        let routing = self.routing.borrow().clone();
        let snapshot = StateSnapshot::capture(&self.node_id, &routing, self.cache.as_ref());
        trace!(?snapshot, "Captured snapshot");

        let frame = match encode_frame(event, &snapshot) {
            Ok(frame) => frame,
            Err(e) => {
                error!(?event, "Dropping event, frame encoding failed: {}", e);
                return PassOutcome::Dropped(e);
            }
        };

        self.observe(event, &snapshot);

        match self.transmitter.broadcast(&frame).await {
            Ok(()) => PassOutcome::Sent(frame.len()),
            Err(e) => {
                debug!(?event, "Dropping frame: {}", e);
                PassOutcome::Dropped(e)
            }
        }
    }

    /// Surface the reported state on the display.
    fn observe(&self, event: Event, snapshot: &StateSnapshot) {
        match event {
            Event::ParentAdded | Event::PeriodicTick if snapshot.has_route() => {
                self.display.show_rank(snapshot.rank, false);
            }
            Event::ParentRefreshed => self.display.show_rank(snapshot.rank, false),
            Event::ParentDropped => self.display.show_rank(snapshot.rank, true),
            event if event.is_cache_change() => {
                info!(
                    cached = snapshot.cache_occupied,
                    capacity = snapshot.cache_capacity,
                    "Name cache changed"
                );
                self.display.show_cache(snapshot.cache_occupied, snapshot.cache_capacity);
            }
            _ => {}
        }
    }
}
