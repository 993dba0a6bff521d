//! Bounded event mailbox of the telemetry router
//!
//! Producers (timers, routing callbacks, button handlers, the cache) hold an
//! [`EventSender`] and raise events without ever blocking: a full mailbox drops
//! the event and reports it. The router owns the single [`Mailbox`] receiver.

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

use crate::types::Event;
use crate::{Result, TelemetryError};

/// Mailbox depth of the deployed nodes.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 8;

/// Create a mailbox holding at most `capacity` events.
pub fn mailbox(capacity: usize) -> (EventSender, Mailbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, Mailbox { rx })
}

/// Cloneable, non-blocking handle for raising events.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    /// Raise an event without waiting.
    ///
    /// Returns [`TelemetryError::MailboxFull`] when every slot is taken; the
    /// queued events are left untouched and the new one is dropped.
    pub fn raise(&self, event: Event) -> Result<()> {
        match self.tx.try_send(event) {
            Ok(()) => {
                trace!(?event, "Event queued");
                Ok(())
            }
            Err(TrySendError::Full(event)) => Err(TelemetryError::MailboxFull { event }),
            Err(TrySendError::Closed(event)) => Err(TelemetryError::MailboxClosed { event }),
        }
    }

    /// Raise an event, logging instead of returning a drop.
    ///
    /// For callers that cannot do anything about a full mailbox, such as
    /// interrupt-style handlers. Returns whether the event was queued.
    pub fn raise_or_log(&self, event: Event) -> bool {
        match self.raise(event) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping event: {}", e);
                false
            }
        }
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving end, owned by the router.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::Receiver<Event>,
}

impl Mailbox {
    /// Wait for the next event. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Take the next event if one is queued.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
