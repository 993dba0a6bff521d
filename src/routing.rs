//! Routing collaborator side: publishes state and raises notifications
//!
//! The routing protocol owns [`RoutingState`]. It publishes every change on a
//! watch channel the router reads at encode time, then raises the matching
//! event. The watch value is updated before the event is raised, so by the time
//! the router processes the event the snapshot already reflects it.

use tokio::sync::watch;
use tracing::debug;

use crate::mailbox::EventSender;
use crate::types::{Event, LinkAddr, RoutingState};

/// Read-only view of the routing state held by the router.
pub type RoutingView = watch::Receiver<RoutingState>;

/// Handle the routing collaborator uses to publish state transitions.
#[derive(Debug)]
pub struct RoutingHandle {
    state: watch::Sender<RoutingState>,
    events: EventSender,
}

impl RoutingHandle {
    /// Create a handle starting from `initial`, plus the view for the router.
    pub fn new(initial: RoutingState, events: EventSender) -> (Self, RoutingView) {
        let (state, view) = watch::channel(initial);
        (Self { state, events }, view)
    }

    /// Another read-only view of the same state.
    pub fn view(&self) -> RoutingView {
        self.state.subscribe()
    }

    /// Current state.
    pub fn current(&self) -> RoutingState {
        self.state.borrow().clone()
    }

    /// The DODAG root handed out a name prefix.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        self.state.send_modify(|state| state.prefix = Some(prefix));
    }

    /// A parent was selected. Returns whether the notification was queued.
    pub fn parent_added(&self, parent: LinkAddr, rank: u16) -> bool {
        self.state.send_modify(|state| {
            state.parent = parent;
            state.rank = Some(rank);
            state.floating = false;
        });
        debug!(%parent, rank, "Parent added");
        self.events.raise_or_log(Event::ParentAdded)
    }

    /// The current parent re-advertised, possibly with a new rank.
    pub fn parent_refreshed(&self, rank: u16) -> bool {
        self.state.send_modify(|state| state.rank = Some(rank));
        self.events.raise_or_log(Event::ParentRefreshed)
    }

    /// The current parent timed out.
    ///
    /// The node becomes floating with an undefined rank; the parent address is
    /// kept so the parent-dropped record can name the dropped parent.
    pub fn parent_dropped(&self) -> bool {
        self.state.send_modify(|state| {
            state.rank = None;
            state.floating = true;
        });
        debug!("Parent dropped");
        self.events.raise_or_log(Event::ParentDropped)
    }
}
