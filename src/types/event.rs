//! Mailbox event kinds

use serde::{Deserialize, Serialize};

/// Trigger delivered to the telemetry router.
///
/// Events are pure triggers: they carry no state. Everything a frame reports is
/// read from a fresh [`StateSnapshot`](super::StateSnapshot) when the event is
/// processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Periodic wake-up from the re-armer.
    PeriodicTick,
    /// The routing collaborator selected a parent.
    ParentAdded,
    /// The current parent re-advertised.
    ParentRefreshed,
    /// The current parent timed out.
    ParentDropped,
    /// A name was added to the name cache.
    CacheEntryAdded,
    /// A name was evicted from the name cache.
    CacheEntryRemoved,
    /// Button press or publish timer on an originator.
    PublishRequested,
    /// A locally produced content object was registered.
    ContentCacheNotify,
}

/// Which records the encoder emits after the identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSet {
    /// Optional parent-added record, then cache count and capacity.
    ParentAndCache,
    /// Parent-dropped record only.
    ParentDropped,
    /// Cache count and capacity.
    Cache,
}

impl Event {
    /// All event kinds, in declaration order.
    pub const ALL: [Event; 8] = [
        Event::PeriodicTick,
        Event::ParentAdded,
        Event::ParentRefreshed,
        Event::ParentDropped,
        Event::CacheEntryAdded,
        Event::CacheEntryRemoved,
        Event::PublishRequested,
        Event::ContentCacheNotify,
    ];

    /// Record set this event produces, or `None` if it never yields a frame.
    pub fn record_set(self) -> Option<RecordSet> {
        match self {
            Event::ParentAdded | Event::PeriodicTick | Event::ParentRefreshed => {
                Some(RecordSet::ParentAndCache)
            }
            Event::ParentDropped => Some(RecordSet::ParentDropped),
            Event::CacheEntryAdded | Event::CacheEntryRemoved | Event::ContentCacheNotify => {
                Some(RecordSet::Cache)
            }
            Event::PublishRequested => None,
        }
    }

    /// Whether the event is a routing-state notification.
    pub fn is_routing(self) -> bool {
        matches!(self, Event::ParentAdded | Event::ParentRefreshed | Event::ParentDropped)
    }

    /// Whether the event reports a name cache change.
    pub fn is_cache_change(self) -> bool {
        matches!(
            self,
            Event::CacheEntryAdded | Event::CacheEntryRemoved | Event::ContentCacheNotify
        )
    }
}
