//! In-memory slot table implementing [`ContentCache`]

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{CacheError, ContentCache};
use crate::mailbox::EventSender;
use crate::types::{ContentName, Event, PublishedContent};

/// Names kept by [`SlotCache::announced`].
pub const ANNOUNCE_BACKLOG: usize = 32;

/// Fixed-size name index plus a bounded content store.
///
/// Stale content is evicted first when the store is full. Names learned or
/// evicted through the forwarding path raise cache events on the attached
/// notifier; names registered by the local producer do not, since the producer
/// reports those itself.
///
/// Learned names only leave the index through [`evict_name`](Self::evict_name),
/// which the routing collaborator calls when a name expires. A locally
/// registered name whose content has been evicted from the store gives its
/// slot back once the index is full.
pub struct SlotCache {
    inner: RwLock<Inner>,
    notifier: Option<EventSender>,
}

#[derive(Default)]
struct Inner {
    slots: Vec<Option<ContentName>>,
    contents: Vec<PublishedContent>,
    content_capacity: usize,
    announced: VecDeque<ContentName>,
    local: VecDeque<ContentName>,
    reject_content: bool,
    reject_names: bool,
}

impl SlotCache {
    /// A cache with `name_slots` name slots and room for as many content objects.
    pub fn new(name_slots: usize) -> Self {
        Self::with_content_capacity(name_slots, name_slots)
    }

    pub fn with_content_capacity(name_slots: usize, content_capacity: usize) -> Self {
        let inner = Inner {
            slots: vec![None; name_slots],
            content_capacity: content_capacity.max(1),
            ..Inner::default()
        };
        Self { inner: RwLock::new(inner), notifier: None }
    }

    /// Raise cache events for forwarding-path changes on `events`.
    pub fn with_notifier(mut self, events: EventSender) -> Self {
        self.notifier = Some(events);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: Event) {
        if let Some(events) = &self.notifier {
            events.raise_or_log(event);
        }
    }

    /// Add a name learned from a neighbor's advertisement.
    pub fn learn_name(&self, name: &ContentName) -> Result<(), CacheError> {
        self.write().occupy(name)?;
        self.notify(Event::CacheEntryAdded);
        Ok(())
    }

    /// Drop a name from the index. Returns whether it was present.
    pub fn evict_name(&self, name: &ContentName) -> bool {
        let removed = {
            let mut inner = self.write();
            match inner.slots.iter().position(|slot| slot.as_ref() == Some(name)) {
                Some(pos) => {
                    inner.slots[pos] = None;
                    inner.local.retain(|local| local != name);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.notify(Event::CacheEntryRemoved);
        }
        removed
    }

    /// Number of in-use name slots.
    pub fn names_in_use(&self) -> usize {
        self.read().slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of stored content objects.
    pub fn content_len(&self) -> usize {
        self.read().contents.len()
    }

    pub fn contains_content(&self, name: &ContentName) -> bool {
        self.read().contents.iter().any(|c| &c.name == name)
    }

    pub fn contains_name(&self, name: &ContentName) -> bool {
        self.read().slots.iter().any(|slot| slot.as_ref() == Some(name))
    }

    /// Stored content for `name`, if any.
    pub fn content(&self, name: &ContentName) -> Option<PublishedContent> {
        self.read().contents.iter().find(|c| &c.name == name).cloned()
    }

    /// Names announced for advertisement, oldest first.
    ///
    /// Only the most recent [`ANNOUNCE_BACKLOG`] are kept.
    pub fn announced(&self) -> Vec<ContentName> {
        self.read().announced.iter().cloned().collect()
    }

    /// Make the content store refuse insertions.
    pub fn reject_content(&self, reject: bool) {
        self.write().reject_content = reject;
    }

    /// Make the name index refuse registrations.
    pub fn reject_names(&self, reject: bool) {
        self.write().reject_names = reject;
    }
}

impl Inner {
    /// Free the slot of the oldest local name whose content is gone.
    fn reclaim_orphan(&mut self) {
        let Some(pos) = self
            .local
            .iter()
            .position(|name| !self.contents.iter().any(|c| &c.name == name))
        else {
            return;
        };
        if let Some(name) = self.local.remove(pos) {
            if let Some(slot) = self.slots.iter_mut().find(|slot| slot.as_ref() == Some(&name)) {
                *slot = None;
            }
            debug!(%name, "Reclaimed name slot of evicted content");
        }
    }

    fn occupy(&mut self, name: &ContentName) -> Result<(), CacheError> {
        if self.slots.iter().any(|slot| slot.as_ref() == Some(name)) {
            return Err(CacheError::Duplicate(name.to_string()));
        }
        let slot = self.slots.iter_mut().find(|slot| slot.is_none()).ok_or(CacheError::Full)?;
        *slot = Some(name.clone());
        Ok(())
    }
}

impl ContentCache for SlotCache {
    fn capacity(&self) -> usize {
        self.read().slots.len()
    }

    fn visit_slots(&self, visit: &mut dyn FnMut(bool)) {
        for slot in &self.read().slots {
            visit(slot.is_some());
        }
    }

    fn insert_content(&self, content: PublishedContent) -> Result<(), CacheError> {
        let mut inner = self.write();
        if inner.reject_content {
            return Err(CacheError::Rejected("content store refused insertion".into()));
        }
        if inner.contents.iter().any(|c| c.name == content.name) {
            return Err(CacheError::Duplicate(content.name.to_string()));
        }
        if inner.contents.len() >= inner.content_capacity {
            let victim = inner.contents.iter().position(|c| c.stale).ok_or(CacheError::Full)?;
            let evicted = inner.contents.remove(victim);
            debug!(name = %evicted.name, "Evicted stale content");
        }
        inner.contents.push(content);
        Ok(())
    }

    fn remove_content(&self, name: &ContentName) -> bool {
        let mut inner = self.write();
        let before = inner.contents.len();
        inner.contents.retain(|c| &c.name != name);
        inner.contents.len() != before
    }

    fn register_name(&self, name: &ContentName) -> Result<(), CacheError> {
        let mut inner = self.write();
        if inner.reject_names {
            return Err(CacheError::Rejected("name index refused registration".into()));
        }
        if inner.slots.iter().all(Option::is_some) {
            inner.reclaim_orphan();
        }
        inner.occupy(name)?;
        inner.local.push_back(name.clone());
        Ok(())
    }

    fn announce(&self, name: &ContentName) {
        let mut inner = self.write();
        if inner.announced.len() == ANNOUNCE_BACKLOG {
            inner.announced.pop_front();
        }
        inner.announced.push_back(name.clone());
    }
}
