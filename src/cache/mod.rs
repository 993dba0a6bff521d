//! Caching collaborator interface
//!
//! The content store and the name index belong to the forwarding engine. This
//! crate only counts the in-use name slots, inserts locally produced content,
//! registers its name, and announces publications.

mod slots;

pub use slots::{ANNOUNCE_BACKLOG, SlotCache};

use thiserror::Error;

use crate::types::{ContentName, PublishedContent};

/// Rejection reported by the caching collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("no free slot")]
    Full,
    #[error("'{0}' already present")]
    Duplicate(String),
    #[error("{0}")]
    Rejected(String),
}

/// Content store plus name index of the forwarding engine.
pub trait ContentCache: Send + Sync {
    /// Number of slots in the name index.
    fn capacity(&self) -> usize;

    /// Visit every name slot, passing whether it is in use.
    fn visit_slots(&self, visit: &mut dyn FnMut(bool));

    /// Insert a content object into the content store.
    fn insert_content(&self, content: PublishedContent) -> Result<(), CacheError>;

    /// Remove a content object again. Returns whether it was present.
    fn remove_content(&self, name: &ContentName) -> bool;

    /// Register a name in the name index.
    fn register_name(&self, name: &ContentName) -> Result<(), CacheError>;

    /// Tell the forwarding engine a new name is ready to be advertised.
    fn announce(&self, _name: &ContentName) {}
}

/// Count in-use name slots by scanning the whole table.
pub fn count_in_use(cache: &dyn ContentCache) -> usize {
    let mut in_use = 0;
    cache.visit_slots(&mut |used| {
        if used {
            in_use += 1;
        }
    });
    in_use
}
