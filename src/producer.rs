//! Content publication producer
//!
//! Synthesizes `<prefix>/<category>/<counter>` names carrying a sampled value,
//! inserts them into the content store marked stale, and registers them in
//! the name index. Either both happen or neither does.

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::ContentCache;
use crate::types::{ContentName, PublishedContent, RoutingState};
use crate::{PublishRejection, Result, TelemetryError};

/// Category path used by the deployed originators.
pub const DEFAULT_CATEGORY: &str = "1/gas";

/// Source of the value published with each name.
pub trait Sampler: Send {
    fn sample(&mut self) -> i64;
}

impl<F> Sampler for F
where
    F: FnMut() -> i64 + Send,
{
    fn sample(&mut self) -> i64 {
        self()
    }
}

/// Samples the microsecond clock, wrapped to 32 bits.
#[derive(Debug)]
pub struct ClockSampler {
    origin: Instant,
}

impl Default for ClockSampler {
    fn default() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Sampler for ClockSampler {
    fn sample(&mut self) -> i64 {
        (self.origin.elapsed().as_micros() as u32) as i32 as i64
    }
}

/// Publishes named content for an originator node.
pub struct Producer {
    category: String,
    sampler: Box<dyn Sampler>,
    origin: Instant,
    last_counter: Option<u64>,
    published: u64,
}

impl Producer {
    pub fn new(category: impl Into<String>, sampler: Box<dyn Sampler>) -> Self {
        Self {
            category: category.into(),
            sampler,
            origin: Instant::now(),
            last_counter: None,
            published: 0,
        }
    }

    /// Number of successful publications.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Microseconds since the producer started, bumped to stay strictly increasing.
    fn next_counter(&mut self) -> u64 {
        let now = self.origin.elapsed().as_micros() as u64;
        let counter = match self.last_counter {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_counter = Some(counter);
        counter
    }

    /// Publish one content object.
    ///
    /// Rejected without side effects while the node has no route or no prefix.
    /// Content inserted before a failed name registration is removed again.
    pub fn publish(
        &mut self,
        routing: &RoutingState,
        cache: &dyn ContentCache,
    ) -> Result<PublishedContent> {
        if !routing.has_route() {
            debug!(rank = ?routing.rank, floating = routing.floating, "Not publishing without a route");
            return Err(TelemetryError::publish_rejected(PublishRejection::NoRoute));
        }
        let Some(prefix) = routing.prefix.as_deref() else {
            return Err(TelemetryError::publish_rejected(PublishRejection::NoPrefix));
        };

        let counter = self.next_counter();
        let uri = format!("{}/{}/{}", prefix, self.category, counter);
        let name = ContentName::parse(&uri).map_err(|e| {
            TelemetryError::publish_rejected(PublishRejection::MalformedName(e.to_string()))
        })?;

        let content = PublishedContent::reading(name.clone(), self.sampler.sample());
        cache.insert_content(content.clone()).map_err(|e| {
            warn!(%name, "Content store rejected publication: {}", e);
            TelemetryError::publish_rejected(PublishRejection::CacheRejected(e.to_string()))
        })?;

        if let Err(e) = cache.register_name(&name) {
            warn!(%name, "Name index rejected publication: {}", e);
            cache.remove_content(&name);
            return Err(TelemetryError::publish_rejected(PublishRejection::IndexRejected(
                e.to_string(),
            )));
        }

        cache.announce(&name);
        self.published += 1;
        info!(%name, payload = %String::from_utf8_lossy(&content.payload), "Published content");
        Ok(content)
    }
}
