//! Hierarchical content names and locally published content objects

use serde::Serialize;

use crate::{Result, TelemetryError};

/// Longest name the producer will synthesize.
pub const MAX_NAME_LEN: usize = 64;

/// Hierarchical content name, decomposed into its components.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct ContentName {
    components: Vec<String>,
}

impl ContentName {
    /// Decompose a `/a/b/c` URI into components.
    ///
    /// Fails on a missing leading slash, empty components, or names longer
    /// than [`MAX_NAME_LEN`].
    pub fn parse(uri: &str) -> Result<Self> {
        if uri.len() > MAX_NAME_LEN {
            return Err(TelemetryError::invalid_name(
                uri,
                format!("{} bytes exceeds {MAX_NAME_LEN}", uri.len()),
            ));
        }
        let Some(rest) = uri.strip_prefix('/') else {
            return Err(TelemetryError::invalid_name(uri, "missing leading '/'"));
        };
        let components: Vec<String> = rest.split('/').map(str::to_owned).collect();
        if components.iter().any(String::is_empty) {
            return Err(TelemetryError::invalid_name(uri, "empty component"));
        }
        Ok(Self { components })
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Whether `prefix` is a component-wise prefix of this name.
    pub fn starts_with(&self, prefix: &ContentName) -> bool {
        self.components.starts_with(&prefix.components)
    }
}

impl std::fmt::Display for ContentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl From<ContentName> for String {
    fn from(name: ContentName) -> Self {
        name.to_string()
    }
}

/// Content object created by the producer.
///
/// After insertion its lifecycle belongs to the content cache; `stale` marks it
/// as evictable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedContent {
    pub name: ContentName,
    pub payload: Vec<u8>,
    pub stale: bool,
}

impl PublishedContent {
    /// Content carrying the decimal rendering of `reading`, marked stale.
    pub fn reading(name: ContentName, reading: i64) -> Self {
        Self { name, payload: reading.to_string().into_bytes(), stale: true }
    }
}
