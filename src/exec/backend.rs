// src/exec/backend.rs

//! Abstraction over the external engine that physically caches artifacts.
//!
//! The scheduler only decides *whether* and *when* an artifact should be
//! cached; the mechanism belongs to whatever compute engine materializes
//! the artifacts. The runner talks to a `CacheEngine` so that:
//!
//! - production code can plug in a real engine binding,
//! - tests can record which cache requests were issued without any engine.

use tracing::debug;

use crate::errors::Result;
use crate::types::ArtifactId;

/// Trait abstracting the physical caching action.
pub trait CacheEngine: Send {
    /// Ask the engine to cache `artifact`, produced by `producer`.
    ///
    /// Purely advisory from the scheduler's point of view; an error here
    /// still aborts the run, because a caller that pinned a producer to
    /// cached mode is entitled to assume the request took effect.
    fn cache_artifact(&mut self, producer: &str, artifact: &ArtifactId) -> Result<()>;
}

/// Default engine that acknowledges cache requests without doing anything.
///
/// Useful for runs where the compute functions handle persistence
/// themselves, and as the engine of last resort in examples and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheEngine;

impl CacheEngine for NoopCacheEngine {
    fn cache_artifact(&mut self, producer: &str, artifact: &ArtifactId) -> Result<()> {
        debug!(producer = %producer, artifact = %artifact, "cache request acknowledged (noop)");
        Ok(())
    }
}
