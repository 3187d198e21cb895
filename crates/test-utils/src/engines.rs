use std::sync::{Arc, Mutex};

use metricdag::errors::Result;
use metricdag::exec::CacheEngine;
use metricdag::types::ArtifactId;

/// A cache engine that:
/// - records every `(producer, artifact)` cache request it receives
/// - optionally fails on a chosen producer, for abort-path tests.
pub struct RecordingEngine {
    cached: Arc<Mutex<Vec<(String, String)>>>,
    fail_on: Option<String>,
}

impl RecordingEngine {
    pub fn new(cached: Arc<Mutex<Vec<(String, String)>>>) -> Self {
        Self {
            cached,
            fail_on: None,
        }
    }

    /// Make `cache_artifact` fail when asked to cache `producer`.
    pub fn fail_on(mut self, producer: &str) -> Self {
        self.fail_on = Some(producer.to_string());
        self
    }
}

impl CacheEngine for RecordingEngine {
    fn cache_artifact(&mut self, producer: &str, artifact: &ArtifactId) -> Result<()> {
        if self.fail_on.as_deref() == Some(producer) {
            return Err(anyhow::anyhow!("engine refused to cache '{producer}'").into());
        }
        let mut guard = self.cached.lock().unwrap();
        guard.push((producer.to_string(), artifact.as_str().to_string()));
        Ok(())
    }
}
