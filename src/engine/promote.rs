// src/engine/promote.rs

//! Fan-in-based cache promotion.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::engine::report::RunEvent;
use crate::registry::{CacheMode, Registry};
use crate::types::{MetricName, ProducerName};

/// Decides, before execution starts, which `Auto` producers are worth
/// caching for the current run.
///
/// Usage is counted per scheduled metric: a producer appearing in three
/// metrics' ordered dependency lists counts three times, even though
/// run-once means it executes once. Producers registered as `ForcedOn` or
/// `ForcedOff` were pinned by the caller and are never touched.
#[derive(Debug, Clone, Copy)]
pub struct CachePromoter {
    threshold: usize,
}

impl CachePromoter {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Mutate cache modes in `registry` according to the scheduled plans.
    ///
    /// Returns one [`RunEvent::CachePromoted`] per flipped producer, in
    /// registration order.
    pub fn promote(
        &self,
        registry: &mut Registry,
        plans: &[(MetricName, Vec<ProducerName>)],
    ) -> Vec<RunEvent> {
        let mut uses: HashMap<&str, usize> = HashMap::new();
        for (_, order) in plans {
            for producer in order {
                *uses.entry(producer.as_str()).or_insert(0) += 1;
            }
        }

        let candidates: Vec<(String, usize)> = registry
            .producers_in_registration_order()
            .iter()
            .filter_map(|p| {
                let count = uses.get(p.name()).copied().unwrap_or(0);
                (count > self.threshold && p.cache_mode() == CacheMode::Auto)
                    .then(|| (p.name().to_string(), count))
            })
            .collect();

        let mut events = Vec::with_capacity(candidates.len());
        for (name, count) in candidates {
            if let Some(producer) = registry.producer_mut(&name) {
                producer.set_cache_mode(CacheMode::ForcedOn);
                info!(
                    producer = %name,
                    uses = count,
                    threshold = self.threshold,
                    "promoting producer to cached mode"
                );
                events.push(RunEvent::CachePromoted {
                    producer: name,
                    uses: count,
                });
            }
        }

        debug!(promoted = events.len(), "cache promotion pass complete");
        events
    }
}
