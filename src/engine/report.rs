// src/engine/report.rs

//! Result and observability types for a single run.

use crate::types::{ArtifactId, MetricName, ProducerName};

/// What happened to one requested metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricOutcome {
    /// The metric and all of its dependencies completed; this is the
    /// artifact the metric's own compute function produced.
    Completed(ArtifactId),
    /// The metric failed, either in one of its producers (`producer` names
    /// it) or in its own compute function (`producer` is `None`).
    Failed {
        producer: Option<ProducerName>,
        message: String,
    },
    /// The run aborted before this metric was reached.
    NotRun,
}

/// Per-metric entry of a [`RunReport`], in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricResult {
    pub metric: MetricName,
    pub outcome: MetricOutcome,
}

/// Observability events emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// A producer required by `metric` had already run earlier in the run
    /// and was not executed again.
    ProducerSkipped {
        producer: ProducerName,
        metric: MetricName,
    },
    /// An `Auto` producer crossed the fan-in threshold and was switched to
    /// `ForcedOn` before execution started.
    CachePromoted { producer: ProducerName, uses: usize },
    /// A `ForcedOn` producer finished and the engine was asked to cache its
    /// artifact.
    CacheRequested {
        producer: ProducerName,
        artifact: ArtifactId,
    },
}

/// Everything a finished (or aborted) run has to say for itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub results: Vec<MetricResult>,
    pub events: Vec<RunEvent>,
}

impl RunReport {
    pub fn outcome_of(&self, metric: &str) -> Option<&MetricOutcome> {
        self.results
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| &r.outcome)
    }

    /// The artifact a completed metric produced, if it completed.
    pub fn artifact_of(&self, metric: &str) -> Option<&ArtifactId> {
        match self.outcome_of(metric) {
            Some(MetricOutcome::Completed(artifact)) => Some(artifact),
            _ => None,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, MetricOutcome::Completed(_)))
            .count()
    }

    /// Producers that were skipped because they had already run.
    pub fn skipped_producers(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RunEvent::ProducerSkipped { producer, .. } => Some(producer.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Producers promoted to cached mode in this run.
    pub fn promoted_producers(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RunEvent::CachePromoted { producer, .. } => Some(producer.as_str()),
                _ => None,
            })
            .collect()
    }
}
