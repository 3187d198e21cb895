// src/registry/mod.rs

//! Declarations of metrics and artifact producers.
//!
//! - [`compute`] adapts plain Rust functions into type-erased handles.
//! - [`validate`] checks every registration against the container in one
//!   pass and reports problems by category.
//!
//! The registry is an explicit value constructed by the caller; there is no
//! process-wide instance. Build one per graph, move it into a
//! [`Runner`](crate::engine::Runner), and you can have as many independent
//! graphs in a process as you like.

pub mod compute;
pub mod validate;

use std::collections::HashMap;

use tracing::debug;

use crate::errors::{MetricDagError, Result};
use crate::types::{ArtifactId, MetricName, ProducerName};

pub use compute::{ComputeCallError, ComputeHandle, FromContainer, IntoCompute, Signature};
pub use validate::{validate, CategoryErrors, UnresolvedArgument, ValidationReport};

/// Caching behaviour of an artifact producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Let the run decide: promoted to `ForcedOn` when the producer's
    /// fan-in across the scheduled metrics exceeds the configured threshold.
    Auto,
    /// Always ask the engine to cache the artifact. Never demoted.
    ForcedOn,
    /// Never cache, regardless of fan-in. Never promoted.
    ForcedOff,
}

/// Per-run execution state of a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotRun,
    /// The producer ran in the current run and yielded this artifact.
    Done(ArtifactId),
}

/// A registered artifact producer.
#[derive(Debug)]
pub struct ProducerDef {
    name: ProducerName,
    compute: ComputeHandle,
    deps: Vec<ProducerName>,
    cache: CacheMode,
    run_state: RunState,
    /// Registration sequence number; ties in the topological order are
    /// broken by this, so plans are stable for a given registration order.
    seq: u64,
}

impl ProducerDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deps(&self) -> &[ProducerName] {
        &self.deps
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    pub fn compute(&self) -> &ComputeHandle {
        &self.compute
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn set_cache_mode(&mut self, mode: CacheMode) {
        self.cache = mode;
    }

    pub(crate) fn set_run_state(&mut self, state: RunState) {
        self.run_state = state;
    }
}

/// A registered metric. Immutable after registration.
#[derive(Debug)]
pub struct MetricDef {
    name: MetricName,
    compute: ComputeHandle,
    deps: Vec<ProducerName>,
    seq: u64,
}

impl MetricDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deps(&self) -> &[ProducerName] {
        &self.deps
    }

    pub fn compute(&self) -> &ComputeHandle {
        &self.compute
    }
}

/// Name-keyed store of metric and producer declarations.
///
/// Metric and producer names live in disjoint namespaces: a metric and a
/// producer may share a spelling without clashing. Registering the same name
/// twice replaces the earlier definition (last write wins).
#[derive(Debug, Default)]
pub struct Registry {
    metrics: HashMap<MetricName, MetricDef>,
    producers: HashMap<ProducerName, ProducerDef>,
    next_seq: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric under `name`, depending on the named producers.
    ///
    /// Any return type is accepted here; metrics whose compute function does
    /// not return an artifact identifier are reported by [`validate`], not
    /// rejected at registration. Returns the stored name.
    pub fn register_metric<Args, F>(&mut self, name: impl Into<String>, f: F, deps: &[&str]) -> String
    where
        F: IntoCompute<Args>,
    {
        let name = name.into();
        let seq = self.bump_seq();
        let def = MetricDef {
            name: name.clone(),
            compute: f.into_compute(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            seq,
        };
        if self.metrics.insert(name.clone(), def).is_some() {
            debug!(metric = %name, "replacing previously registered metric");
        }
        name
    }

    /// Register an artifact producer.
    ///
    /// When `name` is `None` the producer is stored under the compute
    /// function's type name, which is stable across builds for named
    /// functions (closures get a `{{closure}}` suffix and are only as good
    /// as their source location). Returns the resolved name, which other
    /// registrations can use as a dependency key.
    pub fn register_producer<Args, F>(
        &mut self,
        name: Option<&str>,
        f: F,
        deps: &[&str],
        cache: CacheMode,
    ) -> Result<String>
    where
        F: IntoCompute<Args>,
    {
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| std::any::type_name::<F>().to_string());
        let compute = f.into_compute();

        if !compute.signature().returns_artifact() {
            return Err(MetricDagError::Signature {
                name,
                reason: format!(
                    "producer compute function must return an artifact identifier, got `{}`",
                    compute.signature().ret.name
                ),
            });
        }

        let seq = self.bump_seq();
        let def = ProducerDef {
            name: name.clone(),
            compute,
            deps: deps.iter().map(|d| d.to_string()).collect(),
            cache,
            run_state: RunState::NotRun,
            seq,
        };
        if self.producers.insert(name.clone(), def).is_some() {
            debug!(producer = %name, "replacing previously registered producer");
        }
        Ok(name)
    }

    pub fn metric(&self, name: &str) -> Option<&MetricDef> {
        self.metrics.get(name)
    }

    pub fn producer(&self, name: &str) -> Option<&ProducerDef> {
        self.producers.get(name)
    }

    pub(crate) fn producer_mut(&mut self, name: &str) -> Option<&mut ProducerDef> {
        self.producers.get_mut(name)
    }

    /// All metrics, in registration order.
    pub fn metrics_in_registration_order(&self) -> Vec<&MetricDef> {
        let mut metrics: Vec<&MetricDef> = self.metrics.values().collect();
        metrics.sort_by_key(|m| m.seq);
        metrics
    }

    /// All producers, in registration order.
    pub fn producers_in_registration_order(&self) -> Vec<&ProducerDef> {
        let mut producers: Vec<&ProducerDef> = self.producers.values().collect();
        producers.sort_by_key(|p| p.seq);
        producers
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(|s| s.as_str())
    }

    pub fn producer_names(&self) -> impl Iterator<Item = &str> {
        self.producers.keys().map(|s| s.as_str())
    }

    /// Forget all per-run producer state. Called at the start of every run
    /// so that repeated runs are independent.
    pub(crate) fn reset_run_states(&mut self) {
        for producer in self.producers.values_mut() {
            producer.run_state = RunState::NotRun;
        }
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
