// src/engine/runner.rs

//! The per-run state machine.
//!
//! One `run` call walks `Validating -> Ordering -> Promoting -> Executing
//! -> Done`; a cycle, an unknown name, or an execution failure drops the
//! runner into `Failed` instead. Producer run-states are reset at the top
//! of every run, so repeated runs are independent.

use tracing::{debug, info, warn};

use crate::container::Container;
use crate::dag::{DepGraph, GraphResolver};
use crate::engine::promote::CachePromoter;
use crate::engine::report::{MetricOutcome, MetricResult, RunEvent, RunReport};
use crate::errors::{MetricDagError, Result};
use crate::exec::{CacheEngine, NoopCacheEngine};
use crate::registry::{CacheMode, ComputeCallError, ComputeHandle, Registry, RunState};
use crate::types::{MetricName, ProducerName, Selection};

/// Where the runner currently is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    Ordering,
    Promoting,
    Executing,
    Done,
    Failed,
}

/// Knobs for a runner, typically filled from config and CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    /// A producer used by more metrics than this per run is auto-promoted
    /// to cached mode (only when its cache mode is `Auto`).
    pub auto_cache_threshold: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            auto_cache_threshold: 1,
        }
    }
}

/// Execution plan for one requested metric.
struct MetricPlan {
    metric: MetricName,
    compute: ComputeHandle,
    order: Vec<ProducerName>,
}

/// Owns a registry for the duration of its runs and executes selections
/// against it.
///
/// The registry is moved in rather than shared globally; independent graphs
/// in one process just build independent runners.
pub struct Runner {
    registry: Registry,
    engine: Box<dyn CacheEngine>,
    options: RunnerOptions,
    phase: RunPhase,
}

impl Runner {
    /// Runner with the no-op cache engine.
    pub fn new(registry: Registry, options: RunnerOptions) -> Self {
        Self::with_engine(registry, options, Box::new(NoopCacheEngine))
    }

    pub fn with_engine(
        registry: Registry,
        options: RunnerOptions,
        engine: Box<dyn CacheEngine>,
    ) -> Self {
        Self {
            registry,
            engine,
            options,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Compute the per-metric execution orders without executing anything.
    ///
    /// Runs the same validation as `run` (global cycle check, name
    /// resolution), so a plan that comes back `Ok` is a plan `run` would
    /// accept.
    pub fn plan(&self, selection: &Selection) -> Result<Vec<(MetricName, Vec<ProducerName>)>> {
        let graph = DepGraph::from_registry(&self.registry)?;
        let resolver = GraphResolver::new(&graph);
        resolver.check_acyclic()?;
        let plans = self.resolve_plans(&resolver, selection)?;
        Ok(plans
            .into_iter()
            .map(|p| (p.metric, p.order))
            .collect())
    }

    /// Execute the selected metrics.
    ///
    /// Cycle and unknown-name problems abort before anything executes.
    /// Compute, argument-resolution and cache-engine failures abort the
    /// rest of the run and surface as [`MetricDagError::Execution`], which
    /// carries the partial report of what already completed.
    pub fn run(&mut self, container: &Container, selection: &Selection) -> Result<RunReport> {
        self.phase = RunPhase::Validating;
        self.registry.reset_run_states();

        let graph = match DepGraph::from_registry(&self.registry) {
            Ok(graph) => graph,
            Err(err) => return self.fail(err),
        };
        let resolver = GraphResolver::new(&graph);
        if let Err(err) = resolver.check_acyclic() {
            warn!("producer graph contains a cycle; aborting before execution");
            return self.fail(err);
        }

        self.phase = RunPhase::Ordering;
        let plans = match self.resolve_plans(&resolver, selection) {
            Ok(plans) => plans,
            Err(err) => return self.fail(err),
        };

        self.phase = RunPhase::Promoting;
        let promoter = CachePromoter::new(self.options.auto_cache_threshold);
        let name_orders: Vec<(MetricName, Vec<ProducerName>)> = plans
            .iter()
            .map(|p| (p.metric.clone(), p.order.clone()))
            .collect();
        let mut events = promoter.promote(&mut self.registry, &name_orders);

        self.phase = RunPhase::Executing;
        let mut results: Vec<MetricResult> = Vec::new();

        for (index, plan) in plans.iter().enumerate() {
            info!(metric = %plan.metric, producers = plan.order.len(), "running metric");

            for name in &plan.order {
                let (done, handle, cache_mode) = match self.registry.producer(name) {
                    Some(p) => (
                        matches!(p.run_state(), RunState::Done(_)),
                        p.compute().clone(),
                        p.cache_mode(),
                    ),
                    None => return self.fail(MetricDagError::UnknownProducer(name.clone())),
                };

                if done {
                    debug!(producer = %name, metric = %plan.metric, "producer already ran; skipping");
                    events.push(RunEvent::ProducerSkipped {
                        producer: name.clone(),
                        metric: plan.metric.clone(),
                    });
                    continue;
                }

                debug!(producer = %name, metric = %plan.metric, "running producer");
                let artifact = match handle.call(container) {
                    Ok(artifact) => artifact,
                    Err(source) => {
                        return self.abort(&plans, index, results, events, Some(name.clone()), source);
                    }
                };

                if let Some(p) = self.registry.producer_mut(name) {
                    p.set_run_state(RunState::Done(artifact.clone()));
                }

                if cache_mode == CacheMode::ForcedOn {
                    events.push(RunEvent::CacheRequested {
                        producer: name.clone(),
                        artifact: artifact.clone(),
                    });
                    if let Err(err) = self.engine.cache_artifact(name, &artifact) {
                        let source = ComputeCallError::CacheRequest(anyhow::Error::new(err));
                        return self.abort(&plans, index, results, events, Some(name.clone()), source);
                    }
                }
            }

            match plan.compute.call(container) {
                Ok(artifact) => {
                    info!(metric = %plan.metric, artifact = %artifact, "metric complete");
                    results.push(MetricResult {
                        metric: plan.metric.clone(),
                        outcome: MetricOutcome::Completed(artifact),
                    });
                }
                Err(source) => {
                    return self.abort(&plans, index, results, events, None, source);
                }
            }
        }

        self.phase = RunPhase::Done;
        Ok(RunReport { results, events })
    }

    /// Resolve a selection to metric plans: name lookup, transitive
    /// expansion, topological ordering.
    fn resolve_plans(
        &self,
        resolver: &GraphResolver<'_>,
        selection: &Selection,
    ) -> Result<Vec<MetricPlan>> {
        let requested: Vec<MetricName> = match selection {
            Selection::All => self
                .registry
                .metrics_in_registration_order()
                .iter()
                .map(|m| m.name().to_string())
                .collect(),
            Selection::One(name) => vec![name.clone()],
            Selection::Many(names) => names.clone(),
        };

        let mut plans = Vec::with_capacity(requested.len());
        for name in requested {
            let metric = self
                .registry
                .metric(&name)
                .ok_or_else(|| MetricDagError::UnknownMetric(name.clone()))?;
            let closure = resolver.expand(metric.deps())?;
            let order = resolver.order(&closure)?;
            plans.push(MetricPlan {
                metric: name,
                compute: metric.compute().clone(),
                order,
            });
        }
        Ok(plans)
    }

    fn fail<T>(&mut self, err: MetricDagError) -> Result<T> {
        self.phase = RunPhase::Failed;
        Err(err)
    }

    /// Abort mid-execution: build the partial report and surface the
    /// failure with metric/producer context.
    fn abort(
        &mut self,
        plans: &[MetricPlan],
        failed_index: usize,
        mut results: Vec<MetricResult>,
        events: Vec<RunEvent>,
        producer: Option<ProducerName>,
        source: ComputeCallError,
    ) -> Result<RunReport> {
        let metric = plans[failed_index].metric.clone();
        warn!(
            metric = %metric,
            producer = producer.as_deref().unwrap_or("<metric fn>"),
            "aborting run: {source}"
        );

        results.push(MetricResult {
            metric: metric.clone(),
            outcome: MetricOutcome::Failed {
                producer: producer.clone(),
                message: source.to_string(),
            },
        });
        for plan in &plans[failed_index + 1..] {
            results.push(MetricResult {
                metric: plan.metric.clone(),
                outcome: MetricOutcome::NotRun,
            });
        }

        self.phase = RunPhase::Failed;
        Err(MetricDagError::Execution {
            metric,
            producer,
            source,
            partial: Box::new(RunReport { results, events }),
        })
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("phase", &self.phase)
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
