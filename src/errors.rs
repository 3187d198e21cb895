// src/errors.rs

//! Crate-wide error type and helpers.

use thiserror::Error;

use crate::engine::report::RunReport;
use crate::registry::compute::ComputeCallError;

#[derive(Error, Debug)]
pub enum MetricDagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown producer: {0}")]
    UnknownProducer(String),

    /// The producer graph could not be fully ordered. `participants` is the
    /// exact set of producers still unresolved when the worklist drained,
    /// i.e. every node involved in a cycle.
    #[error("Cyclic dependency among producers: {}", .participants.join(", "))]
    CyclicDependency { participants: Vec<String> },

    #[error("Signature error for '{name}': {reason}")]
    Signature { name: String, reason: String },

    /// A compute function (or its argument resolution) failed mid-run.
    ///
    /// `partial` records what already completed before the abort, so a caller
    /// can see which metrics finished and which were never reached.
    #[error("run aborted in metric '{metric}': {source}")]
    Execution {
        metric: String,
        /// The producer that failed, or `None` when the metric's own compute
        /// function was the failing unit.
        producer: Option<String>,
        #[source]
        source: ComputeCallError,
        partial: Box<RunReport>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MetricDagError>;
