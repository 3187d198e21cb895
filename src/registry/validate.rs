// src/registry/validate.rs

//! One-pass validation of every registration against the container.
//!
//! Unlike the run-time checks, nothing here fails fast: the whole registry
//! is swept and every problem is collected, so an operator sees all of them
//! at once instead of fixing one per run.

use tracing::debug;

use crate::container::Container;
use crate::registry::Registry;

/// An argument type a compute function declared but the container cannot
/// supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedArgument {
    /// Name of the metric or producer declaring the argument.
    pub owner: String,
    /// Type name of the unresolvable argument.
    pub argument: &'static str,
}

/// Problems found for one namespace (metrics or producers), by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryErrors {
    /// Registrations whose compute function does not return an artifact
    /// identifier.
    pub wrong_return_type: Vec<String>,
    /// Declared argument types with no registered factory.
    pub unregistered_argument_type: Vec<UnresolvedArgument>,
}

impl CategoryErrors {
    pub fn is_empty(&self) -> bool {
        self.wrong_return_type.is_empty() && self.unregistered_argument_type.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub metrics: CategoryErrors,
    pub producers: CategoryErrors,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.metrics.is_empty() && self.producers.is_empty()
    }
}

/// Sweep every registered metric and producer, checking return types and
/// argument resolvability against `container`.
pub fn validate(registry: &Registry, container: &Container) -> ValidationReport {
    let mut report = ValidationReport::default();

    for metric in registry.metrics_in_registration_order() {
        let signature = metric.compute().signature();
        if !signature.returns_artifact() {
            report.metrics.wrong_return_type.push(metric.name().to_string());
        }
        for arg in &signature.args {
            if !container.provides(arg) {
                report.metrics.unregistered_argument_type.push(UnresolvedArgument {
                    owner: metric.name().to_string(),
                    argument: arg.name,
                });
            }
        }
    }

    for producer in registry.producers_in_registration_order() {
        let signature = producer.compute().signature();
        // Producers with a non-identifier return are rejected at
        // registration; re-checking keeps the report complete even if that
        // path changes.
        if !signature.returns_artifact() {
            report.producers.wrong_return_type.push(producer.name().to_string());
        }
        for arg in &signature.args {
            if !container.provides(arg) {
                report.producers.unregistered_argument_type.push(UnresolvedArgument {
                    owner: producer.name().to_string(),
                    argument: arg.name,
                });
            }
        }
    }

    debug!(
        metric_issues = report.metrics.wrong_return_type.len()
            + report.metrics.unregistered_argument_type.len(),
        producer_issues = report.producers.wrong_return_type.len()
            + report.producers.unregistered_argument_type.len(),
        "validation sweep complete"
    );

    report
}
