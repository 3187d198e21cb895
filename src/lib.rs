// src/lib.rs

pub mod cli;
pub mod config;
pub mod container;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod registry;
pub mod types;

use anyhow::{anyhow, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_or_default;
use crate::container::Container;
use crate::engine::report::{MetricOutcome, RunReport};
use crate::engine::{Runner, RunnerOptions};
use crate::registry::{validate, Registry, ValidationReport};
use crate::types::Selection;

/// High-level entry point for a downstream `main.rs`.
///
/// The caller declares its metrics, producers and container factories, then
/// hands everything over together with the parsed CLI args. This wires
/// together:
/// - config loading (threshold, default selection)
/// - validation / dry-run short-circuits
/// - runner construction and execution
/// - report printing
pub fn run(args: CliArgs, registry: Registry, container: Container) -> Result<()> {
    let cfg = load_or_default(&args.config)?;

    if args.check {
        let report = validate(&registry, &container);
        print_validation(&report);
        if !report.is_clean() {
            return Err(anyhow!("validation found problems; see report above"));
        }
        return Ok(());
    }

    let threshold = args
        .threshold
        .unwrap_or(cfg.promotion.auto_cache_threshold);
    let selection = if !args.metrics.is_empty() {
        Selection::from_names(args.metrics.clone())
    } else {
        Selection::from_names(cfg.run.metrics.clone())
    };
    debug!(?selection, threshold, "resolved run parameters");

    let mut runner = Runner::new(
        registry,
        RunnerOptions {
            auto_cache_threshold: threshold,
        },
    );

    if args.dry_run {
        print_dry_run(&runner.plan(&selection)?);
        return Ok(());
    }

    let report = runner.run(&container, &selection)?;
    info!(metrics = report.results.len(), "run finished");
    print_report(&report);
    Ok(())
}

/// Simple dry-run output: print each metric's ordered producer plan.
fn print_dry_run(plans: &[(String, Vec<String>)]) {
    println!("metricdag dry-run");
    println!("metrics ({}):", plans.len());
    for (metric, order) in plans {
        println!("  - {metric}");
        for producer in order {
            println!("      runs: {producer}");
        }
    }
    debug!("dry-run complete (no execution)");
}

fn print_report(report: &RunReport) {
    for result in &report.results {
        match &result.outcome {
            MetricOutcome::Completed(artifact) => {
                println!("{}: {artifact}", result.metric);
            }
            MetricOutcome::Failed { producer, message } => match producer {
                Some(p) => println!("{}: FAILED in producer '{p}': {message}", result.metric),
                None => println!("{}: FAILED: {message}", result.metric),
            },
            MetricOutcome::NotRun => println!("{}: not run", result.metric),
        }
    }
    if !report.events.is_empty() {
        debug!(events = report.events.len(), "run events recorded");
    }
}

fn print_validation(report: &ValidationReport) {
    if report.is_clean() {
        println!("validation: ok");
        return;
    }
    for name in &report.metrics.wrong_return_type {
        println!("metric '{name}': compute function does not return an artifact identifier");
    }
    for issue in &report.metrics.unregistered_argument_type {
        println!(
            "metric '{}': argument type `{}` has no registered factory",
            issue.owner, issue.argument
        );
    }
    for name in &report.producers.wrong_return_type {
        println!("producer '{name}': compute function does not return an artifact identifier");
    }
    for issue in &report.producers.unregistered_argument_type {
        println!(
            "producer '{}': argument type `{}` has no registered factory",
            issue.owner, issue.argument
        );
    }
}
