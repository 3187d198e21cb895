// tests/registry_behaviour.rs
mod common;
use crate::common::{init_tracing, TestResult};

use metricdag::container::Container;
use metricdag::engine::{Runner, RunnerOptions};
use metricdag::errors::MetricDagError;
use metricdag::registry::{CacheMode, Registry};
use metricdag::types::Selection;
use metricdag_test_utils::builders::{calls, logged_fn, new_call_log};

#[test]
fn re_registration_replaces_the_earlier_definition() -> TestResult {
    init_tracing();

    let log = new_call_log();
    let mut registry = Registry::new();

    registry.register_producer(Some("p"), logged_fn(&log, "p_old"), &[], CacheMode::Auto)?;
    registry.register_producer(Some("p"), logged_fn(&log, "p_new"), &[], CacheMode::Auto)?;

    registry.register_metric("m", logged_fn(&log, "m_old"), &["p"]);
    registry.register_metric("m", logged_fn(&log, "m_new"), &["p"]);

    let mut runner = Runner::new(registry, RunnerOptions::default());
    runner.run(&Container::new(), &Selection::from("m"))?;

    // Only the replacement definitions ran.
    assert_eq!(calls(&log), vec!["p_new", "m_new"]);
    Ok(())
}

#[test]
fn unknown_metric_fails_before_any_execution() -> TestResult {
    init_tracing();

    let log = new_call_log();
    let mut registry = Registry::new();
    registry.register_producer(Some("p"), logged_fn(&log, "p"), &[], CacheMode::Auto)?;
    registry.register_metric("exists", logged_fn(&log, "exists"), &["p"]);

    let mut runner = Runner::new(registry, RunnerOptions::default());
    let err = runner
        .run(
            &Container::new(),
            &Selection::Many(vec!["exists".to_string(), "missing".to_string()]),
        )
        .expect_err("unknown metric must fail the run");

    match err {
        MetricDagError::UnknownMetric(name) => assert_eq!(name, "missing"),
        other => panic!("expected UnknownMetric, got {other:?}"),
    }
    // Fail-fast: even the metric that exists must not have run.
    assert!(calls(&log).is_empty());
    Ok(())
}

#[test]
fn unknown_producer_dependency_is_an_explicit_error() -> TestResult {
    init_tracing();

    let log = new_call_log();
    let mut registry = Registry::new();
    registry.register_producer(Some("p"), logged_fn(&log, "p"), &["ghost"], CacheMode::Auto)?;
    registry.register_metric("m", logged_fn(&log, "m"), &["p"]);

    let mut runner = Runner::new(registry, RunnerOptions::default());
    let err = runner
        .run(&Container::new(), &Selection::from("m"))
        .expect_err("dangling dependency must fail the run");

    match err {
        MetricDagError::UnknownProducer(name) => assert_eq!(name, "ghost"),
        other => panic!("expected UnknownProducer, got {other:?}"),
    }
    assert!(calls(&log).is_empty());
    Ok(())
}

#[test]
fn producer_with_non_identifier_return_is_rejected_at_registration() {
    init_tracing();

    let mut registry = Registry::new();
    let err = registry
        .register_producer(Some("bad"), || 42usize, &[], CacheMode::Auto)
        .expect_err("non-identifier return must be rejected");

    match err {
        MetricDagError::Signature { name, reason } => {
            assert_eq!(name, "bad");
            assert!(reason.contains("usize"), "reason should name the type: {reason}");
        }
        other => panic!("expected Signature error, got {other:?}"),
    }
}

#[test]
fn unnamed_producer_gets_a_usable_derived_name() -> TestResult {
    init_tracing();

    fn base_view() -> String {
        "tv_base".to_string()
    }

    let mut registry = Registry::new();
    let derived = registry.register_producer(None, base_view, &[], CacheMode::Auto)?;
    // The derived name is the function's type name; exact shape is an
    // implementation detail, but it must be stable and registered.
    assert!(registry.producer(&derived).is_some());

    registry.register_metric("m", || "tv_m".to_string(), &[derived.as_str()]);

    let mut runner = Runner::new(registry, RunnerOptions::default());
    let report = runner.run(&Container::new(), &Selection::from("m"))?;
    assert_eq!(report.artifact_of("m").unwrap().as_str(), "tv_m");
    Ok(())
}

#[test]
fn metric_and_producer_namespaces_are_disjoint() -> TestResult {
    init_tracing();

    let log = new_call_log();
    let mut registry = Registry::new();
    // Same spelling on both sides; neither registration may clobber the other.
    registry.register_producer(Some("same"), logged_fn(&log, "producer_same"), &[], CacheMode::Auto)?;
    registry.register_metric("same", logged_fn(&log, "metric_same"), &["same"]);

    let mut runner = Runner::new(registry, RunnerOptions::default());
    runner.run(&Container::new(), &Selection::from("same"))?;

    assert_eq!(calls(&log), vec!["producer_same", "metric_same"]);
    Ok(())
}
