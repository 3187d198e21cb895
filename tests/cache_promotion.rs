// tests/cache_promotion.rs
mod common;
use crate::common::{init_tracing, TestResult};

use std::sync::{Arc, Mutex};

use metricdag::container::Container;
use metricdag::engine::{Runner, RunnerOptions};
use metricdag::registry::CacheMode;
use metricdag::types::Selection;
use metricdag_test_utils::builders::{call_count, RegistryBuilder};
use metricdag_test_utils::engines::RecordingEngine;

/// The reference scenario: metric A needs x; metric B needs x and y, where
/// y itself needs x. With threshold 1, x is used by both metrics (count 2)
/// and gets promoted; y is used once and stays auto.
#[test]
fn fan_in_above_threshold_promotes_auto_producers() -> TestResult {
    init_tracing();

    let (registry, log) = RegistryBuilder::new()
        .producer("x", &[])
        .producer("y", &["x"])
        .metric("a", &["x"])
        .metric("b", &["x", "y"])
        .build();

    let cached = Arc::new(Mutex::new(Vec::new()));
    let engine = RecordingEngine::new(Arc::clone(&cached));
    let mut runner = Runner::with_engine(
        registry,
        RunnerOptions {
            auto_cache_threshold: 1,
        },
        Box::new(engine),
    );

    let report = runner.run(&Container::new(), &Selection::All)?;

    // x ran once, y ran once, after x.
    assert_eq!(call_count(&log, "x"), 1);
    assert_eq!(call_count(&log, "y"), 1);
    assert_eq!(call_count(&log, "a"), 1);
    assert_eq!(call_count(&log, "b"), 1);

    // Promotion flipped x, left y alone.
    assert_eq!(report.promoted_producers(), vec!["x"]);
    assert_eq!(
        runner.registry().producer("x").unwrap().cache_mode(),
        CacheMode::ForcedOn
    );
    assert_eq!(
        runner.registry().producer("y").unwrap().cache_mode(),
        CacheMode::Auto
    );

    // The engine saw exactly one cache request, for x's artifact.
    let cached = cached.lock().unwrap();
    assert_eq!(cached.as_slice(), &[("x".to_string(), "tv_x".to_string())]);
    Ok(())
}

#[test]
fn count_at_threshold_is_not_promoted() -> TestResult {
    init_tracing();

    // One use, threshold 1: count must *exceed* the threshold.
    let (registry, _log) = RegistryBuilder::new()
        .producer("x", &[])
        .metric("only", &["x"])
        .build();

    let mut runner = Runner::new(registry, RunnerOptions {
        auto_cache_threshold: 1,
    });
    let report = runner.run(&Container::new(), &Selection::All)?;

    assert!(report.promoted_producers().is_empty());
    assert_eq!(
        runner.registry().producer("x").unwrap().cache_mode(),
        CacheMode::Auto
    );
    Ok(())
}

#[test]
fn pinned_modes_are_never_altered() -> TestResult {
    init_tracing();

    let (registry, _log) = RegistryBuilder::new()
        .producer_with_cache("never", &[], CacheMode::ForcedOff)
        .producer_with_cache("always", &[], CacheMode::ForcedOn)
        .metric("m1", &["never", "always"])
        .metric("m2", &["never", "always"])
        .metric("m3", &["never", "always"])
        .build();

    let cached = Arc::new(Mutex::new(Vec::new()));
    let engine = RecordingEngine::new(Arc::clone(&cached));
    let mut runner = Runner::with_engine(
        registry,
        RunnerOptions {
            auto_cache_threshold: 1,
        },
        Box::new(engine),
    );

    let report = runner.run(&Container::new(), &Selection::All)?;

    // High fan-in, but neither pinned mode moves.
    assert!(report.promoted_producers().is_empty());
    assert_eq!(
        runner.registry().producer("never").unwrap().cache_mode(),
        CacheMode::ForcedOff
    );
    assert_eq!(
        runner.registry().producer("always").unwrap().cache_mode(),
        CacheMode::ForcedOn
    );

    // Only the forced-on producer was sent to the engine, once (it runs once).
    let cached = cached.lock().unwrap();
    assert_eq!(
        cached.as_slice(),
        &[("always".to_string(), "tv_always".to_string())]
    );
    Ok(())
}

#[test]
fn usage_counts_per_metric_not_per_execution() -> TestResult {
    init_tracing();

    // `base` reaches each metric only through an intermediate, so it never
    // appears in a metric's direct deps, yet still counts once per metric.
    let (registry, _log) = RegistryBuilder::new()
        .producer("base", &[])
        .producer("via1", &["base"])
        .producer("via2", &["base"])
        .metric("m1", &["via1"])
        .metric("m2", &["via2"])
        .build();

    let mut runner = Runner::new(registry, RunnerOptions {
        auto_cache_threshold: 1,
    });
    let report = runner.run(&Container::new(), &Selection::All)?;

    // base: 2 uses (> 1) promoted; via1/via2: 1 use each, untouched.
    assert_eq!(report.promoted_producers(), vec!["base"]);
    Ok(())
}
