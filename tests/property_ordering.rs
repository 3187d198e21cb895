// tests/property_ordering.rs

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use metricdag::container::Container;
use metricdag::engine::{Runner, RunnerOptions};
use metricdag::types::Selection;
use metricdag_test_utils::builders::{calls, RegistryBuilder};

/// Description of a random acyclic registry: one producer per index, where
/// producer N may only depend on producers 0..N-1 (acyclicity by
/// construction), plus one metric per producer depending directly on it.
#[derive(Debug, Clone)]
struct DagShape {
    deps: Vec<Vec<usize>>,
}

fn dag_shape_strategy(max_producers: usize) -> impl Strategy<Value = DagShape> {
    (1..=max_producers).prop_flat_map(|num| {
        // Raw dependency indices are sanitized modulo the node's own index,
        // since a strategy can't easily depend on the position in the vec.
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num),
            num,
        )
        .prop_map(|raw| {
            let deps = raw
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let mut valid: HashSet<usize> = HashSet::new();
                    for dep in potential {
                        if i > 0 {
                            valid.insert(dep % i);
                        }
                    }
                    let mut valid: Vec<usize> = valid.into_iter().collect();
                    valid.sort_unstable();
                    valid
                })
                .collect();
            DagShape { deps }
        })
    })
}

proptest! {
    #[test]
    fn every_producer_runs_once_and_after_its_requirements(
        shape in dag_shape_strategy(12)
    ) {
        let num = shape.deps.len();
        let mut builder = RegistryBuilder::new();

        for (i, deps) in shape.deps.iter().enumerate() {
            let dep_names: Vec<String> = deps.iter().map(|d| format!("p{d}")).collect();
            let dep_refs: Vec<&str> = dep_names.iter().map(|s| s.as_str()).collect();
            builder = builder.producer(&format!("p{i}"), &dep_refs);
        }
        for i in 0..num {
            let dep_name = format!("p{i}");
            builder = builder.metric(&format!("m{i}"), &[dep_name.as_str()]);
        }

        let (registry, log) = builder.build();
        let mut runner = Runner::new(registry, RunnerOptions {
            auto_cache_threshold: usize::MAX,
        });
        let report = runner
            .run(&Container::new(), &Selection::All)
            .expect("acyclic registry must run");

        prop_assert_eq!(report.completed_count(), num);

        let order = calls(&log);
        let positions: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(pos, name)| (name.as_str(), pos))
            .collect();

        for (i, deps) in shape.deps.iter().enumerate() {
            let name = format!("p{i}");
            // Exactly once, run-once across all the metrics that reach it.
            prop_assert_eq!(
                order.iter().filter(|c| *c == &name).count(),
                1,
                "producer {} must run exactly once", name
            );
            for dep in deps {
                let dep_name = format!("p{dep}");
                prop_assert!(
                    positions[dep_name.as_str()] < positions[name.as_str()],
                    "{} must run before {}", dep_name, name
                );
            }
        }
    }
}
