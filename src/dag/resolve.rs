// src/dag/resolve.rs

//! Transitive-dependency expansion and topological ordering.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use crate::dag::DepGraph;
use crate::errors::{MetricDagError, Result};
use crate::types::ProducerName;

/// Read-only resolver over a built [`DepGraph`].
#[derive(Debug)]
pub struct GraphResolver<'g> {
    graph: &'g DepGraph,
}

impl<'g> GraphResolver<'g> {
    pub fn new(graph: &'g DepGraph) -> Self {
        Self { graph }
    }

    /// Expand a metric's direct dependency names into the full transitive
    /// closure over producers, in first-seen order.
    ///
    /// The closure is accumulated in a fresh set; the declarations in the
    /// registry are never touched, so a metric's stored dependency list
    /// stays exactly what the caller registered.
    pub fn expand(&self, direct_deps: &[ProducerName]) -> Result<Vec<ProducerName>> {
        let mut closure: Vec<ProducerName> = Vec::new();
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut worklist: VecDeque<NodeIndex> = VecDeque::new();

        for dep in direct_deps {
            let ix = self
                .graph
                .index_of(dep)
                .ok_or_else(|| MetricDagError::UnknownProducer(dep.clone()))?;
            worklist.push_back(ix);
        }

        while let Some(ix) = worklist.pop_front() {
            if !seen.insert(ix) {
                continue;
            }
            closure.push(self.graph.name_of(ix).to_string());
            for req in self.graph.requirements(ix) {
                worklist.push_back(req);
            }
        }

        trace!(direct = direct_deps.len(), expanded = closure.len(), "expanded dependency closure");
        Ok(closure)
    }

    /// Topologically order a subset of producers so that every producer
    /// appears after everything it (transitively) requires.
    ///
    /// Kahn's algorithm over the restriction of the graph to `subset`:
    /// in-degree counts how many subset members still require a node, the
    /// worklist is seeded with the un-required nodes, and the finished
    /// sequence is reversed so requirements come first. When several nodes
    /// are eligible at once, the latest-registered is processed first;
    /// after the final reversal that makes independent producers execute in
    /// registration order, so plans are stable for a given registration
    /// order.
    ///
    /// If the worklist drains before every node is placed, the leftover
    /// nodes are exactly the cycle participants and are reported as such.
    pub fn order(&self, subset: &[ProducerName]) -> Result<Vec<ProducerName>> {
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for name in subset {
            let ix = self
                .graph
                .index_of(name)
                .ok_or_else(|| MetricDagError::UnknownProducer(name.clone()))?;
            in_degree.entry(ix).or_insert(0);
        }

        let members: Vec<NodeIndex> = in_degree.keys().copied().collect();
        for &ix in &members {
            for req in self.graph.requirements(ix) {
                if let Some(count) = in_degree.get_mut(&req) {
                    *count += 1;
                }
            }
        }

        // NodeIndex order is registration order, so an ordered ready-set
        // gives the documented tie-break for free. Popping from the back
        // here puts earliest-registered nodes first once the sequence is
        // reversed below.
        let mut ready: BTreeSet<NodeIndex> = in_degree
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(&ix, _)| ix)
            .collect();

        let mut sequence: Vec<NodeIndex> = Vec::with_capacity(in_degree.len());
        while let Some(ix) = ready.pop_last() {
            sequence.push(ix);
            for req in self.graph.requirements(ix) {
                if let Some(count) = in_degree.get_mut(&req) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(req);
                    }
                }
            }
        }

        if sequence.len() != in_degree.len() {
            let placed: HashSet<NodeIndex> = sequence.iter().copied().collect();
            let mut participants: Vec<NodeIndex> = in_degree
                .keys()
                .filter(|ix| !placed.contains(ix))
                .copied()
                .collect();
            participants.sort();
            return Err(MetricDagError::CyclicDependency {
                participants: participants
                    .into_iter()
                    .map(|ix| self.graph.name_of(ix).to_string())
                    .collect(),
            });
        }

        sequence.reverse();
        let order: Vec<ProducerName> = sequence
            .into_iter()
            .map(|ix| self.graph.name_of(ix).to_string())
            .collect();
        debug!(len = order.len(), "computed topological order");
        Ok(order)
    }

    /// Cycle check over the whole producer graph.
    ///
    /// Any cycle anywhere is fatal for a run, even among producers no
    /// requested metric reaches, so this runs before selection is resolved.
    pub fn check_acyclic(&self) -> Result<()> {
        let all: Vec<ProducerName> = self
            .graph
            .node_indices()
            .map(|ix| self.graph.name_of(ix).to_string())
            .collect();
        self.order(&all).map(|_| ())
    }
}
