// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::errors::{MetricDagError, Result};
use crate::registry::Registry;

/// Directed graph of producer requirements.
///
/// Nodes are producer names; an edge `a -> b` means "a requires b". Metrics
/// are not nodes here; they are roots that reference into the graph by name.
///
/// Nodes are inserted in registration order, so `NodeIndex` order doubles as
/// the registration-order tie-break used by the resolver.
#[derive(Debug)]
pub struct DepGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl DepGraph {
    /// Build the full producer graph from a registry.
    ///
    /// Fails with [`MetricDagError::UnknownProducer`] when a producer
    /// requires a name that was never registered; producers can be declared
    /// in any order, so this is only checkable once the whole registry is
    /// assembled.
    pub fn from_registry(registry: &Registry) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut indices = HashMap::new();

        let producers = registry.producers_in_registration_order();
        for producer in &producers {
            let ix = graph.add_node(producer.name().to_string());
            indices.insert(producer.name().to_string(), ix);
        }

        for producer in &producers {
            let from = indices[producer.name()];
            for dep in producer.deps() {
                let to = *indices
                    .get(dep.as_str())
                    .ok_or_else(|| MetricDagError::UnknownProducer(dep.clone()))?;
                graph.add_edge(from, to, ());
            }
        }

        Ok(Self { graph, indices })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.indices.get(name).copied()
    }

    pub(crate) fn name_of(&self, ix: NodeIndex) -> &str {
        &self.graph[ix]
    }

    /// Producers that `ix` directly requires (one entry per declared edge,
    /// so duplicate declarations stay consistent with in-degree counting).
    pub(crate) fn requirements(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(ix, Direction::Outgoing)
    }

    /// All producer nodes, in registration order.
    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Direct requirement names of a producer, for diagnostics.
    pub fn requirements_of(&self, name: &str) -> Vec<&str> {
        match self.index_of(name) {
            Some(ix) => self.requirements(ix).map(|dep| self.name_of(dep)).collect(),
            None => Vec::new(),
        }
    }
}
