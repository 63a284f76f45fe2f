//! Graph primitives: PageRank, centrality measures, community detection.
//!
//! All primitives operate on [`Adjacency`], a directed adjacency map keyed
//! by [`EntityId`]. `BTreeMap`/`BTreeSet` keep every iteration in ID order,
//! so repeated runs over the same snapshot produce identical output. Pure
//! functions, no I/O; self-loops and cycles are legal inputs, and every
//! degenerate case (empty graph, isolated nodes, zero total edges) yields
//! defined zeros rather than NaN.

pub mod centrality;
pub mod community;
pub mod pagerank;

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::EntityId;

/// Directed adjacency: node → set of successor nodes.
pub type Adjacency = BTreeMap<EntityId, BTreeSet<EntityId>>;

/// Insert a directed edge, creating both endpoints as needed.
pub fn add_edge(graph: &mut Adjacency, from: EntityId, to: EntityId) {
    graph.entry(to.clone()).or_default();
    graph.entry(from).or_default().insert(to);
}

/// All nodes of the graph in ID order: keys plus any successor that only
/// appears on the right-hand side.
pub fn node_set(graph: &Adjacency) -> BTreeSet<EntityId> {
    let mut nodes: BTreeSet<EntityId> = graph.keys().cloned().collect();
    for targets in graph.values() {
        nodes.extend(targets.iter().cloned());
    }
    nodes
}

/// The undirected projection: every edge mirrored in both directions.
pub(crate) fn undirected(graph: &Adjacency) -> Adjacency {
    let mut out: Adjacency = BTreeMap::new();
    for node in node_set(graph) {
        out.entry(node).or_default();
    }
    for (from, targets) in graph {
        for to in targets {
            out.entry(from.clone()).or_default().insert(to.clone());
            out.entry(to.clone()).or_default().insert(from.clone());
        }
    }
    out
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    pub fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    /// Build a graph from (from, to) string pairs.
    pub fn graph_of(edges: &[(&str, &str)]) -> Adjacency {
        let mut g = Adjacency::new();
        for (from, to) in edges {
            add_edge(&mut g, eid(from), eid(to));
        }
        g
    }
}
