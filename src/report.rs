//! Versioned graph-metrics report artifact.
//!
//! Summarizes node/edge/community counts per graph plus "bridge" nodes
//! (high-betweenness nodes whose edges mostly leave their own community)
//! and persists the result as `graph_metrics.json` under a timestamped
//! directory.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::algo::centrality::betweenness_centrality;
use crate::algo::community::{CommunityConfig, detect_communities};
use crate::algo::{Adjacency, node_set};
use crate::entity::{EntityId, GraphType};
use crate::error::ReportError;

pub const REPORT_KIND: &str = "GraphMetricsReport.v1";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTotals {
    pub nodes: usize,
    pub edges: usize,
    pub communities: usize,
    pub bridges: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSection {
    pub entity_type: String,
    pub nodes: usize,
    pub edges: usize,
    pub communities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetricsReport {
    pub kind: String,
    pub schema_version: u32,
    /// ISO-8601 timestamp of computation.
    pub computed_at: String,
    pub totals: ReportTotals,
    pub graphs: Vec<GraphSection>,
}

/// Compute the report over one adjacency per graph.
pub fn build_report(graphs: &BTreeMap<GraphType, Adjacency>) -> GraphMetricsReport {
    let mut sections = Vec::new();
    let mut totals = ReportTotals {
        nodes: 0,
        edges: 0,
        communities: 0,
        bridges: 0,
    };

    for (graph_type, adjacency) in graphs {
        let nodes = node_set(adjacency).len();
        let edges: usize = adjacency.values().map(BTreeSet::len).sum();
        let communities =
            detect_communities(adjacency, &CommunityConfig::default()).count;
        let bridges = bridge_nodes(adjacency).len();

        totals.nodes += nodes;
        totals.edges += edges;
        totals.communities += communities;
        totals.bridges += bridges;
        sections.push(GraphSection {
            entity_type: graph_type.to_string(),
            nodes,
            edges,
            communities,
        });
    }

    GraphMetricsReport {
        kind: REPORT_KIND.to_string(),
        schema_version: SCHEMA_VERSION,
        computed_at: Utc::now().to_rfc3339(),
        totals,
        graphs: sections,
    }
}

/// Nodes that connect communities rather than sit inside one.
///
/// A bridge has betweenness centrality in the top quintile of the graph
/// (and above zero) while fewer than half of its edges stay within its
/// own community.
pub fn bridge_nodes(graph: &Adjacency) -> Vec<EntityId> {
    let nodes = node_set(graph);
    if nodes.is_empty() {
        return Vec::new();
    }

    let centrality = betweenness_centrality(graph);
    let mut values: Vec<f64> = centrality.values().copied().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((0.8 * values.len() as f64).floor() as usize).min(values.len() - 1);
    let threshold = values[idx];

    let communities = detect_communities(graph, &CommunityConfig::default());

    // Undirected neighbor sets for degree and within-community counts.
    let mut neighbors: BTreeMap<&EntityId, BTreeSet<&EntityId>> = BTreeMap::new();
    for (from, targets) in graph {
        for to in targets {
            if from != to {
                neighbors.entry(from).or_default().insert(to);
                neighbors.entry(to).or_default().insert(from);
            }
        }
    }

    nodes
        .iter()
        .filter(|node| {
            let c = centrality.get(node).copied().unwrap_or(0.0);
            if c <= 0.0 || c < threshold {
                return false;
            }
            let Some(own) = communities.assignments.get(*node) else {
                return false;
            };
            let Some(adjacent) = neighbors.get(node) else {
                return false;
            };
            let degree = adjacent.len();
            let within = adjacent
                .iter()
                .filter(|n| communities.assignments.get(**n) == Some(own))
                .count();
            (within as f64) < degree as f64 / 2.0
        })
        .cloned()
        .collect()
}

/// Serialize the report and write it as `graph_metrics.json` under a
/// fresh UTC-timestamped directory below `reports_root`. Returns the
/// full path of the written file.
pub fn write_report(
    report: &GraphMetricsReport,
    reports_root: &Path,
) -> Result<PathBuf, ReportError> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let dir = reports_root.join(stamp);
    fs::create_dir_all(&dir).map_err(|source| ReportError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let json = serde_json::to_string_pretty(report).map_err(|e| ReportError::Serialize {
        message: e.to_string(),
    })?;

    let path = dir.join("graph_metrics.json");
    fs::write(&path, json).map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(path = %path.display(), "wrote graph metrics report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::testutil::{eid, graph_of};

    fn three_cliques_with_hub() -> Adjacency {
        // Three triangles, each tied to a central connector node "x".
        graph_of(&[
            ("a1", "a2"),
            ("a2", "a3"),
            ("a3", "a1"),
            ("b1", "b2"),
            ("b2", "b3"),
            ("b3", "b1"),
            ("c1", "c2"),
            ("c2", "c3"),
            ("c3", "c1"),
            ("x", "a1"),
            ("x", "b1"),
            ("x", "c1"),
        ])
    }

    #[test]
    fn connector_node_is_a_bridge() {
        let bridges = bridge_nodes(&three_cliques_with_hub());
        assert!(bridges.contains(&eid("x")));
    }

    #[test]
    fn clique_interior_is_not_a_bridge() {
        let bridges = bridge_nodes(&three_cliques_with_hub());
        assert!(!bridges.contains(&eid("a2")));
        assert!(!bridges.contains(&eid("b3")));
    }

    #[test]
    fn empty_graph_has_no_bridges() {
        assert!(bridge_nodes(&Adjacency::new()).is_empty());
    }

    #[test]
    fn report_totals_sum_over_graphs() {
        let mut graphs = BTreeMap::new();
        graphs.insert(GraphType::Code, graph_of(&[("a", "b"), ("b", "c")]));
        graphs.insert(GraphType::Org, graph_of(&[("alice", "team-x")]));

        let report = build_report(&graphs);
        assert_eq!(report.kind, REPORT_KIND);
        assert_eq!(report.schema_version, 1);
        assert_eq!(report.totals.nodes, 5);
        assert_eq!(report.totals.edges, 3);
        assert_eq!(report.graphs.len(), 2);
        assert_eq!(report.graphs[0].entity_type, "code");
    }

    #[test]
    fn written_report_round_trips_as_json() {
        let mut graphs = BTreeMap::new();
        graphs.insert(GraphType::Code, graph_of(&[("a", "b")]));
        let report = build_report(&graphs);

        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&report, dir.path()).unwrap();
        assert!(path.ends_with("graph_metrics.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: GraphMetricsReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.kind, REPORT_KIND);
        assert_eq!(parsed.totals, report.totals);
    }
}
