//! Code-graph importance: PageRank + betweenness + churn×complexity hotspots.

use std::collections::{BTreeMap, HashMap};

use crate::algo::centrality::betweenness_centrality;
use crate::algo::pagerank::{PageRankConfig, pagerank};
use crate::algo::{Adjacency, node_set};
use crate::entity::EntityId;

use super::CodeImportanceMetrics;

/// Raw hotspot signal for one code entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotSignal {
    /// Change frequency (commits touching the entity, any consistent unit).
    pub churn: f64,
    /// Structural complexity (cyclomatic or similar, any consistent unit).
    pub complexity: f64,
}

/// Tuning for the code importance blend.
#[derive(Debug, Clone)]
pub struct CodeImportanceConfig {
    pub pagerank: PageRankConfig,
    /// Blend weights when hotspot signals are supplied.
    pub pagerank_weight: f64,
    pub centrality_weight: f64,
    pub hotspot_weight: f64,
}

impl Default for CodeImportanceConfig {
    fn default() -> Self {
        Self {
            pagerank: PageRankConfig::default(),
            pagerank_weight: 0.4,
            centrality_weight: 0.3,
            hotspot_weight: 0.3,
        }
    }
}

/// Compute code importance for every node of the code graph.
///
/// `hotspots` may be empty; without hotspot signals the combined score
/// blends PageRank and centrality only (renormalized 50/50) and the
/// hotspot component reports 0. Entities absent from the graph are not in
/// the returned map — callers substitute [`CodeImportanceMetrics::default`].
pub fn compute_code_importance(
    graph: &Adjacency,
    hotspots: &HashMap<EntityId, HotspotSignal>,
    config: &CodeImportanceConfig,
) -> BTreeMap<EntityId, CodeImportanceMetrics> {
    let ranks = pagerank(graph, &config.pagerank);
    let centralities = betweenness_centrality(graph);

    // Hotspot scores are churn × complexity normalized by the max product.
    let max_product = hotspots
        .values()
        .map(|s| s.churn * s.complexity)
        .fold(0.0_f64, f64::max);

    let mut out = BTreeMap::new();
    for node in node_set(graph) {
        let page_rank = ranks.get(&node).copied().unwrap_or(0.0);
        let centrality = centralities.get(&node).copied().unwrap_or(0.0);
        let hotspot_score = match hotspots.get(&node) {
            Some(signal) if max_product > 0.0 => {
                (signal.churn * signal.complexity / max_product).clamp(0.0, 1.0)
            }
            _ => 0.0,
        };

        let combined = if hotspots.is_empty() {
            0.5 * page_rank + 0.5 * centrality
        } else {
            config.pagerank_weight * page_rank
                + config.centrality_weight * centrality
                + config.hotspot_weight * hotspot_score
        }
        .clamp(0.0, 1.0);

        out.insert(node, CodeImportanceMetrics {
            page_rank,
            centrality,
            hotspot_score,
            combined,
        });
    }
    out
}
