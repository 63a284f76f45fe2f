//! PageRank via power iteration with dangling-node redistribution.

use std::collections::BTreeMap;

use crate::entity::EntityId;

use super::{Adjacency, node_set};

/// Tuning parameters for the power iteration.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Random-walk damping factor.
    pub damping: f64,
    /// Stop once the L1 delta between iterations falls below this.
    pub tolerance: f64,
    /// Hard cap on iterations, in case the tolerance is never reached.
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Compute PageRank over a directed graph.
///
/// Dangling nodes (no outgoing edges) redistribute their rank uniformly.
/// Output is normalized by the maximum score so the top node is 1.0 —
/// a relative scale, not a probability distribution. An empty graph yields
/// an empty map.
pub fn pagerank(graph: &Adjacency, config: &PageRankConfig) -> BTreeMap<EntityId, f64> {
    let nodes = node_set(graph);
    let n = nodes.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let uniform = 1.0 / n as f64;
    let mut rank: BTreeMap<EntityId, f64> = nodes.iter().map(|id| (id.clone(), uniform)).collect();

    for iteration in 0..config.max_iterations {
        // Rank held by nodes with no successors, spread over everyone.
        let dangling: f64 = nodes
            .iter()
            .filter(|id| graph.get(*id).is_none_or(|succ| succ.is_empty()))
            .map(|id| rank[id])
            .sum();

        let mut next: BTreeMap<EntityId, f64> = nodes
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    (1.0 - config.damping) * uniform + config.damping * dangling * uniform,
                )
            })
            .collect();

        for (from, targets) in graph {
            if targets.is_empty() {
                continue;
            }
            let share = config.damping * rank[from] / targets.len() as f64;
            for to in targets {
                *next.get_mut(to).expect("target in node set") += share;
            }
        }

        let delta: f64 = nodes.iter().map(|id| (next[id] - rank[id]).abs()).sum();
        rank = next;
        if delta < config.tolerance {
            tracing::debug!(iteration, delta, "pagerank converged");
            break;
        }
    }

    // Normalize to [0, 1] by the max score.
    let max = rank.values().cloned().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for score in rank.values_mut() {
            *score /= max;
        }
    }
    rank
}
