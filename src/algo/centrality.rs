//! Centrality measures: betweenness (Brandes), closeness, eigenvector.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::entity::EntityId;

use super::{Adjacency, node_set, undirected};

/// Betweenness centrality via Brandes' algorithm over unweighted BFS.
///
/// For each source, builds the shortest-path DAG (distance, path count,
/// predecessors), then back-propagates dependency scores in reverse
/// BFS-finish order. For n > 2 the accumulated scores are scaled by
/// `2 / ((n-1)(n-2))` and clamped to [0, 1]. Nodes unreachable from a
/// source simply contribute nothing for that source; isolated nodes
/// receive 0.
pub fn betweenness_centrality(graph: &Adjacency) -> BTreeMap<EntityId, f64> {
    let nodes: Vec<EntityId> = node_set(graph).into_iter().collect();
    let n = nodes.len();
    let mut centrality: BTreeMap<EntityId, f64> = nodes.iter().map(|id| (id.clone(), 0.0)).collect();
    if n < 3 {
        return centrality;
    }

    for source in &nodes {
        // BFS shortest-path DAG from this source.
        let mut finish_order: Vec<&EntityId> = Vec::new();
        let mut predecessors: HashMap<&EntityId, Vec<&EntityId>> = HashMap::new();
        let mut sigma: HashMap<&EntityId, f64> = HashMap::new();
        let mut dist: HashMap<&EntityId, i64> = HashMap::new();

        sigma.insert(source, 1.0);
        dist.insert(source, 0);

        let mut queue: VecDeque<&EntityId> = VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            finish_order.push(v);
            let d_v = dist[v];
            let Some(successors) = graph.get(v) else {
                continue;
            };
            for w in successors {
                if !dist.contains_key(w) {
                    dist.insert(w, d_v + 1);
                    queue.push_back(w);
                }
                if dist[w] == d_v + 1 {
                    *sigma.entry(w).or_insert(0.0) += sigma[v];
                    predecessors.entry(w).or_default().push(v);
                }
            }
        }

        // Back-propagate dependencies in reverse finish order.
        let mut delta: HashMap<&EntityId, f64> = HashMap::new();
        for w in finish_order.iter().rev() {
            let coeff = (1.0 + delta.get(w).copied().unwrap_or(0.0)) / sigma[w];
            if let Some(preds) = predecessors.get(w) {
                for v in preds {
                    *delta.entry(v).or_insert(0.0) += sigma[v] * coeff;
                }
            }
            if *w != source {
                *centrality.get_mut(*w).expect("node present") +=
                    delta.get(w).copied().unwrap_or(0.0);
            }
        }
    }

    let scale = 2.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
    for score in centrality.values_mut() {
        *score = (*score * scale).clamp(0.0, 1.0);
    }
    centrality
}

/// Closeness centrality, reachability-weighted variant.
///
/// Score = (count of nodes reachable from `v`) / (sum of BFS distances to
/// them), and 0 when nothing is reachable. This deliberately differs from
/// the textbook `(n-1)/distance_sum` and harmonic formulas: downstream
/// importance scores are calibrated against this exact scale, so it is
/// preserved as-is.
pub fn closeness_centrality(graph: &Adjacency) -> BTreeMap<EntityId, f64> {
    let nodes = node_set(graph);
    let mut out = BTreeMap::new();

    for source in &nodes {
        let mut dist: HashMap<&EntityId, u64> = HashMap::new();
        dist.insert(source, 0);
        let mut queue: VecDeque<&EntityId> = VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            let d_v = dist[v];
            let Some(successors) = graph.get(v) else {
                continue;
            };
            for w in successors {
                if !dist.contains_key(w) {
                    dist.insert(w, d_v + 1);
                    queue.push_back(w);
                }
            }
        }

        let reachable = dist.len() as f64 - 1.0;
        let total: u64 = dist.values().sum();
        let score = if reachable > 0.0 && total > 0 {
            reachable / total as f64
        } else {
            0.0
        };
        out.insert(source.clone(), score);
    }
    out
}

/// Tuning parameters for eigenvector power iteration.
#[derive(Debug, Clone)]
pub struct EigenvectorConfig {
    /// Stop once the L1 delta between iterations falls below this.
    pub tolerance: f64,
    /// Hard cap on iterations.
    pub max_iterations: usize,
}

impl Default for EigenvectorConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

/// Eigenvector centrality via power iteration over the undirected projection.
///
/// Seeded uniformly at `1/sqrt(n)` and L2-renormalized each iteration; each
/// component of a unit vector lies in [0, 1].
pub fn eigenvector_centrality(
    graph: &Adjacency,
    config: &EigenvectorConfig,
) -> BTreeMap<EntityId, f64> {
    let sym = undirected(graph);
    let n = sym.len();
    if n == 0 {
        return BTreeMap::new();
    }

    let seed = 1.0 / (n as f64).sqrt();
    let mut scores: BTreeMap<EntityId, f64> = sym.keys().map(|id| (id.clone(), seed)).collect();

    for iteration in 0..config.max_iterations {
        let mut next: BTreeMap<EntityId, f64> = sym.keys().map(|id| (id.clone(), 0.0)).collect();
        for (node, neighbors) in &sym {
            let contribution = scores[node];
            for neighbor in neighbors {
                *next.get_mut(neighbor).expect("neighbor in projection") += contribution;
            }
        }

        let norm: f64 = next.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in next.values_mut() {
                *v /= norm;
            }
        }

        let delta: f64 = sym.keys().map(|id| (next[id] - scores[id]).abs()).sum();
        scores = next;
        if delta < config.tolerance {
            tracing::debug!(iteration, delta, "eigenvector centrality converged");
            break;
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{eid, graph_of};
    use super::*;

    #[test]
    fn betweenness_middle_of_chain_is_highest() {
        let g = graph_of(&[("a", "b"), ("b", "c")]);
        let scores = betweenness_centrality(&g);
        assert!(scores[&eid("b")] > scores[&eid("a")]);
        assert!(scores[&eid("b")] > scores[&eid("c")]);
        assert_eq!(scores[&eid("a")], 0.0);
    }

    #[test]
    fn betweenness_isolated_node_is_zero() {
        let mut g = graph_of(&[("a", "b"), ("b", "c")]);
        g.entry(eid("lonely")).or_default();
        let scores = betweenness_centrality(&g);
        assert_eq!(scores[&eid("lonely")], 0.0);
    }

    #[test]
    fn betweenness_stays_in_unit_interval() {
        let g = graph_of(&[
            ("a", "b"),
            ("b", "a"),
            ("b", "c"),
            ("c", "b"),
            ("c", "d"),
            ("d", "c"),
        ]);
        for (_, score) in betweenness_centrality(&g) {
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn betweenness_two_node_graph_is_all_zero() {
        let g = graph_of(&[("a", "b")]);
        let scores = betweenness_centrality(&g);
        assert!(scores.values().all(|&s| s == 0.0));
    }

    #[test]
    fn closeness_chain_head_sees_decaying_scores() {
        // a reaches b (1) and c (2): 2/3. b reaches c: 1/1. c reaches nothing: 0.
        let g = graph_of(&[("a", "b"), ("b", "c")]);
        let scores = closeness_centrality(&g);
        assert!((scores[&eid("a")] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(scores[&eid("b")], 1.0);
        assert_eq!(scores[&eid("c")], 0.0);
    }

    #[test]
    fn eigenvector_hub_scores_highest() {
        let g = graph_of(&[("b", "a"), ("c", "a"), ("d", "a"), ("e", "a")]);
        let scores = eigenvector_centrality(&g, &EigenvectorConfig::default());
        for node in ["b", "c", "d", "e"] {
            assert!(scores[&eid("a")] > scores[&eid(node)]);
        }
    }

    #[test]
    fn eigenvector_empty_graph_is_empty() {
        let scores = eigenvector_centrality(&Adjacency::new(), &EigenvectorConfig::default());
        assert!(scores.is_empty());
    }

    #[test]
    fn eigenvector_cycle_converges_to_finite_scores() {
        let g = graph_of(&[("a", "b"), ("b", "c"), ("c", "a")]);
        let scores = eigenvector_centrality(&g, &EigenvectorConfig::default());
        for (_, score) in scores {
            assert!(score.is_finite());
            assert!((0.0..=1.0).contains(&score));
        }
    }
}
