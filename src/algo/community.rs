//! Louvain-style community detection.
//!
//! Greedy modularity optimization over the undirected projection:
//!
//! 1. **Local moving** — visit nodes in a fixed order, reassigning each to
//!    the neighboring community with the best modularity gain
//!    `ΔQ = w_to_community − (k_v · Σ_community) / (2m)`; the current
//!    community wins ties unless another's gain exceeds it by epsilon.
//! 2. **Refinement** — split any community whose induced subgraph is
//!    disconnected into its connected components.
//! 3. **Aggregation** — collapse communities into super-nodes and recurse.
//!
//! Terminates when no node moves, the aggregated graph stops shrinking, or
//! the level cap is hit. Final community IDs are compacted to a dense
//! `0..k` range in order of first appearance over the sorted node order.

use std::collections::{BTreeMap, VecDeque};

use crate::entity::EntityId;

use super::{Adjacency, node_set};

/// Tuning parameters for community detection.
#[derive(Debug, Clone)]
pub struct CommunityConfig {
    /// A move must beat staying put by at least this much.
    pub epsilon: f64,
    /// Maximum aggregation levels.
    pub max_levels: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-9,
            max_levels: 10,
        }
    }
}

/// Community assignment for every node of the input graph.
#[derive(Debug, Clone)]
pub struct Communities {
    /// Node → community ID, dense in `0..count`.
    pub assignments: BTreeMap<EntityId, usize>,
    /// Number of distinct communities.
    pub count: usize,
}

impl Communities {
    /// Members of each community, indexed by community ID.
    pub fn members(&self) -> Vec<Vec<EntityId>> {
        let mut out = vec![Vec::new(); self.count];
        for (id, &community) in &self.assignments {
            out[community].push(id.clone());
        }
        out
    }
}

/// Detect communities in a directed graph (treated as undirected, unit weights).
pub fn detect_communities(graph: &Adjacency, config: &CommunityConfig) -> Communities {
    let nodes: Vec<EntityId> = node_set(graph).into_iter().collect();
    let n = nodes.len();
    if n == 0 {
        return Communities {
            assignments: BTreeMap::new(),
            count: 0,
        };
    }

    let index: BTreeMap<&EntityId, usize> = nodes.iter().zip(0..).collect();

    // Undirected weighted adjacency over node indices.
    let mut adj: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    for (from, targets) in graph {
        for to in targets {
            let (i, j) = (index[from], index[to]);
            *adj[i].entry(j).or_insert(0.0) += 1.0;
            if i != j {
                *adj[j].entry(i).or_insert(0.0) += 1.0;
            }
        }
    }

    // Original node index → community at the current level.
    let mut node_comm: Vec<usize> = (0..n).collect();

    for _level in 0..config.max_levels {
        let assignment = local_moving(&adj, config.epsilon);
        let refined = refine_disconnected(&adj, &assignment);
        let (compacted, count) = compact(&refined);

        if count == adj.len() {
            // Nothing merged at this level.
            break;
        }

        for community in node_comm.iter_mut() {
            *community = compacted[*community];
        }
        adj = aggregate(&adj, &compacted, count);
    }

    // Compact once more over the sorted original node order.
    let (final_ids, count) = compact(&node_comm);
    let assignments = nodes
        .into_iter()
        .zip(final_ids)
        .collect::<BTreeMap<EntityId, usize>>();
    Communities { assignments, count }
}

/// Greedy local-moving phase. Returns a community per node.
fn local_moving(adj: &[BTreeMap<usize, f64>], epsilon: f64) -> Vec<usize> {
    let n = adj.len();
    let degree: Vec<f64> = adj.iter().map(|row| row.values().sum()).collect();
    let two_m: f64 = degree.iter().sum();

    let mut comm: Vec<usize> = (0..n).collect();
    let mut comm_degree = degree.clone();

    loop {
        let mut moved = false;
        for v in 0..n {
            let current = comm[v];

            // Edge weight from v into each neighboring community (self-loops excluded).
            let mut weight_to: BTreeMap<usize, f64> = BTreeMap::new();
            for (&u, &w) in &adj[v] {
                if u != v {
                    *weight_to.entry(comm[u]).or_insert(0.0) += w;
                }
            }

            // Evaluate gains with v removed from its community.
            comm_degree[current] -= degree[v];
            let gain_of = |community: usize, weight: f64| {
                if two_m > 0.0 {
                    weight - degree[v] * comm_degree[community] / two_m
                } else {
                    weight
                }
            };

            let stay = gain_of(current, weight_to.get(&current).copied().unwrap_or(0.0));
            let mut best = (current, stay);
            for (&candidate, &weight) in &weight_to {
                if candidate == current {
                    continue;
                }
                let gain = gain_of(candidate, weight);
                if gain > best.1 + epsilon {
                    best = (candidate, gain);
                }
            }

            comm[v] = best.0;
            comm_degree[best.0] += degree[v];
            if best.0 != current {
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    comm
}

/// Split communities whose induced subgraphs are disconnected.
fn refine_disconnected(adj: &[BTreeMap<usize, f64>], comm: &[usize]) -> Vec<usize> {
    let n = adj.len();
    let mut refined = vec![usize::MAX; n];
    let mut next_id = 0;

    for v in 0..n {
        if refined[v] != usize::MAX {
            continue;
        }
        // BFS within v's community.
        let id = next_id;
        next_id += 1;
        refined[v] = id;
        let mut queue = VecDeque::from([v]);
        while let Some(u) = queue.pop_front() {
            for (&w, _) in &adj[u] {
                if comm[w] == comm[v] && refined[w] == usize::MAX {
                    refined[w] = id;
                    queue.push_back(w);
                }
            }
        }
    }
    refined
}

/// Renumber community IDs densely in order of first appearance.
fn compact(comm: &[usize]) -> (Vec<usize>, usize) {
    let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
    let mut next = 0;
    let out = comm
        .iter()
        .map(|&c| {
            *remap.entry(c).or_insert_with(|| {
                let id = next;
                next += 1;
                id
            })
        })
        .collect();
    (out, next)
}

/// Collapse each community into a super-node, summing edge weights.
fn aggregate(
    adj: &[BTreeMap<usize, f64>],
    comm: &[usize],
    count: usize,
) -> Vec<BTreeMap<usize, f64>> {
    let mut out: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];
    for (v, row) in adj.iter().enumerate() {
        for (&u, &w) in row {
            // Each undirected edge is stored in both rows; halve the double
            // count by only taking the v <= u copy.
            if v <= u {
                let (a, b) = (comm[v], comm[u]);
                *out[a].entry(b).or_insert(0.0) += w;
                if a != b {
                    *out[b].entry(a).or_insert(0.0) += w;
                }
            }
        }
    }
    out
}
