//! Epistemic-graph importance: claim load, evidence depth, defeater exposure.
//!
//! A claim's importance grows with the claims resting on it (epistemic
//! load), the depth of its supporting evidence chain, and its exposure to
//! defeaters. Unresolved *blocking* contradictions between two claims
//! penalize both claims' combined score: contradicted knowledge cannot be
//! trusted as a foundation until resolved.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

use super::EpistemicImportanceMetrics;

/// Resolution status of a defeater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterStatus {
    Active,
    Pending,
    Resolved,
}

impl DefeaterStatus {
    /// Status weight: live defeaters count most, resolved ones barely.
    fn weight(self) -> f64 {
        match self {
            DefeaterStatus::Active => 1.0,
            DefeaterStatus::Pending => 0.7,
            DefeaterStatus::Resolved => 0.2,
        }
    }
}

/// A defeater attached to a claim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defeater {
    pub status: DefeaterStatus,
    /// Severity in [0, 1].
    pub severity: f64,
}

/// A contradiction between two claims.
#[derive(Debug, Clone, PartialEq)]
pub struct Contradiction {
    pub claim_a: EntityId,
    pub claim_b: EntityId,
    /// Blocking contradictions make both claims unusable until resolved.
    pub blocking: bool,
    pub resolved: bool,
}

/// Tuning for epistemic importance.
#[derive(Debug, Clone)]
pub struct EpistemicImportanceConfig {
    /// Supports out-degree at which load saturates.
    pub load_cap: usize,
    /// Support chain length at which depth saturates (also the traversal bound).
    pub chain_cap: usize,
    /// Combined-score penalty per unresolved blocking contradiction.
    pub contradiction_penalty: f64,
}

impl Default for EpistemicImportanceConfig {
    fn default() -> Self {
        Self {
            load_cap: 10,
            chain_cap: 10,
            contradiction_penalty: 0.2,
        }
    }
}

/// Compute epistemic importance for every claim touched by the inputs.
///
/// `supports` lists (supporter, supported) pairs among claims: load is the
/// supporter's normalized out-degree, evidence depth the longest incoming
/// chain at the supported end. Support cycles are legal: the depth-bounded
/// walk saturates them at `chain_cap`.
pub fn compute_epistemic_importance(
    supports: &[(EntityId, EntityId)],
    defeaters: &HashMap<EntityId, Vec<Defeater>>,
    contradictions: &[Contradiction],
    config: &EpistemicImportanceConfig,
) -> BTreeMap<EntityId, EpistemicImportanceMetrics> {
    // Forward (supporter → supported) degree and reverse (supported → supporters) index.
    let mut out_degree: BTreeMap<&EntityId, usize> = BTreeMap::new();
    let mut supporters_of: HashMap<&EntityId, Vec<&EntityId>> = HashMap::new();
    for (supporter, supported) in supports {
        *out_degree.entry(supporter).or_insert(0) += 1;
        out_degree.entry(supported).or_insert(0);
        supporters_of.entry(supported).or_default().push(supporter);
    }
    for id in defeaters.keys() {
        out_degree.entry(id).or_insert(0);
    }
    for c in contradictions {
        out_degree.entry(&c.claim_a).or_insert(0);
        out_degree.entry(&c.claim_b).or_insert(0);
    }

    // Unresolved blocking contradictions per claim.
    let mut blocking: HashMap<&EntityId, usize> = HashMap::new();
    for c in contradictions {
        if c.blocking && !c.resolved {
            *blocking.entry(&c.claim_a).or_insert(0) += 1;
            *blocking.entry(&c.claim_b).or_insert(0) += 1;
        }
    }

    let mut out = BTreeMap::new();
    for (id, degree) in &out_degree {
        let epistemic_load = (*degree as f64 / config.load_cap.max(1) as f64).min(1.0);

        let chain = longest_support_chain(id, &supporters_of, config.chain_cap);
        let evidence_depth = (chain as f64 / config.chain_cap.max(1) as f64).min(1.0);

        let defeater_vulnerability = defeaters
            .get(*id)
            .map(|ds| {
                ds.iter()
                    .map(|d| d.status.weight() * d.severity.clamp(0.0, 1.0))
                    .sum::<f64>()
            })
            .unwrap_or(0.0)
            .min(1.0);

        let penalty =
            blocking.get(*id).copied().unwrap_or(0) as f64 * config.contradiction_penalty;
        let combined = (0.5 * epistemic_load
            + 0.3 * evidence_depth
            + 0.2 * defeater_vulnerability
            - penalty)
            .clamp(0.0, 1.0);

        out.insert((*id).clone(), EpistemicImportanceMetrics {
            epistemic_load,
            evidence_depth,
            defeater_vulnerability,
            combined,
        });
    }
    out
}

/// Length of the longest incoming support chain, bounded by `cap` hops.
///
/// Bounded-horizon dynamic program memoized per (claim, budget) pair, so a
/// dense support lattice costs O(claims × cap) instead of one traversal per
/// path. Cycles walk out to the horizon and saturate at the cap.
fn longest_support_chain<'a>(
    claim: &'a EntityId,
    supporters_of: &HashMap<&'a EntityId, Vec<&'a EntityId>>,
    cap: usize,
) -> usize {
    fn walk<'a>(
        claim: &'a EntityId,
        supporters_of: &HashMap<&'a EntityId, Vec<&'a EntityId>>,
        memo: &mut HashMap<(&'a EntityId, usize), usize>,
        remaining: usize,
    ) -> usize {
        if remaining == 0 {
            return 0;
        }
        let Some(supporters) = supporters_of.get(claim) else {
            return 0;
        };
        if let Some(&cached) = memo.get(&(claim, remaining)) {
            return cached;
        }
        let deepest = supporters
            .iter()
            .map(|supporter| 1 + walk(supporter, supporters_of, memo, remaining - 1))
            .max()
            .unwrap_or(0);
        memo.insert((claim, remaining), deepest);
        deepest
    }

    walk(claim, supporters_of, &mut HashMap::new(), cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn load_is_normalized_out_degree() {
        let supports: Vec<(EntityId, EntityId)> = (0..5)
            .map(|i| (eid("axiom"), eid(&format!("c{i}"))))
            .collect();
        let metrics = compute_epistemic_importance(
            &supports,
            &HashMap::new(),
            &[],
            &Default::default(),
        );
        assert!((metrics[&eid("axiom")].epistemic_load - 0.5).abs() < 1e-9);
        assert_eq!(metrics[&eid("c0")].epistemic_load, 0.0);
    }

    #[test]
    fn evidence_depth_follows_longest_chain() {
        // a supports b supports c: c's chain is 2 hops deep.
        let supports = vec![(eid("a"), eid("b")), (eid("b"), eid("c"))];
        let metrics = compute_epistemic_importance(
            &supports,
            &HashMap::new(),
            &[],
            &Default::default(),
        );
        assert!((metrics[&eid("c")].evidence_depth - 0.2).abs() < 1e-9);
        assert!((metrics[&eid("b")].evidence_depth - 0.1).abs() < 1e-9);
        assert_eq!(metrics[&eid("a")].evidence_depth, 0.0);
    }

    #[test]
    fn dense_support_lattice_keeps_depth_exact() {
        // Every claim in layer i is supported by every claim in layer i + 1,
        // so the number of distinct support paths grows as width^layers.
        let width = 4;
        let layers = 12;
        let mut supports = Vec::new();
        for layer in 0..layers {
            for upper in 0..width {
                for lower in 0..width {
                    supports.push((
                        eid(&format!("l{}n{upper}", layer + 1)),
                        eid(&format!("l{layer}n{lower}")),
                    ));
                }
            }
        }
        let metrics = compute_epistemic_importance(
            &supports,
            &HashMap::new(),
            &[],
            &Default::default(),
        );
        // Twelve support layers above layer 0: depth saturates at the cap.
        assert!((metrics[&eid("l0n0")].evidence_depth - 1.0).abs() < 1e-9);
        // Eight layers above layer 4: 8 of the 10-hop cap.
        assert!((metrics[&eid("l4n0")].evidence_depth - 0.8).abs() < 1e-9);
        // The top layer has nothing above it.
        assert_eq!(metrics[&eid("l12n0")].evidence_depth, 0.0);
    }

    #[test]
    fn support_cycle_terminates() {
        let supports = vec![
            (eid("a"), eid("b")),
            (eid("b"), eid("c")),
            (eid("c"), eid("a")),
        ];
        let metrics = compute_epistemic_importance(
            &supports,
            &HashMap::new(),
            &[],
            &Default::default(),
        );
        for m in metrics.values() {
            assert!(m.evidence_depth.is_finite());
            assert!((0.0..=1.0).contains(&m.evidence_depth));
        }
    }

    #[test]
    fn active_defeaters_outweigh_resolved() {
        let mut defeaters = HashMap::new();
        defeaters.insert(eid("shaky"), vec![Defeater {
            status: DefeaterStatus::Active,
            severity: 0.8,
        }]);
        defeaters.insert(eid("patched"), vec![Defeater {
            status: DefeaterStatus::Resolved,
            severity: 0.8,
        }]);
        let metrics =
            compute_epistemic_importance(&[], &defeaters, &[], &Default::default());
        assert!(
            metrics[&eid("shaky")].defeater_vulnerability
                > metrics[&eid("patched")].defeater_vulnerability
        );
        assert!((metrics[&eid("shaky")].defeater_vulnerability - 0.8).abs() < 1e-9);
    }

    #[test]
    fn blocking_contradiction_penalizes_both_claims() {
        let supports = vec![(eid("a"), eid("x")), (eid("b"), eid("y"))];
        let contradictions = vec![Contradiction {
            claim_a: eid("a"),
            claim_b: eid("b"),
            blocking: true,
            resolved: false,
        }];
        let clean =
            compute_epistemic_importance(&supports, &HashMap::new(), &[], &Default::default());
        let contradicted = compute_epistemic_importance(
            &supports,
            &HashMap::new(),
            &contradictions,
            &Default::default(),
        );
        assert!(contradicted[&eid("a")].combined < clean[&eid("a")].combined);
        assert!(contradicted[&eid("b")].combined < clean[&eid("b")].combined);
    }

    #[test]
    fn resolved_or_nonblocking_contradiction_is_free() {
        let supports = vec![(eid("a"), eid("x"))];
        let contradictions = vec![Contradiction {
            claim_a: eid("a"),
            claim_b: eid("b"),
            blocking: false,
            resolved: false,
        }];
        let clean =
            compute_epistemic_importance(&supports, &HashMap::new(), &[], &Default::default());
        let flagged = compute_epistemic_importance(
            &supports,
            &HashMap::new(),
            &contradictions,
            &Default::default(),
        );
        assert_eq!(flagged[&eid("a")].combined, clean[&eid("a")].combined);
    }
}
