//! Org-graph importance: ownership concentration, expertise, review coverage.

use std::collections::{BTreeMap, HashMap};

use crate::entity::EntityId;

use super::OrgImportanceMetrics;

/// Authorship signal for one entity: (author, authorship weight) pairs from
/// `authored_by` edges.
pub type AuthorshipWeights = Vec<(EntityId, f64)>;

/// Tuning for org importance.
#[derive(Debug, Clone)]
pub struct OrgImportanceConfig {
    /// Review count at which coverage saturates.
    pub review_cap: usize,
    /// Expertise assumed for authors with no recorded score.
    pub default_expertise: f64,
}

impl Default for OrgImportanceConfig {
    fn default() -> Self {
        Self {
            review_cap: 5,
            default_expertise: 0.5,
        }
    }
}

/// Compute org importance for every entity with authorship or review signal.
///
/// Ownership concentration is the top author's share of total authorship
/// weight: a single owner scores 1.0, N even owners score ≈ 1/N. Expertise
/// depth is the authorship-weighted mean of per-author expertise.
pub fn compute_org_importance(
    authorship: &HashMap<EntityId, AuthorshipWeights>,
    review_counts: &HashMap<EntityId, usize>,
    expertise: &HashMap<EntityId, f64>,
    config: &OrgImportanceConfig,
) -> BTreeMap<EntityId, OrgImportanceMetrics> {
    let mut entities: BTreeMap<&EntityId, ()> = BTreeMap::new();
    for id in authorship.keys() {
        entities.insert(id, ());
    }
    for id in review_counts.keys() {
        entities.insert(id, ());
    }

    let mut out = BTreeMap::new();
    for (id, ()) in entities {
        let weights = authorship.get(id).map(Vec::as_slice).unwrap_or(&[]);
        let total: f64 = weights.iter().map(|(_, w)| w.max(0.0)).sum();

        let (ownership_concentration, expertise_depth) = if total > 0.0 {
            let top = weights
                .iter()
                .map(|(_, w)| w.max(0.0))
                .fold(0.0_f64, f64::max);
            let weighted_expertise: f64 = weights
                .iter()
                .map(|(author, w)| {
                    let score = expertise
                        .get(author)
                        .copied()
                        .unwrap_or(config.default_expertise);
                    w.max(0.0) * score.clamp(0.0, 1.0)
                })
                .sum();
            (top / total, weighted_expertise / total)
        } else {
            // No authorship signal at all: neutral.
            (0.5, 0.5)
        };

        let reviews = review_counts.get(id).copied().unwrap_or(0);
        let review_coverage = (reviews as f64 / config.review_cap.max(1) as f64).min(1.0);

        let combined = (0.4 * ownership_concentration
            + 0.4 * expertise_depth
            + 0.2 * review_coverage)
            .clamp(0.0, 1.0);

        out.insert(id.clone(), OrgImportanceMetrics {
            ownership_concentration,
            expertise_depth,
            review_coverage,
            combined,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn single_owner_concentration_is_one() {
        let mut authorship = HashMap::new();
        authorship.insert(eid("file"), vec![(eid("alice"), 1.0)]);
        let metrics = compute_org_importance(
            &authorship,
            &HashMap::new(),
            &HashMap::new(),
            &Default::default(),
        );
        assert_eq!(metrics[&eid("file")].ownership_concentration, 1.0);
    }

    #[test]
    fn three_even_owners_stay_under_half() {
        let mut authorship = HashMap::new();
        authorship.insert(eid("file"), vec![
            (eid("alice"), 0.33),
            (eid("bo"), 0.33),
            (eid("chris"), 0.34),
        ]);
        let metrics = compute_org_importance(
            &authorship,
            &HashMap::new(),
            &HashMap::new(),
            &Default::default(),
        );
        assert!(metrics[&eid("file")].ownership_concentration < 0.5);
    }

    #[test]
    fn expertise_is_authorship_weighted() {
        let mut authorship = HashMap::new();
        authorship.insert(eid("file"), vec![(eid("expert"), 0.8), (eid("new"), 0.2)]);
        let mut expertise = HashMap::new();
        expertise.insert(eid("expert"), 1.0);
        expertise.insert(eid("new"), 0.0);
        let metrics = compute_org_importance(
            &authorship,
            &HashMap::new(),
            &expertise,
            &Default::default(),
        );
        assert!((metrics[&eid("file")].expertise_depth - 0.8).abs() < 1e-9);
    }

    #[test]
    fn unscored_authors_default_to_half() {
        let mut authorship = HashMap::new();
        authorship.insert(eid("file"), vec![(eid("mystery"), 1.0)]);
        let metrics = compute_org_importance(
            &authorship,
            &HashMap::new(),
            &HashMap::new(),
            &Default::default(),
        );
        assert_eq!(metrics[&eid("file")].expertise_depth, 0.5);
    }

    #[test]
    fn review_coverage_caps_at_one() {
        let mut reviews = HashMap::new();
        reviews.insert(eid("busy"), 12);
        reviews.insert(eid("quiet"), 2);
        let metrics = compute_org_importance(
            &HashMap::new(),
            &reviews,
            &HashMap::new(),
            &Default::default(),
        );
        assert_eq!(metrics[&eid("busy")].review_coverage, 1.0);
        assert!((metrics[&eid("quiet")].review_coverage - 0.4).abs() < 1e-9);
    }
}
