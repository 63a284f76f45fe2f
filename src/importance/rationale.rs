//! Rationale-graph importance: decision foundationality and lifecycle.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

use super::RationaleImportanceMetrics;

/// Lifecycle status of a design decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Proposed,
    Accepted,
    Superseded,
    Deprecated,
}

impl DecisionStatus {
    /// Activity score keyed by lifecycle: live decisions count fully,
    /// retired ones not at all.
    fn activity(self) -> f64 {
        match self {
            DecisionStatus::Accepted | DecisionStatus::Proposed => 1.0,
            DecisionStatus::Superseded | DecisionStatus::Deprecated => 0.0,
        }
    }
}

/// Metadata for one decision.
#[derive(Debug, Clone, Default)]
pub struct DecisionInfo {
    /// Lifecycle status; `None` means unknown and is assumed active.
    pub status: Option<DecisionStatus>,
    /// Tradeoffs this decision participates in.
    pub tradeoff_count: usize,
    /// Constraints this decision imposes.
    pub constraint_count: usize,
}

/// Tuning for rationale importance.
#[derive(Debug, Clone)]
pub struct RationaleImportanceConfig {
    /// Dependent count at which foundationality saturates.
    pub dependent_cap: usize,
    /// Tradeoff count at which centrality saturates.
    pub tradeoff_cap: usize,
    /// Constraint count at which load saturates.
    pub constraint_cap: usize,
}

impl Default for RationaleImportanceConfig {
    fn default() -> Self {
        Self {
            dependent_cap: 10,
            tradeoff_cap: 5,
            constraint_cap: 5,
        }
    }
}

/// Compute rationale importance for every known decision.
///
/// `supports` lists (supporter, supported) pairs: the supporter is
/// foundational to the supported decision, so each outgoing supports edge
/// adds a dependent. Decisions appear in the output if they occur in
/// `decisions` or touch a supports edge.
pub fn compute_rationale_importance(
    decisions: &HashMap<EntityId, DecisionInfo>,
    supports: &[(EntityId, EntityId)],
    config: &RationaleImportanceConfig,
) -> BTreeMap<EntityId, RationaleImportanceMetrics> {
    let mut dependents: BTreeMap<&EntityId, usize> = BTreeMap::new();
    for (supporter, supported) in supports {
        *dependents.entry(supporter).or_insert(0) += 1;
        dependents.entry(supported).or_insert(0);
    }
    for id in decisions.keys() {
        dependents.entry(id).or_insert(0);
    }

    let cap = |count: usize, cap: usize| (count as f64 / cap.max(1) as f64).min(1.0);

    let mut out = BTreeMap::new();
    for (id, dependent_count) in dependents {
        let info = decisions.get(id).cloned().unwrap_or_default();

        let foundationality = cap(dependent_count, config.dependent_cap);
        let activity_score = info.status.map_or(1.0, DecisionStatus::activity);
        let tradeoff_centrality = cap(info.tradeoff_count, config.tradeoff_cap);
        let constraint_load = cap(info.constraint_count, config.constraint_cap);

        let combined = (0.4 * foundationality
            + 0.3 * activity_score
            + 0.15 * tradeoff_centrality
            + 0.15 * constraint_load)
            .clamp(0.0, 1.0);

        out.insert(id.clone(), RationaleImportanceMetrics {
            foundationality,
            activity_score,
            tradeoff_centrality,
            constraint_load,
            combined,
        });
    }
    out
}
