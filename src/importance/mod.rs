//! Per-graph importance metrics and the unified importance profile.
//!
//! Four independent computers ([`code`], [`rationale`], [`epistemic`],
//! [`org`]) each turn domain-specific edge lists and metadata into a small
//! metric vector with a combined score. [`unified`] aggregates the four
//! combined scores plus a cross-graph influence term into one scalar and a
//! set of boolean risk/significance flags.
//!
//! Every field of every metric vector lies in [0, 1]. Entities with no
//! signal in a graph get that graph's documented neutral vector (`Default`
//! impls below); recomputation replaces profiles wholesale, never mutates.

pub mod code;
pub mod epistemic;
pub mod org;
pub mod rationale;
pub mod unified;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};

/// Code-graph importance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeImportanceMetrics {
    /// Normalized PageRank within the code graph.
    pub page_rank: f64,
    /// Normalized betweenness centrality.
    pub centrality: f64,
    /// Churn × complexity hotspot score.
    pub hotspot_score: f64,
    /// Blended code importance.
    pub combined: f64,
}

impl Default for CodeImportanceMetrics {
    /// Neutral vector for entities absent from the code graph.
    fn default() -> Self {
        Self {
            page_rank: 0.5,
            centrality: 0.5,
            hotspot_score: 0.5,
            combined: 0.5,
        }
    }
}

/// Rationale-graph importance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleImportanceMetrics {
    /// How much other decisions depend on this one via supports edges.
    pub foundationality: f64,
    /// Lifecycle activity: accepted/proposed decisions are active (1.0),
    /// superseded/deprecated are not (0.0).
    pub activity_score: f64,
    /// Tradeoff involvement, count-capped.
    pub tradeoff_centrality: f64,
    /// Constraint involvement, count-capped.
    pub constraint_load: f64,
    /// Blended rationale importance.
    pub combined: f64,
}

impl Default for RationaleImportanceMetrics {
    /// Neutral vector: no dependents, assumed active, no tradeoffs/constraints.
    fn default() -> Self {
        Self {
            foundationality: 0.0,
            activity_score: 1.0,
            tradeoff_centrality: 0.0,
            constraint_load: 0.0,
            combined: 0.5,
        }
    }
}

/// Epistemic-graph importance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpistemicImportanceMetrics {
    /// How many other claims depend on this one (normalized out-degree of
    /// supports edges).
    pub epistemic_load: f64,
    /// Normalized length of the longest incoming support chain.
    pub evidence_depth: f64,
    /// Severity- and status-weighted defeater exposure.
    pub defeater_vulnerability: f64,
    /// Blended epistemic importance.
    pub combined: f64,
}

impl Default for EpistemicImportanceMetrics {
    fn default() -> Self {
        Self {
            epistemic_load: 0.0,
            evidence_depth: 0.0,
            defeater_vulnerability: 0.0,
            combined: 0.5,
        }
    }
}

/// Org-graph importance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgImportanceMetrics {
    /// Share held by the top-weighted author (1.0 = single owner).
    pub ownership_concentration: f64,
    /// Authorship-weighted average of per-author expertise.
    pub expertise_depth: f64,
    /// Review count, capped.
    pub review_coverage: f64,
    /// Blended org importance.
    pub combined: f64,
}

impl Default for OrgImportanceMetrics {
    fn default() -> Self {
        Self {
            ownership_concentration: 0.5,
            expertise_depth: 0.5,
            review_coverage: 0.5,
            combined: 0.5,
        }
    }
}

/// Boolean risk/significance flags derived from the raw sub-scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceFlags {
    /// High unified importance.
    pub is_load_bearing: bool,
    /// Many decisions rest on this one.
    pub is_foundational: bool,
    /// Important but low-confidence.
    pub is_at_risk: bool,
    /// Significant defeater exposure.
    pub needs_validation: bool,
    /// Ownership concentrated in too few people.
    pub has_truck_factor_risk: bool,
    /// High churn × complexity.
    pub is_hotspot: bool,
}

/// The complete importance profile for one entity.
///
/// Created fresh on every computation pass; a recomputation replaces the
/// profile wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceProfile {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    pub code_importance: CodeImportanceMetrics,
    pub rationale_importance: RationaleImportanceMetrics,
    pub epistemic_importance: EpistemicImportanceMetrics,
    pub org_importance: OrgImportanceMetrics,
    /// Weighted aggregate over the four graphs plus cross-graph influence,
    /// in [0, 1].
    pub unified: f64,
    /// Damped importance flowing in over cross-graph edges.
    pub cross_graph_influence: f64,
    pub flags: ImportanceFlags,
    pub computed_at: DateTime<Utc>,
}
