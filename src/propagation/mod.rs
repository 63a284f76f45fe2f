//! Cross-graph edges: construction from generic store edges, typed damping.
//!
//! A [`CrossGraphEdge`] links entities in two *different* conceptual graphs
//! (the constructor enforces the invariant). Generic edges whose endpoints
//! resolve to the same graph, or whose endpoints are missing from the
//! supplied [`GraphTypeMap`], are skipped rather than raised.

pub mod engine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

use crate::edge::{KnowledgeEdgeType, KnowledgeGraphEdge};
use crate::entity::{EdgeId, EntityId, GraphType, GraphTypeMap};

/// Typed relationship between entities of two different graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossGraphEdgeType {
    DocumentedByDecision,
    ConstrainedByDecision,
    JustifiedByClaim,
    AssumesClaim,
    VerifiedByTest,
    EvidencedByCode,
    OwnedByExpert,
    DecidedBy,
}

impl CrossGraphEdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossGraphEdgeType::DocumentedByDecision => "documented_by_decision",
            CrossGraphEdgeType::ConstrainedByDecision => "constrained_by_decision",
            CrossGraphEdgeType::JustifiedByClaim => "justified_by_claim",
            CrossGraphEdgeType::AssumesClaim => "assumes_claim",
            CrossGraphEdgeType::VerifiedByTest => "verified_by_test",
            CrossGraphEdgeType::EvidencedByCode => "evidenced_by_code",
            CrossGraphEdgeType::OwnedByExpert => "owned_by_expert",
            CrossGraphEdgeType::DecidedBy => "decided_by",
        }
    }
}

impl std::fmt::Display for CrossGraphEdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A derived, typed edge between two graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossGraphEdge {
    pub id: EdgeId,
    pub source_graph: GraphType,
    pub target_graph: GraphType,
    pub source_entity_id: EntityId,
    pub target_entity_id: EntityId,
    pub edge_type: CrossGraphEdgeType,
    pub weight: f64,
    pub confidence: f64,
    pub computed_at: DateTime<Utc>,
}

/// Per-edge-type damping factors: how strongly importance attenuates per
/// hop across each kind of cross-graph edge. Empirically chosen policy
/// constants, tunable configuration rather than derived laws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DampingFactors {
    pub documented_by_decision: f64,
    pub constrained_by_decision: f64,
    pub justified_by_claim: f64,
    pub assumes_claim: f64,
    pub verified_by_test: f64,
    pub evidenced_by_code: f64,
    pub owned_by_expert: f64,
    pub decided_by: f64,
}

impl Default for DampingFactors {
    fn default() -> Self {
        Self {
            documented_by_decision: 0.7,
            constrained_by_decision: 0.8,
            justified_by_claim: 0.75,
            assumes_claim: 0.6,
            verified_by_test: 0.5,
            evidenced_by_code: 0.65,
            owned_by_expert: 0.4,
            decided_by: 0.55,
        }
    }
}

impl DampingFactors {
    /// Damping factor for an edge type. The match is exhaustive over the
    /// closed enum; a new variant is a compile error here, never a silent
    /// missing factor.
    pub fn factor(&self, edge_type: CrossGraphEdgeType) -> f64 {
        match edge_type {
            CrossGraphEdgeType::DocumentedByDecision => self.documented_by_decision,
            CrossGraphEdgeType::ConstrainedByDecision => self.constrained_by_decision,
            CrossGraphEdgeType::JustifiedByClaim => self.justified_by_claim,
            CrossGraphEdgeType::AssumesClaim => self.assumes_claim,
            CrossGraphEdgeType::VerifiedByTest => self.verified_by_test,
            CrossGraphEdgeType::EvidencedByCode => self.evidenced_by_code,
            CrossGraphEdgeType::OwnedByExpert => self.owned_by_expert,
            CrossGraphEdgeType::DecidedBy => self.decided_by,
        }
    }
}

/// Configuration for the propagation engine.
#[derive(Debug, Clone)]
pub struct PropagationConfig {
    pub damping: DampingFactors,
    /// Scale for reverse (outgoing) contributions: importance flows
    /// upstream more weakly than downstream.
    pub forward_weight: f64,
    /// Sources below this importance contribute nothing.
    pub min_importance_threshold: f64,
    /// Hard cap on influence-chain depth.
    pub max_propagation_depth: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            damping: DampingFactors::default(),
            forward_weight: 0.3,
            min_importance_threshold: 0.1,
            max_propagation_depth: 5,
        }
    }
}

/// Map (source graph, target graph, generic edge type) to a cross-graph
/// edge type. Unmapped combinations return `None` unless the org graph is
/// involved: anything pointing at org is ownership, anything leaving org
/// is a decision-maker link.
pub fn classify_cross_edge(
    source_graph: GraphType,
    target_graph: GraphType,
    edge_type: KnowledgeEdgeType,
) -> Option<CrossGraphEdgeType> {
    use GraphType::*;
    use KnowledgeEdgeType::*;

    match (source_graph, target_graph, edge_type) {
        (Code, Rationale, Documents) => Some(CrossGraphEdgeType::DocumentedByDecision),
        (Code, Rationale, DependsOn) => Some(CrossGraphEdgeType::ConstrainedByDecision),
        (Rationale, Epistemic, DependsOn | Documents) => Some(CrossGraphEdgeType::JustifiedByClaim),
        (Code, Epistemic, DependsOn) => Some(CrossGraphEdgeType::AssumesClaim),
        (Epistemic, Code, Tests) => Some(CrossGraphEdgeType::VerifiedByTest),
        (Epistemic, Code, Documents) => Some(CrossGraphEdgeType::EvidencedByCode),
        (Org, Rationale, ReviewedBy) => Some(CrossGraphEdgeType::DecidedBy),
        (_, Org, _) => Some(CrossGraphEdgeType::OwnedByExpert),
        (Org, _, _) => Some(CrossGraphEdgeType::DecidedBy),
        _ => None,
    }
}

/// Derive cross-graph edges from generic store edges.
///
/// Edges with an endpoint missing from `graph_types`, or with both
/// endpoints in the same graph, are skipped.
pub fn build_cross_graph_edges(
    edges: &[KnowledgeGraphEdge],
    graph_types: &GraphTypeMap,
) -> Vec<CrossGraphEdge> {
    let mut out = Vec::new();
    for edge in edges {
        let (Some(&source_graph), Some(&target_graph)) = (
            graph_types.get(&edge.source_id),
            graph_types.get(&edge.target_id),
        ) else {
            continue;
        };
        if source_graph == target_graph {
            continue;
        }
        let Some(edge_type) = classify_cross_edge(source_graph, target_graph, edge.edge_type)
        else {
            continue;
        };
        out.push(CrossGraphEdge {
            id: EdgeId::derived(&edge.source_id, &edge.target_id, edge_type.as_str()),
            source_graph,
            target_graph,
            source_entity_id: edge.source_id.clone(),
            target_entity_id: edge.target_id.clone(),
            edge_type,
            weight: edge.weight,
            confidence: edge.confidence,
            computed_at: edge.computed_at,
        });
    }
    out
}

/// Cross-graph influence for one entity, fed into the unified combiner: the sum
/// over all cross-graph edges touching the entity of the *other* endpoint's
/// combined importance, damped by edge type. Entities with no cross-graph
/// edges have influence 0.
pub fn cross_graph_influence(
    entity: &EntityId,
    edges: &[CrossGraphEdge],
    combined: &HashMap<EntityId, f64>,
    damping: &DampingFactors,
) -> f64 {
    let mut influence = 0.0;
    for edge in edges {
        let other = if edge.source_entity_id == *entity {
            &edge.target_entity_id
        } else if edge.target_entity_id == *entity {
            &edge.source_entity_id
        } else {
            continue;
        };
        // Unscored endpoints count as neutral.
        let other_importance = combined.get(other).copied().unwrap_or(0.5);
        influence += other_importance * damping.factor(edge.edge_type);
    }
    influence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn generic_edge(src: &str, dst: &str, et: KnowledgeEdgeType) -> KnowledgeGraphEdge {
        KnowledgeGraphEdge::new(
            eid(src),
            eid(dst),
            EntityType::Function,
            EntityType::Decision,
            et,
        )
    }

    fn type_map(pairs: &[(&str, GraphType)]) -> GraphTypeMap {
        pairs.iter().map(|(id, g)| (eid(id), *g)).collect()
    }

    #[test]
    fn same_graph_edges_are_skipped() {
        let edges = vec![generic_edge("f", "g", KnowledgeEdgeType::Calls)];
        let types = type_map(&[("f", GraphType::Code), ("g", GraphType::Code)]);
        assert!(build_cross_graph_edges(&edges, &types).is_empty());
    }

    #[test]
    fn unknown_endpoint_is_skipped() {
        let edges = vec![generic_edge("f", "d", KnowledgeEdgeType::Documents)];
        let types = type_map(&[("f", GraphType::Code)]);
        assert!(build_cross_graph_edges(&edges, &types).is_empty());
    }

    #[test]
    fn documents_into_rationale_becomes_documented_by_decision() {
        let edges = vec![generic_edge("f", "d", KnowledgeEdgeType::Documents)];
        let types = type_map(&[("f", GraphType::Code), ("d", GraphType::Rationale)]);
        let cross = build_cross_graph_edges(&edges, &types);
        assert_eq!(cross.len(), 1);
        assert_eq!(cross[0].edge_type, CrossGraphEdgeType::DocumentedByDecision);
        assert_ne!(cross[0].source_graph, cross[0].target_graph);
    }

    #[test]
    fn anything_pointing_at_org_is_ownership() {
        let edges = vec![generic_edge("f", "alice", KnowledgeEdgeType::AuthoredBy)];
        let types = type_map(&[("f", GraphType::Code), ("alice", GraphType::Org)]);
        let cross = build_cross_graph_edges(&edges, &types);
        assert_eq!(cross[0].edge_type, CrossGraphEdgeType::OwnedByExpert);
    }

    #[test]
    fn unmapped_combination_is_skipped() {
        let edges = vec![generic_edge("claim", "decision", KnowledgeEdgeType::CloneOf)];
        let types = type_map(&[
            ("claim", GraphType::Epistemic),
            ("decision", GraphType::Rationale),
        ]);
        assert!(build_cross_graph_edges(&edges, &types).is_empty());
    }

    #[test]
    fn influence_of_untouched_entity_is_zero() {
        let influence = cross_graph_influence(
            &eid("isolated"),
            &[],
            &HashMap::new(),
            &DampingFactors::default(),
        );
        assert_eq!(influence, 0.0);
    }

    #[test]
    fn influence_is_damped_other_endpoint_importance() {
        let edges = vec![generic_edge("f", "d", KnowledgeEdgeType::Documents)];
        let types = type_map(&[("f", GraphType::Code), ("d", GraphType::Rationale)]);
        let cross = build_cross_graph_edges(&edges, &types);

        let mut combined = HashMap::new();
        combined.insert(eid("d"), 1.0);
        let damping = DampingFactors::default();
        let influence = cross_graph_influence(&eid("f"), &cross, &combined, &damping);
        assert!((influence - damping.documented_by_decision).abs() < 1e-9);
    }
}
