//! Importance propagation across cross-graph edges.
//!
//! For each entity, incoming cross-graph edges contribute damped importance
//! from their sources and outgoing edges contribute a weaker reverse term;
//! influence chains walk incoming edges backward with a visited set; and
//! epistemic risk scores claims whose load outruns their confidence.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityType};
use crate::error::ConfigError;
use crate::importance::EpistemicImportanceMetrics;

use super::{CrossGraphEdge, CrossGraphEdgeType, PropagationConfig};

/// Direction a contribution flowed relative to the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceDirection {
    Incoming,
    Outgoing,
}

/// One contribution to an entity's propagated importance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceSource {
    pub entity_id: EntityId,
    pub contribution: f64,
    pub direction: InfluenceDirection,
}

/// Result of propagating importance to a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationResult {
    pub entity_id: EntityId,
    pub original_importance: f64,
    /// Original plus all contributions, clamped to [0, 1].
    pub propagated_importance: f64,
    /// Contributions sorted by magnitude, largest first.
    pub influence_sources: Vec<InfluenceSource>,
}

/// One hop of an influence chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    /// The predecessor entity importance flowed from.
    pub entity_id: EntityId,
    pub edge_type: CrossGraphEdgeType,
    /// Damping applied at this hop.
    pub damping: f64,
}

/// A backward walk along incoming cross-graph edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceChain {
    pub target_entity_id: EntityId,
    /// Hops from the target backward; may be empty when the target has no
    /// predecessors.
    pub links: Vec<ChainLink>,
    /// Product of per-hop damping factors over the chain.
    pub total_propagation_factor: f64,
}

/// Severity bucket for an epistemic risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Medium,
    High,
    Critical,
}

/// A claim whose epistemic load outruns its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpistemicRisk {
    pub entity_id: EntityId,
    pub epistemic_load: f64,
    pub confidence: f64,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub suggested_action: String,
}

/// Thresholds for epistemic risk detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    /// Scores below this are not reported at all.
    pub min_risk: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            min_risk: 0.3,
            medium: 0.3,
            high: 0.5,
            critical: 0.7,
        }
    }
}

impl RiskThresholds {
    /// Check that the level thresholds ascend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.medium < self.high && self.high < self.critical {
            Ok(())
        } else {
            Err(ConfigError::RiskThresholdOrder {
                medium: self.medium,
                high: self.high,
                critical: self.critical,
            })
        }
    }

    fn level(&self, score: f64) -> RiskLevel {
        if score >= self.critical {
            RiskLevel::Critical
        } else if score >= self.high {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }
}

/// Propagate importance to one entity across its cross-graph edges.
///
/// Incoming contributions carry the source's importance damped by edge
/// type, weight, and confidence; outgoing (reverse) contributions are
/// additionally scaled by the global forward weight. Endpoints whose own
/// importance falls below `min_importance_threshold` are pruned entirely.
/// An entity with no cross-graph edges keeps its original importance and
/// reports no influence sources.
pub fn propagate_importance(
    entity: &EntityId,
    importances: &HashMap<EntityId, f64>,
    edges: &[CrossGraphEdge],
    config: &PropagationConfig,
) -> PropagationResult {
    let original = importances.get(entity).copied().unwrap_or(0.5);
    let mut sources: Vec<InfluenceSource> = Vec::new();

    for edge in edges {
        let damping = config.damping.factor(edge.edge_type);
        if edge.target_entity_id == *entity {
            let source_importance = importances
                .get(&edge.source_entity_id)
                .copied()
                .unwrap_or(0.0);
            if source_importance < config.min_importance_threshold {
                continue;
            }
            sources.push(InfluenceSource {
                entity_id: edge.source_entity_id.clone(),
                contribution: source_importance * damping * edge.weight * edge.confidence,
                direction: InfluenceDirection::Incoming,
            });
        } else if edge.source_entity_id == *entity {
            let target_importance = importances
                .get(&edge.target_entity_id)
                .copied()
                .unwrap_or(0.0);
            if target_importance < config.min_importance_threshold {
                continue;
            }
            sources.push(InfluenceSource {
                entity_id: edge.target_entity_id.clone(),
                contribution: target_importance
                    * damping
                    * edge.weight
                    * edge.confidence
                    * config.forward_weight,
                direction: InfluenceDirection::Outgoing,
            });
        }
    }

    sources.sort_by(|a, b| {
        b.contribution
            .partial_cmp(&a.contribution)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let total: f64 = sources.iter().map(|s| s.contribution).sum();
    PropagationResult {
        entity_id: entity.clone(),
        original_importance: original,
        propagated_importance: (original + total).clamp(0.0, 1.0),
        influence_sources: sources,
    }
}

/// Trace the chain of influence feeding a target entity.
///
/// Repeatedly follows the strongest (weight × confidence, ties by ID)
/// unvisited incoming edge backward, multiplying damping factors into the
/// total propagation factor. Stops at `max_propagation_depth`, or when no
/// unvisited predecessor remains; cycles terminate via the visited set.
pub fn trace_influence_chain(
    target: &EntityId,
    edges: &[CrossGraphEdge],
    config: &PropagationConfig,
) -> InfluenceChain {
    let mut links = Vec::new();
    let mut total_factor = 1.0;
    let mut visited: HashSet<EntityId> = HashSet::from([target.clone()]);
    let mut current = target.clone();

    for _ in 0..config.max_propagation_depth {
        let strongest = edges
            .iter()
            .filter(|e| e.target_entity_id == current && !visited.contains(&e.source_entity_id))
            .max_by(|a, b| {
                (a.weight * a.confidence)
                    .partial_cmp(&(b.weight * b.confidence))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.source_entity_id.cmp(&a.source_entity_id))
            });
        let Some(edge) = strongest else {
            break;
        };

        let damping = config.damping.factor(edge.edge_type);
        total_factor *= damping;
        links.push(ChainLink {
            entity_id: edge.source_entity_id.clone(),
            edge_type: edge.edge_type,
            damping,
        });
        visited.insert(edge.source_entity_id.clone());
        current = edge.source_entity_id.clone();
    }

    // A chain with no hops carries no propagation at all.
    if links.is_empty() {
        total_factor = 0.0;
    }

    InfluenceChain {
        target_entity_id: target.clone(),
        links,
        total_propagation_factor: total_factor,
    }
}

/// Detect claims at epistemic risk.
///
/// Restricted to entities typed `Claim` with a numeric confidence score;
/// claims without one are excluded instead of defaulted. The risk score
/// combines load, inverted confidence, and defeater vulnerability.
pub fn detect_epistemic_risks(
    metrics: &BTreeMap<EntityId, EpistemicImportanceMetrics>,
    confidence: &HashMap<EntityId, f64>,
    entity_types: &HashMap<EntityId, EntityType>,
    thresholds: &RiskThresholds,
) -> Vec<EpistemicRisk> {
    let mut risks = Vec::new();
    for (id, m) in metrics {
        if entity_types.get(id) != Some(&EntityType::Claim) {
            continue;
        }
        let Some(&confidence) = confidence.get(id) else {
            continue;
        };

        let risk_score = (0.4 * m.epistemic_load
            + 0.4 * (1.0 - confidence)
            + 0.2 * m.defeater_vulnerability)
            .clamp(0.0, 1.0);
        if risk_score < thresholds.min_risk {
            continue;
        }

        let risk_level = thresholds.level(risk_score);
        let suggested_action = suggest_action(id, risk_level, confidence);
        risks.push(EpistemicRisk {
            entity_id: id.clone(),
            epistemic_load: m.epistemic_load,
            confidence,
            risk_score,
            risk_level,
            suggested_action,
        });
    }

    risks.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    risks
}

fn suggest_action(id: &EntityId, level: RiskLevel, confidence: f64) -> String {
    match level {
        RiskLevel::Critical if confidence < 0.3 => format!(
            "URGENT: claim \"{id}\" carries heavy epistemic load with near-zero confidence; \
             gather evidence or retract dependents now"
        ),
        RiskLevel::Critical => {
            format!("URGENT: validate claim \"{id}\" before building further on it")
        }
        RiskLevel::High => format!(
            "claim \"{id}\" needs corroborating evidence; schedule validation soon"
        ),
        RiskLevel::Medium => format!(
            "consider strengthening the evidence behind claim \"{id}\""
        ),
    }
}

/// Aggregate counters from a batch propagation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPropagationSummary {
    pub results: Vec<PropagationResult>,
    pub risks: Vec<EpistemicRisk>,
    /// Entities that received any nonzero influence.
    pub influenced_count: usize,
    pub critical_risk_count: usize,
    pub high_risk_count: usize,
    /// Mean (propagated − original) over all entities.
    pub average_importance_delta: f64,
}

/// Run propagation plus risk detection over the whole entity set.
///
/// Entities are processed in ID order; each only reads already-computed
/// importances, so the pass is deterministic.
pub fn propagate_importance_batch(
    importances: &BTreeMap<EntityId, f64>,
    epistemic_metrics: &BTreeMap<EntityId, EpistemicImportanceMetrics>,
    confidence: &HashMap<EntityId, f64>,
    entity_types: &HashMap<EntityId, EntityType>,
    edges: &[CrossGraphEdge],
    config: &PropagationConfig,
    risk_thresholds: &RiskThresholds,
) -> BatchPropagationSummary {
    let flat: HashMap<EntityId, f64> =
        importances.iter().map(|(k, v)| (k.clone(), *v)).collect();

    let results: Vec<PropagationResult> = importances
        .keys()
        .map(|id| propagate_importance(id, &flat, edges, config))
        .collect();

    let risks = detect_epistemic_risks(epistemic_metrics, confidence, entity_types, risk_thresholds);

    let influenced_count = results
        .iter()
        .filter(|r| !r.influence_sources.is_empty())
        .count();
    let critical_risk_count = risks
        .iter()
        .filter(|r| r.risk_level == RiskLevel::Critical)
        .count();
    let high_risk_count = risks
        .iter()
        .filter(|r| r.risk_level == RiskLevel::High)
        .count();
    let average_importance_delta = if results.is_empty() {
        0.0
    } else {
        results
            .iter()
            .map(|r| r.propagated_importance - r.original_importance)
            .sum::<f64>()
            / results.len() as f64
    };

    tracing::info!(
        entities = results.len(),
        influenced = influenced_count,
        critical = critical_risk_count,
        high = high_risk_count,
        "batch propagation complete"
    );

    BatchPropagationSummary {
        results,
        risks,
        influenced_count,
        critical_risk_count,
        high_risk_count,
        average_importance_delta,
    }
}
