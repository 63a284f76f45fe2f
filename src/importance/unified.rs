//! Unified importance: weighted aggregation plus flag predicates.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use chrono::Utc;

use crate::entity::{EntityId, EntityType};
use crate::error::ConfigError;
use crate::propagation::{CrossGraphEdge, DampingFactors, cross_graph_influence};

use super::{
    CodeImportanceMetrics, EpistemicImportanceMetrics, ImportanceFlags, ImportanceProfile,
    OrgImportanceMetrics, RationaleImportanceMetrics,
};

/// Weights for the five terms of the unified score. Defaults sum to 1;
/// zeroing a subset isolates the remaining graphs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImportanceWeights {
    pub code: f64,
    pub rationale: f64,
    pub epistemic: f64,
    pub org: f64,
    pub cross_graph: f64,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            code: 0.30,
            rationale: 0.20,
            epistemic: 0.20,
            org: 0.15,
            cross_graph: 0.15,
        }
    }
}

impl ImportanceWeights {
    /// Check that every weight is finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("code", self.code),
            ("rationale", self.rationale),
            ("epistemic", self.epistemic),
            ("org", self.org),
            ("cross_graph", self.cross_graph),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { field, value });
            }
        }
        Ok(())
    }
}

/// Thresholds for the boolean flag predicates. Configuration, not literals:
/// every predicate compares against a field here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlagThresholds {
    /// `is_load_bearing`: unified >= this.
    pub load_bearing: f64,
    /// `is_foundational`: rationale foundationality >= this.
    pub foundational: f64,
    /// `is_at_risk`: unified >= this ...
    pub at_risk_importance: f64,
    /// ... and confidence < this.
    pub at_risk_confidence: f64,
    /// `needs_validation`: defeater vulnerability >= this.
    pub needs_validation: f64,
    /// `has_truck_factor_risk`: ownership concentration >= this.
    pub truck_factor: f64,
    /// `is_hotspot`: hotspot score >= this.
    pub hotspot: f64,
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            load_bearing: 0.7,
            foundational: 0.7,
            at_risk_importance: 0.7,
            at_risk_confidence: 0.5,
            needs_validation: 0.5,
            truck_factor: 0.8,
            hotspot: 0.5,
        }
    }
}

/// Combined configuration for the unified combiner.
#[derive(Debug, Clone, Default)]
pub struct UnifiedConfig {
    pub weights: ImportanceWeights,
    pub thresholds: FlagThresholds,
    /// Damping applied when summing neighbors' importance into
    /// cross-graph influence.
    pub damping: DampingFactors,
}

impl UnifiedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()
    }
}

/// Build a fresh importance profile for one entity.
///
/// `confidence` is externally supplied calibration; absent scores default
/// to 1.0 for flag computation (an unmeasured entity is not thereby
/// at risk).
#[allow(clippy::too_many_arguments)]
pub fn build_profile(
    entity_id: EntityId,
    entity_type: EntityType,
    code: CodeImportanceMetrics,
    rationale: RationaleImportanceMetrics,
    epistemic: EpistemicImportanceMetrics,
    org: OrgImportanceMetrics,
    cross_graph_influence: f64,
    confidence: Option<f64>,
    config: &UnifiedConfig,
) -> ImportanceProfile {
    let w = &config.weights;
    let unified = (w.code * code.combined
        + w.rationale * rationale.combined
        + w.epistemic * epistemic.combined
        + w.org * org.combined
        + w.cross_graph * cross_graph_influence)
        .clamp(0.0, 1.0);

    let t = &config.thresholds;
    let confidence = confidence.unwrap_or(1.0);
    let flags = ImportanceFlags {
        is_load_bearing: unified >= t.load_bearing,
        is_foundational: rationale.foundationality >= t.foundational,
        is_at_risk: unified >= t.at_risk_importance && confidence < t.at_risk_confidence,
        needs_validation: epistemic.defeater_vulnerability >= t.needs_validation,
        has_truck_factor_risk: org.ownership_concentration >= t.truck_factor,
        is_hotspot: code.hotspot_score >= t.hotspot,
    };

    ImportanceProfile {
        entity_id,
        entity_type,
        code_importance: code,
        rationale_importance: rationale,
        epistemic_importance: epistemic,
        org_importance: org,
        unified,
        cross_graph_influence,
        flags,
        computed_at: Utc::now(),
    }
}

/// Build fresh profiles for every entity in one pass.
///
/// The entity set is the union of all metric-map keys plus anything in
/// `entity_types`; entities absent from a metric map take that graph's
/// neutral default. Cross-graph influence reads each neighbor's native
/// combined score (whichever graph scored it), so the pass only depends on
/// already-computed per-graph metrics and is deterministic in ID order.
pub fn compute_batch_importance(
    entity_types: &HashMap<EntityId, EntityType>,
    code: &BTreeMap<EntityId, CodeImportanceMetrics>,
    rationale: &BTreeMap<EntityId, RationaleImportanceMetrics>,
    epistemic: &BTreeMap<EntityId, EpistemicImportanceMetrics>,
    org: &BTreeMap<EntityId, OrgImportanceMetrics>,
    cross_edges: &[CrossGraphEdge],
    confidence: &HashMap<EntityId, f64>,
    config: &UnifiedConfig,
) -> BTreeMap<EntityId, ImportanceProfile> {
    let mut entities: BTreeSet<EntityId> = BTreeSet::new();
    entities.extend(entity_types.keys().cloned());
    entities.extend(code.keys().cloned());
    entities.extend(rationale.keys().cloned());
    entities.extend(epistemic.keys().cloned());
    entities.extend(org.keys().cloned());

    let native_combined: HashMap<EntityId, f64> = entities
        .iter()
        .map(|id| {
            let combined = code
                .get(id)
                .map(|m| m.combined)
                .or_else(|| rationale.get(id).map(|m| m.combined))
                .or_else(|| epistemic.get(id).map(|m| m.combined))
                .or_else(|| org.get(id).map(|m| m.combined))
                .unwrap_or(0.5);
            (id.clone(), combined)
        })
        .collect();

    let profiles: BTreeMap<EntityId, ImportanceProfile> = entities
        .into_iter()
        .map(|id| {
            let influence =
                cross_graph_influence(&id, cross_edges, &native_combined, &config.damping);
            let profile = build_profile(
                id.clone(),
                entity_types
                    .get(&id)
                    .copied()
                    .unwrap_or(EntityType::Function),
                code.get(&id).cloned().unwrap_or_default(),
                rationale.get(&id).cloned().unwrap_or_default(),
                epistemic.get(&id).cloned().unwrap_or_default(),
                org.get(&id).cloned().unwrap_or_default(),
                influence,
                confidence.get(&id).copied(),
                config,
            );
            (id, profile)
        })
        .collect();

    tracing::info!(
        entities = profiles.len(),
        load_bearing = profiles
            .values()
            .filter(|p| p.flags.is_load_bearing)
            .count(),
        "batch importance pass complete"
    );
    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(
        code_combined: f64,
        confidence: Option<f64>,
        config: &UnifiedConfig,
    ) -> ImportanceProfile {
        build_profile(
            EntityId::new("e"),
            EntityType::Function,
            CodeImportanceMetrics {
                combined: code_combined,
                ..Default::default()
            },
            RationaleImportanceMetrics::default(),
            EpistemicImportanceMetrics::default(),
            OrgImportanceMetrics::default(),
            0.0,
            confidence,
            config,
        )
    }

    #[test]
    fn unified_is_weighted_sum_of_combined_scores() {
        let config = UnifiedConfig::default();
        let p = profile_with(1.0, None, &config);
        // 0.30*1.0 + 0.20*0.5 + 0.20*0.5 + 0.15*0.5 + 0.15*0.0
        assert!((p.unified - 0.575).abs() < 1e-9);
    }

    #[test]
    fn zeroing_weights_isolates_one_graph() {
        let config = UnifiedConfig {
            weights: ImportanceWeights {
                code: 1.0,
                rationale: 0.0,
                epistemic: 0.0,
                org: 0.0,
                cross_graph: 0.0,
            },
            ..Default::default()
        };
        let p = profile_with(0.8, None, &config);
        assert!((p.unified - 0.8).abs() < 1e-9);
    }

    #[test]
    fn at_risk_requires_low_confidence() {
        let config = UnifiedConfig {
            weights: ImportanceWeights {
                code: 1.0,
                rationale: 0.0,
                epistemic: 0.0,
                org: 0.0,
                cross_graph: 0.0,
            },
            ..Default::default()
        };
        let confident = profile_with(0.9, None, &config);
        assert!(confident.flags.is_load_bearing);
        assert!(!confident.flags.is_at_risk);

        let shaky = profile_with(0.9, Some(0.3), &config);
        assert!(shaky.flags.is_at_risk);
    }

    #[test]
    fn thresholds_are_configurable_not_baked_in() {
        let strict = UnifiedConfig {
            thresholds: FlagThresholds {
                load_bearing: 0.1,
                ..Default::default()
            },
            ..Default::default()
        };
        let p = profile_with(0.5, None, &strict);
        assert!(p.flags.is_load_bearing);
    }

    #[test]
    fn invalid_weight_is_rejected() {
        let config = UnifiedConfig {
            weights: ImportanceWeights {
                code: f64::NAN,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn batch_pass_profiles_every_entity_with_influence() {
        use crate::entity::{EdgeId, GraphType};
        use crate::propagation::CrossGraphEdgeType;

        let fn_id = EntityId::new("parse");
        let adr_id = EntityId::new("adr-007");

        let mut entity_types = HashMap::new();
        entity_types.insert(fn_id.clone(), EntityType::Function);
        entity_types.insert(adr_id.clone(), EntityType::Decision);

        let mut code = BTreeMap::new();
        code.insert(
            fn_id.clone(),
            CodeImportanceMetrics {
                combined: 0.9,
                ..Default::default()
            },
        );
        let mut rationale = BTreeMap::new();
        rationale.insert(
            adr_id.clone(),
            RationaleImportanceMetrics {
                combined: 0.8,
                ..Default::default()
            },
        );

        let cross = vec![CrossGraphEdge {
            id: EdgeId::derived(&fn_id, &adr_id, "documented_by_decision"),
            source_graph: GraphType::Code,
            target_graph: GraphType::Rationale,
            source_entity_id: fn_id.clone(),
            target_entity_id: adr_id.clone(),
            edge_type: CrossGraphEdgeType::DocumentedByDecision,
            weight: 1.0,
            confidence: 1.0,
            computed_at: Utc::now(),
        }];

        let profiles = compute_batch_importance(
            &entity_types,
            &code,
            &rationale,
            &BTreeMap::new(),
            &BTreeMap::new(),
            &cross,
            &HashMap::new(),
            &UnifiedConfig::default(),
        );

        assert_eq!(profiles.len(), 2);
        // The function sees the decision's combined score across the edge.
        let damping = DampingFactors::default();
        let expected = 0.8 * damping.documented_by_decision;
        assert!((profiles[&fn_id].cross_graph_influence - expected).abs() < 1e-9);
        assert!(profiles[&adr_id].cross_graph_influence > 0.0);
        assert_eq!(profiles[&adr_id].entity_type, EntityType::Decision);
    }

    #[test]
    fn unified_clamps_to_unit_interval() {
        let config = UnifiedConfig {
            weights: ImportanceWeights {
                code: 5.0,
                rationale: 0.0,
                epistemic: 0.0,
                org: 0.0,
                cross_graph: 0.0,
            },
            ..Default::default()
        };
        let p = profile_with(1.0, None, &config);
        assert_eq!(p.unified, 1.0);
    }
}
