//! Spreading-activation cascading-impact analysis.
//!
//! Answers "what is affected if this entity breaks or improves" by walking
//! the dependency graph upstream (toward dependents) with an activation
//! value that decays by a per-edge-type factor at every hop. Activation
//! strictly decreases, so cycles and self-loops terminate once it falls
//! below the pruning threshold.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::edge::KnowledgeEdgeType;
use crate::entity::{EntityId, EntityType};
use crate::error::ConfigError;
use crate::store::EdgeStore;

// --- propagation factors ---

/// Per-edge-type decay factors for the two analysis modes.
///
/// Risk mode asks how badly a break cascades; benefit mode asks how far an
/// improvement reaches. Structural edges carry breakage much better than
/// they carry improvement, so the two tables differ per type. Unmapped
/// types take `default_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationFactors {
    pub risk: HashMap<KnowledgeEdgeType, f64>,
    pub benefit: HashMap<KnowledgeEdgeType, f64>,
    pub default_factor: f64,
}

impl Default for PropagationFactors {
    fn default() -> Self {
        use KnowledgeEdgeType::*;
        let risk = HashMap::from([
            (Imports, 0.9),
            (Calls, 0.8),
            (Extends, 0.95),
            (Implements, 0.85),
            (CloneOf, 0.3),
            (CoChanged, 0.5),
            (Tests, 0.2),
            (Documents, 0.1),
            (PartOf, 0.7),
            (DependsOn, 0.85),
            (SimilarTo, 0.2),
            (AuthoredBy, 0.1),
            (ReviewedBy, 0.1),
            (EvolvedFrom, 0.4),
            (DebtRelated, 0.6),
        ]);
        let benefit = HashMap::from([
            (Imports, 0.3),
            (Calls, 0.6),
            (Extends, 0.4),
            (Implements, 0.4),
            (CloneOf, 0.2),
            (CoChanged, 0.3),
            (Tests, 0.15),
            (Documents, 0.05),
            (PartOf, 0.35),
            (DependsOn, 0.5),
            (SimilarTo, 0.1),
            (AuthoredBy, 0.05),
            (ReviewedBy, 0.05),
            (EvolvedFrom, 0.25),
            (DebtRelated, 0.3),
        ]);
        Self {
            risk,
            benefit,
            default_factor: 0.5,
        }
    }
}

impl PropagationFactors {
    pub fn factor(&self, edge_type: KnowledgeEdgeType, mode: CascadeMode) -> f64 {
        let table = match mode {
            CascadeMode::Risk => &self.risk,
            CascadeMode::Benefit => &self.benefit,
        };
        table.get(&edge_type).copied().unwrap_or(self.default_factor)
    }
}

/// Which factor table the cascade uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    Risk,
    Benefit,
}

impl fmt::Display for CascadeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CascadeMode::Risk => "risk",
            CascadeMode::Benefit => "benefit",
        })
    }
}

/// Bounds on the spreading-activation search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Activations below this are pruned.
    pub activation_threshold: f64,
    pub max_depth: usize,
    /// Cap on distinct affected entities recorded.
    pub max_nodes: usize,
    pub factors: PropagationFactors,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.05,
            max_depth: 5,
            max_nodes: 100,
            factors: PropagationFactors::default(),
        }
    }
}

impl CascadeConfig {
    /// Depth and node caps bound every traversal; zero would make the
    /// analysis degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroCap { field: "max_depth" });
        }
        if self.max_nodes == 0 {
            return Err(ConfigError::ZeroCap { field: "max_nodes" });
        }
        Ok(())
    }
}

// --- results ---

/// One entity reached by the cascade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedEntity {
    pub entity_id: EntityId,
    pub entity_type: EntityType,
    /// Best-path activation at this entity.
    pub impact_score: f64,
    pub depth: usize,
    /// Path from the source to this entity, source first.
    pub path: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeResult {
    pub source_entity: EntityId,
    pub mode: CascadeMode,
    /// Sum of all impact scores.
    pub total_impact: f64,
    /// Descending by impact score, ties by entity ID.
    pub affected_entities: Vec<AffectedEntity>,
    /// The path maximizing `activation · (1 + depth·0.1)` among paths
    /// longer than one entity; empty when nothing was reached.
    pub critical_path: Vec<EntityId>,
    pub summary: String,
}

impl CascadeResult {
    fn empty(source: &EntityId, mode: CascadeMode) -> Self {
        Self {
            source_entity: source.clone(),
            mode,
            total_impact: 0.0,
            affected_entities: Vec::new(),
            critical_path: Vec::new(),
            summary: format!("{source}: no entities affected ({mode} mode)"),
        }
    }
}

// --- spreading activation ---

/// Trace the cascading impact of a change to `source`.
///
/// Breadth-first from the source with activation 1.0. Each step fetches
/// the edges pointing *into* the current entity — its dependents — and
/// hands each dependent `activation · factor · weight · confidence`. A
/// dependent reached by several paths keeps the maximum and is expanded
/// only once. The walk stops at `max_depth` or after `max_nodes` distinct
/// entities.
pub fn analyze_cascading_impact(
    store: &EdgeStore,
    source: &EntityId,
    mode: CascadeMode,
    config: &CascadeConfig,
) -> CascadeResult {
    let mut affected: HashMap<EntityId, AffectedEntity> = HashMap::new();
    let mut queue: VecDeque<(EntityId, f64, usize, Vec<EntityId>)> = VecDeque::new();
    queue.push_back((source.clone(), 1.0, 0, vec![source.clone()]));

    while let Some((current, activation, depth, path)) = queue.pop_front() {
        if depth >= config.max_depth {
            continue;
        }
        for edge in store.edges_to(&current) {
            let dependent = edge.source_id.clone();
            if dependent == *source {
                continue;
            }
            let factor = config.factors.factor(edge.edge_type, mode);
            let propagated = activation * factor * edge.weight * edge.confidence;
            if propagated < config.activation_threshold {
                continue;
            }

            match affected.get_mut(&dependent) {
                Some(existing) => {
                    // Best path wins; already expanded, so never re-enqueue.
                    if propagated > existing.impact_score {
                        let mut new_path = path.clone();
                        new_path.push(dependent.clone());
                        existing.impact_score = propagated;
                        existing.depth = depth + 1;
                        existing.path = new_path;
                    }
                }
                None => {
                    if affected.len() >= config.max_nodes {
                        continue;
                    }
                    let mut new_path = path.clone();
                    new_path.push(dependent.clone());
                    affected.insert(
                        dependent.clone(),
                        AffectedEntity {
                            entity_id: dependent.clone(),
                            entity_type: edge.source_type,
                            impact_score: propagated,
                            depth: depth + 1,
                            path: new_path.clone(),
                        },
                    );
                    queue.push_back((dependent, propagated, depth + 1, new_path));
                }
            }
        }
    }

    if affected.is_empty() {
        return CascadeResult::empty(source, mode);
    }

    let mut affected_entities: Vec<AffectedEntity> = affected.into_values().collect();
    affected_entities.sort_by(|a, b| {
        b.impact_score
            .partial_cmp(&a.impact_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });

    let total_impact: f64 = affected_entities.iter().map(|a| a.impact_score).sum();
    let critical_path = affected_entities
        .iter()
        .filter(|a| a.path.len() > 1)
        .max_by(|a, b| {
            let score_a = a.impact_score * (1.0 + a.depth as f64 * 0.1);
            let score_b = b.impact_score * (1.0 + b.depth as f64 * 0.1);
            score_a
                .partial_cmp(&score_b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.entity_id.cmp(&a.entity_id))
        })
        .map(|a| a.path.clone())
        .unwrap_or_default();
    let summary = summarize(source, mode, &affected_entities, total_impact, &critical_path);

    tracing::debug!(
        source = %source,
        mode = %mode,
        affected = affected_entities.len(),
        total_impact,
        "cascade analysis complete"
    );

    CascadeResult {
        source_entity: source.clone(),
        mode,
        total_impact,
        affected_entities,
        critical_path,
        summary,
    }
}

fn summarize(
    source: &EntityId,
    mode: CascadeMode,
    affected: &[AffectedEntity],
    total_impact: f64,
    critical_path: &[EntityId],
) -> String {
    let mut by_depth: BTreeMap<usize, usize> = BTreeMap::new();
    for a in affected {
        *by_depth.entry(a.depth).or_default() += 1;
    }
    let mut out = format!(
        "{source}: {} entities affected ({mode} mode), total impact {total_impact:.2}\n",
        affected.len()
    );
    for (depth, count) in &by_depth {
        out.push_str(&format!("  depth {depth}: {count} entities\n"));
    }
    if !critical_path.is_empty() {
        let rendered: Vec<&str> = critical_path.iter().map(|e| e.as_str()).collect();
        out.push_str(&format!("  critical path: {}\n", rendered.join(" -> ")));
    }
    out
}

// --- derived queries ---

/// Recommendation tier for an optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenefitTier {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenefitEstimate {
    pub entity_id: EntityId,
    pub improvement_factor: f64,
    /// `cascade total impact × (improvement_factor − 1)`, linear in the
    /// factor.
    pub total_benefit: f64,
    pub tier: BenefitTier,
    pub affected_count: usize,
    pub recommendation: String,
}

/// Estimate how much a speedup or quality improvement of `entity`
/// propagates to its dependents.
pub fn estimate_benefit_of_optimizing(
    store: &EdgeStore,
    entity: &EntityId,
    improvement_factor: f64,
    config: &CascadeConfig,
) -> BenefitEstimate {
    let cascade = analyze_cascading_impact(store, entity, CascadeMode::Benefit, config);
    let total_benefit = cascade.total_impact * (improvement_factor - 1.0);
    let tier = if total_benefit < 0.5 {
        BenefitTier::Low
    } else if total_benefit < 2.0 {
        BenefitTier::Moderate
    } else if total_benefit < 5.0 {
        BenefitTier::High
    } else {
        BenefitTier::Critical
    };
    let recommendation = match tier {
        BenefitTier::Low => format!("optimizing {entity} has limited reach; deprioritize"),
        BenefitTier::Moderate => {
            format!("optimizing {entity} helps {} dependents; worth scheduling", cascade.affected_entities.len())
        }
        BenefitTier::High => {
            format!("optimizing {entity} benefits a wide dependent set; prioritize")
        }
        BenefitTier::Critical => {
            format!("optimizing {entity} is a leverage point for the whole graph; do it first")
        }
    };
    BenefitEstimate {
        entity_id: entity.clone(),
        improvement_factor,
        total_benefit,
        tier,
        affected_count: cascade.affected_entities.len(),
        recommendation,
    }
}

/// How severe the hypothesized change to the entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSeverity {
    Minor,
    Major,
    Critical,
}

impl ChangeSeverity {
    /// Search parameters: (activation threshold, max depth, impact
    /// multiplier). More severe changes search deeper with a lower
    /// pruning threshold.
    fn search_params(&self) -> (f64, usize, f64) {
        match self {
            ChangeSeverity::Minor => (0.1, 3, 0.5),
            ChangeSeverity::Major => (0.05, 5, 1.0),
            ChangeSeverity::Critical => (0.01, 8, 1.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlastRadiusEstimate {
    pub entity_id: EntityId,
    pub change_severity: ChangeSeverity,
    /// Severity-multiplied total risk.
    pub total_risk: f64,
    pub affected_count: usize,
    /// Overall severity reclassified from total risk and reach.
    pub overall_severity: ChangeSeverity,
    /// Dependents with impact > 0.5 or at depth 1, strongest first,
    /// capped at 10.
    pub critical_dependents: Vec<EntityId>,
    pub mitigations: Vec<String>,
}

/// Estimate who breaks, and how badly, if `entity` changes.
pub fn estimate_blast_radius(
    store: &EdgeStore,
    entity: &EntityId,
    severity: ChangeSeverity,
    factors: &PropagationFactors,
) -> BlastRadiusEstimate {
    let (threshold, max_depth, multiplier) = severity.search_params();
    let config = CascadeConfig {
        activation_threshold: threshold,
        max_depth,
        factors: factors.clone(),
        ..CascadeConfig::default()
    };
    let cascade = analyze_cascading_impact(store, entity, CascadeMode::Risk, &config);
    let total_risk = cascade.total_impact * multiplier;
    let affected_count = cascade.affected_entities.len();

    let overall_severity = if total_risk > 5.0 || affected_count >= 30 {
        ChangeSeverity::Critical
    } else if total_risk > 2.0 || affected_count >= 10 {
        ChangeSeverity::Major
    } else {
        ChangeSeverity::Minor
    };

    let critical_dependents: Vec<EntityId> = cascade
        .affected_entities
        .iter()
        .filter(|a| a.impact_score > 0.5 || a.depth == 1)
        .take(10)
        .map(|a| a.entity_id.clone())
        .collect();

    let direct_dependents = cascade
        .affected_entities
        .iter()
        .filter(|a| a.depth == 1)
        .count();
    let mut mitigations = Vec::new();
    if direct_dependents > 5 {
        mitigations.push(format!(
            "{direct_dependents} direct dependents: roll the change out incrementally behind a flag"
        ));
    }
    if critical_dependents.len() >= 3 {
        mitigations.push(format!(
            "{} critical dependents: add regression tests for each before changing",
            critical_dependents.len()
        ));
    }
    if cascade.critical_path.len() >= 4 {
        mitigations.push(format!(
            "impact chain spans {} entities: add monitoring along the path",
            cascade.critical_path.len()
        ));
    }
    if overall_severity == ChangeSeverity::Critical {
        mitigations.push(
            "critical blast radius: put a circuit breaker in front and keep a \
             compatibility window for the old behavior"
                .to_string(),
        );
    }

    BlastRadiusEstimate {
        entity_id: entity.clone(),
        change_severity: severity,
        total_risk,
        affected_count,
        overall_severity,
        critical_dependents,
        mitigations,
    }
}

/// Rank a set of candidate entities by cascading risk, highest first.
pub fn compare_cascade_impact(
    store: &EdgeStore,
    entities: &[EntityId],
    config: &CascadeConfig,
) -> Vec<CascadeResult> {
    let mut results: Vec<CascadeResult> = entities
        .iter()
        .map(|e| analyze_cascading_impact(store, e, CascadeMode::Risk, config))
        .collect();
    results.sort_by(|a, b| {
        b.total_impact
            .partial_cmp(&a.total_impact)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.source_entity.cmp(&b.source_entity))
    });
    results
}

/// Quick heuristic: does touching this entity ripple widely?
pub fn is_high_impact_entity(store: &EdgeStore, entity: &EntityId, config: &CascadeConfig) -> bool {
    let cascade = analyze_cascading_impact(store, entity, CascadeMode::Risk, config);
    cascade.total_impact > 2.0 || cascade.affected_entities.len() > 10
}
