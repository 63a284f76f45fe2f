//! Generic knowledge-graph edges and the closed edge-type vocabulary.
//!
//! Every relationship ingested into the store is a [`KnowledgeGraphEdge`]:
//! a typed, weighted, confidence-scored link between two entities. The
//! [`KnowledgeEdgeType`] vocabulary is a closed enum so damping and
//! propagation-factor lookups are exhaustiveness-checked; extending the
//! vocabulary upstream degrades gracefully to a neutral factor (see
//! [`crate::cascade::PropagationFactors`]).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{EdgeId, EntityId, EntityType};

/// The closed vocabulary of generic edge types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeEdgeType {
    Imports,
    Calls,
    Extends,
    Implements,
    CloneOf,
    CoChanged,
    Tests,
    Documents,
    PartOf,
    DependsOn,
    SimilarTo,
    AuthoredBy,
    ReviewedBy,
    EvolvedFrom,
    DebtRelated,
}

impl KnowledgeEdgeType {
    /// Canonical string form, matching the stored `edge_type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeEdgeType::Imports => "imports",
            KnowledgeEdgeType::Calls => "calls",
            KnowledgeEdgeType::Extends => "extends",
            KnowledgeEdgeType::Implements => "implements",
            KnowledgeEdgeType::CloneOf => "clone_of",
            KnowledgeEdgeType::CoChanged => "co_changed",
            KnowledgeEdgeType::Tests => "tests",
            KnowledgeEdgeType::Documents => "documents",
            KnowledgeEdgeType::PartOf => "part_of",
            KnowledgeEdgeType::DependsOn => "depends_on",
            KnowledgeEdgeType::SimilarTo => "similar_to",
            KnowledgeEdgeType::AuthoredBy => "authored_by",
            KnowledgeEdgeType::ReviewedBy => "reviewed_by",
            KnowledgeEdgeType::EvolvedFrom => "evolved_from",
            KnowledgeEdgeType::DebtRelated => "debt_related",
        }
    }
}

impl std::fmt::Display for KnowledgeEdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generic, store-owned edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraphEdge {
    /// Unique edge identifier. Upserting an edge with an existing ID replaces it.
    pub id: EdgeId,
    /// Source entity.
    pub source_id: EntityId,
    /// Target entity.
    pub target_id: EntityId,
    /// Entity type of the source.
    pub source_type: EntityType,
    /// Entity type of the target.
    pub target_type: EntityType,
    /// Relationship type.
    pub edge_type: KnowledgeEdgeType,
    /// Edge strength in [0.0, 1.0].
    pub weight: f64,
    /// Confidence in [0.0, 1.0] that the edge is real.
    pub confidence: f64,
    /// Free-form metadata from the signal source (clone type, debt category, ...).
    pub metadata: HashMap<String, String>,
    /// When this edge was computed.
    pub computed_at: DateTime<Utc>,
}

impl KnowledgeGraphEdge {
    /// Create a new edge with full weight and confidence.
    ///
    /// The ID is derived from the endpoints and edge type, so re-ingesting
    /// the same relationship upserts rather than duplicates.
    pub fn new(
        source_id: EntityId,
        target_id: EntityId,
        source_type: EntityType,
        target_type: EntityType,
        edge_type: KnowledgeEdgeType,
    ) -> Self {
        Self {
            id: EdgeId::derived(&source_id, &target_id, edge_type.as_str()),
            source_id,
            target_id,
            source_type,
            target_type,
            edge_type,
            weight: 1.0,
            confidence: 1.0,
            metadata: HashMap::new(),
            computed_at: Utc::now(),
        }
    }

    /// Set the edge weight, clamped to [0, 1].
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.clamp(0.0, 1.0);
        self
    }

    /// Set the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
