//! Core identity types for the cartograph engine.
//!
//! Entities are the atomic units of the knowledge model. Every function,
//! module, decision, claim, or author is identified by an opaque [`EntityId`]
//! and tagged with the conceptual graph it belongs to ([`GraphType`]) plus a
//! finer-grained [`EntityType`]. Identifiers are compared by equality only
//! and never parsed for structure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an entity in any of the four graphs.
///
/// Wraps the upstream extractor's string ID. Ordering is lexicographic over
/// the raw string, which gives every traversal in this crate a deterministic
/// iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap a raw entity identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        EntityId(raw.into())
    }

    /// Get the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        EntityId(raw.to_string())
    }
}

/// Opaque identifier for a stored edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Wrap a raw edge identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        EdgeId(raw.into())
    }

    /// Derive the canonical ID for an edge from its endpoints and type.
    pub fn derived(source: &EntityId, target: &EntityId, edge_type: &str) -> Self {
        EdgeId(format!("{source}--{edge_type}->{target}"))
    }

    /// Get the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The four conceptual graphs of the knowledge model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    /// Code structure: functions, modules, files and their dependencies.
    Code,
    /// Design rationale: decisions, tradeoffs, constraints.
    Rationale,
    /// Epistemic: claims, evidence, defeaters.
    Epistemic,
    /// Organizational: authors, teams, ownership.
    Org,
}

impl GraphType {
    /// All graph types in canonical order.
    pub const ALL: [GraphType; 4] = [
        GraphType::Code,
        GraphType::Rationale,
        GraphType::Epistemic,
        GraphType::Org,
    ];
}

impl std::fmt::Display for GraphType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphType::Code => write!(f, "code"),
            GraphType::Rationale => write!(f, "rationale"),
            GraphType::Epistemic => write!(f, "epistemic"),
            GraphType::Org => write!(f, "org"),
        }
    }
}

/// Fine-grained classification of an entity within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Function,
    Module,
    File,
    Class,
    Decision,
    Tradeoff,
    Constraint,
    Claim,
    Evidence,
    Author,
    Team,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityType::Function => "function",
            EntityType::Module => "module",
            EntityType::File => "file",
            EntityType::Class => "class",
            EntityType::Decision => "decision",
            EntityType::Tradeoff => "tradeoff",
            EntityType::Constraint => "constraint",
            EntityType::Claim => "claim",
            EntityType::Evidence => "evidence",
            EntityType::Author => "author",
            EntityType::Team => "team",
        };
        write!(f, "{s}")
    }
}

/// Externally supplied mapping from entity ID to its conceptual graph.
///
/// The propagation engine needs to know which graph each endpoint of a
/// generic edge lives in; entities absent from the map are skipped (§7:
/// malformed edges are skipped, never raised).
pub type GraphTypeMap = HashMap<EntityId, GraphType>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_equality_and_ordering() {
        let a = EntityId::new("src/auth.rs::login");
        let b = EntityId::new("src/auth.rs::login");
        let c = EntityId::new("src/auth.rs::logout");
        assert_eq!(a, b);
        assert!(a < c);
    }

    #[test]
    fn derived_edge_id_is_stable() {
        let s = EntityId::new("a");
        let t = EntityId::new("b");
        assert_eq!(
            EdgeId::derived(&s, &t, "imports"),
            EdgeId::derived(&s, &t, "imports")
        );
        assert_ne!(
            EdgeId::derived(&s, &t, "imports"),
            EdgeId::derived(&t, &s, "imports")
        );
    }

    #[test]
    fn graph_type_serializes_snake_case() {
        let json = serde_json::to_string(&GraphType::Rationale).unwrap();
        assert_eq!(json, "\"rationale\"");
    }
}
