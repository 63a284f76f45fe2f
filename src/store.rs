//! In-memory edge store with dual-indexing.
//!
//! Holds the full snapshot of [`KnowledgeGraphEdge`]s and serves the read
//! contract the analysis layers consume: filtered scans, edges-from, and
//! edges-to. Uses `DashMap` secondary indexes so the per-frontier lookups
//! inside BFS-style analyses are O(degree), not O(total edges).
//!
//! Upsert semantics: edges are keyed by [`EdgeId`]; re-ingesting an edge
//! with an existing ID replaces it wholesale.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::edge::{KnowledgeEdgeType, KnowledgeGraphEdge};
use crate::entity::{EdgeId, EntityId};

/// Filter for scanning stored edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    /// Only edges of this type.
    pub edge_type: Option<KnowledgeEdgeType>,
    /// Only edges with weight >= this value.
    pub min_weight: Option<f64>,
}

impl EdgeFilter {
    fn matches(&self, edge: &KnowledgeGraphEdge) -> bool {
        if let Some(t) = self.edge_type
            && edge.edge_type != t
        {
            return false;
        }
        if let Some(w) = self.min_weight
            && edge.weight < w
        {
            return false;
        }
        true
    }
}

/// In-memory knowledge-edge store, indexed by source, target, and edge type.
///
/// All read paths return owned `Vec` snapshots sorted by edge ID, so callers
/// iterate deterministically and never hold a lock across their own work.
#[derive(Debug, Default)]
pub struct EdgeStore {
    /// Edge ID → edge. The authoritative copy.
    edges: DashMap<EdgeId, KnowledgeGraphEdge>,
    /// Source entity → edge IDs leaving it.
    by_source: DashMap<EntityId, Vec<EdgeId>>,
    /// Target entity → edge IDs entering it.
    by_target: DashMap<EntityId, Vec<EdgeId>>,
    /// Upsert count (including replacements), for ingest reporting.
    upserts: AtomicUsize,
}

impl EdgeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a batch of edges.
    pub fn upsert_edges(&self, edges: Vec<KnowledgeGraphEdge>) {
        for edge in edges {
            self.upsert_edge(edge);
        }
    }

    /// Insert or replace a single edge.
    pub fn upsert_edge(&self, edge: KnowledgeGraphEdge) {
        let id = edge.id.clone();
        let previous = self.edges.insert(id.clone(), edge);

        // Replacing an edge keeps its index entries; only new IDs are indexed.
        if previous.is_none() {
            let stored = self.edges.get(&id).expect("edge inserted above");
            self.by_source
                .entry(stored.source_id.clone())
                .or_default()
                .push(id.clone());
            self.by_target
                .entry(stored.target_id.clone())
                .or_default()
                .push(id);
        }
        self.upserts.fetch_add(1, Ordering::Relaxed);
    }

    /// All edges matching the filter, sorted by edge ID.
    pub fn edges(&self, filter: &EdgeFilter) -> Vec<KnowledgeGraphEdge> {
        let mut out: Vec<KnowledgeGraphEdge> = self
            .edges
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// All edges whose source is `entity`, sorted by edge ID.
    pub fn edges_from(&self, entity: &EntityId) -> Vec<KnowledgeGraphEdge> {
        self.collect_ids(self.by_source.get(entity).map(|v| v.value().clone()))
    }

    /// All edges whose target is `entity`, sorted by edge ID.
    pub fn edges_to(&self, entity: &EntityId) -> Vec<KnowledgeGraphEdge> {
        self.collect_ids(self.by_target.get(entity).map(|v| v.value().clone()))
    }

    /// Whether any stored edge touches `entity`.
    pub fn contains_entity(&self, entity: &EntityId) -> bool {
        self.by_source.contains_key(entity) || self.by_target.contains_key(entity)
    }

    /// Number of distinct stored edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn collect_ids(&self, ids: Option<Vec<EdgeId>>) -> Vec<KnowledgeGraphEdge> {
        let mut out: Vec<KnowledgeGraphEdge> = ids
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.edges.get(id).map(|e| e.value().clone()))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;

    fn eid(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn edge(src: &str, dst: &str, et: KnowledgeEdgeType, weight: f64) -> KnowledgeGraphEdge {
        KnowledgeGraphEdge::new(
            eid(src),
            eid(dst),
            EntityType::Function,
            EntityType::Function,
            et,
        )
        .with_weight(weight)
    }

    #[test]
    fn upsert_replaces_by_id() {
        let store = EdgeStore::new();
        store.upsert_edge(edge("a", "b", KnowledgeEdgeType::Calls, 0.4));
        store.upsert_edge(edge("a", "b", KnowledgeEdgeType::Calls, 0.9));

        assert_eq!(store.edge_count(), 1);
        let from_a = store.edges_from(&eid("a"));
        assert_eq!(from_a.len(), 1);
        assert_eq!(from_a[0].weight, 0.9);
    }

    #[test]
    fn filter_by_type_and_weight() {
        let store = EdgeStore::new();
        store.upsert_edge(edge("a", "b", KnowledgeEdgeType::Calls, 0.9));
        store.upsert_edge(edge("a", "c", KnowledgeEdgeType::Imports, 0.9));
        store.upsert_edge(edge("a", "d", KnowledgeEdgeType::Calls, 0.2));

        let calls = store.edges(&EdgeFilter {
            edge_type: Some(KnowledgeEdgeType::Calls),
            min_weight: Some(0.5),
        });
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target_id, eid("b"));
    }

    #[test]
    fn edges_to_sees_incoming_only() {
        let store = EdgeStore::new();
        store.upsert_edge(edge("caller", "target", KnowledgeEdgeType::Imports, 1.0));
        store.upsert_edge(edge("target", "other", KnowledgeEdgeType::Imports, 1.0));

        let incoming = store.edges_to(&eid("target"));
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].source_id, eid("caller"));
    }

    #[test]
    fn unknown_entity_yields_empty_not_error() {
        let store = EdgeStore::new();
        assert!(store.edges_from(&eid("ghost")).is_empty());
        assert!(store.edges_to(&eid("ghost")).is_empty());
        assert!(!store.contains_entity(&eid("ghost")));
    }
}
