//! Knowledge-graph builder and query surface.
//!
//! Thin orchestration over [`EdgeStore`]: per-source ingestion APIs that
//! normalize external analysis results into typed edges, and read queries
//! (clone clusters, debt hotspots, ownership maps, impact analysis,
//! subgraph extraction) built from the stored edges and the graph
//! primitives in [`crate::algo`].

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use petgraph::graph::UnGraph;
use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::algo::{self, Adjacency};
use crate::edge::{KnowledgeEdgeType, KnowledgeGraphEdge};
use crate::entity::{EntityId, EntityType};
use crate::error::BuilderError;
use crate::store::EdgeStore;

// --- ingestion records ---

/// A detected clone relationship between two code entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClonePair {
    pub source: EntityId,
    pub target: EntityId,
    /// Similarity in [0, 1]; becomes the edge weight.
    pub similarity: f64,
    /// Clone taxonomy label: "exact", "renamed", or "gapped".
    pub clone_type: String,
}

/// Structural dependency kinds extracted from source analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Imports,
    Calls,
    Extends,
    Implements,
}

impl DependencyKind {
    fn edge_type(self) -> KnowledgeEdgeType {
        match self {
            DependencyKind::Imports => KnowledgeEdgeType::Imports,
            DependencyKind::Calls => KnowledgeEdgeType::Calls,
            DependencyKind::Extends => KnowledgeEdgeType::Extends,
            DependencyKind::Implements => KnowledgeEdgeType::Implements,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub source: EntityId,
    pub target: EntityId,
    pub kind: DependencyKind,
}

/// Two entities that change together in version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoChange {
    pub a: EntityId,
    pub b: EntityId,
    /// Fraction of commits touching one that also touch the other.
    pub frequency: f64,
    pub commit_count: usize,
}

/// An author's share of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorshipRecord {
    pub entity: EntityId,
    pub author: EntityId,
    /// Ownership share in [0, 1].
    pub share: f64,
}

/// A technical-debt measurement attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtRecord {
    pub entity: EntityId,
    /// e.g. "complexity", "duplication", "coverage", "documentation".
    pub category: String,
    /// Debt magnitude in [0, 1].
    pub score: f64,
}

// --- builder ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Clone edges below this similarity are excluded from clustering.
    pub clone_similarity_threshold: f64,
    pub min_cluster_size: usize,
    /// Depth bound on transitive impact BFS.
    pub impact_depth: usize,
    /// Node cap shared by impact BFS and subgraph extraction.
    pub max_traversal_nodes: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            clone_similarity_threshold: 0.7,
            min_cluster_size: 2,
            impact_depth: 3,
            max_traversal_nodes: 500,
        }
    }
}

/// Orchestrates ingestion into and queries over a shared edge store.
pub struct GraphBuilder<'a> {
    store: &'a EdgeStore,
    config: BuilderConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(store: &'a EdgeStore) -> Self {
        Self {
            store,
            config: BuilderConfig::default(),
        }
    }

    pub fn with_config(store: &'a EdgeStore, config: BuilderConfig) -> Self {
        Self { store, config }
    }

    // --- ingestion ---

    /// Ingest clone-detection results as `clone_of` edges.
    pub fn ingest_clone_pairs(&self, pairs: Vec<ClonePair>) {
        let count = pairs.len();
        let edges: Vec<KnowledgeGraphEdge> = pairs
            .into_iter()
            .map(|p| {
                KnowledgeGraphEdge::new(
                    p.source,
                    p.target,
                    EntityType::Function,
                    EntityType::Function,
                    KnowledgeEdgeType::CloneOf,
                )
                .with_weight(p.similarity)
                .with_metadata("clone_type", p.clone_type)
            })
            .collect();
        self.store.upsert_edges(edges);
        tracing::info!(pairs = count, "ingested clone pairs");
    }

    /// Ingest import/call/extends/implements edges from structural analysis.
    pub fn ingest_dependencies(&self, deps: Vec<Dependency>) {
        let count = deps.len();
        let edges: Vec<KnowledgeGraphEdge> = deps
            .into_iter()
            .map(|d| {
                KnowledgeGraphEdge::new(
                    d.source,
                    d.target,
                    EntityType::Function,
                    EntityType::Function,
                    d.kind.edge_type(),
                )
            })
            .collect();
        self.store.upsert_edges(edges);
        tracing::info!(dependencies = count, "ingested dependencies");
    }

    /// Ingest co-change couplings mined from version history.
    pub fn ingest_co_changes(&self, changes: Vec<CoChange>) {
        let count = changes.len();
        let edges: Vec<KnowledgeGraphEdge> = changes
            .into_iter()
            .map(|c| {
                KnowledgeGraphEdge::new(
                    c.a,
                    c.b,
                    EntityType::File,
                    EntityType::File,
                    KnowledgeEdgeType::CoChanged,
                )
                .with_weight(c.frequency)
                .with_metadata("commit_count", c.commit_count.to_string())
            })
            .collect();
        self.store.upsert_edges(edges);
        tracing::info!(couplings = count, "ingested co-change couplings");
    }

    /// Ingest per-author ownership shares as `authored_by` edges.
    pub fn ingest_authorship(&self, records: Vec<AuthorshipRecord>) {
        let count = records.len();
        let edges: Vec<KnowledgeGraphEdge> = records
            .into_iter()
            .map(|r| {
                KnowledgeGraphEdge::new(
                    r.entity,
                    r.author,
                    EntityType::File,
                    EntityType::Author,
                    KnowledgeEdgeType::AuthoredBy,
                )
                .with_weight(r.share)
            })
            .collect();
        self.store.upsert_edges(edges);
        tracing::info!(records = count, "ingested authorship");
    }

    /// Ingest debt measurements as `debt_related` edges to per-category
    /// marker entities.
    pub fn ingest_debt(&self, records: Vec<DebtRecord>) {
        let count = records.len();
        let edges: Vec<KnowledgeGraphEdge> = records
            .into_iter()
            .map(|r| {
                let marker = EntityId::new(format!("debt:{}", r.category));
                KnowledgeGraphEdge::new(
                    r.entity,
                    marker,
                    EntityType::File,
                    EntityType::File,
                    KnowledgeEdgeType::DebtRelated,
                )
                .with_weight(r.score)
                .with_metadata("category", r.category)
            })
            .collect();
        self.store.upsert_edges(edges);
        tracing::info!(records = count, "ingested debt measurements");
    }

    // --- queries ---

    /// Connected components over strong `clone_of` edges.
    pub fn clone_clusters(&self) -> Vec<CloneCluster> {
        let filter = crate::store::EdgeFilter {
            edge_type: Some(KnowledgeEdgeType::CloneOf),
            min_weight: Some(self.config.clone_similarity_threshold),
        };
        let edges = self.store.edges(&filter);
        if edges.is_empty() {
            return Vec::new();
        }

        let mut graph: UnGraph<EntityId, f64> = UnGraph::new_undirected();
        let mut indices = HashMap::new();
        for e in &edges {
            let a = *indices
                .entry(e.source_id.clone())
                .or_insert_with(|| graph.add_node(e.source_id.clone()));
            let b = *indices
                .entry(e.target_id.clone())
                .or_insert_with(|| graph.add_node(e.target_id.clone()));
            graph.add_edge(a, b, e.weight);
        }

        let mut components = UnionFind::new(graph.node_count());
        for edge in graph.edge_indices() {
            let (a, b) = graph
                .edge_endpoints(edge)
                .expect("edge index from edge_indices");
            components.union(a.index(), b.index());
        }

        let mut by_root: BTreeMap<usize, Vec<EntityId>> = BTreeMap::new();
        for node in graph.node_indices() {
            by_root
                .entry(components.find(node.index()))
                .or_default()
                .push(graph[node].clone());
        }

        let mut clusters = Vec::new();
        for members in by_root.into_values() {
            if members.len() < self.config.min_cluster_size {
                continue;
            }
            let member_set: HashSet<&EntityId> = members.iter().collect();
            let cluster_edges: Vec<&KnowledgeGraphEdge> = edges
                .iter()
                .filter(|e| member_set.contains(&e.source_id))
                .collect();
            let average_similarity = cluster_edges
                .iter()
                .map(|e| e.weight)
                .sum::<f64>()
                / cluster_edges.len().max(1) as f64;
            let type_factor = cluster_edges
                .iter()
                .map(|e| clone_type_factor(e.metadata.get("clone_type").map(String::as_str)))
                .sum::<f64>()
                / cluster_edges.len().max(1) as f64;
            let mut members = members;
            members.sort();
            clusters.push(CloneCluster {
                members,
                average_similarity,
                refactoring_potential: (average_similarity * type_factor).clamp(0.0, 1.0),
            });
        }
        clusters.sort_by(|a, b| {
            b.refactoring_potential
                .partial_cmp(&a.refactoring_potential)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.members.cmp(&b.members))
        });
        clusters
    }

    /// Entities ranked by total debt weighted by structural centrality.
    pub fn debt_hotspots(&self, limit: usize) -> Vec<DebtHotspot> {
        let debt_edges = self.store.edges(&crate::store::EdgeFilter {
            edge_type: Some(KnowledgeEdgeType::DebtRelated),
            min_weight: None,
        });
        if debt_edges.is_empty() {
            return Vec::new();
        }

        // Total debt and dominant category per entity.
        let mut totals: BTreeMap<EntityId, f64> = BTreeMap::new();
        let mut categories: BTreeMap<EntityId, BTreeMap<String, f64>> = BTreeMap::new();
        for e in &debt_edges {
            *totals.entry(e.source_id.clone()).or_default() += e.weight;
            if let Some(cat) = e.metadata.get("category") {
                *categories
                    .entry(e.source_id.clone())
                    .or_default()
                    .entry(cat.clone())
                    .or_default() += e.weight;
            }
        }

        let centrality = algo::centrality::betweenness_centrality(&self.structural_adjacency());

        let mut hotspots: Vec<DebtHotspot> = totals
            .into_iter()
            .map(|(entity_id, total_debt)| {
                let c = centrality.get(&entity_id).copied().unwrap_or(0.0);
                let dominant_category = categories
                    .get(&entity_id)
                    .and_then(|cats| {
                        cats.iter()
                            .max_by(|a, b| {
                                a.1.partial_cmp(b.1)
                                    .unwrap_or(std::cmp::Ordering::Equal)
                                    .then_with(|| b.0.cmp(a.0))
                            })
                            .map(|(cat, _)| cat.clone())
                    })
                    .unwrap_or_else(|| "general".to_string());
                let recommendation = debt_recommendation(&entity_id, &dominant_category);
                DebtHotspot {
                    entity_id,
                    total_debt,
                    centrality: c,
                    // Central entities' debt hurts more, but debt on
                    // peripheral code still registers.
                    weighted_score: total_debt * (0.5 + 0.5 * c),
                    dominant_category,
                    recommendation,
                }
            })
            .collect();
        hotspots.sort_by(|a, b| {
            b.weighted_score
                .partial_cmp(&a.weighted_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        hotspots.truncate(limit);
        hotspots
    }

    /// Aggregate `authored_by` weights into per-entity ownership entries
    /// plus a per-author rollup.
    pub fn ownership_map(&self) -> OwnershipMap {
        let edges = self.store.edges(&crate::store::EdgeFilter {
            edge_type: Some(KnowledgeEdgeType::AuthoredBy),
            min_weight: None,
        });

        let mut entries: BTreeMap<EntityId, Vec<(EntityId, f64)>> = BTreeMap::new();
        let mut by_author: BTreeMap<EntityId, f64> = BTreeMap::new();
        for e in &edges {
            entries
                .entry(e.source_id.clone())
                .or_default()
                .push((e.target_id.clone(), e.weight));
            *by_author.entry(e.target_id.clone()).or_default() += e.weight;
        }

        let entries = entries
            .into_iter()
            .map(|(entity, mut authors)| {
                authors.sort_by(|a, b| {
                    b.1.partial_cmp(&a.1)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.0.cmp(&b.0))
                });
                let primary_author = authors[0].0.clone();
                (
                    entity,
                    OwnershipEntry {
                        primary_author,
                        authors,
                    },
                )
            })
            .collect();

        OwnershipMap { entries, by_author }
    }

    /// Direct dependents plus a bounded transitive closure, with a coarse
    /// risk score and fan-out recommendations.
    pub fn impact_analysis(&self, entity: &EntityId) -> Result<ImpactAnalysis, BuilderError> {
        if !self.store.contains_entity(entity) {
            return Err(BuilderError::EntityNotFound {
                entity_id: entity.to_string(),
            });
        }

        let direct: Vec<EntityId> = self
            .store
            .edges_to(entity)
            .into_iter()
            .map(|e| e.source_id)
            .collect();

        // Level-by-level BFS upstream, bounded by depth and node caps.
        let mut transitive: Vec<EntityId> = Vec::new();
        let mut visited: HashSet<EntityId> = HashSet::from([entity.clone()]);
        visited.extend(direct.iter().cloned());
        let mut frontier: Vec<EntityId> = direct.clone();
        for _ in 1..self.config.impact_depth {
            let mut next = Vec::new();
            for current in &frontier {
                for e in self.store.edges_to(current) {
                    if visited.len() >= self.config.max_traversal_nodes {
                        break;
                    }
                    if visited.insert(e.source_id.clone()) {
                        next.push(e.source_id);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            transitive.extend(next.iter().cloned());
            frontier = next;
        }
        transitive.sort();

        let risk_score =
            (direct.len() as f64 * 0.1 + transitive.len() as f64 * 0.02).clamp(0.0, 1.0);
        let mut recommendations = Vec::new();
        if direct.len() > 10 {
            recommendations.push(format!(
                "{entity} has {} direct dependents: consider splitting its interface",
                direct.len()
            ));
        }
        if risk_score > 0.7 {
            recommendations
                .push(format!("changes to {entity} are high risk: stage them carefully"));
        }
        if direct.is_empty() {
            recommendations.push(format!("{entity} has no dependents: safe to change freely"));
        }

        Ok(ImpactAnalysis {
            entity_id: entity.clone(),
            direct_dependents: direct,
            transitive_dependents: transitive,
            risk_score,
            recommendations,
        })
    }

    /// Undirected BFS neighborhood of `center`, bounded by `radius` hops
    /// and the traversal node cap, optionally restricted to one edge type.
    pub fn extract_subgraph(
        &self,
        center: &EntityId,
        radius: usize,
        edge_type: Option<KnowledgeEdgeType>,
    ) -> Subgraph {
        let mut entities: HashSet<EntityId> = HashSet::from([center.clone()]);
        let mut edges: Vec<KnowledgeGraphEdge> = Vec::new();
        let mut seen_edges: HashSet<crate::entity::EdgeId> = HashSet::new();
        let mut frontier: VecDeque<(EntityId, usize)> = VecDeque::from([(center.clone(), 0)]);

        while let Some((current, depth)) = frontier.pop_front() {
            if depth >= radius {
                continue;
            }
            let mut neighborhood = self.store.edges_from(&current);
            neighborhood.extend(self.store.edges_to(&current));
            for e in neighborhood {
                if let Some(wanted) = edge_type
                    && e.edge_type != wanted
                {
                    continue;
                }
                let other = if e.source_id == current {
                    e.target_id.clone()
                } else {
                    e.source_id.clone()
                };
                if !entities.contains(&other) {
                    if entities.len() >= self.config.max_traversal_nodes {
                        continue;
                    }
                    entities.insert(other.clone());
                    frontier.push_back((other, depth + 1));
                }
                if seen_edges.insert(e.id.clone()) {
                    edges.push(e);
                }
            }
        }

        let mut entities: Vec<EntityId> = entities.into_iter().collect();
        entities.sort();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        Subgraph {
            center: center.clone(),
            entities,
            edges,
        }
    }

    /// Adjacency over the structural edge types, for centrality weighting.
    fn structural_adjacency(&self) -> Adjacency {
        let mut adjacency = Adjacency::new();
        for e in self.store.edges(&crate::store::EdgeFilter::default()) {
            if matches!(
                e.edge_type,
                KnowledgeEdgeType::Imports
                    | KnowledgeEdgeType::Calls
                    | KnowledgeEdgeType::Extends
                    | KnowledgeEdgeType::Implements
                    | KnowledgeEdgeType::DependsOn
                    | KnowledgeEdgeType::PartOf
            ) {
                algo::add_edge(&mut adjacency, e.source_id, e.target_id);
            }
        }
        adjacency
    }
}

fn clone_type_factor(clone_type: Option<&str>) -> f64 {
    match clone_type {
        Some("exact") => 1.0,
        Some("renamed") => 0.75,
        Some("gapped") => 0.5,
        _ => 0.4,
    }
}

fn debt_recommendation(entity: &EntityId, category: &str) -> String {
    match category {
        "complexity" => format!("refactor {entity} into smaller units"),
        "duplication" => format!("deduplicate {entity} against its clones"),
        "coverage" => format!("add tests covering {entity}"),
        "documentation" => format!("document the contract of {entity}"),
        _ => format!("review the accumulated debt on {entity}"),
    }
}

// --- query results ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneCluster {
    pub members: Vec<EntityId>,
    pub average_similarity: f64,
    /// Higher for exact clones with high similarity.
    pub refactoring_potential: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtHotspot {
    pub entity_id: EntityId,
    pub total_debt: f64,
    pub centrality: f64,
    pub weighted_score: f64,
    pub dominant_category: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipEntry {
    pub primary_author: EntityId,
    /// Authors with their shares, largest first.
    pub authors: Vec<(EntityId, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipMap {
    pub entries: BTreeMap<EntityId, OwnershipEntry>,
    /// Total ownership weight per author across all entities.
    pub by_author: BTreeMap<EntityId, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub entity_id: EntityId,
    pub direct_dependents: Vec<EntityId>,
    pub transitive_dependents: Vec<EntityId>,
    pub risk_score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub center: EntityId,
    pub entities: Vec<EntityId>,
    pub edges: Vec<KnowledgeGraphEdge>,
}
