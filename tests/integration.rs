//! End-to-end integration tests for cartograph.
//!
//! These exercise the full pipeline: ingesting edges through the builder,
//! computing per-graph importance, combining into unified profiles with
//! cross-graph influence, propagating importance, running cascade impact
//! analysis, and writing the metrics report.

use std::collections::{BTreeMap, HashMap};

use cartograph::algo::{Adjacency, add_edge};
use cartograph::builder::{
    AuthorshipRecord, ClonePair, DebtRecord, Dependency, DependencyKind, GraphBuilder,
};
use cartograph::cascade::{
    CascadeConfig, CascadeMode, ChangeSeverity, PropagationFactors, analyze_cascading_impact,
    estimate_blast_radius,
};
use cartograph::entity::{EntityId, EntityType, GraphType, GraphTypeMap};
use cartograph::importance::code::{CodeImportanceConfig, compute_code_importance};
use cartograph::importance::unified::{UnifiedConfig, build_profile};
use cartograph::importance::{
    EpistemicImportanceMetrics, OrgImportanceMetrics, RationaleImportanceMetrics,
};
use cartograph::propagation::engine::{RiskThresholds, propagate_importance_batch};
use cartograph::propagation::{
    PropagationConfig, build_cross_graph_edges, cross_graph_influence,
};
use cartograph::report::{build_report, write_report};
use cartograph::store::{EdgeFilter, EdgeStore};

fn eid(s: &str) -> EntityId {
    EntityId::new(s)
}

/// A small service: handlers import a service layer which imports core,
/// with an architectural decision documenting core and an owner for each
/// file.
fn seed_store(store: &EdgeStore) {
    let builder = GraphBuilder::new(store);
    builder.ingest_dependencies(vec![
        Dependency {
            source: eid("http_handler"),
            target: eid("service"),
            kind: DependencyKind::Calls,
        },
        Dependency {
            source: eid("cli_handler"),
            target: eid("service"),
            kind: DependencyKind::Calls,
        },
        Dependency {
            source: eid("service"),
            target: eid("core"),
            kind: DependencyKind::Imports,
        },
    ]);
    builder.ingest_clone_pairs(vec![ClonePair {
        source: eid("http_handler"),
        target: eid("cli_handler"),
        similarity: 0.85,
        clone_type: "renamed".to_string(),
    }]);
    builder.ingest_authorship(vec![
        AuthorshipRecord {
            entity: eid("core"),
            author: eid("alice"),
            share: 1.0,
        },
        AuthorshipRecord {
            entity: eid("service"),
            author: eid("bob"),
            share: 0.6,
        },
        AuthorshipRecord {
            entity: eid("service"),
            author: eid("alice"),
            share: 0.4,
        },
    ]);
    builder.ingest_debt(vec![DebtRecord {
        entity: eid("service"),
        category: "complexity".to_string(),
        score: 0.7,
    }]);
}

fn code_adjacency(store: &EdgeStore) -> Adjacency {
    let mut graph = Adjacency::new();
    for e in store.edges(&EdgeFilter::default()) {
        if matches!(
            e.edge_type,
            cartograph::edge::KnowledgeEdgeType::Imports
                | cartograph::edge::KnowledgeEdgeType::Calls
        ) {
            add_edge(&mut graph, e.source_id, e.target_id);
        }
    }
    graph
}

#[test]
fn ingest_then_query_round_trip() {
    let store = EdgeStore::new();
    seed_store(&store);
    let builder = GraphBuilder::new(&store);

    let clusters = builder.clone_clusters();
    assert_eq!(clusters.len(), 1);
    assert_eq!(
        clusters[0].members,
        vec![eid("cli_handler"), eid("http_handler")]
    );

    let ownership = builder.ownership_map();
    assert_eq!(ownership.entries[&eid("core")].primary_author, eid("alice"));
    assert_eq!(
        ownership.entries[&eid("service")].primary_author,
        eid("bob")
    );

    let hotspots = builder.debt_hotspots(5);
    assert_eq!(hotspots[0].entity_id, eid("service"));

    let impact = builder.impact_analysis(&eid("core")).unwrap();
    assert_eq!(impact.direct_dependents, vec![eid("service")]);
    assert_eq!(
        impact.transitive_dependents,
        vec![eid("cli_handler"), eid("http_handler")]
    );
}

#[test]
fn importance_profiles_rank_the_load_bearing_module() {
    let store = EdgeStore::new();
    seed_store(&store);
    let graph = code_adjacency(&store);

    let code_metrics =
        compute_code_importance(&graph, &HashMap::new(), &CodeImportanceConfig::default());
    // "service" funnels both handlers toward core.
    assert!(code_metrics[&eid("service")].combined > code_metrics[&eid("http_handler")].combined);

    let config = UnifiedConfig::default();
    let profile = build_profile(
        eid("service"),
        EntityType::Module,
        code_metrics[&eid("service")].clone(),
        RationaleImportanceMetrics::default(),
        EpistemicImportanceMetrics::default(),
        OrgImportanceMetrics::default(),
        0.0,
        None,
        &config,
    );
    assert!(profile.unified > 0.0 && profile.unified <= 1.0);
    assert!(!profile.flags.is_at_risk);
}

#[test]
fn cross_graph_edges_feed_propagation() {
    let store = EdgeStore::new();
    let builder = GraphBuilder::new(&store);
    // core is documented by an architecture decision.
    builder.ingest_dependencies(vec![Dependency {
        source: eid("service"),
        target: eid("core"),
        kind: DependencyKind::Imports,
    }]);
    store.upsert_edge(cartograph::edge::KnowledgeGraphEdge::new(
        eid("core"),
        eid("adr-001"),
        EntityType::Module,
        EntityType::Decision,
        cartograph::edge::KnowledgeEdgeType::Documents,
    ));

    let mut graph_types = GraphTypeMap::new();
    graph_types.insert(eid("core"), GraphType::Code);
    graph_types.insert(eid("service"), GraphType::Code);
    graph_types.insert(eid("adr-001"), GraphType::Rationale);

    let cross = build_cross_graph_edges(&store.edges(&EdgeFilter::default()), &graph_types);
    assert_eq!(cross.len(), 1);

    let mut combined = HashMap::new();
    combined.insert(eid("core"), 0.9);
    combined.insert(eid("adr-001"), 0.8);
    let config = PropagationConfig::default();
    let influence = cross_graph_influence(&eid("core"), &cross, &combined, &config.damping);
    assert!(influence > 0.0);

    let mut importances = BTreeMap::new();
    importances.insert(eid("core"), 0.9);
    importances.insert(eid("adr-001"), 0.8);
    let summary = propagate_importance_batch(
        &importances,
        &BTreeMap::new(),
        &HashMap::new(),
        &HashMap::new(),
        &cross,
        &config,
        &RiskThresholds::default(),
    );
    assert_eq!(summary.influenced_count, 2);
    let adr = summary
        .results
        .iter()
        .find(|r| r.entity_id == eid("adr-001"))
        .unwrap();
    assert!(adr.propagated_importance > adr.original_importance);
}

#[test]
fn cascade_and_blast_radius_agree_on_the_hot_module() {
    let store = EdgeStore::new();
    seed_store(&store);

    let cascade = analyze_cascading_impact(
        &store,
        &eid("core"),
        CascadeMode::Risk,
        &CascadeConfig::default(),
    );
    // service at depth 1, both handlers at depth 2.
    assert_eq!(cascade.affected_entities.len(), 3);
    assert_eq!(cascade.affected_entities[0].entity_id, eid("service"));
    assert!(cascade.total_impact > 0.0);
    assert_eq!(cascade.critical_path.first(), Some(&eid("core")));

    let blast = estimate_blast_radius(
        &store,
        &eid("core"),
        ChangeSeverity::Major,
        &PropagationFactors::default(),
    );
    assert_eq!(blast.affected_count, 3);
    assert!(blast.critical_dependents.contains(&eid("service")));
}

#[test]
fn report_covers_all_graphs_and_persists() {
    let store = EdgeStore::new();
    seed_store(&store);

    let mut graphs = BTreeMap::new();
    graphs.insert(GraphType::Code, code_adjacency(&store));
    let mut org = Adjacency::new();
    add_edge(&mut org, eid("core"), eid("alice"));
    add_edge(&mut org, eid("service"), eid("bob"));
    graphs.insert(GraphType::Org, org);

    let report = build_report(&graphs);
    assert_eq!(report.kind, "GraphMetricsReport.v1");
    assert_eq!(report.graphs.len(), 2);
    assert!(report.totals.nodes >= 8);

    let dir = tempfile::tempdir().unwrap();
    let path = write_report(&report, dir.path()).unwrap();
    let raw = std::fs::read_to_string(path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["schema_version"], 1);
    assert_eq!(value["kind"], "GraphMetricsReport.v1");
}
