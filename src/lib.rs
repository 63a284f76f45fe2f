//! # cartograph
//!
//! Importance and impact analysis over a multi-graph knowledge model of a
//! codebase: what matters, what breaks, and who to ask.
//!
//! ## Architecture
//!
//! - **Graph primitives** (`algo`): PageRank, betweenness/closeness/
//!   eigenvector centrality, Louvain community detection
//! - **Edge store** (`store`): dual-indexed in-memory store of typed,
//!   weighted, confidence-scored edges
//! - **Importance** (`importance`): per-graph metric computers (code,
//!   rationale, epistemic, org) plus the unified combiner and flags
//! - **Propagation** (`propagation`): damped cross-graph importance flow,
//!   influence chains, epistemic-risk detection
//! - **Cascade** (`cascade`): spreading-activation impact analysis with
//!   risk/benefit modes, blast radius, and optimization-benefit estimates
//! - **Builder** (`builder`): ingestion from clone/dependency/co-change/
//!   authorship/debt sources and query surfaces over the store
//! - **Report** (`report`): versioned `GraphMetricsReport.v1` JSON artifact
//!
//! ## Library usage
//!
//! ```no_run
//! use cartograph::builder::{Dependency, DependencyKind, GraphBuilder};
//! use cartograph::cascade::{CascadeConfig, CascadeMode, analyze_cascading_impact};
//! use cartograph::entity::EntityId;
//! use cartograph::store::EdgeStore;
//!
//! let store = EdgeStore::new();
//! let builder = GraphBuilder::new(&store);
//! builder.ingest_dependencies(vec![Dependency {
//!     source: EntityId::new("app"),
//!     target: EntityId::new("core"),
//!     kind: DependencyKind::Imports,
//! }]);
//! let impact = analyze_cascading_impact(
//!     &store,
//!     &EntityId::new("core"),
//!     CascadeMode::Risk,
//!     &CascadeConfig::default(),
//! );
//! println!("{}", impact.summary);
//! ```

pub mod algo;
pub mod builder;
pub mod cascade;
pub mod edge;
pub mod entity;
pub mod error;
pub mod importance;
pub mod propagation;
pub mod report;
pub mod store;
