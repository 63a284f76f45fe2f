//! Rich diagnostic error types for the cartograph engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. Note that per the core's
//! error-handling design, degenerate *inputs* (empty graphs, unknown edge
//! types, entities with no signal) are never errors — they produce defined
//! neutral outputs. The types here cover genuine faults: invalid
//! configuration, I/O, serialization, and point queries naming entities the
//! store has never seen.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the cartograph engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum CartographError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Report(#[from] ReportError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("importance weights must be finite and non-negative, got {field} = {value}")]
    #[diagnostic(
        code(cartograph::config::invalid_weight),
        help(
            "Every entry in ImportanceWeights must be a finite value >= 0. \
             Use ImportanceWeights::default() as a starting point and adjust \
             individual fields."
        )
    )]
    InvalidWeight { field: &'static str, value: f64 },

    #[error(
        "risk level thresholds must be strictly ascending: medium {medium} < high {high} < critical {critical}"
    )]
    #[diagnostic(
        code(cartograph::config::risk_thresholds),
        help(
            "Risk buckets are assigned by comparing the score against the three \
             thresholds in order. Reorder them so medium < high < critical."
        )
    )]
    RiskThresholdOrder {
        medium: f64,
        high: f64,
        critical: f64,
    },

    #[error("{field} must be greater than zero")]
    #[diagnostic(
        code(cartograph::config::zero_cap),
        help(
            "Depth, node, and normalization caps bound every traversal; a zero \
             cap would make the computation degenerate. Set the field to a \
             positive value."
        )
    )]
    ZeroCap { field: &'static str },
}

// ---------------------------------------------------------------------------
// Builder errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BuilderError {
    #[error("entity not found in edge store: \"{entity_id}\"")]
    #[diagnostic(
        code(cartograph::builder::entity_not_found),
        help(
            "The entity has no edges in the store, so a point query centered on \
             it cannot be answered. Ingest edges touching this entity first, or \
             check the ID for typos."
        )
    )]
    EntityNotFound { entity_id: String },
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ReportError {
    #[error("failed to create report directory: {path}")]
    #[diagnostic(
        code(cartograph::report::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report file: {path}")]
    #[diagnostic(
        code(cartograph::report::write),
        help("Check write permissions and available disk space.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {message}")]
    #[diagnostic(
        code(cartograph::report::serialize),
        help(
            "The report contained a value serde_json could not represent. \
             This indicates a bug in metric computation (NaN or infinity \
             leaking through a clamp) — please file a bug report."
        )
    )]
    Serialize { message: String },
}

/// Convenience alias for functions returning cartograph results.
pub type CartoResult<T> = std::result::Result<T, CartographError>;
