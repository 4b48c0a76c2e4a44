//! Error types for the Veritas pipeline.
//!
//! Mirrors the split used throughout the stage pipeline this core is based
//! on: narrow `thiserror` enums at each component boundary, `anyhow::Result`
//! only at the orchestration layer where heterogeneous failures are folded
//! together.

use thiserror::Error;

/// Failure loading or validating static configuration (lexicons, routing
/// tables, evidence-type weights). Fails fast at startup per the error
/// handling design (`ConfigError`).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config toml: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config is missing required table `{0}`")]
    MissingTable(&'static str),

    #[error("category `{0}` has no keyword entries")]
    EmptyCategoryKeywords(String),
}

/// Failure extracting claims from a source's segment stream.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("segments for source are empty")]
    EmptySegments,

    #[error("segments out of order or overlapping at index {index}: prev_end={prev_end}, start={start}")]
    SegmentsOutOfOrder {
        index: usize,
        prev_end: f64,
        start: f64,
    },

    #[error("segment at index {0} has empty text")]
    EmptySegmentText(usize),
}

/// Orchestrator-level failure. Per-claim persistence failures and deadline
/// cancellation are absorbed per §7 ("never allowed to poison the whole
/// run") and surface only as `ClaimErrorTag`s on the store, not here; this
/// type exists for the one failure mode that does fail the whole source.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("extraction failed for source {source_id}: {reason}")]
    ExtractionFailed { source_id: uuid::Uuid, reason: String },
}
