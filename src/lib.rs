//! Veritas: a deterministic claim-extraction and fact-verification engine.
//!
//! The pipeline is split the way the reference pipeline splits its own
//! stages: a pure, synchronous core (tokenizer, extractor, classifier,
//! dedup, router, scorer, aggregator) with no shared mutable state or
//! wall-clock dependence, driven by a thin async orchestrator that owns
//! concurrency, deadlines, and persistence.
//!
//! External callers load [`Config`] once (typically [`Config::embedded_default`])
//! and either call the pure stages directly for a single source's segments,
//! or build an [`orchestrator::Orchestrator`] to run the full pipeline
//! end-to-end against a [`store::ClaimStore`] and an
//! [`adapters::AdapterRegistry`].

pub mod adapters;
pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod router;
pub mod scorer;
pub mod store;
pub mod tokenizer;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, ExtractionError, OrchestratorError};
pub use orchestrator::{Orchestrator, SegmentProvider};
pub use store::{ClaimStore, InMemoryStore};
pub use types::{Claim, ClaimGroup, ClaimStatus, ContradictionFlag, RunCounts, ScoredEvidence, Source, TimedSegment};

use uuid::Uuid;

/// §6 "Output contract from the core": `extract(source_id) -> Claim[]`.
/// Pure given `segments`, `config`, and `now` — no I/O, no internal clock
/// read (§8 invariant 1); `now` stands in for `Claim::created_at` so the
/// same inputs always produce byte-identical output.
pub fn extract(
    source_id: Uuid,
    segments: &[TimedSegment],
    config: &Config,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<Claim>, ExtractionError> {
    extractor::extract(source_id, segments, config, now)
}

/// §6 "Output contract from the core": for one claim, route to evidence
/// sources and score every candidate returned. The network/async part of
/// the pipeline; see [`orchestrator::Orchestrator::run`] for the full
/// per-source drive including persistence and deadlines.
pub async fn assist(
    claim: &Claim,
    config: &Config,
    registry: &adapters::AdapterRegistry,
) -> Vec<ScoredEvidence> {
    let source_ids = router::route(claim, config);
    let request = adapters::AdapterRequest {
        claim_text: claim.text.clone(),
        entities: tokenizer::detect_entities(&claim.text, config).into_iter().map(|e| e.text).collect(),
        numbers: tokenizer::detect_numbers(&claim.text).into_iter().map(|n| n.value).collect(),
        dates: tokenizer::detect_dates(&claim.text).into_iter().map(|d| d.surface).collect(),
        category: claim.category,
    };

    let mut evidence = Vec::new();
    for source_id in source_ids {
        let Some(adapter) = registry.get(source_id) else { continue };
        let candidates = adapter.fetch(&request, 5).await;
        evidence.extend(candidates.into_iter().map(|c| scorer::score(claim, &c, config)));
    }
    evidence
}

/// §6 "Output contract from the core": `aggregate() -> ClaimGroup[]` plus
/// contradiction flags, computed over everything a store currently holds.
pub async fn aggregate(store: &dyn ClaimStore) -> (Vec<ClaimGroup>, Vec<ContradictionFlag>) {
    orchestrator::aggregate(store).await
}

/// Runs one source through the full orchestrator and folds its failure
/// into `anyhow`, the convention this crate reserves for the orchestration
/// boundary where heterogeneous failures (extraction, persistence, host
/// application errors) would otherwise need their own umbrella enum.
pub async fn run_source(orchestrator: &Orchestrator, source_id: Uuid) -> anyhow::Result<RunCounts> {
    orchestrator.run(source_id).await.map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[tokio::test]
    async fn full_pipeline_extract_assist_aggregate() {
        let config = Config::embedded_default();
        let registry = adapters::AdapterRegistry::with_reference_adapters();
        let source_id = Uuid::new_v4();
        let segments = vec![TimedSegment {
            text: "Alphabet reported revenue of $96.5 billion in Q4 2024.".to_string(),
            start_s: 0.0,
            end_s: 5.0,
        }];

        let claims = extract(source_id, &segments, &config, chrono::Utc::now()).unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].category, Category::Finance);

        let evidence = assist(&claims[0], &config, &registry).await;
        assert!(!evidence.is_empty());

        let store = InMemoryStore::new();
        store.put_claim(claims[0].clone()).await.unwrap();
        let status = scorer::claim_auto_status(&evidence);
        store.put_evidence(claims[0].id, evidence, status).await.unwrap();

        let (groups, _flags) = aggregate(&store).await;
        assert_eq!(groups.len(), 1);
    }
}
