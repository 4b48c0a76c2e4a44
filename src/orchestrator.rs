//! Orchestrator (4.I): async driver that turns one source's segments into
//! persisted claims, evidence, and auto-statuses (§5 Concurrency & Resource
//! Model, §7 Error Handling Design).
//!
//! The extractor, router, and scorer stay pure and synchronous; this is the
//! only module that touches `tokio`, deadlines, or the store. Grounded on
//! the reference pipeline's `iterations/v3/workers/src/multimodal_scheduler.rs`
//! (`Arc<Semaphore>`-bounded concurrent job fan-out) and the per-source drive
//! shape of `iterations/v3/orchestration/src/orchestrate.rs`, adapted here to
//! `futures::stream::buffered` so a single claim's adapter fetches run
//! concurrently while their results land back in router-sorted order.

use crate::adapters::{AdapterRegistry, AdapterRequest};
use crate::config::Config;
use crate::error::OrchestratorError;
use crate::store::ClaimStore;
use crate::types::{Claim, ClaimErrorTag, RunCounts, TimedSegment};
use crate::{aggregator, extractor, router, scorer};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use uuid::Uuid;

/// Bounded concurrency cap for adapter fan-out per claim (§5, default 4).
const FANOUT_CONCURRENCY: usize = 4;

/// External collaborator supplying a source's ordered transcript segments
/// (§6 "Input contract"). The core never fetches or produces segments
/// itself.
#[async_trait]
pub trait SegmentProvider: Send + Sync {
    async fn list_segments(&self, source_id: Uuid) -> Vec<TimedSegment>;
}

pub struct Orchestrator {
    config: Arc<Config>,
    segments: Arc<dyn SegmentProvider>,
    registry: Arc<AdapterRegistry>,
    store: Arc<dyn ClaimStore>,
    deadline: Duration,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        segments: Arc<dyn SegmentProvider>,
        registry: Arc<AdapterRegistry>,
        store: Arc<dyn ClaimStore>,
        deadline: Duration,
    ) -> Self {
        Self { config, segments, registry, store, deadline }
    }

    /// Runs the full 4.I pipeline for one source and returns its run counts.
    /// Input malformation (§7) fails the whole source with no partial
    /// claims persisted; every other failure mode is absorbed per-claim.
    pub async fn run(&self, source_id: Uuid) -> Result<RunCounts, OrchestratorError> {
        let segments = self.segments.list_segments(source_id).await;
        let now = chrono::Utc::now();
        let claims = extractor::extract(source_id, &segments, &self.config, now).map_err(|err| {
            tracing::warn!(%source_id, %err, "extraction failed, no claims persisted for this source");
            OrchestratorError::ExtractionFailed { source_id, reason: err.to_string() }
        })?;

        for claim in &claims {
            if let Err(err) = self.store.put_claim(claim.clone()).await {
                tracing::warn!(%source_id, claim_id = %claim.id, %err, "claim persistence failed");
                self.store
                    .record_error(ClaimErrorTag {
                        claim_id: claim.id,
                        stage: "persist_claim".to_string(),
                        reason: err.to_string(),
                    })
                    .await;
            }
        }

        let deadline_at = Instant::now() + self.deadline;
        for claim in &claims {
            if Instant::now() >= deadline_at {
                tracing::debug!(claim_id = %claim.id, "deadline exceeded, claim left unknown");
                continue;
            }
            self.process_claim(claim, deadline_at).await;
        }

        Ok(self.run_counts_best_effort(source_id).await)
    }

    async fn process_claim(&self, claim: &Claim, deadline_at: Instant) {
        let remaining = deadline_at.saturating_duration_since(Instant::now());
        let fan_out = self.fan_out(claim);

        let evidence = match timeout(remaining, fan_out).await {
            Ok(evidence) => evidence,
            Err(_) => {
                tracing::debug!(claim_id = %claim.id, "adapter fan-out cancelled at deadline");
                Vec::new()
            }
        };

        let status = scorer::claim_auto_status(&evidence);
        if let Err(err) = self.store.put_evidence(claim.id, evidence, status).await {
            tracing::warn!(claim_id = %claim.id, %err, "evidence persistence failed, claim left in prior state");
            self.store
                .record_error(ClaimErrorTag {
                    claim_id: claim.id,
                    stage: "persist_evidence".to_string(),
                    reason: err.to_string(),
                })
                .await;
        }
    }

    /// §4.E -> §4.F -> §4.G for a single claim: route to a source list,
    /// fetch each concurrently (bounded, `buffered` preserves router order
    /// in the result stream even though fetches may complete out of order),
    /// then score every returned candidate.
    async fn fan_out(&self, claim: &Claim) -> Vec<crate::types::ScoredEvidence> {
        let source_ids = router::route(claim, &self.config);
        let request = AdapterRequest {
            claim_text: claim.text.clone(),
            entities: crate::tokenizer::detect_entities(&claim.text, &self.config)
                .into_iter()
                .map(|e| e.text)
                .collect(),
            numbers: crate::tokenizer::detect_numbers(&claim.text).into_iter().map(|n| n.value).collect(),
            dates: crate::tokenizer::detect_dates(&claim.text).into_iter().map(|d| d.surface).collect(),
            category: claim.category,
        };

        let now_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let tasks = source_ids.into_iter().map(|source_id| {
            let request = request.clone();
            async move {
                if !self.registry.try_acquire(source_id, now_millis) {
                    tracing::debug!(claim_id = %claim.id, ?source_id, "rate limit exhausted, skipping adapter");
                    return Vec::new();
                }
                let Some(adapter) = self.registry.get(source_id) else {
                    return Vec::new();
                };
                match timeout(crate::adapters::ADAPTER_TIMEOUT, adapter.fetch(&request, 5)).await {
                    Ok(candidates) => candidates,
                    Err(_) => {
                        tracing::debug!(claim_id = %claim.id, ?source_id, "adapter fetch timed out");
                        Vec::new()
                    }
                }
            }
        });

        let candidates: Vec<_> = stream::iter(tasks).buffered(FANOUT_CONCURRENCY).collect().await;
        candidates
            .into_iter()
            .flatten()
            .map(|candidate| scorer::score(claim, &candidate, &self.config))
            .collect()
    }

    async fn run_counts_best_effort(&self, source_id: Uuid) -> RunCounts {
        let claims = self.store.claims_for_source(source_id).await;
        let mut counts = RunCounts::default();
        for claim in &claims {
            counts.extracted += 1;
            let evidence = self.store.evidence_for_claim(claim.id).await;
            if !evidence.is_empty() {
                counts.evidenced += 1;
            }
            match claim.status {
                crate::types::ClaimStatus::Supported => counts.supported += 1,
                crate::types::ClaimStatus::Partial => counts.partial += 1,
                crate::types::ClaimStatus::Unknown => counts.unknown += 1,
                crate::types::ClaimStatus::Contradicted => {}
            }
        }
        counts
    }
}

/// Cross-source view built from everything a store holds, per §6
/// `aggregate() -> ClaimGroup[]` plus contradiction flags.
pub async fn aggregate(
    store: &dyn ClaimStore,
) -> (Vec<crate::types::ClaimGroup>, Vec<crate::types::ContradictionFlag>) {
    let claims = store.all_claims().await;
    let sources = store.all_sources().await;
    let groups = aggregator::group_claims(&claims, &sources);
    let flags = aggregator::contradiction_flags(&groups, &claims);
    (groups, flags)
}
