//! Persistence trait and in-memory reference implementation (§5
//! "Persistence", §6 "Persisted state").
//!
//! `claim-extraction` itself has no storage layer of its own — the
//! reference pipeline delegates persistence to its sibling
//! `agent-agency-database` crate via a small async trait at the boundary.
//! This mirrors that seam: a narrow `ClaimStore` trait the orchestrator
//! depends on, with an `InMemoryStore` reference implementation standing in
//! for a real database so the crate is runnable and testable standalone.

use crate::types::{Claim, ClaimErrorTag, ScoredEvidence, Source};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate claim content hash for source {source_id}: {content_hash}")]
    DuplicateContentHash { source_id: Uuid, content_hash: String },
    #[error("duplicate evidence url for claim {claim_id}: {url}")]
    DuplicateEvidenceUrl { claim_id: Uuid, url: String },
    #[error("unknown claim id {0}")]
    UnknownClaim(Uuid),
}

/// §5 "Persistence": the store must guarantee atomic per-claim writes (the
/// claim, its evidence, and its auto-status land in one transaction) so a
/// partial crash leaves a claim either fully unprocessed or fully
/// processed. §6 schema requirement: uniqueness of `(source_id,
/// claim.content_hash)` and `(claim_id, candidate.url)`, and indexability
/// of `global_hash`.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn put_source(&self, source: Source);
    async fn put_claim(&self, claim: Claim) -> Result<(), StoreError>;

    /// Persists a claim's evidence set and resulting auto-status as one
    /// atomic unit; a failure here must not leave the claim's prior state
    /// (if any) mutated.
    async fn put_evidence(
        &self,
        claim_id: Uuid,
        evidence: Vec<ScoredEvidence>,
        status: crate::types::ClaimStatus,
    ) -> Result<(), StoreError>;

    async fn record_error(&self, tag: ClaimErrorTag);

    async fn get_claim(&self, claim_id: Uuid) -> Option<Claim>;
    async fn claims_for_source(&self, source_id: Uuid) -> Vec<Claim>;
    async fn all_claims(&self) -> Vec<Claim>;
    async fn all_sources(&self) -> HashMap<Uuid, Source>;
    async fn evidence_for_claim(&self, claim_id: Uuid) -> Vec<ScoredEvidence>;
}

#[derive(Default)]
struct Inner {
    sources: HashMap<Uuid, Source>,
    claims: HashMap<Uuid, Claim>,
    content_hash_index: HashMap<(Uuid, String), Uuid>,
    evidence_url_index: HashMap<(Uuid, String), ()>,
    evidence: HashMap<Uuid, Vec<ScoredEvidence>>,
    errors: Vec<ClaimErrorTag>,
}

/// Reference `ClaimStore` backed by an in-process mutex-guarded map.
/// Sufficient for tests and single-process runs; a production deployment
/// swaps this for a real transactional store behind the same trait.
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    pub fn run_counts(&self, source_id: Uuid) -> crate::types::RunCounts {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut counts = crate::types::RunCounts::default();
        for claim in inner.claims.values().filter(|c| c.source_id == source_id) {
            counts.extracted += 1;
            let has_evidence = inner.evidence.get(&claim.id).map(|e| !e.is_empty()).unwrap_or(false);
            if has_evidence {
                counts.evidenced += 1;
            }
            match claim.status {
                crate::types::ClaimStatus::Supported => counts.supported += 1,
                crate::types::ClaimStatus::Partial => counts.partial += 1,
                crate::types::ClaimStatus::Unknown => counts.unknown += 1,
                crate::types::ClaimStatus::Contradicted => {}
            }
        }
        counts.errored = inner.errors.iter().filter(|e| {
            inner.claims.get(&e.claim_id).map(|c| c.source_id == source_id).unwrap_or(false)
        }).count() as u32;
        counts
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClaimStore for InMemoryStore {
    async fn put_source(&self, source: Source) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.sources.insert(source.id, source);
    }

    async fn put_claim(&self, claim: Claim) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let key = (claim.source_id, claim.content_hash.clone());
        if inner.content_hash_index.contains_key(&key) {
            return Err(StoreError::DuplicateContentHash {
                source_id: claim.source_id,
                content_hash: claim.content_hash,
            });
        }
        inner.content_hash_index.insert(key, claim.id);
        inner.claims.insert(claim.id, claim);
        Ok(())
    }

    async fn put_evidence(
        &self,
        claim_id: Uuid,
        evidence: Vec<ScoredEvidence>,
        status: crate::types::ClaimStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        if !inner.claims.contains_key(&claim_id) {
            return Err(StoreError::UnknownClaim(claim_id));
        }
        for item in &evidence {
            let key = (claim_id, item.candidate.url.clone());
            if inner.evidence_url_index.contains_key(&key) {
                return Err(StoreError::DuplicateEvidenceUrl { claim_id, url: item.candidate.url.clone() });
            }
        }
        for item in &evidence {
            inner.evidence_url_index.insert((claim_id, item.candidate.url.clone()), ());
        }
        inner.evidence.insert(claim_id, evidence);
        if let Some(claim) = inner.claims.get_mut(&claim_id) {
            claim.status = status;
        }
        Ok(())
    }

    async fn record_error(&self, tag: ClaimErrorTag) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.errors.push(tag);
    }

    async fn get_claim(&self, claim_id: Uuid) -> Option<Claim> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.claims.get(&claim_id).cloned()
    }

    async fn claims_for_source(&self, source_id: Uuid) -> Vec<Claim> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.claims.values().filter(|c| c.source_id == source_id).cloned().collect()
    }

    async fn all_claims(&self) -> Vec<Claim> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.claims.values().cloned().collect()
    }

    async fn all_sources(&self) -> HashMap<Uuid, Source> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.sources.clone()
    }

    async fn evidence_for_claim(&self, claim_id: Uuid) -> Vec<ScoredEvidence> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.evidence.get(&claim_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClaimStatus, ConfidenceLanguage, Category};
    use chrono::Utc;

    fn claim(source_id: Uuid, content_hash: &str) -> Claim {
        Claim {
            id: Uuid::new_v4(),
            source_id,
            text: "Alphabet reported revenue growth.".to_string(),
            start_s: 0.0,
            end_s: 1.0,
            content_hash: content_hash.to_string(),
            global_hash: content_hash.to_string(),
            confidence_language: ConfidenceLanguage::Definitive,
            category: Category::Finance,
            signal_log: vec![],
            status: ClaimStatus::Unknown,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_content_hash_within_source_is_rejected() {
        let store = InMemoryStore::new();
        let source_id = Uuid::new_v4();
        store.put_claim(claim(source_id, "h1")).await.unwrap();
        let err = store.put_claim(claim(source_id, "h1")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateContentHash { .. }));
    }

    #[tokio::test]
    async fn same_content_hash_allowed_across_different_sources() {
        let store = InMemoryStore::new();
        store.put_claim(claim(Uuid::new_v4(), "h1")).await.unwrap();
        store.put_claim(claim(Uuid::new_v4(), "h1")).await.unwrap();
    }

    #[tokio::test]
    async fn evidence_write_requires_existing_claim() {
        let store = InMemoryStore::new();
        let err = store.put_evidence(Uuid::new_v4(), vec![], ClaimStatus::Unknown).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownClaim(_)));
    }

    #[tokio::test]
    async fn run_counts_reflect_persisted_status() {
        let store = InMemoryStore::new();
        let source_id = Uuid::new_v4();
        let c = claim(source_id, "h1");
        let claim_id = c.id;
        store.put_claim(c).await.unwrap();
        store.put_evidence(claim_id, vec![], ClaimStatus::Supported).await.unwrap();
        let counts = store.run_counts(source_id);
        assert_eq!(counts.extracted, 1);
        assert_eq!(counts.supported, 1);
    }
}
