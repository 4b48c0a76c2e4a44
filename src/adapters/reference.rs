//! Illustrative evidence-source adapters (§4.F).
//!
//! `claim-extraction` has no network-adapter equivalent of its own; these
//! follow the shape of `claim-extraction/src/evidence.rs`'s
//! `EvidenceCollector` methods (e.g. `run_clippy_analysis`, which returns a
//! canned `Evidence` record without a real external call) — a canned
//! in-memory responder plus a deterministic mock used across the test
//! suite, both honoring the `fetch` contract without ever touching the
//! network.

use super::{AdapterRequest, EvidenceSourceAdapter};
use crate::types::{EvidenceCandidate, EvidenceType, SourceId};
use async_trait::async_trait;
use chrono::Utc;

/// Returns a fixed set of candidates regardless of the request, useful for
/// wiring a source into the registry before its real client exists.
pub struct StaticAdapter {
    source_id: SourceId,
    evidence_type: EvidenceType,
    candidates: Vec<EvidenceCandidate>,
}

impl StaticAdapter {
    pub fn new(source_id: SourceId, evidence_type: EvidenceType, candidates: Vec<EvidenceCandidate>) -> Self {
        Self { source_id, evidence_type, candidates }
    }

    /// An adapter with no canned candidates: a source that is registered but
    /// never actually returns evidence (used for sources whose real client
    /// has not been implemented yet).
    pub fn empty(source_id: SourceId, evidence_type: EvidenceType) -> Self {
        Self::new(source_id, evidence_type, Vec::new())
    }
}

#[async_trait]
impl EvidenceSourceAdapter for StaticAdapter {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn evidence_type(&self) -> EvidenceType {
        self.evidence_type
    }

    async fn fetch(&self, _request: &AdapterRequest, max_candidates: usize) -> Vec<EvidenceCandidate> {
        self.candidates.iter().take(max_candidates).cloned().collect()
    }
}

/// A mock adapter whose single candidate echoes the request's own entities
/// and numbers back as matches, so scorer tests can exercise the matching
/// logic end to end without a real evidence source.
pub struct MockAdapter {
    source_id: SourceId,
    evidence_type: EvidenceType,
}

impl MockAdapter {
    pub fn new(source_id: SourceId, evidence_type: EvidenceType) -> Self {
        Self { source_id, evidence_type }
    }
}

#[async_trait]
impl EvidenceSourceAdapter for MockAdapter {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn evidence_type(&self) -> EvidenceType {
        self.evidence_type
    }

    async fn fetch(&self, request: &AdapterRequest, max_candidates: usize) -> Vec<EvidenceCandidate> {
        if max_candidates == 0 {
            return Vec::new();
        }
        vec![EvidenceCandidate {
            source_api: self.source_id.as_str().to_string(),
            evidence_type: self.evidence_type,
            title: format!("Mock evidence for: {}", request.claim_text),
            snippet: request.claim_text.clone(),
            url: format!("https://example.invalid/{}", self.source_id.as_str()),
            identifier: None,
            published_at: Some(Utc::now()),
            entities: request.entities.clone(),
            numbers: request.numbers.clone(),
            keyphrases: request.entities.clone(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AdapterRequest {
        AdapterRequest {
            claim_text: "Alphabet reported revenue of $96.5 billion.".to_string(),
            entities: vec!["Alphabet".to_string()],
            numbers: vec![96.5e9],
            dates: vec![],
            category: crate::types::Category::Finance,
        }
    }

    #[tokio::test]
    async fn static_adapter_returns_up_to_max_candidates() {
        let candidate = EvidenceCandidate {
            source_api: "yahoo_finance".to_string(),
            evidence_type: EvidenceType::Secondary,
            title: "t".to_string(),
            snippet: "s".to_string(),
            url: "https://example.invalid".to_string(),
            identifier: None,
            published_at: None,
            entities: vec![],
            numbers: vec![],
            keyphrases: vec![],
        };
        let adapter = StaticAdapter::new(
            SourceId::YahooFinance,
            EvidenceType::Secondary,
            vec![candidate.clone(), candidate],
        );
        let result = adapter.fetch(&request(), 1).await;
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn empty_adapter_never_returns_candidates() {
        let adapter = StaticAdapter::empty(SourceId::Nasa, EvidenceType::Gov);
        let result = adapter.fetch(&request(), 10).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn mock_adapter_echoes_entities_and_numbers() {
        let adapter = MockAdapter::new(SourceId::SecEdgar, EvidenceType::Filing);
        let result = adapter.fetch(&request(), 5).await;
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].entities, vec!["Alphabet".to_string()]);
        assert_eq!(result[0].numbers, vec![96.5e9]);
    }

    #[tokio::test]
    async fn mock_adapter_honors_zero_max_candidates() {
        let adapter = MockAdapter::new(SourceId::SecEdgar, EvidenceType::Filing);
        let result = adapter.fetch(&request(), 0).await;
        assert!(result.is_empty());
    }
}
