//! Flat evidence-source adapter registry (§4.F, §5).
//!
//! Grounded on the Design Notes' explicit steer away from deep trait-object
//! inheritance hierarchies toward "a flat registry keyed by source id" —
//! the same shape `claim-extraction`'s `ClassifierRegistry` uses for its
//! pluggable classifiers.

use super::resilience::RateLimiter;
use super::{EvidenceSourceAdapter, MockAdapter, StaticAdapter};
use crate::types::{EvidenceType, SourceId};
use std::collections::HashMap;

struct Entry {
    adapter: Box<dyn EvidenceSourceAdapter>,
    limiter: RateLimiter,
}

/// Owns one adapter and one independent rate limiter per registered source
/// (§5: "Independent token-bucket per adapter").
pub struct AdapterRegistry {
    entries: HashMap<SourceId, Entry>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn register(&mut self, adapter: Box<dyn EvidenceSourceAdapter>) {
        let source_id = adapter.source_id();
        self.entries.insert(source_id, Entry { adapter, limiter: RateLimiter::default() });
    }

    pub fn get(&self, source_id: SourceId) -> Option<&dyn EvidenceSourceAdapter> {
        self.entries.get(&source_id).map(|entry| entry.adapter.as_ref())
    }

    /// Attempts to take a rate-limit token for `source_id` at `now_millis`.
    /// An unregistered source has no limiter and is treated as unavailable.
    pub fn try_acquire(&self, source_id: SourceId, now_millis: i64) -> bool {
        self.entries
            .get(&source_id)
            .map(|entry| entry.limiter.try_acquire(now_millis))
            .unwrap_or(false)
    }

    pub fn registered_sources(&self) -> Vec<SourceId> {
        let mut sources: Vec<SourceId> = self.entries.keys().copied().collect();
        sources.sort_by_key(|s| s.as_str());
        sources
    }

    /// All 18 sources wired to a mock adapter, exercised by the test suite
    /// and by `orchestrator` doctests. Production wiring registers real
    /// clients in their place via `register`.
    pub fn with_reference_adapters() -> Self {
        let wiring: [(SourceId, EvidenceType); 18] = [
            (SourceId::YahooFinance, EvidenceType::Secondary),
            (SourceId::SecEdgar, EvidenceType::Filing),
            (SourceId::Fred, EvidenceType::Dataset),
            (SourceId::WorldBank, EvidenceType::Dataset),
            (SourceId::Wikipedia, EvidenceType::Secondary),
            (SourceId::PubMed, EvidenceType::Paper),
            (SourceId::OpenFda, EvidenceType::Gov),
            (SourceId::ClinicalTrials, EvidenceType::Gov),
            (SourceId::Arxiv, EvidenceType::Paper),
            (SourceId::Nasa, EvidenceType::Gov),
            (SourceId::Ieee, EvidenceType::Paper),
            (SourceId::Patents, EvidenceType::Gov),
            (SourceId::Bls, EvidenceType::Dataset),
            (SourceId::Eia, EvidenceType::Dataset),
            (SourceId::UnData, EvidenceType::Dataset),
            (SourceId::FactcheckOrg, EvidenceType::Factcheck),
            (SourceId::GovinfoUs, EvidenceType::Gov),
            (SourceId::Cdc, EvidenceType::Gov),
        ];

        let mut registry = Self::new();
        for (source_id, evidence_type) in wiring {
            registry.register(Box::new(MockAdapter::new(source_id, evidence_type)));
        }
        registry
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_registry_covers_all_eighteen_sources() {
        let registry = AdapterRegistry::with_reference_adapters();
        assert_eq!(registry.registered_sources().len(), 18);
    }

    #[test]
    fn unregistered_source_has_no_adapter_and_no_tokens() {
        let registry = AdapterRegistry::new();
        assert!(registry.get(SourceId::Cdc).is_none());
        assert!(!registry.try_acquire(SourceId::Cdc, 0));
    }

    #[test]
    fn custom_adapter_replaces_nothing_but_registers_cleanly() {
        let mut registry = AdapterRegistry::new();
        registry.register(Box::new(StaticAdapter::empty(SourceId::Nasa, EvidenceType::Gov)));
        assert!(registry.get(SourceId::Nasa).is_some());
    }

    #[test]
    fn rate_limiter_exhausts_independently_per_source() {
        let registry = AdapterRegistry::with_reference_adapters();
        for _ in 0..5 {
            assert!(registry.try_acquire(SourceId::Wikipedia, 0));
        }
        assert!(!registry.try_acquire(SourceId::Wikipedia, 0));
        assert!(registry.try_acquire(SourceId::PubMed, 0));
    }
}
