//! Evidence Source Adapter Interface (4.F).
//!
//! Structured the way the reference pipeline's `verification/mod.rs`
//! composes its submodules: a thin `mod.rs` that declares the internal
//! files and re-exports a narrow public surface, keeping adapter
//! implementation detail out of the orchestrator's view.
//!
//! - `registry.rs`   : flat `SourceId -> Adapter` table (Design Notes:
//!                     "avoid deep inheritance; prefer a flat registry").
//! - `resilience.rs` : per-adapter timeout + token-bucket rate limiting.
//! - `reference.rs`  : illustrative adapters exercised by the test suite.

mod reference;
mod registry;
mod resilience;

pub use reference::{MockAdapter, StaticAdapter};
pub use registry::AdapterRegistry;
pub use resilience::{RateLimiter, ADAPTER_TIMEOUT};

use crate::types::{Category, EvidenceCandidate, SourceId};
use async_trait::async_trait;

/// Input passed to an adapter's `fetch`, per §4.F "Input".
#[derive(Debug, Clone)]
pub struct AdapterRequest {
    pub claim_text: String,
    pub entities: Vec<String>,
    pub numbers: Vec<f64>,
    pub dates: Vec<String>,
    pub category: Category,
}

/// A single pluggable evidence source. Implementations must never raise
/// into the orchestrator (§4.F, §7): timeouts, rate limits, and transport
/// errors are absorbed and reported as an empty candidate list.
#[async_trait]
pub trait EvidenceSourceAdapter: Send + Sync {
    fn source_id(&self) -> SourceId;
    fn evidence_type(&self) -> crate::types::EvidenceType;

    /// Up to `max_candidates` candidates, in the adapter's native order.
    async fn fetch(&self, request: &AdapterRequest, max_candidates: usize) -> Vec<EvidenceCandidate>;
}
