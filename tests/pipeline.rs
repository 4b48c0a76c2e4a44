//! End-to-end integration test: segments in, persisted claims and
//! cross-source aggregation out, exercising the full orchestrator drive
//! rather than any single stage in isolation.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use veritas::adapters::AdapterRegistry;
use veritas::orchestrator::{Orchestrator, SegmentProvider};
use veritas::{Config, InMemoryStore, TimedSegment};

struct ScriptedSegments(Vec<TimedSegment>);

#[async_trait::async_trait]
impl SegmentProvider for ScriptedSegments {
    async fn list_segments(&self, _source_id: Uuid) -> Vec<TimedSegment> {
        self.0.clone()
    }
}

#[tokio::test]
async fn multi_source_run_groups_duplicate_claims_across_sources() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let config = Arc::new(Config::embedded_default());
    let registry = Arc::new(AdapterRegistry::with_reference_adapters());
    let store: Arc<dyn veritas::ClaimStore> = Arc::new(InMemoryStore::new());

    let segments_a = Arc::new(ScriptedSegments(vec![TimedSegment {
        text: "Alphabet reported revenue of $96.5 billion in Q4 2024.".to_string(),
        start_s: 0.0,
        end_s: 5.0,
    }]));
    let segments_b = Arc::new(ScriptedSegments(vec![TimedSegment {
        text: "Alphabet reported revenue of $96.5 billion in Q4 2024.".to_string(),
        start_s: 0.0,
        end_s: 5.0,
    }]));

    let orchestrator_a = Orchestrator::new(
        config.clone(),
        segments_a,
        registry.clone(),
        store.clone(),
        Duration::from_secs(10),
    );
    let orchestrator_b =
        Orchestrator::new(config, segments_b, registry, store.clone(), Duration::from_secs(10));

    let source_a = Uuid::new_v4();
    let source_b = Uuid::new_v4();
    let counts_a = orchestrator_a.run(source_a).await.unwrap();
    let counts_b = orchestrator_b.run(source_b).await.unwrap();

    assert_eq!(counts_a.extracted, 1);
    assert_eq!(counts_b.extracted, 1);

    let (groups, _flags) = veritas::aggregate(store.as_ref()).await;
    assert_eq!(groups.len(), 1, "identical claims from two sources should merge into one group");
    assert_eq!(groups[0].source_ids.len(), 2);
}

#[tokio::test]
async fn malformed_segments_fail_the_whole_source_with_no_partial_claims() {
    let config = Arc::new(Config::embedded_default());
    let registry = Arc::new(AdapterRegistry::with_reference_adapters());
    let store: Arc<dyn veritas::ClaimStore> = Arc::new(InMemoryStore::new());

    let out_of_order = Arc::new(ScriptedSegments(vec![
        TimedSegment { text: "Second segment text here.".to_string(), start_s: 10.0, end_s: 12.0 },
        TimedSegment { text: "First segment text here.".to_string(), start_s: 0.0, end_s: 2.0 },
    ]));

    let orchestrator = Orchestrator::new(config, out_of_order, registry, store.clone(), Duration::from_secs(5));
    let source_id = Uuid::new_v4();
    let result = orchestrator.run(source_id).await;

    assert!(result.is_err());
    assert!(store.claims_for_source(source_id).await.is_empty());
}

#[tokio::test]
async fn distinct_claims_in_different_categories_route_to_their_category_defaults() {
    let config = Arc::new(Config::embedded_default());
    let registry = Arc::new(AdapterRegistry::with_reference_adapters());
    let store: Arc<dyn veritas::ClaimStore> = Arc::new(InMemoryStore::new());

    let segments = Arc::new(ScriptedSegments(vec![
        TimedSegment {
            text: "Alphabet reported revenue of $96.5 billion in Q4 2024.".to_string(),
            start_s: 0.0,
            end_s: 5.0,
        },
        TimedSegment {
            text: "LDL cholesterol levels above 160 mg/dL are associated with cardiovascular risk in patients."
                .to_string(),
            start_s: 6.0,
            end_s: 11.0,
        },
    ]));

    let orchestrator = Orchestrator::new(config, segments, registry, store.clone(), Duration::from_secs(10));
    let source_id = Uuid::new_v4();
    let counts = orchestrator.run(source_id).await.unwrap();

    assert_eq!(counts.extracted, 2);
    let claims = store.claims_for_source(source_id).await;
    let categories: Vec<_> = claims.iter().map(|c| c.category).collect();
    assert!(categories.contains(&veritas::types::Category::Finance));
    assert!(categories.contains(&veritas::types::Category::Health));
}
