//! End-to-end pipeline tests: both analysis steps composed by the runner
//! over an in-memory provider.

use std::sync::Arc;

use advisor_lib::{
    AdvisorConfig, InstanceConsolidationStep, MetricSnapshot, MockProvider, PipelineRunner,
    PipelineState, Recommendation, RecommendationPayload, RecommendationStatus,
    RecommendationType, ResourceId, ResourceProperties, ResourceSummary, Sku, SkuTier,
    TierRightsizingStep, VirtualNetworkType, CAPACITY_METRIC,
};

const SUBSCRIPTION: &str = "sub-123";

fn resource_id(name: &str) -> ResourceId {
    format!(
        "/subscriptions/{SUBSCRIPTION}/resourceGroups/rg-prod-1/providers/Microsoft.ApiManagement/service/{name}"
    )
    .parse()
    .unwrap()
}

fn summary(name: &str, tier: SkuTier) -> ResourceSummary {
    ResourceSummary {
        id: resource_id(name),
        name: name.to_string(),
        sku: Sku { tier, capacity: 1 },
    }
}

fn capacity_snapshot(value: f64) -> MetricSnapshot {
    MetricSnapshot::new().with_metric(CAPACITY_METRIC, value)
}

/// A subscription with one overprovisioned Premium instance under analysis
/// and two underutilized Basic instances discoverable via listing.
fn sprawling_subscription() -> MockProvider {
    let prod = resource_id("apim-prod-eus");
    MockProvider::new()
        .with_properties(
            &prod,
            ResourceProperties {
                name: "apim-prod-eus".to_string(),
                sku: Sku { tier: SkuTier::Premium, capacity: 2 },
                virtual_network_type: VirtualNetworkType::External,
                additional_locations: Vec::new(),
            },
        )
        .with_metrics(&prod, capacity_snapshot(22.5))
        .with_metrics(&resource_id("apim-staging-eus"), capacity_snapshot(15.0))
        .with_metrics(&resource_id("apim-legacy-wus"), capacity_snapshot(25.0))
        .with_listing(
            SUBSCRIPTION,
            vec![
                summary("apim-prod-eus", SkuTier::Premium),
                summary("apim-dev-wus", SkuTier::Developer),
                summary("apim-staging-eus", SkuTier::Basic),
                summary("apim-legacy-wus", SkuTier::Basic),
            ],
        )
}

fn advisor_pipeline(provider: Arc<MockProvider>) -> PipelineRunner {
    PipelineRunner::new()
        .with_step(Arc::new(TierRightsizingStep::new(provider.clone())))
        .with_step(Arc::new(InstanceConsolidationStep::new(provider)))
}

#[tokio::test]
async fn test_full_pipeline_over_a_sprawling_subscription() {
    let provider = Arc::new(sprawling_subscription());
    let runner = advisor_pipeline(provider);
    let initial = PipelineState::with_resources(vec![resource_id("apim-prod-eus")]);

    let final_state = runner.run(initial).await.unwrap();

    let ids: Vec<&str> = final_state
        .recommendations
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(
        ids,
        vec![
            "REC-TIER_CHANGE-apim-prod-eus",
            "REC-TIER_CHANGE-apim-prod-eus-vnet",
            "REC-INSTANCE_CONSOLIDATE-sub-123",
        ]
    );

    for recommendation in &final_state.recommendations {
        assert_eq!(recommendation.status, RecommendationStatus::PendingApproval);
    }

    let consolidation = &final_state.recommendations[2];
    assert_eq!(consolidation.kind, RecommendationType::InstanceConsolidate);
    assert_eq!(consolidation.resource_id, SUBSCRIPTION);
    assert_eq!(consolidation.source_node, "InstanceConsolidationStep");
    match &consolidation.payload {
        RecommendationPayload::Consolidation {
            candidate_instances,
            estimated_capacity_for_new_instance,
            ..
        } => {
            assert_eq!(candidate_instances.len(), 2);
            assert_eq!(estimated_capacity_for_new_instance, "40.00%");
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn test_pipeline_appends_after_prior_recommendations() {
    let provider = Arc::new(sprawling_subscription());
    let runner = advisor_pipeline(provider);

    let seed = Recommendation::pending(
        RecommendationType::TierChange,
        "earlier-run",
        "/subscriptions/sub-999/resourceGroups/rg/providers/ns/service/earlier-run",
        "carried over from an earlier run",
        "TierRightsizingStep",
        RecommendationPayload::TierDowngrade {
            current_sku: Sku { tier: SkuTier::Standard, capacity: 1 },
            p95_capacity: 11.0,
            recommended_action: "downgrade".to_string(),
        },
    );
    let mut initial = PipelineState::with_resources(vec![resource_id("apim-prod-eus")]);
    initial.recommendations.push(seed.clone());

    let final_state = runner.run(initial).await.unwrap();

    assert_eq!(final_state.recommendations.len(), 4);
    assert_eq!(final_state.recommendations[0], seed);
}

#[tokio::test]
async fn test_empty_state_is_a_no_op_for_the_whole_pipeline() {
    let provider = Arc::new(MockProvider::new());
    let runner = advisor_pipeline(provider);

    let final_state = runner.run(PipelineState::default()).await.unwrap();
    assert!(final_state.recommendations.is_empty());
}

#[tokio::test]
async fn test_rerunning_the_pipeline_reappends_duplicates() {
    let provider = Arc::new(sprawling_subscription());
    let runner = advisor_pipeline(provider);
    let initial = PipelineState::with_resources(vec![resource_id("apim-prod-eus")]);

    let once = runner.run(initial).await.unwrap();
    let twice = runner.run(once).await.unwrap();

    assert_eq!(twice.recommendations.len(), 6);
    assert_eq!(twice.recommendations[0].id, twice.recommendations[3].id);
}

#[tokio::test]
async fn test_raised_thresholds_change_the_verdict() {
    let provider = Arc::new(sprawling_subscription());
    let config = AdvisorConfig {
        capacity_downgrade_threshold: 20.0,
        ..AdvisorConfig::default()
    };
    let runner = PipelineRunner::new().with_step(Arc::new(TierRightsizingStep::with_config(
        provider,
        config,
    )));
    let initial = PipelineState::with_resources(vec![resource_id("apim-prod-eus")]);

    let final_state = runner.run(initial).await.unwrap();

    // 22.5% no longer clears the tightened downgrade rule; only the VNet
    // migration rule still fires.
    assert_eq!(final_state.recommendations.len(), 1);
    assert!(matches!(
        final_state.recommendations[0].payload,
        RecommendationPayload::TierMigration { .. }
    ));
}
