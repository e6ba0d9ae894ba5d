//! Instance consolidation analysis
//!
//! Scans a whole subscription for underutilized Basic and Standard gateway
//! instances and proposes merging them into a single right-sized instance.

use crate::config::AdvisorConfig;
use crate::models::{
    ComplexityScore, Recommendation, RecommendationPayload, RecommendationType, ResourceSummary,
    SkuTier, CAPACITY_METRIC,
};
use crate::observability::{AdvisorMetrics, StructuredLogger};
use crate::pipeline::{AnalysisStep, PipelineState, StateUpdate};
use crate::provider::{ProviderError, ResourceProvider};
use crate::resource_id::ResourceId;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Step name recorded as `source_node` on emitted recommendations
const SOURCE_NODE: &str = "InstanceConsolidationStep";

/// SKU tiers eligible for consolidation
///
/// Premium instances carry dedicated features and Developer instances are
/// non-production, so neither is ever a candidate.
pub const ELIGIBLE_CONSOLIDATION_TIERS: &[SkuTier] = &[SkuTier::Basic, SkuTier::Standard];

/// Analyzes all gateway instances in a subscription for consolidation
/// opportunities
///
/// The subscription scope comes from the first resource id in the state.
/// One recommendation at most is emitted per run, targeting the whole
/// subscription rather than any single instance.
pub struct InstanceConsolidationStep {
    provider: Arc<dyn ResourceProvider>,
    config: AdvisorConfig,
    metrics: AdvisorMetrics,
    logger: StructuredLogger,
}

impl InstanceConsolidationStep {
    pub fn new(provider: Arc<dyn ResourceProvider>) -> Self {
        Self::with_config(provider, AdvisorConfig::default())
    }

    pub fn with_config(provider: Arc<dyn ResourceProvider>, config: AdvisorConfig) -> Self {
        Self {
            provider,
            config,
            metrics: AdvisorMetrics::new(),
            logger: StructuredLogger::new(SOURCE_NODE),
        }
    }

    /// Fetch the P95 capacity for an instance, if the provider has data
    async fn fetch_p95_capacity(&self, id: &ResourceId) -> Result<Option<f64>, ProviderError> {
        let snapshot = self
            .provider
            .fetch_metrics(id, &[CAPACITY_METRIC], self.config.metrics_window())
            .await?;
        Ok(snapshot.capacity())
    }

    /// Select underutilized, consolidation-eligible instances in the scope
    async fn find_candidates(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceSummary>, ProviderError> {
        let instances = self.provider.list_resources(subscription_id).await?;

        let mut candidates = Vec::new();
        for instance in instances {
            if !ELIGIBLE_CONSOLIDATION_TIERS.contains(&instance.sku.tier) {
                debug!(
                    instance = %instance.name,
                    tier = %instance.sku.tier,
                    "Skipping instance, tier not eligible for consolidation"
                );
                continue;
            }

            match self.fetch_p95_capacity(&instance.id).await {
                Ok(Some(p95)) if p95 < self.config.consolidation_capacity_threshold => {
                    debug!(
                        instance = %instance.name,
                        p95_capacity = p95,
                        "Found consolidation candidate"
                    );
                    candidates.push(instance);
                }
                Ok(Some(p95)) => {
                    debug!(
                        instance = %instance.name,
                        p95_capacity = p95,
                        "Skipping instance, not underutilized"
                    );
                }
                Ok(None) => {
                    self.logger
                        .log_resource_skipped(&instance.name, "no Capacity data in window");
                }
                Err(error) => {
                    // One unreadable instance must not sink the whole scan.
                    self.metrics.inc_provider_errors();
                    self.logger
                        .log_provider_error(&instance.id.to_string(), &error.to_string());
                }
            }
        }
        Ok(candidates)
    }

    /// Sum each candidate's freshly fetched capacity into the estimate
    ///
    /// The merged instance is sized from the values observed at estimation
    /// time, not from the earlier candidacy screen; hence the second fetch.
    /// A candidate whose value is missing or unreachable here contributes
    /// zero and stays in the candidate list.
    async fn estimate_capacity(&self, candidates: &[ResourceSummary]) -> f64 {
        let mut total = 0.0;
        for candidate in candidates {
            match self.fetch_p95_capacity(&candidate.id).await {
                Ok(Some(p95)) => total += p95,
                Ok(None) => {
                    self.logger
                        .log_resource_skipped(&candidate.name, "no Capacity data for estimate");
                }
                Err(error) => {
                    self.metrics.inc_provider_errors();
                    self.logger
                        .log_provider_error(&candidate.id.to_string(), &error.to_string());
                }
            }
        }
        total
    }
}

#[async_trait]
impl AnalysisStep for InstanceConsolidationStep {
    fn name(&self) -> &str {
        SOURCE_NODE
    }

    async fn run(&self, state: &PipelineState) -> Result<StateUpdate> {
        let mut recommendations = state.recommendations.clone();

        // The subscription scope is derived from the first resource id.
        let first = match state.resources.first() {
            Some(id) => id,
            None => {
                info!("No resources in state, cannot determine subscription scope");
                return Ok(StateUpdate { recommendations });
            }
        };
        let subscription_id = first.subscription_id.as_str();

        info!(
            subscription_id = %subscription_id,
            "Scanning subscription for consolidation candidates"
        );
        let candidates = self.find_candidates(subscription_id).await?;

        if candidates.len() < self.config.min_consolidation_candidates {
            info!(
                candidates = candidates.len(),
                "Too few consolidation candidates, nothing to recommend"
            );
            return Ok(StateUpdate { recommendations });
        }

        let estimated_capacity = self.estimate_capacity(&candidates).await;
        let candidate_instances: Vec<String> =
            candidates.iter().map(|c| c.id.to_string()).collect();
        let details = format!(
            "Found {} underutilized instances that can be consolidated into a single, right-sized instance.",
            candidates.len()
        );

        recommendations.push(Recommendation::pending(
            RecommendationType::InstanceConsolidate,
            subscription_id,
            subscription_id,
            details,
            SOURCE_NODE,
            RecommendationPayload::Consolidation {
                candidate_instances,
                estimated_capacity_for_new_instance: format!("{estimated_capacity:.2}%"),
                migration_complexity_score: ComplexityScore::for_candidate_count(candidates.len()),
            },
        ));
        Ok(StateUpdate { recommendations })
    }
}
