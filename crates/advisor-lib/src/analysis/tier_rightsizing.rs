//! Tier and SKU rightsizing analysis
//!
//! Flags gateway instances whose sustained utilization sits below the
//! downgrade threshold, and Premium instances whose only Premium-tier
//! feature in use is VNet integration, which Standard_v2 also offers.

use crate::config::AdvisorConfig;
use crate::models::{
    MetricSnapshot, Recommendation, RecommendationPayload, RecommendationType,
    ResourceProperties, SkuTier, CAPACITY_METRIC,
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
const SOURCE_NODE: &str = "TierRightsizingStep";

/// Tier recommended to Premium instances whose only Premium feature in use
/// is VNet integration
const VNET_MIGRATION_TARGET: SkuTier = SkuTier::StandardV2;

/// Analyzes gateway instances for tier and SKU rightsizing opportunities
///
/// Evaluates each resource in the state independently. The two rules are
/// not mutually exclusive; a single resource can yield zero, one, or two
/// recommendations. A provider failure on one resource is logged and the
/// remaining resources are still evaluated.
pub struct TierRightsizingStep {
    provider: Arc<dyn ResourceProvider>,
    config: AdvisorConfig,
    metrics: AdvisorMetrics,
    logger: StructuredLogger,
}

impl TierRightsizingStep {
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

    /// Evaluate both rightsizing rules for a single resource
    async fn evaluate_resource(
        &self,
        id: &ResourceId,
    ) -> Result<Vec<Recommendation>, ProviderError> {
        let properties = self.provider.fetch_properties(id).await?;
        let metrics = self
            .provider
            .fetch_metrics(id, &[CAPACITY_METRIC], self.config.metrics_window())
            .await?;

        let mut recommendations = Vec::new();
        if let Some(rec) = self.underutilization_rule(id, &properties, &metrics) {
            recommendations.push(rec);
        }
        if let Some(rec) = self.vnet_migration_rule(id, &properties) {
            recommendations.push(rec);
        }
        Ok(recommendations)
    }

    /// Sustained P95 capacity below the downgrade threshold
    fn underutilization_rule(
        &self,
        id: &ResourceId,
        properties: &ResourceProperties,
        metrics: &MetricSnapshot,
    ) -> Option<Recommendation> {
        let p95_capacity = match metrics.capacity() {
            Some(value) => value,
            None => {
                self.logger
                    .log_resource_skipped(&properties.name, "no Capacity data in window");
                return None;
            }
        };

        if p95_capacity >= self.config.capacity_downgrade_threshold {
            debug!(
                resource = %properties.name,
                p95_capacity = p95_capacity,
                "Utilization above downgrade threshold"
            );
            return None;
        }

        let details = format!(
            "Instance shows a sustained 95th percentile Capacity of {:.1}% over the past {} days, below the {:.0}% downgrade threshold.",
            p95_capacity, self.config.metrics_window_days, self.config.capacity_downgrade_threshold
        );
        Some(Recommendation::pending(
            RecommendationType::TierChange,
            &properties.name,
            id.to_string(),
            details,
            SOURCE_NODE,
            RecommendationPayload::TierDowngrade {
                current_sku: properties.sku.clone(),
                p95_capacity,
                recommended_action: "downgrade".to_string(),
            },
        ))
    }

    /// Premium with VNet enabled but no additional locations
    fn vnet_migration_rule(
        &self,
        id: &ResourceId,
        properties: &ResourceProperties,
    ) -> Option<Recommendation> {
        if properties.sku.tier != SkuTier::Premium
            || !properties.virtual_network_type.is_enabled()
            || properties.is_multi_region()
        {
            return None;
        }

        let details = format!(
            "Premium instance uses VNet integration without additional locations; the {} tier supports VNet at a lower cost.",
            VNET_MIGRATION_TARGET
        );
        Some(Recommendation::pending(
            RecommendationType::TierChange,
            &format!("{}-vnet", properties.name),
            id.to_string(),
            details,
            SOURCE_NODE,
            RecommendationPayload::TierMigration {
                current_sku: properties.sku.clone(),
                recommended_sku: VNET_MIGRATION_TARGET,
            },
        ))
    }
}

#[async_trait]
impl AnalysisStep for TierRightsizingStep {
    fn name(&self) -> &str {
        SOURCE_NODE
    }

    async fn run(&self, state: &PipelineState) -> Result<StateUpdate> {
        let mut recommendations = state.recommendations.clone();

        if state.resources.is_empty() {
            info!("No resources to analyze for tier rightsizing");
            return Ok(StateUpdate { recommendations });
        }

        info!(
            resources = state.resources.len(),
            "Analyzing resources for tier rightsizing"
        );
        for id in &state.resources {
            match self.evaluate_resource(id).await {
                Ok(new) => recommendations.extend(new),
                Err(error) => {
                    self.metrics.inc_provider_errors();
                    self.logger.log_provider_error(&id.to_string(), &error.to_string());
                }
            }
        }

        Ok(StateUpdate { recommendations })
    }
}
