//! Resource provider contract
//!
//! The provider is the advisor's only window onto the cloud control plane:
//! configuration snapshots, percentile metrics, and scope-wide listings.
//! All calls are read-only and have no effect on pipeline state.
//! Implementations may be slow or remote; cancellation and timeouts belong
//! to their transport layer, not to the analysis core.

pub mod mock;

pub use mock::MockProvider;

use crate::models::{MetricSnapshot, ResourceProperties, ResourceSummary};
use crate::resource_id::ResourceId;
use chrono::Duration;
use thiserror::Error;

pub use async_trait::async_trait;

/// Errors surfaced by provider implementations
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The resource id is unknown to the provider
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    /// The underlying transport failed
    #[error("provider transport error: {0}")]
    Transport(String),
}

/// Trait for cloud resource data sources
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Fetch the configuration snapshot for a resource
    async fn fetch_properties(&self, id: &ResourceId)
        -> Result<ResourceProperties, ProviderError>;

    /// Fetch P95 metric values over a trailing window
    ///
    /// The snapshot contains only the requested metrics the provider has
    /// data for; a name missing from the result means "no data", not zero.
    async fn fetch_metrics(
        &self,
        id: &ResourceId,
        metric_names: &[&str],
        window: Duration,
    ) -> Result<MetricSnapshot, ProviderError>;

    /// List all gateway instances in a subscription, in a stable order
    async fn list_resources(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceSummary>, ProviderError>;
}
