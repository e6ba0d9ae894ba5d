//! In-memory provider for tests and offline runs
//!
//! Returns canned properties, metric snapshots, and listings the way a real
//! control-plane client would. Metric responses can additionally be queued
//! per resource, drained in call order, so successive fetches against the
//! same resource observe distinct values.

use super::{ProviderError, ResourceProvider};
use crate::models::{MetricSnapshot, ResourceProperties, ResourceSummary};
use crate::resource_id::ResourceId;
use async_trait::async_trait;
use chrono::Duration;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// In-memory [`ResourceProvider`] implementation
#[derive(Default)]
pub struct MockProvider {
    properties: HashMap<String, ResourceProperties>,
    metrics: HashMap<String, MetricSnapshot>,
    queued_metrics: Mutex<HashMap<String, VecDeque<MetricSnapshot>>>,
    listings: HashMap<String, Vec<ResourceSummary>>,
    failing: HashSet<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the configuration snapshot for a resource
    pub fn with_properties(mut self, id: &ResourceId, properties: ResourceProperties) -> Self {
        self.properties.insert(id.to_string(), properties);
        self
    }

    /// Register the static metric snapshot for a resource
    ///
    /// Returned once any queued responses have drained.
    pub fn with_metrics(mut self, id: &ResourceId, snapshot: MetricSnapshot) -> Self {
        self.metrics.insert(id.to_string(), snapshot);
        self
    }

    /// Queue a one-shot metric response, consumed in call order
    pub fn push_metrics(mut self, id: &ResourceId, snapshot: MetricSnapshot) -> Self {
        self.queued_metrics
            .get_mut()
            .expect("metrics queue poisoned")
            .entry(id.to_string())
            .or_default()
            .push_back(snapshot);
        self
    }

    /// Register the instance listing for a subscription
    pub fn with_listing(mut self, subscription_id: &str, resources: Vec<ResourceSummary>) -> Self {
        self.listings.insert(subscription_id.to_string(), resources);
        self
    }

    /// Make every call against this resource fail with a transport error
    pub fn with_transport_failure(mut self, id: &ResourceId) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    fn pop_queued(&self, key: &str) -> Option<MetricSnapshot> {
        self.queued_metrics
            .lock()
            .expect("metrics queue poisoned")
            .get_mut(key)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl ResourceProvider for MockProvider {
    async fn fetch_properties(
        &self,
        id: &ResourceId,
    ) -> Result<ResourceProperties, ProviderError> {
        let key = id.to_string();
        if self.failing.contains(&key) {
            return Err(ProviderError::Transport(format!(
                "connection reset fetching properties for {key}"
            )));
        }
        self.properties
            .get(&key)
            .cloned()
            .ok_or(ProviderError::ResourceNotFound(key))
    }

    async fn fetch_metrics(
        &self,
        id: &ResourceId,
        metric_names: &[&str],
        _window: Duration,
    ) -> Result<MetricSnapshot, ProviderError> {
        let key = id.to_string();
        if self.failing.contains(&key) {
            return Err(ProviderError::Transport(format!(
                "connection reset fetching metrics for {key}"
            )));
        }
        if let Some(snapshot) = self.pop_queued(&key) {
            return Ok(snapshot.select(metric_names));
        }
        if let Some(snapshot) = self.metrics.get(&key) {
            return Ok(snapshot.select(metric_names));
        }
        if self.properties.contains_key(&key) {
            // Known resource with no metric data in the window.
            return Ok(MetricSnapshot::new());
        }
        Err(ProviderError::ResourceNotFound(key))
    }

    async fn list_resources(
        &self,
        subscription_id: &str,
    ) -> Result<Vec<ResourceSummary>, ProviderError> {
        Ok(self.listings.get(subscription_id).cloned().unwrap_or_default())
    }
}
