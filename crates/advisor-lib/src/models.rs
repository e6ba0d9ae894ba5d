//! Core data models for the cost advisor

use crate::resource_id::ResourceId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Metric name carrying the gateway utilization percentile
pub const CAPACITY_METRIC: &str = "Capacity";

/// Provisioning tier of an API gateway instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkuTier {
    Developer,
    Basic,
    Standard,
    #[serde(rename = "Standard_v2")]
    StandardV2,
    Premium,
}

impl fmt::Display for SkuTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkuTier::Developer => "Developer",
            SkuTier::Basic => "Basic",
            SkuTier::Standard => "Standard",
            SkuTier::StandardV2 => "Standard_v2",
            SkuTier::Premium => "Premium",
        };
        f.write_str(name)
    }
}

/// SKU of an instance: tier plus provisioned unit count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sku {
    #[serde(rename = "name")]
    pub tier: SkuTier,
    pub capacity: u32,
}

/// Virtual network integration mode of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VirtualNetworkType {
    None,
    External,
    Internal,
}

impl VirtualNetworkType {
    /// Returns true if any VNet integration is configured
    pub fn is_enabled(&self) -> bool {
        !matches!(self, VirtualNetworkType::None)
    }
}

/// Configuration snapshot of a gateway instance at evaluation time
///
/// Immutable once fetched; steps fetch a fresh snapshot per resource
/// rather than sharing a cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProperties {
    pub name: String,
    pub sku: Sku,
    pub virtual_network_type: VirtualNetworkType,
    /// Secondary region deployments; non-empty means multi-region
    pub additional_locations: Vec<String>,
}

impl ResourceProperties {
    pub fn is_multi_region(&self) -> bool {
        !self.additional_locations.is_empty()
    }
}

/// Summary element of a scope-wide resource listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub id: ResourceId,
    pub name: String,
    pub sku: Sku,
}

/// P95 metric values keyed by metric name
///
/// Absence of a metric name means the provider had no data for it in the
/// window, never an implicit zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot(HashMap<String, f64>);

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric value
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// Value for a metric name, if the provider had data for it
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Convenience accessor for the capacity percentile
    pub fn capacity(&self) -> Option<f64> {
        self.get(CAPACITY_METRIC)
    }

    /// Retain only the named metrics
    pub fn select(&self, names: &[&str]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, f64)> for MetricSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Kind of cost-optimization recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    TierChange,
    InstanceConsolidate,
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecommendationType::TierChange => "TIER_CHANGE",
            RecommendationType::InstanceConsolidate => "INSTANCE_CONSOLIDATE",
        };
        f.write_str(name)
    }
}

/// Approval lifecycle of a recommendation
///
/// The pipeline only ever creates records in `PendingApproval`; the
/// remaining states are owned by external approval tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    PendingApproval,
    Approved,
    Rejected,
}

/// Migration complexity estimate for a consolidation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityScore {
    Low,
    Medium,
    High,
}

impl ComplexityScore {
    /// Step function of how many instances fold into the merged one
    pub fn for_candidate_count(count: usize) -> Self {
        if count <= 3 {
            ComplexityScore::Low
        } else if count <= 5 {
            ComplexityScore::Medium
        } else {
            ComplexityScore::High
        }
    }
}

impl fmt::Display for ComplexityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComplexityScore::Low => "Low",
            ComplexityScore::Medium => "Medium",
            ComplexityScore::High => "High",
        };
        f.write_str(name)
    }
}

/// Structured evidence attached to a recommendation, shaped per analysis
/// concern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecommendationPayload {
    /// Sustained utilization sits below the downgrade threshold
    TierDowngrade {
        current_sku: Sku,
        p95_capacity: f64,
        recommended_action: String,
    },
    /// Premium features unused apart from VNet integration
    TierMigration {
        current_sku: Sku,
        recommended_sku: SkuTier,
    },
    /// Several underutilized instances can merge into one
    Consolidation {
        candidate_instances: Vec<String>,
        estimated_capacity_for_new_instance: String,
        migration_complexity_score: ComplexityScore,
    },
}

/// The advisor's sole externally meaningful output artifact
///
/// Append-only: once created a recommendation is never mutated by the
/// pipeline. Approval or rejection happens in external tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// `REC-<TYPE>-<key>`; uniqueness is not enforced across re-runs
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    /// The resource or scope the recommendation targets
    pub resource_id: String,
    pub details: String,
    pub status: RecommendationStatus,
    /// Analysis step that produced the record
    pub source_node: String,
    pub payload: RecommendationPayload,
    pub generated_at: i64,
}

impl Recommendation {
    /// Build a pending recommendation, deriving the id from the
    /// `REC-<TYPE>-<key>` convention
    pub fn pending(
        kind: RecommendationType,
        key: &str,
        resource_id: impl Into<String>,
        details: impl Into<String>,
        source_node: &str,
        payload: RecommendationPayload,
    ) -> Self {
        Self {
            id: format!("REC-{}-{}", kind, key),
            kind,
            resource_id: resource_id.into(),
            details: details.into(),
            status: RecommendationStatus::PendingApproval,
            source_node: source_node.to_string(),
            payload,
            generated_at: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complexity_score_bands() {
        assert_eq!(ComplexityScore::for_candidate_count(1), ComplexityScore::Low);
        assert_eq!(ComplexityScore::for_candidate_count(2), ComplexityScore::Low);
        assert_eq!(ComplexityScore::for_candidate_count(3), ComplexityScore::Low);
        assert_eq!(ComplexityScore::for_candidate_count(4), ComplexityScore::Medium);
        assert_eq!(ComplexityScore::for_candidate_count(5), ComplexityScore::Medium);
        assert_eq!(ComplexityScore::for_candidate_count(6), ComplexityScore::High);
        assert_eq!(ComplexityScore::for_candidate_count(12), ComplexityScore::High);
    }

    #[test]
    fn test_recommendation_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecommendationType::TierChange).unwrap(),
            "\"TIER_CHANGE\""
        );
        assert_eq!(
            serde_json::to_string(&RecommendationType::InstanceConsolidate).unwrap(),
            "\"INSTANCE_CONSOLIDATE\""
        );
    }

    #[test]
    fn test_sku_tier_wire_names() {
        assert_eq!(serde_json::to_string(&SkuTier::StandardV2).unwrap(), "\"Standard_v2\"");
        assert_eq!(SkuTier::StandardV2.to_string(), "Standard_v2");

        let sku: Sku = serde_json::from_str(r#"{"name": "Premium", "capacity": 2}"#).unwrap();
        assert_eq!(sku.tier, SkuTier::Premium);
        assert_eq!(sku.capacity, 2);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecommendationStatus::PendingApproval).unwrap(),
            "\"pending_approval\""
        );
    }

    #[test]
    fn test_metric_snapshot_absence_is_not_zero() {
        let snapshot = MetricSnapshot::new().with_metric(CAPACITY_METRIC, 22.5);
        assert_eq!(snapshot.capacity(), Some(22.5));
        assert_eq!(snapshot.get("CpuPercentage"), None);

        let empty = MetricSnapshot::new();
        assert_eq!(empty.capacity(), None);
    }

    #[test]
    fn test_metric_snapshot_select() {
        let snapshot = MetricSnapshot::new()
            .with_metric(CAPACITY_METRIC, 60.0)
            .with_metric("Requests", 5_000_000.0);

        let selected = snapshot.select(&[CAPACITY_METRIC]);
        assert_eq!(selected.capacity(), Some(60.0));
        assert_eq!(selected.get("Requests"), None);
    }

    #[test]
    fn test_recommendation_id_convention() {
        let rec = Recommendation::pending(
            RecommendationType::TierChange,
            "apim-prod-eus",
            "/subscriptions/s/resourceGroups/rg/providers/p/service/apim-prod-eus",
            "details",
            "TierRightsizingStep",
            RecommendationPayload::TierDowngrade {
                current_sku: Sku { tier: SkuTier::Premium, capacity: 2 },
                p95_capacity: 22.5,
                recommended_action: "downgrade".to_string(),
            },
        );
        assert_eq!(rec.id, "REC-TIER_CHANGE-apim-prod-eus");
        assert_eq!(rec.status, RecommendationStatus::PendingApproval);

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "TIER_CHANGE");
        assert_eq!(json["payload"]["kind"], "tier_downgrade");
        assert_eq!(json["payload"]["p95_capacity"], 22.5);
    }
}
