//! Advisor configuration

use anyhow::Result;
use chrono::Duration;
use serde::Deserialize;

/// Tunable thresholds for the analysis steps
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// P95 capacity percentage below which a tier downgrade is recommended
    #[serde(default = "default_capacity_downgrade_threshold")]
    pub capacity_downgrade_threshold: f64,

    /// P95 capacity percentage below which an instance becomes a
    /// consolidation candidate
    #[serde(default = "default_consolidation_capacity_threshold")]
    pub consolidation_capacity_threshold: f64,

    /// Minimum candidate count before a consolidation is proposed
    #[serde(default = "default_min_consolidation_candidates")]
    pub min_consolidation_candidates: usize,

    /// Trailing window, in days, for percentile metric queries
    #[serde(default = "default_metrics_window_days")]
    pub metrics_window_days: i64,
}

fn default_capacity_downgrade_threshold() -> f64 {
    40.0
}

fn default_consolidation_capacity_threshold() -> f64 {
    30.0
}

fn default_min_consolidation_candidates() -> usize {
    2
}

fn default_metrics_window_days() -> i64 {
    90
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            capacity_downgrade_threshold: default_capacity_downgrade_threshold(),
            consolidation_capacity_threshold: default_consolidation_capacity_threshold(),
            min_consolidation_candidates: default_min_consolidation_candidates(),
            metrics_window_days: default_metrics_window_days(),
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ADVISOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Metric query window as a duration
    pub fn metrics_window(&self) -> Duration {
        Duration::days(self.metrics_window_days)
    }
}
