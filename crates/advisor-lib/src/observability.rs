//! Observability infrastructure for the cost advisor
//!
//! Provides:
//! - Prometheus metrics (step latency, recommendation and error counters)
//! - Structured logging with tracing

use crate::models::Recommendation;
use prometheus::{register_histogram, register_int_gauge, Histogram, IntGauge};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Default histogram buckets for step latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct AdvisorMetricsInner {
    step_latency_seconds: Histogram,
    recommendations_generated: IntGauge,
    provider_errors: IntGauge,
    resources_analyzed: IntGauge,
    steps_executed: IntGauge,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            step_latency_seconds: register_histogram!(
                "cost_advisor_step_latency_seconds",
                "Time spent running a single analysis step",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register step_latency_seconds"),

            recommendations_generated: register_int_gauge!(
                "cost_advisor_recommendations_generated_total",
                "Total number of recommendations generated"
            )
            .expect("Failed to register recommendations_generated"),

            provider_errors: register_int_gauge!(
                "cost_advisor_provider_errors_total",
                "Total number of failed provider calls"
            )
            .expect("Failed to register provider_errors"),

            resources_analyzed: register_int_gauge!(
                "cost_advisor_resources_analyzed",
                "Number of resources in the current pipeline run"
            )
            .expect("Failed to register resources_analyzed"),

            steps_executed: register_int_gauge!(
                "cost_advisor_steps_executed_total",
                "Total number of analysis step executions"
            )
            .expect("Failed to register steps_executed"),
        }
    }
}

/// Advisor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a step latency observation
    pub fn observe_step_latency(&self, duration_secs: f64) {
        self.inner().step_latency_seconds.observe(duration_secs);
    }

    /// Increment the recommendations generated counter
    pub fn inc_recommendations_generated(&self) {
        self.inner().recommendations_generated.inc();
    }

    /// Increment the provider errors counter
    pub fn inc_provider_errors(&self) {
        self.inner().provider_errors.inc();
    }

    /// Update the resources analyzed gauge
    pub fn set_resources_analyzed(&self, count: i64) {
        self.inner().resources_analyzed.set(count);
    }

    /// Increment the steps executed counter
    pub fn inc_steps_executed(&self) {
        self.inner().steps_executed.inc();
    }
}

/// Structured logger for advisor events
///
/// Provides consistent logging for pipeline, step, and recommendation
/// events.
#[derive(Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    /// Log the start of a pipeline run
    pub fn log_pipeline_started(&self, steps: usize, resources: usize) {
        info!(
            event = "pipeline_started",
            component = %self.component,
            steps = steps,
            resources = resources,
            "Starting analysis pipeline"
        );
    }

    /// Log the end of a pipeline run
    pub fn log_pipeline_completed(&self, total_recommendations: usize) {
        info!(
            event = "pipeline_completed",
            component = %self.component,
            total_recommendations = total_recommendations,
            "Analysis pipeline completed"
        );
    }

    /// Log the start of an analysis step
    pub fn log_step_started(&self, step: &str) {
        info!(
            event = "step_started",
            component = %self.component,
            step = %step,
            "Running analysis step"
        );
    }

    /// Log the completion of an analysis step
    pub fn log_step_completed(&self, step: &str, appended: usize, total: usize) {
        info!(
            event = "step_completed",
            component = %self.component,
            step = %step,
            appended = appended,
            total_recommendations = total,
            "Analysis step completed"
        );
    }

    /// Log a generated recommendation
    pub fn log_recommendation(&self, recommendation: &Recommendation) {
        info!(
            event = "recommendation_generated",
            component = %self.component,
            id = %recommendation.id,
            kind = %recommendation.kind,
            resource_id = %recommendation.resource_id,
            source_node = %recommendation.source_node,
            "Generated recommendation"
        );
    }

    /// Log a resource excluded from a rule for lack of evidence
    pub fn log_resource_skipped(&self, resource: &str, reason: &str) {
        info!(
            event = "resource_skipped",
            component = %self.component,
            resource = %resource,
            reason = %reason,
            "Skipping resource"
        );
    }

    /// Log a failed provider call
    pub fn log_provider_error(&self, resource: &str, error: &str) {
        warn!(
            event = "provider_error",
            component = %self.component,
            resource = %resource,
            error = %error,
            "Provider call failed, continuing with remaining resources"
        );
    }
}
