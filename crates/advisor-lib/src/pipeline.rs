//! Pipeline state and step composition
//!
//! Analysis steps read the accumulated state and return a partial update
//! holding only the field they changed. The runner merges each update by
//! replacing that field, never by overwriting the whole state, so steps
//! running later see everything earlier steps appended.

use crate::models::Recommendation;
use crate::observability::{AdvisorMetrics, StructuredLogger};
use crate::resource_id::ResourceId;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Accumulating state threaded through analysis steps
///
/// This is also the interchange format between the core and surrounding
/// orchestration. `recommendations` is append-only across a run: the final
/// sequence equals the concatenation of what each step contributed, in
/// execution order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// Resources selected for analysis; absent or empty is a valid no-op
    /// input
    #[serde(default)]
    pub resources: Vec<ResourceId>,
    /// Recommendations accumulated so far
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl PipelineState {
    /// State with resources to analyze and no prior recommendations
    pub fn with_resources(resources: Vec<ResourceId>) -> Self {
        Self {
            resources,
            recommendations: Vec::new(),
        }
    }

    /// Merge a step's partial update by replacing the changed field
    pub fn apply(&mut self, update: StateUpdate) {
        self.recommendations = update.recommendations;
    }
}

/// Partial state update returned by a step
///
/// Carries the full replacement value for the `recommendations` field:
/// the prior sequence concatenated with the step's new records.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub recommendations: Vec<Recommendation>,
}

/// Trait for analysis step implementations
#[async_trait]
pub trait AnalysisStep: Send + Sync {
    /// Stable step name, recorded as `source_node` on emitted recommendations
    fn name(&self) -> &str;

    /// Evaluate the step against the current accumulated state
    ///
    /// Steps never mutate the incoming state; they return a delta for the
    /// runner to merge. Re-running a step against state already holding its
    /// output re-appends rather than erroring.
    async fn run(&self, state: &PipelineState) -> Result<StateUpdate>;
}

/// Runs analysis steps in a fixed order, merging each partial update
pub struct PipelineRunner {
    steps: Vec<Arc<dyn AnalysisStep>>,
    metrics: AdvisorMetrics,
    logger: StructuredLogger,
}

impl PipelineRunner {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            metrics: AdvisorMetrics::new(),
            logger: StructuredLogger::new("pipeline"),
        }
    }

    /// Append a step to the execution order
    pub fn with_step(mut self, step: Arc<dyn AnalysisStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Run all steps in order against the initial state
    ///
    /// A step error propagates to the caller; graceful degradation for
    /// individual resources happens inside the steps themselves.
    pub async fn run(&self, mut state: PipelineState) -> Result<PipelineState> {
        self.logger
            .log_pipeline_started(self.steps.len(), state.resources.len());
        self.metrics.set_resources_analyzed(state.resources.len() as i64);

        for step in &self.steps {
            let before = state.recommendations.len();
            let start = Instant::now();
            self.logger.log_step_started(step.name());

            let update = step.run(&state).await?;

            self.metrics.observe_step_latency(start.elapsed().as_secs_f64());
            self.metrics.inc_steps_executed();
            state.apply(update);

            for recommendation in state.recommendations.iter().skip(before) {
                self.logger.log_recommendation(recommendation);
                self.metrics.inc_recommendations_generated();
            }
            let appended = state.recommendations.len().saturating_sub(before);
            self.logger
                .log_step_completed(step.name(), appended, state.recommendations.len());
        }

        self.logger.log_pipeline_completed(state.recommendations.len());
        Ok(state)
    }
}

impl Default for PipelineRunner {
    fn default() -> Self {
        Self::new()
    }
}
