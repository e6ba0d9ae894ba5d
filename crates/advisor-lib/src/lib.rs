//! Core library for the API gateway cost-optimization advisor
//!
//! This crate provides the core functionality for:
//! - The resource provider contract and an in-memory implementation
//! - Threshold-based analysis steps (tier rightsizing, instance
//!   consolidation)
//! - Pipeline state, the state-merge contract, and the step runner
//! - Metrics and structured logging

pub mod analysis;
pub mod config;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod provider;
pub mod resource_id;

pub use analysis::{InstanceConsolidationStep, TierRightsizingStep};
pub use config::AdvisorConfig;
pub use models::*;
pub use observability::{AdvisorMetrics, StructuredLogger};
pub use pipeline::{AnalysisStep, PipelineRunner, PipelineState, StateUpdate};
pub use provider::{MockProvider, ProviderError, ResourceProvider};
pub use resource_id::{ResourceId, ResourceIdError};
