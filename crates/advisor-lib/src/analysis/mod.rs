//! Cost-optimization analysis steps
//!
//! Each submodule encapsulates one analysis concern: a decision rule set
//! wrapped in a step that reads shared pipeline state, consults the
//! resource provider, and appends recommendation records.

mod instance_consolidation;
mod tier_rightsizing;

pub use instance_consolidation::{InstanceConsolidationStep, ELIGIBLE_CONSOLIDATION_TIERS};
pub use tier_rightsizing::TierRightsizingStep;
