pub mod config;
pub mod engine;
pub mod planner;
pub mod stats;
pub mod types;

use thiserror::Error;

pub use engine::{advance, apply_review, try_advance};
pub use planner::{build_plan, classify, estimate_minutes, select_due, ReviewPlanner};
pub use types::{PriorityBucket, Quality, RetentionState, ReviewPlan, ReviewsByPriority};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchedulerError {
    #[error("invalid retention state: {field}={value}")]
    InvalidState { field: &'static str, value: String },
}
