//! Per-name resolution workflow and the worker pool that drives it

pub mod pipeline;
pub mod scheduler;

pub use pipeline::{PipelineSettings, ResolutionPipeline};
pub use scheduler::{resume_slice, RunSummary, Scheduler};

use crate::models::SkipReason;
use std::fmt;

/// Terminal result of one input name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameOutcome {
    /// Resolved record written
    Saved { name: String, id: String },
    /// Skip recorded
    Skipped { name: String, reason: SkipReason },
    /// Transport-level failure; nothing persisted, re-attempted next run
    Failed { name: String, error: String },
    /// Run cancelled before this name finished; nothing persisted
    Cancelled { name: String },
}

impl NameOutcome {
    pub fn name(&self) -> &str {
        match self {
            NameOutcome::Saved { name, .. }
            | NameOutcome::Skipped { name, .. }
            | NameOutcome::Failed { name, .. }
            | NameOutcome::Cancelled { name } => name,
        }
    }
}

impl fmt::Display for NameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameOutcome::Saved { name, .. } => write!(f, "OK {}", name),
            NameOutcome::Skipped { name, .. } => write!(f, "SKIP {}", name),
            NameOutcome::Failed { name, error } => write!(f, "ERROR {}: {}", name, error),
            NameOutcome::Cancelled { name } => write!(f, "CANCELLED {}", name),
        }
    }
}
