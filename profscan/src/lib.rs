//! profscan library
//!
//! Resolves instructor names against a public ratings directory and records
//! each outcome in a SQLite ledger. The binary in `main.rs` wires these
//! modules together; integration tests drive them directly.

pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod models;
pub mod services;
pub mod workflow;

pub use config::ScrapeConfig;
pub use error::{FetchError, PipelineError, PipelineResult};
pub use workflow::{NameOutcome, PipelineSettings, ResolutionPipeline, RunSummary, Scheduler};
