//! # profscan common library
//!
//! Shared code for the profscan workspace:
//! - Error type and result alias
//! - TOML configuration file discovery, loading and writing
//! - SQLite store initialization (resolved/skipped/pending tables)

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
