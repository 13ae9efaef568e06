//! Scraper configuration
//!
//! Resolution priority: CLI flag > `PROFSCAN_*` environment variable >
//! TOML file > compiled default. The first two are handled by the binary's
//! argument parser and applied on top of the loaded file with
//! [`ScrapeConfig::apply_overrides`].

use profscan_common::config::LoggingConfig;
use profscan_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application name used for the platform config directory
pub const APP_NAME: &str = "profscan";

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "PROFSCAN_CONFIG";

/// Name comparison strategy for the candidate matcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchStrategy {
    /// First and last name tokens must be equal
    #[default]
    Bookend,
    /// Normalized edit-distance similarity at or above a threshold
    Similarity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub strategy: MatchStrategy,
    /// Used by the similarity strategy only (0.0-1.0)
    pub similarity_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::Bookend,
            similarity_threshold: 0.8,
        }
    }
}

/// The external directory and the institution names are resolved against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub base_url: String,
    /// Institution id baked into the search URL
    pub institution_id: u32,
    /// Substring a candidate's school label must contain
    pub institution_name: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ratemyprofessors.com".to_string(),
            institution_id: 1343,
            institution_name: "University of Texas at Arlington".to_string(),
        }
    }
}

/// Page fetching limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Wait for the first search card to render
    pub search_timeout_ms: u64,
    /// Wait for the profile quality anchor to render
    pub profile_timeout_ms: u64,
    /// Re-poll interval while waiting
    pub poll_interval_ms: u64,
    /// Per-request HTTP timeout
    pub request_timeout_ms: u64,
    /// Shared across all workers
    pub requests_per_second: u32,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            search_timeout_ms: 8000,
            profile_timeout_ms: 3000,
            poll_interval_ms: 250,
            request_timeout_ms: 15000,
            requests_per_second: 2,
            user_agent: format!("profscan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn profile_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Complete scraper configuration (TOML root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// SQLite ledger location
    pub database_path: PathBuf,
    /// JSON name list
    pub input_path: PathBuf,
    /// Worker pool size
    pub concurrency: usize,
    pub directory: DirectoryConfig,
    pub fetch: FetchConfig,
    pub matching: MatchingConfig,
    pub logging: LoggingConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("professors.db"),
            input_path: PathBuf::from("professors.json"),
            concurrency: 3,
            directory: DirectoryConfig::default(),
            fetch: FetchConfig::default(),
            matching: MatchingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Values supplied on the command line or via environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub input_path: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub institution_id: Option<u32>,
    pub institution_name: Option<String>,
    pub match_strategy: Option<MatchStrategy>,
    pub log_level: Option<String>,
}

impl ScrapeConfig {
    /// Apply CLI/ENV values over file values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(path) = overrides.database_path {
            self.database_path = path;
        }
        if let Some(path) = overrides.input_path {
            self.input_path = path;
        }
        if let Some(n) = overrides.concurrency {
            self.concurrency = n;
        }
        if let Some(id) = overrides.institution_id {
            self.directory.institution_id = id;
        }
        if let Some(name) = overrides.institution_name {
            self.directory.institution_name = name;
        }
        if let Some(strategy) = overrides.match_strategy {
            self.matching.strategy = strategy;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Reject configurations the run cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.directory.institution_name.trim().is_empty() {
            return Err(Error::Config("directory.institution_name must not be empty".to_string()));
        }
        if reqwest::Url::parse(&self.directory.base_url).is_err() {
            return Err(Error::Config(format!(
                "directory.base_url is not a valid URL: {}",
                self.directory.base_url
            )));
        }
        let fetch = &self.fetch;
        if fetch.search_timeout_ms == 0
            || fetch.profile_timeout_ms == 0
            || fetch.request_timeout_ms == 0
        {
            return Err(Error::Config("fetch timeouts must be greater than zero".to_string()));
        }
        if fetch.poll_interval_ms == 0 {
            return Err(Error::Config("fetch.poll_interval_ms must be greater than zero".to_string()));
        }
        if fetch.requests_per_second == 0 {
            return Err(Error::Config(
                "fetch.requests_per_second must be greater than zero".to_string(),
            ));
        }
        let threshold = self.matching.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::Config(format!(
                "matching.similarity_threshold must be in (0, 1], got {}",
                threshold
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScrapeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.directory.institution_id, 1343);
        assert_eq!(config.fetch.search_timeout(), Duration::from_secs(8));
        assert_eq!(config.fetch.profile_timeout(), Duration::from_secs(3));
        assert_eq!(config.matching.strategy, MatchStrategy::Bookend);
    }

    #[test]
    fn test_partial_toml() {
        let config: ScrapeConfig = toml::from_str(
            r#"
            concurrency = 5

            [directory]
            institution_name = "Rice University"

            [matching]
            strategy = "similarity"
            similarity_threshold = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 5);
        assert_eq!(config.directory.institution_name, "Rice University");
        assert_eq!(config.directory.institution_id, 1343);
        assert_eq!(config.matching.strategy, MatchStrategy::Similarity);
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = ScrapeConfig::default();
        config.apply_overrides(ConfigOverrides {
            concurrency: Some(1),
            database_path: Some(PathBuf::from("/tmp/x.db")),
            match_strategy: Some(MatchStrategy::Similarity),
            ..Default::default()
        });

        assert_eq!(config.concurrency, 1);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.matching.strategy, MatchStrategy::Similarity);
        assert_eq!(config.input_path, PathBuf::from("professors.json"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = ScrapeConfig::default();
        config.concurrency = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = ScrapeConfig::default();
        config.matching.similarity_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = ScrapeConfig::default();
        config.directory.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = ScrapeConfig::default();
        config.fetch.search_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ScrapeConfig::default();
        config.directory.institution_name = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
