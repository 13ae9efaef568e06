//! Resolution pipeline
//!
//! Per input name:
//!
//! ```text
//! SEARCHING -> MATCHED -> EXTRACTING -> SAVED
//!           -> NO_CANDIDATES | NO_MATCH | TIMEOUT -> SKIPPED
//! ```
//!
//! Skips are terminal for the run and persisted. Fetch errors end the name
//! without persisting anything. Ledger errors propagate and are fatal to the
//! run (see [`crate::error::PipelineError::is_fatal`]).

use super::NameOutcome;
use crate::config::ScrapeConfig;
use crate::db::Ledger;
use crate::error::{FetchError, PipelineResult};
use crate::models::{ResolvedRecord, SkipReason};
use crate::services::candidate_matcher::CandidateMatcher;
use crate::services::page_fetcher::PageFetcher;
use crate::services::{detail_extractor, search_results, selectors};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Directory addressing and wait limits used by the pipeline
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    base_url: Url,
    pub institution_id: u32,
    pub institution_name: String,
    pub search_timeout: Duration,
    pub profile_timeout: Duration,
}

impl PipelineSettings {
    pub fn new(
        base_url: &str,
        institution_id: u32,
        institution_name: impl Into<String>,
        search_timeout: Duration,
        profile_timeout: Duration,
    ) -> Result<Self, FetchError> {
        // Trailing slash so relative joins append instead of replacing the last segment
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", base, e)))?;

        Ok(Self {
            base_url,
            institution_id,
            institution_name: institution_name.into(),
            search_timeout,
            profile_timeout,
        })
    }

    pub fn from_config(config: &ScrapeConfig) -> Result<Self, FetchError> {
        Self::new(
            &config.directory.base_url,
            config.directory.institution_id,
            config.directory.institution_name.clone(),
            config.fetch.search_timeout(),
            config.fetch.profile_timeout(),
        )
    }

    /// Search URL for `name`, scoped to the configured institution
    pub fn search_url(&self, name: &str) -> Result<String, FetchError> {
        let mut url = self
            .base_url
            .join(&format!("search/professors/{}", self.institution_id))
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("q", name);
        Ok(url.into())
    }

    /// Absolute profile URL for a card href
    pub fn profile_url(&self, profile_ref: &str) -> Result<String, FetchError> {
        // Root-relative hrefs resolve under the base path, not the host root
        let relative = match profile_ref.strip_prefix('/') {
            Some(rest) if !rest.starts_with('/') => rest,
            _ => profile_ref,
        };
        self.base_url
            .join(relative)
            .map(Into::into)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", profile_ref, e)))
    }
}

/// Search, match, extract and persist one name at a time
pub struct ResolutionPipeline {
    settings: PipelineSettings,
    matcher: CandidateMatcher,
    ledger: Arc<dyn Ledger>,
}

impl ResolutionPipeline {
    pub fn new(settings: PipelineSettings, matcher: CandidateMatcher, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            settings,
            matcher,
            ledger,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run one name through the pipeline using the caller's fetcher
    pub async fn resolve(
        &self,
        fetcher: &mut dyn PageFetcher,
        name: &str,
        cancel: &CancellationToken,
    ) -> PipelineResult<NameOutcome> {
        if cancel.is_cancelled() {
            return Ok(cancelled(name));
        }

        // SEARCHING
        info!(name = %name, "Searching");
        let search_url = self.settings.search_url(name)?;
        fetcher.fetch(&search_url).await?;

        let rendered = fetcher
            .wait_for(selectors::SEARCH_CARD, self.settings.search_timeout)
            .await?;
        if cancel.is_cancelled() {
            return Ok(cancelled(name));
        }
        if !rendered {
            info!(name = %name, "No results rendered before timeout");
            return self.skip(name, SkipReason::SearchTimeout).await;
        }

        let candidates = search_results::parse_candidates(fetcher.content()?);
        if candidates.is_empty() {
            info!(name = %name, "Not found in search results");
            return self.skip(name, SkipReason::NoSearchResults).await;
        }
        debug!(name = %name, candidates = candidates.len(), "Parsed search results");

        let outcome =
            self.matcher
                .find_match(name, &candidates, &self.settings.institution_name);

        for rejected in &outcome.rejected {
            info!(candidate = %rejected, "Skipping candidate: not from {}", self.settings.institution_name);
            self.ledger
                .upsert_skipped(rejected, SkipReason::AffiliationRejected)
                .await?;
        }

        let Some(candidate) = outcome.matched else {
            info!(name = %name, policy = self.matcher.policy_name(), "No acceptable match");
            return self.skip(name, SkipReason::NoAcceptableMatch).await;
        };

        // MATCHED -> EXTRACTING
        if cancel.is_cancelled() {
            return Ok(cancelled(name));
        }

        let profile_url = self.settings.profile_url(&candidate.profile_ref)?;
        info!(
            name = %name,
            candidate = %candidate.displayed_name,
            url = %profile_url,
            "Found matching professor"
        );
        fetcher.fetch(&profile_url).await?;

        let rendered = fetcher
            .wait_for(selectors::PROFILE_QUALITY, self.settings.profile_timeout)
            .await?;
        if cancel.is_cancelled() {
            return Ok(cancelled(name));
        }
        if !rendered {
            info!(name = %name, url = %profile_url, "Profile did not render before timeout");
            return self.skip(name, SkipReason::ProfileLoadTimeout).await;
        }

        let details = detail_extractor::extract(fetcher.content()?, &profile_url);
        let record = ResolvedRecord::new(name, candidate.displayed_name, details);

        // EXTRACTING -> SAVED
        self.ledger.upsert_resolved(&record).await?;
        info!(name = %name, id = %record.id(), "Saved");

        Ok(NameOutcome::Saved {
            name: name.to_string(),
            id: record.id().to_string(),
        })
    }

    async fn skip(&self, name: &str, reason: SkipReason) -> PipelineResult<NameOutcome> {
        self.ledger.upsert_skipped(name, reason).await?;
        Ok(NameOutcome::Skipped {
            name: name.to_string(),
            reason,
        })
    }
}

fn cancelled(name: &str) -> NameOutcome {
    NameOutcome::Cancelled {
        name: name.to_string(),
    }
}
