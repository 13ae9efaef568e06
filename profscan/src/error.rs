//! Error types for profscan
//!
//! Expected "no match" outcomes (empty search, affiliation rejection,
//! render timeouts) are not errors: they are [`crate::models::SkipReason`]s
//! persisted by the pipeline. The types here cover what is left over.

use thiserror::Error;

/// Page fetcher errors
///
/// Any of these ends the current name's pipeline without persisting a skip,
/// so the next run re-attempts the name.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, body read or client-side timeout failure
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// URL could not be built or parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// `wait_for`/`content` called before any page was fetched
    #[error("No page loaded")]
    NoPage,

    /// Fetcher could not be constructed
    #[error("Fetcher setup failed: {0}")]
    Setup(String),
}

/// Resolution pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Isolated to one name; the run continues
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Ledger unavailable; fatal to the whole run
    #[error("Ledger write failed: {0}")]
    Ledger(#[from] profscan_common::Error),
}

impl PipelineError {
    /// Whether this error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Ledger(_))
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality_split() {
        let fetch = PipelineError::from(FetchError::Status {
            status: 503,
            url: "https://example.test/x".to_string(),
        });
        assert!(!fetch.is_fatal());

        let ledger = PipelineError::from(profscan_common::Error::Internal("disk gone".into()));
        assert!(ledger.is_fatal());
    }

    #[test]
    fn test_display_includes_url() {
        let err = FetchError::Transport {
            url: "https://example.test/search".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Transport error for https://example.test/search: connection refused"
        );
    }
}
