//! Service modules for name resolution
//!
//! Pure pieces (normalizer, matcher, parsers) plus the page fetcher
//! capability the pipeline drives.

pub mod candidate_matcher;
pub mod detail_extractor;
pub mod name_normalizer;
pub mod page_fetcher;
pub mod search_results;
pub mod selectors;

pub use candidate_matcher::{
    BookendPolicy, CandidateMatcher, MatchOutcome, NamePolicy, SimilarityPolicy,
};
pub use name_normalizer::{normalize, NormalizedName};
pub use page_fetcher::{FetcherFactory, HttpFetcherFactory, HttpPageFetcher, PageFetcher};
