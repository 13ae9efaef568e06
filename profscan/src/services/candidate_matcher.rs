//! Candidate matching
//!
//! Picks the directory entry that corresponds to a target name. Candidates
//! are examined in listing order and the first one passing both the name
//! test and the affiliation filter wins; there is no global best-score search.

use super::name_normalizer::{normalize, NormalizedName};
use crate::config::{MatchStrategy, MatchingConfig};
use crate::models::CandidateRecord;

/// Name comparison policy
pub trait NamePolicy: Send + Sync {
    /// Short policy name for logging
    fn name(&self) -> &'static str;

    /// Whether `candidate` names the same person as `target`
    fn names_match(&self, target: &NormalizedName, candidate: &NormalizedName) -> bool;
}

/// First and last tokens equal, middle tokens ignored
///
/// A one-letter first token in the target is an initial and accepts any
/// candidate first token starting with that letter. A single-token name
/// never matches.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookendPolicy;

impl NamePolicy for BookendPolicy {
    fn name(&self) -> &'static str {
        "bookend"
    }

    fn names_match(&self, target: &NormalizedName, candidate: &NormalizedName) -> bool {
        if target.len() < 2 || candidate.len() < 2 {
            return false;
        }
        first_tokens_match(target.first(), candidate.first()) && target.last() == candidate.last()
    }
}

fn first_tokens_match(target: Option<&str>, candidate: Option<&str>) -> bool {
    match (target, candidate) {
        (Some(t), Some(c)) if t.chars().count() == 1 => c.starts_with(t),
        (t, c) => t == c,
    }
}

/// Normalized Levenshtein similarity at or above a threshold
#[derive(Debug, Clone, Copy)]
pub struct SimilarityPolicy {
    threshold: f64,
}

impl SimilarityPolicy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn similarity(target: &NormalizedName, candidate: &NormalizedName) -> f64 {
        strsim::normalized_levenshtein(&target.to_string(), &candidate.to_string())
    }
}

impl NamePolicy for SimilarityPolicy {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn names_match(&self, target: &NormalizedName, candidate: &NormalizedName) -> bool {
        if target.is_empty() || candidate.is_empty() {
            return false;
        }
        let score = Self::similarity(target, candidate);
        tracing::trace!(
            target = %target,
            candidate = %candidate,
            score,
            threshold = self.threshold,
            "Name similarity"
        );
        score >= self.threshold
    }
}

/// Result of matching one target against a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Winning candidate, if any
    pub matched: Option<CandidateRecord>,
    /// Display names of candidates whose name matched but whose affiliation
    /// was absent or wrong, in listing order
    pub rejected: Vec<String>,
}

/// Candidate matcher: name policy plus affiliation filter
pub struct CandidateMatcher {
    policy: Box<dyn NamePolicy>,
}

impl CandidateMatcher {
    pub fn new(policy: Box<dyn NamePolicy>) -> Self {
        Self { policy }
    }

    pub fn bookend() -> Self {
        Self::new(Box::new(BookendPolicy))
    }

    pub fn from_config(config: &MatchingConfig) -> Self {
        match config.strategy {
            MatchStrategy::Bookend => Self::bookend(),
            MatchStrategy::Similarity => {
                Self::new(Box::new(SimilarityPolicy::new(config.similarity_threshold)))
            }
        }
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Match `target` against `candidates`
    ///
    /// Stops at the first accepted candidate. Candidates rejected for
    /// affiliation before that point are reported in `rejected` so the caller
    /// can record them; a `None` match means the caller records `target`.
    pub fn find_match(
        &self,
        target: &str,
        candidates: &[CandidateRecord],
        required_affiliation: &str,
    ) -> MatchOutcome {
        let target_name = normalize(target);
        let mut outcome = MatchOutcome::default();

        for candidate in candidates {
            let candidate_name = normalize(&candidate.displayed_name);
            if !self.policy.names_match(&target_name, &candidate_name) {
                continue;
            }

            match candidate.affiliation.as_deref() {
                Some(school) if school.contains(required_affiliation) => {
                    tracing::debug!(
                        target = %target,
                        candidate = %candidate.displayed_name,
                        school = %school,
                        "Found matching candidate"
                    );
                    outcome.matched = Some(candidate.clone());
                    return outcome;
                }
                Some(school) => {
                    tracing::debug!(
                        candidate = %candidate.displayed_name,
                        school = %school,
                        "Rejecting candidate: affiliation mismatch"
                    );
                    outcome.rejected.push(candidate.displayed_name.clone());
                }
                None => {
                    tracing::debug!(
                        candidate = %candidate.displayed_name,
                        "Rejecting candidate: no affiliation shown"
                    );
                    outcome.rejected.push(candidate.displayed_name.clone());
                }
            }
        }

        outcome
    }
}

impl Default for CandidateMatcher {
    fn default() -> Self {
        Self::bookend()
    }
}
