//! Skip bookkeeping

use std::fmt;
use std::str::FromStr;

/// Why a name ended in the skipped state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Search rendered but listed no candidate cards
    NoSearchResults,
    /// No candidate card rendered within the search wait
    SearchTimeout,
    /// Candidates listed, none passed the name and affiliation tests
    NoAcceptableMatch,
    /// A name-matching candidate at the wrong (or no) institution
    AffiliationRejected,
    /// Profile rating anchor never rendered within the profile wait
    ProfileLoadTimeout,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoSearchResults => "no_search_results",
            SkipReason::SearchTimeout => "search_timeout",
            SkipReason::NoAcceptableMatch => "no_acceptable_match",
            SkipReason::AffiliationRejected => "affiliation_rejected",
            SkipReason::ProfileLoadTimeout => "profile_load_timeout",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkipReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_search_results" => Ok(SkipReason::NoSearchResults),
            "search_timeout" => Ok(SkipReason::SearchTimeout),
            "no_acceptable_match" => Ok(SkipReason::NoAcceptableMatch),
            "affiliation_rejected" => Ok(SkipReason::AffiliationRejected),
            "profile_load_timeout" => Ok(SkipReason::ProfileLoadTimeout),
            other => Err(format!("unknown skip reason: {}", other)),
        }
    }
}

/// A row of the skip set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedName {
    pub name: String,
    pub reason: SkipReason,
}

impl SkippedName {
    pub fn new(name: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            name: name.into(),
            reason,
        }
    }
}
