//! Search-result candidate

/// One card scraped from a directory search-results page
///
/// Lives only for the duration of matching; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    /// Name exactly as the directory displays it
    pub displayed_name: String,
    /// Opaque profile reference (the card's href, e.g. `/professor/12345`)
    pub profile_ref: String,
    /// School label on the card, if the card shows one
    pub affiliation: Option<String>,
}

impl CandidateRecord {
    pub fn new(
        displayed_name: impl Into<String>,
        profile_ref: impl Into<String>,
        affiliation: Option<String>,
    ) -> Self {
        Self {
            displayed_name: displayed_name.into(),
            profile_ref: profile_ref.into(),
            affiliation,
        }
    }
}
