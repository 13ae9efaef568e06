//! Resolved profile records
//!
//! Absent fields are `None` in memory. At the storage boundary each one is
//! written as its fixed placeholder string ([`RatingField::sentinel`]) and
//! read back to `None`, keeping the on-disk format of earlier runs.

use std::collections::BTreeSet;

/// Separator used to store the tag set as a single column
pub const TAG_DELIMITER: &str = ", ";

/// Scalar fields extracted from a profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingField {
    Department,
    Quality,
    Difficulty,
    TotalRatings,
    WouldTakeAgain,
}

impl RatingField {
    /// Placeholder stored when the page lacks this field
    pub fn sentinel(self) -> &'static str {
        match self {
            RatingField::Department => "No department found",
            RatingField::Quality => "No quality rating found",
            RatingField::Difficulty => "No difficulty rating found",
            RatingField::TotalRatings => "No total ratings found",
            RatingField::WouldTakeAgain => "No feedback found",
        }
    }

    /// Storage form of a field value
    pub fn to_stored(self, value: Option<&str>) -> String {
        value.unwrap_or(self.sentinel()).to_string()
    }

    /// Typed form of a stored value
    pub fn from_stored(self, stored: String) -> Option<String> {
        if stored == self.sentinel() {
            None
        } else {
            Some(stored)
        }
    }
}

/// Everything the detail extractor pulls from one profile page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    /// Stable identifier: last path segment of `profile_locator`
    pub id: String,
    pub profile_locator: String,
    pub department: Option<String>,
    pub quality: Option<String>,
    pub difficulty: Option<String>,
    pub total_ratings: Option<String>,
    pub would_take_again: Option<String>,
    pub tags: BTreeSet<String>,
}

impl ProfileDetails {
    /// Tags in storage form
    pub fn tags_to_stored(&self) -> String {
        self.tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(TAG_DELIMITER)
    }

    /// Parse a stored tag column back into a set
    pub fn tags_from_stored(stored: &str) -> BTreeSet<String> {
        stored
            .split(TAG_DELIMITER)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The persisted unit: one directory profile matched to one input name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecord {
    /// Input name used for the lookup
    pub lookup_name: String,
    /// Name as the directory displays it
    pub displayed_name: String,
    pub details: ProfileDetails,
}

impl ResolvedRecord {
    pub fn new(
        lookup_name: impl Into<String>,
        displayed_name: impl Into<String>,
        details: ProfileDetails,
    ) -> Self {
        Self {
            lookup_name: lookup_name.into(),
            displayed_name: displayed_name.into(),
            details,
        }
    }

    /// Storage primary key
    pub fn id(&self) -> &str {
        &self.details.id
    }
}
