//! Profile page extraction
//!
//! Each field is read independently. A missing anchor leaves that field
//! `None` (stored later as its placeholder); extraction as a whole never fails.

use super::selectors::{
    element_text, FEEDBACK_DESCRIPTION_SEL, FEEDBACK_ITEM_SEL, FEEDBACK_NUMBER_SEL,
    PROFILE_DEPARTMENT_SEL, PROFILE_NUM_RATINGS_SEL, PROFILE_QUALITY_SEL, TAG_SEL,
};
use crate::models::ProfileDetails;
use scraper::Html;
use std::collections::BTreeSet;

const WOULD_TAKE_AGAIN_LABEL: &str = "would take again";
const DIFFICULTY_LABEL: &str = "level of difficulty";

/// Stable identifier of a profile: the last non-empty path segment
///
/// `https://host/professor/12345` and `/professor/12345/` both give `12345`.
pub fn profile_id(profile_locator: &str) -> String {
    let path = profile_locator
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Extract rating details from a rendered profile page
pub fn extract(profile_html: &str, profile_locator: &str) -> ProfileDetails {
    let document = Html::parse_document(profile_html);

    let department = document
        .select(&PROFILE_DEPARTMENT_SEL)
        .next()
        .map(element_text)
        .map(|text| text.replace("department", "").trim().to_string())
        .filter(|text| !text.is_empty());

    let quality = document
        .select(&PROFILE_QUALITY_SEL)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty());

    // "37 ratings" -> "37"
    let total_ratings = document
        .select(&PROFILE_NUM_RATINGS_SEL)
        .next()
        .map(element_text)
        .and_then(|text| text.split_whitespace().next().map(str::to_string));

    let mut difficulty = None;
    let mut would_take_again = None;
    for item in document.select(&FEEDBACK_ITEM_SEL) {
        let number = item.select(&FEEDBACK_NUMBER_SEL).next().map(element_text);
        let label = item
            .select(&FEEDBACK_DESCRIPTION_SEL)
            .next()
            .map(|d| element_text(d).to_lowercase());

        let (Some(number), Some(label)) = (number, label) else {
            continue;
        };

        if label.starts_with(WOULD_TAKE_AGAIN_LABEL) {
            would_take_again = Some(number);
        } else if label.starts_with(DIFFICULTY_LABEL) {
            difficulty = Some(number);
        }
    }

    let tags: BTreeSet<String> = document
        .select(&TAG_SEL)
        .map(element_text)
        .filter(|tag| !tag.is_empty())
        .collect();

    ProfileDetails {
        id: profile_id(profile_locator),
        profile_locator: profile_locator.to_string(),
        department,
        quality,
        difficulty,
        total_ratings,
        would_take_again,
        tags,
    }
}
