//! Search-results page parsing

use super::selectors::{element_text, CARD_NAME_SEL, CARD_SCHOOL_SEL, SEARCH_CARD_SEL};
use crate::models::CandidateRecord;
use scraper::Html;

/// Parse candidate cards from a rendered search-results page, in listing order
///
/// Cards without a name or an href are dropped; they cannot be matched or
/// followed.
pub fn parse_candidates(html: &str) -> Vec<CandidateRecord> {
    let document = Html::parse_document(html);

    document
        .select(&SEARCH_CARD_SEL)
        .filter_map(|card| {
            let profile_ref = card.value().attr("href")?.trim().to_string();
            if profile_ref.is_empty() {
                return None;
            }

            let displayed_name = card.select(&CARD_NAME_SEL).next().map(element_text)?;
            if displayed_name.is_empty() {
                return None;
            }

            let affiliation = card
                .select(&CARD_SCHOOL_SEL)
                .next()
                .map(element_text)
                .filter(|s| !s.is_empty());

            Some(CandidateRecord::new(displayed_name, profile_ref, affiliation))
        })
        .collect()
}
