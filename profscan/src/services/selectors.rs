//! CSS anchors of the directory's search and profile pages
//!
//! The directory renders styled-component class names with generated
//! suffixes, so every anchor matches on the stable class-name prefix.

use once_cell::sync::Lazy;
use scraper::Selector;

/// A search-result card; its presence means results rendered
pub const SEARCH_CARD: &str = "a[class^='TeacherCard__StyledTeacherCard']";
pub const CARD_NAME: &str = "div[class^='CardName__StyledCardName']";
pub const CARD_SCHOOL: &str = "div[class^='CardSchool__School']";

/// Quality numerator; its presence means the profile rendered
pub const PROFILE_QUALITY: &str = "div[class^='RatingValue__Numerator']";
pub const PROFILE_NUM_RATINGS: &str = "div[class^='RatingValue__NumRatings'] a";
pub const PROFILE_DEPARTMENT: &str = "a[class^='TeacherDepartment__StyledDepartmentLink'] b";
pub const FEEDBACK_ITEM: &str = "div[class^='FeedbackItem__StyledFeedbackItem']";
pub const FEEDBACK_NUMBER: &str = "div[class^='FeedbackItem__FeedbackNumber']";
pub const FEEDBACK_DESCRIPTION: &str = "div[class^='FeedbackItem__FeedbackDescription']";
pub const TAG: &str = "div[class^='TeacherTags__TagsContainer'] span[class^='Tag-']";

fn compile(css: &'static str) -> Selector {
    // Constant selectors above are covered by tests::test_all_selectors_parse
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid built-in selector {css}: {e}"))
}

pub static SEARCH_CARD_SEL: Lazy<Selector> = Lazy::new(|| compile(SEARCH_CARD));
pub static CARD_NAME_SEL: Lazy<Selector> = Lazy::new(|| compile(CARD_NAME));
pub static CARD_SCHOOL_SEL: Lazy<Selector> = Lazy::new(|| compile(CARD_SCHOOL));
pub static PROFILE_QUALITY_SEL: Lazy<Selector> = Lazy::new(|| compile(PROFILE_QUALITY));
pub static PROFILE_NUM_RATINGS_SEL: Lazy<Selector> = Lazy::new(|| compile(PROFILE_NUM_RATINGS));
pub static PROFILE_DEPARTMENT_SEL: Lazy<Selector> = Lazy::new(|| compile(PROFILE_DEPARTMENT));
pub static FEEDBACK_ITEM_SEL: Lazy<Selector> = Lazy::new(|| compile(FEEDBACK_ITEM));
pub static FEEDBACK_NUMBER_SEL: Lazy<Selector> = Lazy::new(|| compile(FEEDBACK_NUMBER));
pub static FEEDBACK_DESCRIPTION_SEL: Lazy<Selector> =
    Lazy::new(|| compile(FEEDBACK_DESCRIPTION));
pub static TAG_SEL: Lazy<Selector> = Lazy::new(|| compile(TAG));

/// Trimmed text content of an element
pub fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
