//! Data models for profscan

pub mod candidate;
pub mod record;
pub mod skip;

pub use candidate::CandidateRecord;
pub use record::{ProfileDetails, RatingField, ResolvedRecord, TAG_DELIMITER};
pub use skip::{SkipReason, SkippedName};
