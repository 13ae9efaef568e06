//! Name normalization
//!
//! Canonical comparable form of a human name: lower-cased, whitespace
//! collapsed, and a leading initial written as `"A."` reduced to `"a"`.

use std::fmt;

/// Normalized token sequence of a name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    tokens: Vec<String>,
}

impl NormalizedName {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn first(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens.join(" "))
    }
}

/// Normalize a raw name
///
/// Pure and total: empty input gives an empty name. Applying it to its own
/// output is a no-op.
pub fn normalize(raw: &str) -> NormalizedName {
    let mut tokens: Vec<String> = raw
        .trim()
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    if tokens.len() > 1 && is_dotted_initial(&tokens[0]) {
        tokens[0].pop();
    }

    NormalizedName { tokens }
}

/// Exactly one letter followed by a period
fn is_dotted_initial(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_and_lowercases() {
        assert_eq!(normalize("  Jane   Q.  DOE ").to_string(), "jane q. doe");
    }

    #[test]
    fn test_dotted_initial_equals_bare_initial() {
        assert_eq!(normalize("A. Smith"), normalize("A Smith"));
        assert_eq!(normalize("A. Smith").to_string(), "a smith");
    }

    #[test]
    fn test_initial_only_stripped_in_first_position() {
        assert_eq!(normalize("Adam B. Smith").to_string(), "adam b. smith");
    }

    #[test]
    fn test_single_token_initial_kept() {
        // Only applies when more than one token is present
        assert_eq!(normalize("A.").to_string(), "a.");
    }

    #[test]
    fn test_longer_dotted_token_kept() {
        assert_eq!(normalize("Jr. Smith").to_string(), "jr. smith");
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \t ").is_empty());
        assert_eq!(normalize("").first(), None);
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "A. Smith",
            "  Jane   Q.  DOE ",
            "A.",
            "",
            "Ünal Ö. Yılmaz",
            "B. C. Dee",
            "x.  y",
        ];
        for raw in samples {
            let once = normalize(raw);
            let twice = normalize(&once.to_string());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_bookend_accessors() {
        let name = normalize("John Q Smith");
        assert_eq!(name.first(), Some("john"));
        assert_eq!(name.last(), Some("smith"));
        assert_eq!(name.len(), 3);
    }
}
