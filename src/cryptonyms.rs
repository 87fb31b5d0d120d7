//! Cryptonym detection: case-sensitive substring match against a bundled
//! dictionary, loaded once at startup.
//!
//! Grounded on `original_source/analyzer.go` (`analyzeCryptonyms`), which
//! walks a `map[string]string` keyed by cryptonym and appends every key that
//! appears as a literal substring of the OCR text.

use std::collections::HashMap;
use std::sync::OnceLock;

const BUNDLED_CRYPTONYMS: &str = include_str!("../assets/cryptonyms.json");

static DICTIONARY: OnceLock<HashMap<String, String>> = OnceLock::new();

fn dictionary() -> &'static HashMap<String, String> {
    DICTIONARY.get_or_init(|| {
        serde_json::from_str(BUNDLED_CRYPTONYMS).expect("bundled cryptonyms.json must parse")
    })
}

/// Return every dictionary cryptonym that occurs as a substring of `text`,
/// in dictionary iteration order.
pub fn find_cryptonyms(text: &str) -> Vec<String> {
    dictionary()
        .keys()
        .filter(|key| text.contains(key.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_dictionary_parses_and_is_nonempty() {
        assert!(!dictionary().is_empty());
    }

    #[test]
    fn finds_known_cryptonym_as_substring() {
        let text = "Internal memo references operation AMLASH in passing.";
        let found = find_cryptonyms(text);
        assert!(found.contains(&"AMLASH".to_string()));
    }

    #[test]
    fn match_is_case_sensitive() {
        let text = "lowercase amlash should not match";
        let found = find_cryptonyms(text);
        assert!(!found.contains(&"AMLASH".to_string()));
    }

    #[test]
    fn no_matches_returns_empty() {
        let found = find_cryptonyms("nothing of interest here");
        assert!(found.is_empty());
    }
}
