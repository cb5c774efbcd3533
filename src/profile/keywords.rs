//! Capitalized-word extraction, a crude stand-in for named-entity recognition.
//!
//! Matches a single ASCII uppercase letter followed by one or more ASCII
//! lowercase letters, on word boundaries. There is no stopword list, so a
//! sentence-initial "Today" is captured the same way "Asha" is.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static CAPITALIZED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid keyword pattern"));

/// Distinct capitalized words in `text`.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    CAPITALIZED_WORD
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Append keywords not yet present to `existing`. Returns the ones added.
pub fn merge_keywords(existing: &mut Vec<String>, keywords: BTreeSet<String>) -> Vec<String> {
    let mut added = Vec::new();
    for kw in keywords {
        if !existing.contains(&kw) {
            existing.push(kw.clone());
            added.push(kw);
        }
    }
    added
}
