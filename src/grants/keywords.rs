//! Purpose keyword extraction

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

const STOP_WORDS: &[&str] = &[
    "about", "also", "among", "been", "being", "both", "each", "from", "general", "have", "into",
    "more", "most", "other", "over", "such", "support", "that", "their", "them", "then", "there",
    "these", "they", "this", "those", "through", "under", "upon", "were", "what", "when", "where",
    "which", "while", "with", "within", "without", "your", "purpose", "purposes", "program",
    "programs", "operating", "project", "projects",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-z]{4,}").expect("static keyword regex"))
}

/// Lower-cased words of four or more letters, stop-words removed, in order of appearance
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    word_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Token frequencies across several purpose strings
pub fn token_counts<'a>(purposes: impl IntoIterator<Item = &'a str>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for purpose in purposes {
        for token in tokenize(purpose) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    counts
}

/// The `limit` most frequent tokens with a count of at least `min_count`.
/// Ties are broken alphabetically.
pub fn top_tokens(counts: &HashMap<String, usize>, min_count: usize, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, &usize)> = counts.iter().filter(|(_, &c)| c >= min_count).collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(limit).map(|(t, _)| t.clone()).collect()
}

/// Tokens present in both count maps, ranked by combined frequency
pub fn shared_tokens(a: &HashMap<String, usize>, b: &HashMap<String, usize>, limit: usize) -> Vec<String> {
    let combined: BTreeMap<&String, usize> = a
        .iter()
        .filter_map(|(token, ca)| b.get(token).map(|cb| (token, ca + cb)))
        .collect();
    let mut ranked: Vec<(&String, usize)> = combined.into_iter().collect();
    ranked.sort_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(y.0)));
    ranked.into_iter().take(limit).map(|(t, _)| t.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_filters_short_and_stop_words() {
        assert_eq!(
            tokenize("General support for Youth EDUCATION and arts, with education focus"),
            vec!["youth", "education", "arts", "education", "focus"]
        );
    }

    #[test]
    fn test_top_tokens_requires_repeats_and_breaks_ties() {
        let counts = token_counts(["youth education", "education access", "youth arts"]);
        assert_eq!(top_tokens(&counts, 2, 5), vec!["education", "youth"]);
        assert_eq!(top_tokens(&counts, 2, 1), vec!["education"]);
    }

    #[test]
    fn test_shared_tokens() {
        let a = token_counts(["youth education", "health"]);
        let b = token_counts(["education", "education", "housing", "youth"]);
        assert_eq!(shared_tokens(&a, &b, 5), vec!["education", "youth"]);
    }
}
