//! Recipient name normalization

/// Trailing corporate/legal designators removed from recipient names.
/// Matched after punctuation removal, so `inc.` arrives here as `inc`.
const LEGAL_SUFFIXES: &[&str] = &["inc", "llc", "foundation", "fund", "corp", "corporation"];

/// Canonical form of a recipient name.
///
/// Lower-cases, removes punctuation, collapses whitespace and strips trailing legal
/// suffixes. The last remaining word is never stripped, so a name made only of
/// suffixes (`"Foundation, Inc."`) keeps its first word. Idempotent.
pub fn normalize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| LEGAL_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}
