//! Text normalization shared by catalog loading and query parsing.

/// Characters that separate tokens, in addition to whitespace.
const DELIMITERS: &[char] = &['-', '_', '(', ')'];

/// Split `text` into normalized tokens.
///
/// Lowercases, splits on runs of whitespace, hyphens, underscores, and
/// parentheses, and drops empty fragments. The same rule produces item
/// name tokens and query tokens, so both sides always agree.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || DELIMITERS.contains(&c))
        .filter(|fragment| !fragment.is_empty())
        .map(String::from)
        .collect()
}
