//! Tokenization and base-score computation shared by the Inverted Index
//! Builder (C4) and the Search Engine's query-side tokenization (C8).

use crate::model::Language;

/// Minimum term length; shorter tokens are discarded.
const MIN_TERM_LEN: usize = 2;

/// Splits `text` into lowercase terms: contiguous runs of ASCII
/// alphanumerics and underscore, discarding runs shorter than
/// [`MIN_TERM_LEN`]. Non-ASCII code points act as separators (spec.md's
/// Open Question on unicode tokenization is not extended for this MVP).
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_ascii_lowercase();
    let mut terms = Vec::new();
    let mut current = String::new();

    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            current.push(ch);
        } else if !current.is_empty() {
            push_term(&mut terms, &mut current);
        }
    }
    if !current.is_empty() {
        push_term(&mut terms, &mut current);
    }

    terms
}

fn push_term(terms: &mut Vec<String>, current: &mut String) {
    if current.chars().count() >= MIN_TERM_LEN {
        terms.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Reference base-score function from spec.md §4.4:
/// `0.5 * language_weight + 0.5 * min(1, 20/length)`, clamped to `[0, 1]`.
pub fn base_score(language: Language, line_len: usize) -> f32 {
    let length_term = if line_len == 0 { 1.0 } else { (20.0 / line_len as f32).min(1.0) };
    let score = 0.5 * language.weight() + 0.5 * length_term;
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_non_alphanumeric_and_lowercases() {
        assert_eq!(tokenize("fetchUser()"), vec!["fetchuser"]);
        assert_eq!(tokenize("async function fetchUser()"), vec!["async", "function", "fetchuser"]);
    }

    #[test]
    fn discards_short_tokens() {
        assert_eq!(tokenize("a b cd e"), vec!["cd"]);
    }

    #[test]
    fn treats_non_ascii_as_separators() {
        assert_eq!(tokenize("caf\u{e9} bar"), vec!["caf", "bar"]);
    }

    #[test]
    fn base_score_is_bounded_and_monotonic_in_length() {
        let short = base_score(Language::Code, 10);
        let long = base_score(Language::Code, 200);
        assert!((0.0..=1.0).contains(&short));
        assert!((0.0..=1.0).contains(&long));
        assert!(short >= long);
    }

    #[test]
    fn code_outscores_other_at_equal_length() {
        let code = base_score(Language::Code, 40);
        let other = base_score(Language::Other, 40);
        assert!(code > other);
    }
}
