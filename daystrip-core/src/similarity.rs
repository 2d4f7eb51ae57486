//! Title signatures and token-overlap similarity.
//!
//! A signature is an order-insensitive, stop-word-free rendering of a title.
//! It is only ever used for matching, never displayed.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const STOP_WORDS: &[&str] = &[
    "the",
    "of",
    "for",
    "and",
    "a",
    "an",
    "mr",
    "mrs",
    "ms",
    "life",
    "celebration",
    "service",
    "memorial",
    "meeting",
    "event",
];

/// Reduce a title to its matching signature.
///
/// "John Smith's Memorial Service" and "Memorial for John Smith" both become
/// `"john smith"`.
pub fn normalize_title(raw: &str) -> String {
    let folded: String = raw
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(straighten_quote)
        .collect();

    let cleaned: String = strip_possessives(&folded)
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| !STOP_WORDS.contains(t))
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn straighten_quote(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{2035}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
        _ => c,
    }
}

/// Drop `'s` when it ends a word: "smith's" -> "smith".
fn strip_possessives(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let is_possessive = chars[i] == '\''
            && i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1) == Some(&'s')
            && chars.get(i + 2).is_none_or(|c| !c.is_alphanumeric());

        if is_possessive {
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

/// Shared-token ratio of two signatures: `|A ∩ B| / max(|A|, |B|)`.
///
/// Returns 0 when either side has no tokens.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let set_a: HashSet<&str> = a.split_whitespace().collect();
    let set_b: HashSet<&str> = b.split_whitespace().collect();

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let shared = set_a.intersection(&set_b).count();
    shared as f64 / set_a.len().max(set_b.len()) as f64
}
