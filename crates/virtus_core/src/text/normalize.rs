//! Accent folding and slug derivation.
//!
//! # Invariants
//! - `normalize` output is ASCII-only and lowercase.
//! - `normalize` is applied identically to stored text and to user queries.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid slug separator regex"));

/// Signature of a text folding function handed to query builders.
pub type Normalizer = fn(&str) -> String;

/// Folds `text` for comparison: NFKD decomposition, non-ASCII dropped,
/// lowercased.
///
/// `"Épaules"` and `"epaules"` both fold to `"epaules"`.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(char::is_ascii)
        .collect::<String>()
        .to_lowercase()
}

/// [`normalize`] for optional columns; `None` folds to `""`.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Derives a lowercase ASCII slug, e.g. `"Développé couché"` -> `"developpe-couche"`.
pub fn slugify(value: &str) -> String {
    let folded = value.nfkd().filter(char::is_ascii).collect::<String>();
    NON_ALNUM_RE
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_lowercase()
}
