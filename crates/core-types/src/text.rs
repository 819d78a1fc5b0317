//! Name normalization and phase-label parsing.
//!
//! [`normalize`] is the sole comparison key wherever names are matched:
//! registry lookups, variant classification and finalizing detection all
//! go through it.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercases, strips diacritics and trims. Idempotent.
pub fn normalize(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parses the leading order number from a phase label
/// ("30 Revisión legal" → 30). `None` when the label carries no number.
pub fn leading_phase_number(label: &str) -> Option<u32> {
    let digits: String = label
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// Phase label without its order number, for display.
pub fn phase_title(label: &str) -> &str {
    label
        .trim_start()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', '-'])
        .trim()
}
