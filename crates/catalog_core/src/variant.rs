use std::collections::HashSet;

use crate::SizePriceCombination;

/// Label used when a product has a single, unnamed size.
pub const STANDARD_SIZE: &str = "Standard";

const DEFAULT_TITLE: &str = "default title";
const SAMPLE: &str = "sample";

/// Clean a size label read from a page or from structured data.
///
/// Strips every case-insensitive occurrence of "sample", collapses
/// whitespace and maps the platform placeholder "Default Title" to
/// [`STANDARD_SIZE`]. A label that consists only of "sample" is kept as-is.
pub fn clean_size_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(DEFAULT_TITLE) {
        return STANDARD_SIZE.to_string();
    }

    let lowered = trimmed.to_ascii_lowercase();
    let mut stripped = String::with_capacity(trimmed.len());
    let mut cursor = 0;
    while let Some(found) = lowered[cursor..].find(SAMPLE) {
        let start = cursor + found;
        stripped.push_str(&trimmed[cursor..start]);
        stripped.push(' ');
        cursor = start + SAMPLE.len();
    }
    stripped.push_str(&trimmed[cursor..]);

    let cleaned = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return trimmed.to_string();
    }
    if cleaned.eq_ignore_ascii_case(DEFAULT_TITLE) {
        return STANDARD_SIZE.to_string();
    }
    cleaned
}

/// Drop later duplicates of the same `(size, price)` pair, keeping the order
/// in which pairs were first seen.
pub fn dedupe_combinations(combinations: Vec<SizePriceCombination>) -> Vec<SizePriceCombination> {
    let mut seen = HashSet::with_capacity(combinations.len());
    combinations
        .into_iter()
        .filter(|combo| seen.insert((combo.size.clone(), combo.price.clone())))
        .collect()
}
