//! Locale-style string ordering for name sorts

use std::cmp::Ordering;

/// Compare the way a human-facing list is alphabetized.
///
/// Letters compare case-insensitively first; strings that differ only in
/// case put the lowercase form first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);
    folded_a.cmp(folded_b).then_with(|| b.cmp(a))
}

/// Case-insensitive substring test; an empty needle matches everything.
pub(crate) fn contains_folded(haystack: &str, needle_folded: &str) -> bool {
    needle_folded.is_empty() || haystack.to_lowercase().contains(needle_folded)
}
