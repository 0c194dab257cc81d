//! Similarity Deduplication
//!
//! Cheap lexical near-duplicate detection: Jaccard index over normalized
//! token sets. Catches agents restating the same fact in slightly different
//! words; paraphrases with disjoint vocabulary slip through (documented
//! limitation, not a defect).

use std::collections::HashSet;

/// Tokens shorter than this are discarded during normalization.
const MIN_TOKEN_LEN: usize = 4;

/// Normalize a text into its comparison token set: lowercase, split on
/// non-alphanumeric characters, discard short tokens.
pub fn normalize_tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .map(|t| t.to_string())
        .collect()
}

/// Jaccard index of the normalized token sets of `a` and `b`, in `[0, 1]`.
///
/// Returns 0.0 when either normalized set is empty.
pub fn similar(a: &str, b: &str) -> f32 {
    let set_a = normalize_tokens(a);
    let set_b = normalize_tokens(b);

    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();

    if union == 0 {
        0.0
    } else {
        intersection as f32 / union as f32
    }
}
