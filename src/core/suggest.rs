//! "Did you mean" suggestions for unknown component and stack names.

use strsim::levenshtein;

/// Maximum allowed Levenshtein distance as a percentage of the target length.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Up to three names closest to `target`, nearest first.
///
/// Ties are broken alphabetically so suggestions are stable across runs.
pub fn find_similar<'a>(target: &str, available: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut scored: Vec<(&str, usize)> =
        available.into_iter().map(|name| (name, levenshtein(target, name))).collect();

    scored.sort_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.cmp(b)));
    scored.dedup_by(|(a, _), (b, _)| a == b);

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(name, _)| name.to_string())
        .collect()
}
