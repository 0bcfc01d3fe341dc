//! Name index over a [`GlobalIndex`] for prefix and substring lookups.

use super::scoring::{MatchTier, compare_matches, match_tier};
use crate::aggregate::GlobalIndex;
use crate::item::{FqPath, fold_case};
use rapidfuzz::distance::jaro_winkler;
use std::collections::BTreeSet;

/// A fuzzy name suggestion with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion<'a> {
    pub name: &'a str,
    /// Jaro-Winkler similarity, 0.0 to 1.0.
    pub score: f64,
}

/// Read-only search structure derived from one [`GlobalIndex`].
///
/// Holds lowercased names sorted lexically, each paired with the [`FqPath`] of its entry, so a
/// prefix lookup is a binary search followed by a contiguous scan. Summaries stay in the
/// global index; results are resolved against it by path.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    names: Vec<(String, FqPath)>,
}

impl SearchIndex {
    /// Build the index in a single pass over `global`.
    pub fn build(global: &GlobalIndex) -> Self {
        let start = std::time::Instant::now();
        let mut names: Vec<(String, FqPath)> = global
            .entries()
            .map(|(path, _)| (fold_case(&path.name), path.clone()))
            .collect();
        names.sort_unstable();

        tracing::debug!(
            "Search index built with {} names in {:?}",
            names.len(),
            start.elapsed()
        );
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries whose name starts with `query`, case-insensitively, best match first.
    ///
    /// An empty query returns nothing rather than every entry.
    pub fn lookup_prefix(&self, query: &str) -> Vec<&FqPath> {
        if query.is_empty() {
            return vec![];
        }
        let query = fold_case(query);
        let start = self
            .names
            .partition_point(|(name, _)| name.as_str() < query.as_str());

        let matches = self.names[start..]
            .iter()
            .take_while(|(name, _)| name.starts_with(&query))
            .filter_map(|(name, path)| Some((match_tier(name, &query)?, path)));
        rank(matches)
    }

    /// Entries whose name contains `query`, case-insensitively, best match first.
    ///
    /// Exact and prefix matches still rank ahead of inner matches.
    pub fn lookup_substring(&self, query: &str) -> Vec<&FqPath> {
        if query.is_empty() {
            return vec![];
        }
        let query = fold_case(query);
        let matches = self
            .names
            .iter()
            .filter_map(|(name, path)| Some((match_tier(name, &query)?, path)));
        rank(matches)
    }

    /// Distinct item names similar to `query`, best first.
    pub fn suggest(&self, query: &str, limit: usize, threshold: f64) -> Vec<Suggestion<'_>> {
        let query = fold_case(query.trim());
        if query.is_empty() || limit == 0 {
            return vec![];
        }

        let distinct: BTreeSet<&str> = self.names.iter().map(|(_, p)| p.name.as_str()).collect();
        let mut suggestions: Vec<Suggestion<'_>> = distinct
            .into_iter()
            .map(|name| Suggestion {
                name,
                score: jaro_winkler::similarity(query.chars(), fold_case(name).chars()),
            })
            .filter(|s| s.score >= threshold)
            .collect();

        suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.name.cmp(b.name)));
        suggestions.truncate(limit);
        suggestions
    }
}

fn rank<'a>(matches: impl Iterator<Item = (MatchTier, &'a FqPath)>) -> Vec<&'a FqPath> {
    let mut ranked: Vec<(MatchTier, &FqPath)> = matches.collect();
    ranked.sort_by(|a, b| compare_matches(*a, *b));
    ranked.into_iter().map(|(_, path)| path).collect()
}
