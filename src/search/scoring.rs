//! Search ranking.
//!
//! Matches are ordered by:
//! 1. Match tier: exact name, then prefix, then substring
//! 2. Shorter names first
//! 3. Kind priority (see [`Kind::search_priority`])
//! 4. Sidebar name order, then module path, so the order is total

use crate::item::{FqPath, Kind, sidebar_order};
use std::cmp::Ordering;

/// How a lowercased name matched a lowercased query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Prefix,
    Substring,
}

/// Classify a match; `None` when `name_lower` does not contain `query_lower` at all.
pub fn match_tier(name_lower: &str, query_lower: &str) -> Option<MatchTier> {
    if query_lower.is_empty() {
        None
    } else if name_lower == query_lower {
        Some(MatchTier::Exact)
    } else if name_lower.starts_with(query_lower) {
        Some(MatchTier::Prefix)
    } else if name_lower.contains(query_lower) {
        Some(MatchTier::Substring)
    } else {
        None
    }
}

/// Compare two ranked matches; `Less` means `a` is listed first.
pub fn compare_matches(a: (MatchTier, &FqPath), b: (MatchTier, &FqPath)) -> Ordering {
    let (tier_a, path_a) = a;
    let (tier_b, path_b) = b;

    tier_a
        .cmp(&tier_b)
        .then_with(|| name_len(path_a).cmp(&name_len(path_b)))
        .then_with(|| priority(path_a.kind).cmp(&priority(path_b.kind)))
        .then_with(|| sidebar_order(&path_a.name, &path_b.name))
        .then_with(|| path_a.module.cmp(&path_b.module))
        .then_with(|| path_a.kind.cmp(&path_b.kind))
}

fn name_len(path: &FqPath) -> usize {
    path.name.chars().count()
}

const fn priority(kind: Kind) -> u8 {
    kind.search_priority()
}
