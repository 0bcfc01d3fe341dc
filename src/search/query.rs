//! Paginated search over the published snapshot.

use crate::config::SearchSettings;
use crate::error::{InvalidPageError, QueryError};
use crate::item::Kind;
use crate::snapshot::{Snapshot, SnapshotStore};
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// DO NOT add doc comments to individual variants - this causes schemars to generate
/// `oneOf` schemas instead of simple `enum` arrays, breaking MCP client enum handling.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Prefix,
    Substring,
}

#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Item name or name prefix, matched case-insensitively
    pub query: String,
    /// Number of ranked results to skip (default: 0)
    #[serde(default)]
    pub offset: i64,
    /// Maximum number of results to return (default: 10)
    #[serde(default)]
    pub limit: Option<i64>,
    /// Match names by prefix (default) or anywhere in the name
    #[serde(default)]
    pub mode: MatchMode,
}

impl SearchRequest {
    pub fn prefix(query: impl Into<String>, offset: i64, limit: i64) -> Self {
        Self {
            query: query.into(),
            offset,
            limit: Some(limit),
            mode: MatchMode::Prefix,
        }
    }
}

/// One search result, complete enough to render without another lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Display form of the fully-qualified path, e.g. `guild::automod::Rule`
    pub path: String,
    pub kind: Kind,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Number of matches before pagination
    pub total: usize,
    pub results: Vec<SearchHit>,
    /// Similar item names, only filled when nothing matched
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    /// Version of the snapshot that answered the query
    pub snapshot: u64,
}

/// Validate paging and resolve the effective `(offset, limit)`.
fn page(
    request: &SearchRequest,
    settings: &SearchSettings,
) -> Result<(usize, usize), InvalidPageError> {
    let limit = request
        .limit
        .unwrap_or_else(|| i64::try_from(settings.default_limit).unwrap_or(i64::MAX));
    let invalid = InvalidPageError {
        offset: request.offset,
        limit,
    };

    let offset = usize::try_from(request.offset).map_err(|_| invalid)?;
    if limit <= 0 {
        return Err(invalid);
    }
    let limit = usize::try_from(limit)
        .unwrap_or(usize::MAX)
        .min(settings.max_limit.max(1));
    Ok((offset, limit))
}

/// Answer one request against one snapshot.
pub fn search_snapshot(
    snapshot: &Snapshot,
    request: &SearchRequest,
    settings: &SearchSettings,
) -> Result<SearchResponse, QueryError> {
    let (offset, limit) = page(request, settings)?;
    let query = request.query.trim();

    let matches = match request.mode {
        MatchMode::Prefix => snapshot.search().lookup_prefix(query),
        MatchMode::Substring => snapshot.search().lookup_substring(query),
    };

    let results: Vec<SearchHit> = matches
        .iter()
        .skip(offset)
        .take(limit)
        .filter_map(|path| {
            let record = snapshot.global().get(path)?;
            Some(SearchHit {
                path: path.to_string(),
                kind: path.kind,
                summary: record.summary.clone(),
            })
        })
        .collect();

    let suggestions = if matches.is_empty() {
        snapshot
            .search()
            .suggest(
                query,
                settings.suggestion_limit,
                settings.suggestion_threshold,
            )
            .into_iter()
            .map(|s| s.name.to_string())
            .collect()
    } else {
        vec![]
    };

    Ok(SearchResponse {
        total: matches.len(),
        results,
        suggestions,
        snapshot: snapshot.version(),
    })
}

/// Read-only query front end over a [`SnapshotStore`].
///
/// Each call pins the snapshot current at its start, so a concurrent regeneration never mixes
/// two generations into one response.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<SnapshotStore>,
    settings: SearchSettings,
}

impl QueryService {
    pub fn new(store: Arc<SnapshotStore>, settings: SearchSettings) -> Self {
        Self { store, settings }
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResponse, QueryError> {
        // Paging errors are reported even before the first snapshot exists.
        page(request, &self.settings)?;
        let snapshot = self.store.current().ok_or(QueryError::NotReady)?;
        search_snapshot(&snapshot, request, &self.settings)
    }
}
