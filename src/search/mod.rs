//! Name search over the published documentation index.
//!
//! This module provides the prefix/substring name index, its ranking policy, and the
//! paginated query service that answers requests against the current snapshot.

// Module declarations
pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;

// Public re-exports (used via lib.rs)
pub use index::{SearchIndex, Suggestion};
pub use query::{
    MatchMode, QueryService, SearchHit, SearchRequest, SearchResponse, search_snapshot,
};
pub use scoring::MatchTier;
