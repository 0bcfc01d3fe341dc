//! Error handling types and utilities.
//!
//! Structural-integrity failures (duplicates, path collisions) and caller misuse (bad paging)
//! are typed so callers can react to each one; process edges use [`Result`].

use crate::item::{FqPath, ItemRecord, Kind, ModulePath};

/// A specialized Result type for docnav operations at the application edges.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods in the CLI, server and cache layers.
pub type Result<T> = anyhow::Result<T>;

/// Malformed analyzer input.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("module path must have at least one segment")]
    EmptyModulePath,
    #[error("invalid segment '{segment}' in module path '{path}'")]
    InvalidSegment { segment: String, path: String },
    #[error("item in module '{module}' has an empty name")]
    EmptyName { module: String },
    #[error("unknown item kind '{0}'")]
    UnknownKind(String),
    #[error("malformed record #{index} in {source_name}: {error}")]
    Record {
        source_name: String,
        index: usize,
        error: Box<IngestError>,
    },
    #[error("failed to parse records from {source_name}: {error}")]
    Json {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
}

/// Two or more records share `(module, kind, name)` within one module build.
#[derive(Debug, Clone, thiserror::Error)]
#[error(
    "duplicate {kind} '{name}' in module '{module}' ({} conflicting records)",
    .records.len()
)]
pub struct DuplicateItemError {
    pub module: ModulePath,
    pub kind: Kind,
    pub name: String,
    /// Every record that claimed the slot, in input order.
    pub records: Vec<ItemRecord>,
}

/// Failure of a single module build.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateItemError),
    #[error("record '{}' belongs to module '{}', not '{module}'", .record.name, .record.module_path)]
    ForeignRecord {
        module: ModulePath,
        record: Box<ItemRecord>,
    },
}

impl BuildError {
    /// Module whose build failed.
    pub const fn module(&self) -> &ModulePath {
        match self {
            Self::Duplicate(err) => &err.module,
            Self::ForeignRecord { module, .. } => module,
        }
    }
}

/// Where a module payload came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSource {
    pub module: ModulePath,
    pub origin: String,
}

impl std::fmt::Display for PayloadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' from {}", self.module, self.origin)
    }
}

/// Two payloads produced the same fully-qualified path.
#[derive(Debug, Clone, thiserror::Error)]
#[error("path collision on {} '{path}': {first} and {second}", .path.kind)]
pub struct PathCollisionError {
    pub path: FqPath,
    pub first: PayloadSource,
    pub second: PayloadSource,
    /// The already indexed record and the one that collided with it.
    pub records: Box<[ItemRecord; 2]>,
}

/// Paging parameters outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid page: offset {offset} must be >= 0 and limit {limit} must be > 0")]
pub struct InvalidPageError {
    pub offset: i64,
    pub limit: i64,
}

/// Failure of a complete generation run. Nothing is published when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{} module build(s) failed; first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Modules(Vec<BuildError>),
    #[error(transparent)]
    Collision(#[from] PathCollisionError),
    #[error("generation run was cancelled")]
    Cancelled,
    #[error("module build task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure of a search request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    InvalidPage(#[from] InvalidPageError),
    #[error("no documentation index has been published yet")]
    NotReady,
}

impl QueryError {
    /// Whether the caller, rather than the service, is at fault.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidPage(_))
    }
}

/// Malformed `SIDEBAR_ITEMS` script.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("expected a `window.{0} = ...;` assignment")]
    MissingAssignment(&'static str),
    #[error("invalid sidebar payload JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("kind `{0}` appears more than once in the sidebar payload")]
    RepeatedKind(String),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Build(#[from] BuildError),
}
