//! Documentation navigation index: per-module sidebar payloads, a global path index, name
//! search, and an MCP server answering sidebar and search queries from atomically published
//! snapshots.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod item;
pub mod module_index;
pub mod search;
pub mod server;
pub mod sidebar;
pub mod snapshot;
pub mod tracing;
pub mod wire;

pub use aggregate::{GlobalIndex, ModuleNode, ModuleTree, aggregate};
pub use config::{Config, SearchSettings};
pub use error::{
    BuildError, DuplicateItemError, GenerationError, IngestError, InvalidPageError,
    PathCollisionError, QueryError, WireError,
};
pub use generate::{generate, generate_from_payloads, refresh, startup};
pub use ingest::{RecordSource, parse_records, read_source, read_sources};
pub use item::{FqPath, ItemRecord, Kind, ModulePath, fold_case, sidebar_order};
pub use module_index::{ModulePayload, build_module_payload};
pub use search::{MatchMode, QueryService, SearchHit, SearchIndex, SearchRequest, SearchResponse};
pub use server::DocNavServer;
pub use sidebar::{NavBucket, NavChild, NavItem, NavTree, render_roots, render_sidebar};
pub use snapshot::{Snapshot, SnapshotStore};
