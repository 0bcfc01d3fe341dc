//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test that touches the filesystem gets its own [`TempWorkspace`]: record files and the
//! index cache live in a fresh temp directory that is removed on drop, so tests run in
//! parallel without seeing each other's caches.
//!
//! # Available Fixtures
//!
//! - `automod_sources`: in-memory records for `guild` and `guild::automod`
//! - `records_workspace`: the same records written to `records.jsonl`, with a [`Config`]
//!   pointing at them and at a cache file in the workspace

use docnav::{Config, ItemRecord, Kind, ModulePath, RecordSource};
use rstest::fixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Analyzer output for a small Discord-style API crate.
#[allow(dead_code)] // Used across different integration test crates
pub const AUTOMOD_RECORDS: &str = r#"
{"name": "Guild", "kind": "struct", "summary": "Guild (server) information.", "module_path": ["guild"]}
{"name": "GuildId", "kind": "type", "summary": "Identifier of a guild.", "module_path": ["guild"]}
{"name": "Action", "kind": "enum", "summary": "An action which will execute whenever a rule is triggered.", "module_path": ["guild", "automod"]}
{"name": "Rule", "kind": "struct", "summary": "Configured auto moderation rule.", "module_path": ["guild", "automod"]}
{"name": "Trigger", "kind": "enum", "summary": "Characterizes the type of content which can trigger the rule.", "module_path": ["guild", "automod"]}
{"name": "TriggerMetadata", "kind": "struct", "summary": "Additional data used to determine whether a rule should be triggered.", "module_path": ["guild", "automod"]}
{"name": "TriggerType", "kind": "enum", "summary": "Type of [`Trigger`].", "module_path": ["guild", "automod"]}
{"name": "ActionExecution", "kind": "struct", "summary": "Gateway event payload sent when a rule is triggered and an action is executed.\n\n[Discord docs](https://discord.com/developers/docs).", "module_path": "guild::automod"}
{"name": "validate_rule", "kind": "fn", "summary": "Checks a rule against the server limits.", "module_path": "guild::automod"}
{"name": "MAX_KEYWORDS", "kind": "constant", "summary": "", "module_path": "guild::automod"}
"#;

/// A temporary workspace directory for test isolation.
///
/// Provides basic filesystem operations within a temp directory that is
/// automatically cleaned up when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Record files plus a configuration that reads them.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct RecordsWorkspace {
    pub workspace: TempWorkspace,
    pub config: Config,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl RecordsWorkspace {
    pub fn new(records: &str) -> Self {
        let workspace = TempWorkspace::new();
        let input = workspace.create_file("records.jsonl", records);
        let config = Config::default()
            .with_overrides(vec![input], Some(workspace.path().join("cache/index.bin")));
        Self { workspace, config }
    }

    /// Overwrite the primary record file.
    pub fn rewrite_records(&self, records: &str) {
        self.workspace.create_file("records.jsonl", records);
    }

    /// Add another record file to the configured inputs.
    pub fn add_input(&mut self, name: &str, records: &str) {
        let path = self.workspace.create_file(name, records);
        self.config.inputs.push(path);
    }

    pub fn cache_path(&self) -> &Path {
        self.config
            .cache_path
            .as_deref()
            .expect("workspace config always has a cache path")
    }
}

#[allow(dead_code)] // Used across different integration test crates
pub fn module(path: &str) -> ModulePath {
    ModulePath::parse(path).expect("valid module path")
}

#[allow(dead_code)] // Used across different integration test crates
pub fn record(module_path: &str, kind: Kind, name: &str) -> ItemRecord {
    ItemRecord::new(module(module_path), kind, name, "").expect("valid record")
}

#[fixture]
pub fn automod_sources() -> Vec<RecordSource> {
    docnav::tracing::init();
    vec![docnav::parse_records("automod.jsonl", AUTOMOD_RECORDS).expect("fixture records parse")]
}

#[fixture]
pub fn records_workspace() -> RecordsWorkspace {
    docnav::tracing::init();
    RecordsWorkspace::new(AUTOMOD_RECORDS)
}
