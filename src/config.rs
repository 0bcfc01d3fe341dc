//! Service configuration.
//!
//! Settings come from an optional TOML file, then command-line overrides:
//!
//! ```toml
//! inputs = ["~/docs/records.jsonl"]
//! cache_path = "~/.cache/docnav/index.bin"
//!
//! [search]
//! default_limit = 10
//! max_limit = 100
//!
//! [log]
//! level = "info"
//! format = "compact"
//! ```

use crate::error::Result;
use anyhow::Context;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// File consulted when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "docnav.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Analyzer record files, read in order on every generation run.
    pub inputs: Vec<PathBuf>,
    /// Where the last good index is persisted. No cache when unset.
    pub cache_path: Option<PathBuf>,
    pub search: SearchSettings,
    pub log: LogSettings,
}

/// Paging and suggestion limits for the query service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    /// Page size used when a request omits `limit`.
    pub default_limit: usize,
    /// Upper bound applied to every requested `limit`.
    pub max_limit: usize,
    pub suggestion_limit: usize,
    /// Minimum Jaro-Winkler similarity for a "did you mean" suggestion.
    pub suggestion_threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            suggestion_limit: 5,
            suggestion_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` still takes precedence.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).context("Invalid configuration")?;
        config.expand_paths();
        Ok(config)
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] when present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
            None => return Ok(Self::default()),
        };

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
    }

    /// Apply command-line overrides. A non-empty `inputs` replaces the configured list.
    pub fn with_overrides(mut self, inputs: Vec<PathBuf>, cache_path: Option<PathBuf>) -> Self {
        if !inputs.is_empty() {
            self.inputs = inputs;
        }
        if cache_path.is_some() {
            self.cache_path = cache_path;
        }
        self.expand_paths();
        self
    }

    fn expand_paths(&mut self) {
        for input in &mut self.inputs {
            *input = expand_path(input);
        }
        if let Some(cache) = &mut self.cache_path {
            *cache = expand_path(cache);
        }
    }
}

fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(text) => PathBuf::from(expand_tilde(text).as_ref()),
        None => path.to_path_buf(),
    }
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml("").unwrap();
        check!(config.inputs.is_empty());
        check!(config.cache_path.is_none());
        check!(config.search == SearchSettings::default());
        check!(config.log.format == LogFormat::Compact);
    }

    #[test]
    fn test_partial_search_table_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
inputs = ["records.jsonl", "more.jsonl"]

[search]
max_limit = 25

[log]
format = "json"
"#,
        )
        .unwrap();

        check!(config.inputs == vec![PathBuf::from("records.jsonl"), PathBuf::from("more.jsonl")]);
        check!(config.search.max_limit == 25);
        check!(config.search.default_limit == 10);
        check!(config.log.format == LogFormat::Json);
        check!(config.log.level == "info");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let_assert!(Err(err) = Config::from_toml("input = [\"typo.jsonl\"]"));
        check!(format!("{err:#}").contains("Invalid configuration"));
    }

    #[test]
    fn test_cli_inputs_replace_configured_inputs() {
        let config = Config::from_toml(r#"inputs = ["a.jsonl"]"#)
            .unwrap()
            .with_overrides(vec![PathBuf::from("b.jsonl")], None);
        check!(config.inputs == vec![PathBuf::from("b.jsonl")]);

        let config = config.with_overrides(vec![], Some(PathBuf::from("cache.bin")));
        check!(config.inputs == vec![PathBuf::from("b.jsonl")]);
        check!(config.cache_path == Some(PathBuf::from("cache.bin")));
    }

    #[rstest]
    #[case("/absolute/path", "/absolute/path")]
    #[case("relative/path", "relative/path")]
    #[case("not~tilde", "not~tilde")]
    fn test_expand_tilde_leaves_plain_paths(#[case] input: &str, #[case] expected: &str) {
        check!(expand_tilde(input) == expected);
    }

    #[test]
    fn test_expand_tilde_home() {
        if let Some(home) = dirs::home_dir() {
            check!(expand_tilde("~") == home.display().to_string());
            check!(expand_tilde("~/docs") == home.join("docs").display().to_string());
        }
    }
}
