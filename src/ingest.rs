//! Analyzer record ingestion.
//!
//! Accepts a JSON array of records or a stream of concatenated / newline-delimited record
//! objects:
//!
//! ```json
//! {"name": "Rule", "kind": "struct", "summary": "Configured auto moderation rule.", "module_path": ["guild", "automod"]}
//! {"name": "Action", "kind": "enum", "modulePath": "guild::automod"}
//! ```
//!
//! Summaries are reduced to one line here; nothing downstream truncates.

use crate::error::IngestError;
use crate::item::{ItemRecord, Kind, ModulePath};
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Records reported by one input source, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSource {
    /// Human-readable source name (usually the file path), used in error reports.
    pub origin: String,
    pub records: Vec<ItemRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    name: String,
    kind: String,
    #[serde(default, alias = "docs")]
    summary: String,
    #[serde(alias = "modulePath")]
    module_path: RawModulePath,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawModulePath {
    Segments(Vec<String>),
    Joined(String),
}

impl RawRecord {
    fn into_record(self) -> Result<ItemRecord, IngestError> {
        let module_path = match self.module_path {
            RawModulePath::Segments(segments) => ModulePath::new(segments)?,
            RawModulePath::Joined(joined) => ModulePath::parse(&joined)?,
        };
        let kind: Kind = self.kind.trim().parse()?;
        ItemRecord::new(module_path, kind, self.name, &self.summary)
    }
}

/// Parse every record in `text`.
pub fn parse_records(origin: &str, text: &str) -> Result<RecordSource, IngestError> {
    let json_error = |error| IngestError::Json {
        source_name: origin.to_string(),
        error,
    };

    let raw: Vec<RawRecord> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text).map_err(json_error)?
    } else {
        serde_json::Deserializer::from_str(text)
            .into_iter::<RawRecord>()
            .collect::<Result<_, _>>()
            .map_err(json_error)?
    };

    let records = raw
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            raw.into_record().map_err(|error| IngestError::Record {
                source_name: origin.to_string(),
                index,
                error: Box::new(error),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecordSource {
        origin: origin.to_string(),
        records,
    })
}

/// Read and parse one record file.
pub async fn read_source(path: &Path) -> anyhow::Result<RecordSource> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let origin = path.display().to_string();

    let source = tokio::task::spawn_blocking(move || parse_records(&origin, &text))
        .await
        .context("Record parsing task panicked")??;

    tracing::debug!(
        "Read {} records from {}",
        source.records.len(),
        path.display()
    );
    Ok(source)
}

/// Read every configured input, in order.
pub async fn read_sources(paths: &[impl AsRef<Path>]) -> anyhow::Result<Vec<RecordSource>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        sources.push(read_source(path.as_ref()).await?);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn test_parses_newline_delimited_records() {
        let text = r#"
{"name": "Rule", "kind": "struct", "summary": "Configured auto moderation rule.", "module_path": ["guild", "automod"]}
{"name": "Action", "kind": "enum", "modulePath": "guild::automod"}
"#;
        let source = parse_records("records.jsonl", text).unwrap();

        check!(source.origin == "records.jsonl");
        check!(source.records.len() == 2);
        check!(source.records[0].summary == "Configured auto moderation rule.");
        check!(source.records[1].module_path.to_string() == "guild::automod");
        check!(source.records[1].summary.is_empty());
    }

    #[test]
    fn test_parses_array_and_truncates_summary() {
        let text = r#"[{"name": "ActionExecution", "kind": "struct", "docs": "Gateway event payload sent when a rule is triggered\nand an action is executed.\n\n[Discord docs](https://example.invalid).", "module_path": "guild::automod"}]"#;
        let source = parse_records("records.json", text).unwrap();

        check!(
            source.records[0].summary
                == "Gateway event payload sent when a rule is triggered and an action is executed."
        );
    }

    #[test]
    fn test_reports_record_index_for_unknown_kind() {
        let text = r#"
{"name": "Rule", "kind": "struct", "module_path": "guild::automod"}
{"name": "Widget", "kind": "class", "module_path": "guild::automod"}
"#;
        let err = parse_records("records.jsonl", text).unwrap_err();

        let IngestError::Record { index, error, .. } = err else {
            panic!("expected a record error");
        };
        check!(index == 1);
        check!(let IngestError::UnknownKind(_) = *error);
    }

    #[test]
    fn test_rejects_empty_module_path() {
        let text = r#"{"name": "Rule", "kind": "struct", "module_path": []}"#;
        let err = parse_records("records.jsonl", text).unwrap_err();
        check!(let IngestError::Record { .. } = err);
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = parse_records("records.jsonl", "{\"name\": ").unwrap_err();
        check!(let IngestError::Json { .. } = err);
    }
}
