//! Generation runs: records in, published snapshot out.
//!
//! A run groups analyzer records by `(source, module)`, builds every module payload on its
//! own blocking task, waits for all of them, then aggregates and indexes on one more blocking
//! task. Any failure, or cancellation before the end, leaves the store untouched.

use crate::aggregate::aggregate;
use crate::cache;
use crate::config::Config;
use crate::error::{BuildError, GenerationError};
use crate::ingest::{RecordSource, read_sources};
use crate::item::{ItemRecord, ModulePath};
use crate::module_index::{ModulePayload, build_module_payload};
use crate::snapshot::{Snapshot, SnapshotStore};
use ahash::AHashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

struct ModuleGroup {
    module: ModulePath,
    origin: String,
    records: Vec<ItemRecord>,
}

/// Split sources into per-module groups, ordered by source then module path.
fn group_records(sources: Vec<RecordSource>) -> Vec<ModuleGroup> {
    let mut by_module: AHashMap<(usize, ModulePath), Vec<ItemRecord>> = AHashMap::new();
    let mut origins = Vec::with_capacity(sources.len());

    for (source_idx, source) in sources.into_iter().enumerate() {
        origins.push(source.origin);
        for record in source.records {
            by_module
                .entry((source_idx, record.module_path.clone()))
                .or_default()
                .push(record);
        }
    }

    let mut groups: Vec<_> = by_module.into_iter().collect();
    groups.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    groups
        .into_iter()
        .map(|((source_idx, module), records)| ModuleGroup {
            module,
            origin: origins[source_idx].clone(),
            records,
        })
        .collect()
}

/// Build a snapshot from analyzer records.
///
/// Every module is built even after one fails, so a single run reports all duplicates.
pub async fn generate(
    sources: Vec<RecordSource>,
    cancel: &CancellationToken,
) -> Result<Snapshot, GenerationError> {
    let start = Instant::now();
    let groups = group_records(sources);
    let module_count = groups.len();

    let mut tasks = JoinSet::new();
    for (idx, group) in groups.into_iter().enumerate() {
        tasks.spawn_blocking(move || {
            (
                idx,
                build_module_payload(group.module, group.origin, group.records),
            )
        });
    }

    let mut payloads: Vec<Option<ModulePayload>> = (0..module_count).map(|_| None).collect();
    let mut failures: Vec<(usize, BuildError)> = Vec::new();

    loop {
        let joined = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tasks.abort_all();
                tracing::info!("Generation cancelled while building modules");
                return Err(GenerationError::Cancelled);
            }
            joined = tasks.join_next() => joined,
        };
        let Some(joined) = joined else { break };

        match joined? {
            (idx, Ok(payload)) => payloads[idx] = Some(payload),
            (idx, Err(err)) => {
                tracing::warn!("Module build failed: {}", err);
                failures.push((idx, err));
            }
        }
    }

    if !failures.is_empty() {
        // Task completion order is arbitrary; report in input order.
        failures.sort_unstable_by_key(|(idx, _)| *idx);
        return Err(GenerationError::Modules(
            failures.into_iter().map(|(_, err)| err).collect(),
        ));
    }

    tracing::debug!(
        "Built {} module payloads in {:?}",
        module_count,
        start.elapsed()
    );

    generate_from_payloads(payloads.into_iter().flatten().collect(), cancel).await
}

/// Aggregate already built payloads and index them.
pub async fn generate_from_payloads(
    payloads: Vec<ModulePayload>,
    cancel: &CancellationToken,
) -> Result<Snapshot, GenerationError> {
    if cancel.is_cancelled() {
        return Err(GenerationError::Cancelled);
    }

    let start = Instant::now();
    let snapshot =
        tokio::task::spawn_blocking(move || aggregate(payloads).map(Snapshot::build)).await??;

    if cancel.is_cancelled() {
        tracing::info!("Generation cancelled after aggregation; discarding result");
        return Err(GenerationError::Cancelled);
    }

    tracing::debug!(
        "Aggregated and indexed {} entries in {:?}",
        snapshot.global().len(),
        start.elapsed()
    );
    Ok(snapshot)
}

impl SnapshotStore {
    /// Run a full generation and publish the result.
    ///
    /// On failure the previously published snapshot stays live.
    pub async fn regenerate(
        &self,
        sources: Vec<RecordSource>,
        cancel: &CancellationToken,
    ) -> Result<Arc<Snapshot>, GenerationError> {
        match generate(sources, cancel).await {
            Ok(snapshot) => Ok(self.publish(snapshot)),
            Err(err) => {
                tracing::error!(
                    "Generation failed; keeping snapshot v{}: {}",
                    self.current().map_or(0, |s| s.version()),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Read the configured inputs, regenerate, and persist the result to the cache.
pub async fn refresh(
    config: &Config,
    store: &SnapshotStore,
    cancel: &CancellationToken,
) -> anyhow::Result<Arc<Snapshot>> {
    if config.inputs.is_empty() {
        anyhow::bail!("No inputs configured; pass --input or set `inputs` in the config file");
    }

    let sources = read_sources(&config.inputs).await?;
    let snapshot = store.regenerate(sources, cancel).await?;

    if let Some(path) = &config.cache_path
        && let Err(e) = cache::save(path, &snapshot).await
    {
        tracing::warn!("Failed to write index cache: {:#}", e);
    }
    Ok(snapshot)
}

/// Initial generation for a long-running service.
///
/// Falls back to the cached index when the inputs cannot be generated.
pub async fn startup(
    config: &Config,
    store: &SnapshotStore,
    cancel: &CancellationToken,
) -> anyhow::Result<Arc<Snapshot>> {
    let err = match refresh(config, store, cancel).await {
        Ok(snapshot) => return Ok(snapshot),
        Err(err) => err,
    };

    let Some(path) = &config.cache_path else {
        return Err(err);
    };
    match cache::load(path).await {
        Some(snapshot) => {
            tracing::warn!(
                "Serving cached index from {} after failed generation: {:#}",
                path.display(),
                err
            );
            Ok(store.publish(snapshot))
        }
        None => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Kind;
    use assert2::{check, let_assert};

    fn source(origin: &str, items: &[(&str, Kind, &str)]) -> RecordSource {
        RecordSource {
            origin: origin.to_string(),
            records: items
                .iter()
                .map(|(module, kind, name)| {
                    ItemRecord::new(ModulePath::parse(module).unwrap(), *kind, *name, "").unwrap()
                })
                .collect(),
        }
    }

    #[test]
    fn test_groups_by_source_then_module() {
        let groups = group_records(vec![
            source(
                "b.jsonl",
                &[
                    ("guild::automod", Kind::Struct, "Rule"),
                    ("guild", Kind::Struct, "Guild"),
                    ("guild::automod", Kind::Enum, "Action"),
                ],
            ),
            source("a.jsonl", &[("channel", Kind::Struct, "Channel")]),
        ]);

        let keys: Vec<(String, String, usize)> = groups
            .iter()
            .map(|g| (g.origin.clone(), g.module.to_string(), g.records.len()))
            .collect();
        check!(
            keys == vec![
                ("b.jsonl".to_string(), "guild".to_string(), 1),
                ("b.jsonl".to_string(), "guild::automod".to_string(), 2),
                ("a.jsonl".to_string(), "channel".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_publishes_nothing() {
        let store = SnapshotStore::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = store
            .regenerate(
                vec![source("a.jsonl", &[("guild", Kind::Struct, "Guild")])],
                &cancel,
            )
            .await;

        let_assert!(Err(GenerationError::Cancelled) = result);
        check!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_refresh_without_inputs_fails() {
        let store = SnapshotStore::new();
        let err = refresh(&Config::default(), &store, &CancellationToken::new())
            .await
            .unwrap_err();
        check!(err.to_string().contains("No inputs configured"));
    }
}
