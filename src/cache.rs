//! On-disk copy of the last successfully generated index.
//!
//! The cache stores the module list and the records of a [`GlobalIndex`] with postcard. Loading
//! rebuilds the index through the regular payload and aggregation path and only accepts the
//! result when its fingerprint matches the stored one.

use crate::aggregate::{GlobalIndex, aggregate};
use crate::error::Result;
use crate::item::{ItemRecord, ModulePath};
use crate::module_index::build_module_payload;
use crate::snapshot::Snapshot;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Bumped whenever the cached layout changes.
const CACHE_FORMAT: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CachedIndex {
    format: u32,
    fingerprint: u64,
    /// Every node of the module tree, including modules without items.
    modules: Vec<ModulePath>,
    records: Vec<ItemRecord>,
}

impl CachedIndex {
    fn capture(snapshot: &Snapshot) -> Self {
        let global = snapshot.global();
        Self {
            format: CACHE_FORMAT,
            fingerprint: snapshot.fingerprint(),
            modules: global
                .module_tree()
                .iter()
                .map(|node| node.path().clone())
                .collect(),
            records: global.entries().map(|(_, record)| record.clone()).collect(),
        }
    }

    fn restore(self, origin: &str) -> Result<GlobalIndex> {
        if self.format != CACHE_FORMAT {
            anyhow::bail!(
                "Unsupported cache format {} (expected {})",
                self.format,
                CACHE_FORMAT
            );
        }

        let mut by_module: BTreeMap<ModulePath, Vec<ItemRecord>> = BTreeMap::new();
        for module in self.modules {
            // Revalidate; the file may have been written by something else.
            let module = ModulePath::new(module.segments().iter().cloned())?;
            by_module.entry(module).or_default();
        }
        for record in self.records {
            let records = by_module.get_mut(&record.module_path).with_context(|| {
                format!("Cached record {} has no module entry", record.fq_path())
            })?;
            records.push(ItemRecord::new(
                record.module_path,
                record.kind,
                record.name,
                &record.summary,
            )?);
        }

        let payloads = by_module
            .into_iter()
            .map(|(module, records)| build_module_payload(module, origin, records))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let global = aggregate(payloads)?;

        let fingerprint = global.fingerprint();
        if fingerprint != self.fingerprint {
            anyhow::bail!(
                "Fingerprint mismatch: stored {:016x}, rebuilt {:016x}",
                self.fingerprint,
                fingerprint
            );
        }
        Ok(global)
    }
}

/// Persist `snapshot` to `path`, replacing any previous cache.
pub async fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let cached = CachedIndex::capture(snapshot);
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_cache(&path, &cached))
        .await
        .context("Cache write task panicked")?
}

fn write_cache(path: &Path, cached: &CachedIndex) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    // Write beside the target and rename so readers never see a partial file.
    let tmp = temp_path(path);
    let file = std::fs::File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    let mut writer = postcard::to_io(cached, BufWriter::new(file))
        .with_context(|| format!("Failed to encode index cache to {}", tmp.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    drop(writer);

    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move cache into place at {}", path.display()))?;
    tracing::debug!(
        "Cached {} records (fingerprint {:016x}) to {}",
        cached.records.len(),
        cached.fingerprint,
        path.display()
    );
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Load and verify the cached index.
///
/// Missing, unreadable, outdated or corrupt caches yield `None`; problems are logged.
pub async fn load(path: &Path) -> Option<Snapshot> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No index cache at {}", path.display());
            return None;
        }
        Err(e) => {
            tracing::warn!("Failed to read index cache {}: {}", path.display(), e);
            return None;
        }
    };

    let origin = path.display().to_string();
    let result = tokio::task::spawn_blocking(move || decode(&bytes, &origin))
        .await
        .context("Cache load task panicked")
        .and_then(|result| result);

    match result {
        Ok(snapshot) => {
            tracing::debug!(
                "Loaded cached index from {} ({} entries)",
                path.display(),
                snapshot.global().len()
            );
            Some(snapshot)
        }
        Err(e) => {
            tracing::warn!("Ignoring index cache {}: {:#}", path.display(), e);
            None
        }
    }
}

fn decode(bytes: &[u8], origin: &str) -> Result<Snapshot> {
    let cached: CachedIndex =
        postcard::from_bytes(bytes).context("Failed to decode index cache")?;
    Ok(Snapshot::build(cached.restore(origin)?))
}
