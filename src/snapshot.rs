//! Immutable index snapshots and their atomic publication.
//!
//! A [`Snapshot`] pairs one [`GlobalIndex`] with the [`SearchIndex`] derived from it. The
//! [`SnapshotStore`] holds the live snapshot; readers take an `Arc` without locking and keep
//! using it while a newer generation is swapped in.

use crate::aggregate::GlobalIndex;
use crate::search::SearchIndex;
use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

/// One fully built generation of the global and search indexes.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    fingerprint: u64,
    built_at: SystemTime,
    global: GlobalIndex,
    search: SearchIndex,
}

impl Snapshot {
    /// Derive the search index and fingerprint for `global`.
    ///
    /// The version is assigned when the snapshot is published.
    pub fn build(global: GlobalIndex) -> Self {
        let search = SearchIndex::build(&global);
        Self {
            version: 0,
            fingerprint: global.fingerprint(),
            built_at: SystemTime::now(),
            global,
            search,
        }
    }

    /// Publication counter; 0 for a snapshot that was never published.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Content hash of the global index.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    pub fn global(&self) -> &GlobalIndex {
        &self.global
    }

    pub fn search(&self) -> &SearchIndex {
        &self.search
    }
}

/// Holder of the live snapshot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: ArcSwapOption<Snapshot>,
    published: AtomicU64,
    /// Serializes publishers so versions go live in the order they were assigned.
    publishing: Mutex<()>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live snapshot, if any has been published.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Assign the next version to `snapshot` and make it live.
    ///
    /// The previous snapshot stays valid for readers that already hold it. Readers never wait
    /// on publishers.
    pub fn publish(&self, mut snapshot: Snapshot) -> Arc<Snapshot> {
        let (snapshot, previous) = {
            let _guard = self
                .publishing
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            snapshot.version = self.published.fetch_add(1, Ordering::AcqRel) + 1;
            let snapshot = Arc::new(snapshot);
            let previous = self.current.swap(Some(Arc::clone(&snapshot)));
            (snapshot, previous)
        };

        tracing::info!(
            "Published snapshot v{} ({} entries, {} modules, fingerprint {:016x}){}",
            snapshot.version,
            snapshot.global.len(),
            snapshot.global.module_tree().len(),
            snapshot.fingerprint,
            previous
                .map(|p| format!(", replacing v{}", p.version))
                .unwrap_or_default()
        );
        snapshot
    }

    /// Number of snapshots published so far.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}
