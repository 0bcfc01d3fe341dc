//! Per-module sidebar payloads.
//!
//! [`build_module_payload`] turns the unordered records the analyzer reported for one module
//! into a [`ModulePayload`]: one bucket per declared [`Kind`], each in sidebar order.

use crate::error::{BuildError, DuplicateItemError, WireError};
use crate::item::{ItemRecord, Kind, ModulePath, sidebar_order};
use crate::wire::{self, SidebarItems};
use std::collections::BTreeMap;

/// Immutable sidebar data for one module.
///
/// Every declared kind has a bucket, possibly empty, so consumers never need existence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulePayload {
    module_path: ModulePath,
    origin: String,
    buckets: BTreeMap<Kind, Vec<ItemRecord>>,
}

impl ModulePayload {
    pub fn module_path(&self) -> &ModulePath {
        &self.module_path
    }

    /// Input source this payload was built from.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Items of one kind, in sidebar order.
    pub fn bucket(&self, kind: Kind) -> &[ItemRecord] {
        self.buckets.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// All buckets in kind order, including empty ones.
    pub fn buckets(&self) -> impl Iterator<Item = (Kind, &[ItemRecord])> {
        self.buckets
            .iter()
            .map(|(kind, items)| (*kind, items.as_slice()))
    }

    /// Total number of items across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }

    /// Consume the payload, yielding its records in kind then sidebar order.
    pub fn into_records(self) -> impl Iterator<Item = ItemRecord> {
        self.buckets.into_values().flatten()
    }

    /// Wire form of this payload.
    pub fn to_sidebar_items(&self) -> SidebarItems<'_> {
        SidebarItems::from_buckets(self.buckets().map(|(kind, items)| {
            (
                kind,
                items
                    .iter()
                    .map(|item| (item.name.as_str(), item.summary.as_str())),
            )
        }))
    }

    /// `window.SIDEBAR_ITEMS = {...};` script for this module.
    pub fn to_sidebar_js(&self) -> String {
        self.to_sidebar_items().to_js()
    }

    /// Rebuild a payload from a previously emitted `SIDEBAR_ITEMS` script.
    ///
    /// The decoded records go through the same validation and ordering as analyzer input.
    pub fn from_sidebar_js(
        module_path: ModulePath,
        origin: impl Into<String>,
        script: &str,
    ) -> Result<Self, WireError> {
        let decoded = wire::parse_js(script)?;
        let mut records = Vec::new();
        for (kind, items) in decoded {
            for (name, summary) in items {
                records.push(ItemRecord::new(module_path.clone(), kind, name, &summary)?);
            }
        }
        Ok(build_module_payload(module_path, origin, records)?)
    }
}

/// Build the payload for one module.
///
/// Records must all belong to `module_path`. A repeated `(kind, name)` pair fails with
/// [`DuplicateItemError`] carrying every conflicting record; nothing is dropped or merged.
pub fn build_module_payload(
    module_path: ModulePath,
    origin: impl Into<String>,
    records: Vec<ItemRecord>,
) -> Result<ModulePayload, BuildError> {
    let mut buckets: BTreeMap<Kind, Vec<ItemRecord>> = Kind::ALL
        .into_iter()
        .map(|kind| (kind, Vec::new()))
        .collect();

    for record in records {
        if record.module_path != module_path {
            return Err(BuildError::ForeignRecord {
                module: module_path,
                record: Box::new(record),
            });
        }
        buckets.entry(record.kind).or_default().push(record);
    }

    for (kind, bucket) in &mut buckets {
        // Stable: duplicates stay adjacent and in input order.
        bucket.sort_by(|a, b| sidebar_order(&a.name, &b.name));

        if let Some(conflict) = bucket
            .chunk_by(|a, b| a.name == b.name)
            .find(|group| group.len() > 1)
        {
            return Err(DuplicateItemError {
                module: module_path,
                kind: *kind,
                name: conflict[0].name.clone(),
                records: conflict.to_vec(),
            }
            .into());
        }
    }

    Ok(ModulePayload {
        module_path,
        origin: origin.into(),
        buckets,
    })
}
