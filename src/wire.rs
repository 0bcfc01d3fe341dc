//! The `SIDEBAR_ITEMS` script format consumed by generated documentation pages.
//!
//! One script per module:
//!
//! ```text
//! window.SIDEBAR_ITEMS = {"enum":[["Action","An action which ..."]],"struct":[["Rule","..."]]};
//! ```
//!
//! Keys are kind wire names in bucket order, values are `[name, summary]` pairs in sidebar
//! order. Empty buckets are left out.

use crate::error::WireError;
use crate::item::Kind;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

/// Name of the page global the script assigns.
pub const SIDEBAR_GLOBAL: &str = "SIDEBAR_ITEMS";

/// Borrowed wire form of one module's sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SidebarItems<'a>(BTreeMap<Kind, Vec<(&'a str, &'a str)>>);

impl<'a> SidebarItems<'a> {
    /// Collect non-empty buckets; items must already be in sidebar order.
    pub fn from_buckets<I, B>(buckets: I) -> Self
    where
        I: IntoIterator<Item = (Kind, B)>,
        B: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self(
            buckets
                .into_iter()
                .map(|(kind, items)| (kind, items.into_iter().collect::<Vec<_>>()))
                .filter(|(_, items)| !items.is_empty())
                .collect(),
        )
    }

    pub fn kinds(&self) -> impl Iterator<Item = Kind> + '_ {
        self.0.keys().copied()
    }

    pub fn items(&self, kind: Kind) -> &[(&'a str, &'a str)] {
        self.0.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// The bare JSON object.
    pub fn to_json(&self) -> String {
        // Keys are unit variants and values are string pairs; neither can fail to serialize.
        serde_json::to_string(&self.0).unwrap_or_else(|_| String::from("{}"))
    }

    /// The full script assigning the page global.
    pub fn to_js(&self) -> String {
        format!("window.{} = {};", SIDEBAR_GLOBAL, self.to_json())
    }
}

/// Owned buckets decoded from a script, still keyed by validated [`Kind`].
pub type DecodedBuckets = BTreeMap<Kind, Vec<(String, String)>>;

/// Decode a `window.SIDEBAR_ITEMS = {...};` script, or the bare JSON object.
///
/// Kind keys must be declared kinds and may appear only once. Item ordering and duplicate
/// names are left to the module builder.
pub fn parse_js(script: &str) -> Result<DecodedBuckets, WireError> {
    let json = strip_assignment(script)?;
    let RawBuckets(raw) = serde_json::from_str(json)?;

    let mut decoded = DecodedBuckets::new();
    for (key, items) in raw {
        match decoded.entry(key.parse::<Kind>()?) {
            Entry::Vacant(slot) => {
                slot.insert(items);
            }
            Entry::Occupied(_) => return Err(WireError::RepeatedKind(key)),
        }
    }
    Ok(decoded)
}

/// Object entries in document order, repeated keys included.
struct RawBuckets(Vec<(String, Vec<(String, String)>)>);

impl<'de> Deserialize<'de> for RawBuckets {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawBuckets;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of kind buckets")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry()? {
                    entries.push(entry);
                }
                Ok(RawBuckets(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn strip_assignment(script: &str) -> Result<&str, WireError> {
    let trimmed = script.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed);
    }

    let body = trimmed
        .strip_prefix("window.")
        .and_then(|rest| rest.strip_prefix(SIDEBAR_GLOBAL))
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('='))
        .ok_or(WireError::MissingAssignment(SIDEBAR_GLOBAL))?;

    let body = body.trim();
    Ok(body.strip_suffix(';').unwrap_or(body).trim_end())
}
