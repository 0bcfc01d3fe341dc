//! Cross-module aggregation into a single [`GlobalIndex`].

use crate::error::{PathCollisionError, PayloadSource};
use crate::item::{FqPath, ItemRecord, ModulePath};
use crate::module_index::ModulePayload;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use xxhash_rust::xxh3::Xxh3;

/// One node of the module tree.
///
/// Nodes exist for every prefix of every indexed module path, so namespace-only modules
/// (no direct items) still appear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    path: ModulePath,
    item_count: usize,
    children: BTreeMap<String, ModuleNode>,
}

impl ModuleNode {
    fn new(path: ModulePath) -> Self {
        Self {
            path,
            item_count: 0,
            children: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &ModulePath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Number of items declared directly in this module.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Immediate child modules, ordered by segment.
    pub fn children(&self) -> impl Iterator<Item = &Self> {
        self.children.values()
    }

    pub fn child(&self, segment: &str) -> Option<&Self> {
        self.children.get(segment)
    }

    /// Pre-order walk of this node and its descendants.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(std::iter::once(self).chain(self.children.values().flat_map(|child| child.walk())))
    }
}

/// Forest of documented modules keyed by path segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleTree {
    roots: BTreeMap<String, ModuleNode>,
}

impl ModuleTree {
    /// Insert `path` and every missing ancestor; returns the node for `path`.
    fn insert(&mut self, path: &ModulePath) -> &mut ModuleNode {
        let segments = path.segments();
        let mut node = self
            .roots
            .entry(segments[0].clone())
            .or_insert_with(|| ModuleNode::new(path.truncated(1)));

        for depth in 2..=segments.len() {
            node = node
                .children
                .entry(segments[depth - 1].clone())
                .or_insert_with(|| ModuleNode::new(path.truncated(depth)));
        }
        node
    }

    pub fn get(&self, path: &ModulePath) -> Option<&ModuleNode> {
        let (first, rest) = path.segments().split_first()?;
        rest.iter()
            .try_fold(self.roots.get(first)?, |node, segment| node.child(segment))
    }

    pub fn contains(&self, path: &ModulePath) -> bool {
        self.get(path).is_some()
    }

    /// Top-level modules, usually one per documented crate.
    pub fn roots(&self) -> impl Iterator<Item = &ModuleNode> {
        self.roots.values()
    }

    /// Pre-order walk of every node.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleNode> {
        self.roots.values().flat_map(|root| root.walk())
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Every documented item of one generation run, keyed by fully-qualified path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalIndex {
    entries: BTreeMap<FqPath, ItemRecord>,
    module_tree: ModuleTree,
}

impl GlobalIndex {
    pub fn get(&self, path: &FqPath) -> Option<&ItemRecord> {
        self.entries.get(path)
    }

    /// All entries in (module, kind, sidebar) order.
    pub fn entries(&self) -> impl Iterator<Item = (&FqPath, &ItemRecord)> {
        self.entries.iter()
    }

    /// Entries declared directly in `module`, in kind then sidebar order.
    pub fn module_entries<'a>(
        &'a self,
        module: &'a ModulePath,
    ) -> impl Iterator<Item = (&'a FqPath, &'a ItemRecord)> + 'a {
        self.entries
            .range(FqPath::module_start(module)..)
            .take_while(move |(path, _)| &path.module == module)
    }

    pub fn module_tree(&self) -> &ModuleTree {
        &self.module_tree
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose module is missing from the tree. Always empty for an aggregated index.
    pub fn orphans(&self) -> Vec<&FqPath> {
        self.entries
            .keys()
            .filter(|path| !self.module_tree.contains(&path.module))
            .collect()
    }

    /// Content hash over every entry and module node, in canonical order.
    ///
    /// Equal indexes always hash equal, which makes the value usable as a snapshot identity
    /// and as a cache validity check.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        for node in self.module_tree.iter() {
            hash_segments(&mut hasher, node.path());
            hasher.update(&(node.item_count as u64).to_le_bytes());
        }
        hasher.update(&[0xfe]);
        for record in self.entries.values() {
            hash_segments(&mut hasher, &record.module_path);
            hasher.update(record.kind.as_str().as_bytes());
            hasher.update(&[0]);
            hasher.update(record.name.as_bytes());
            hasher.update(&[0]);
            hasher.update(record.summary.as_bytes());
            hasher.update(&[0xff]);
        }
        hasher.digest()
    }
}

fn hash_segments(hasher: &mut Xxh3, path: &ModulePath) {
    for segment in path.segments() {
        hasher.update(segment.as_bytes());
        hasher.update(&[0]);
    }
    hasher.update(&[0xff]);
}

/// Merge every payload of a generation run into one [`GlobalIndex`].
///
/// Fails on the first fully-qualified path claimed by two payloads; the error names both
/// payloads and both records. Identical input always yields an identical index.
pub fn aggregate<I>(payloads: I) -> Result<GlobalIndex, PathCollisionError>
where
    I: IntoIterator<Item = ModulePayload>,
{
    let start = std::time::Instant::now();
    let mut sources: Vec<PayloadSource> = Vec::new();
    let mut staged: BTreeMap<FqPath, (usize, ItemRecord)> = BTreeMap::new();
    let mut module_tree = ModuleTree::default();

    for payload in payloads {
        let source_idx = sources.len();
        sources.push(PayloadSource {
            module: payload.module_path().clone(),
            origin: payload.origin().to_string(),
        });

        module_tree.insert(payload.module_path()).item_count += payload.len();

        for record in payload.into_records() {
            match staged.entry(record.fq_path()) {
                Entry::Vacant(slot) => {
                    slot.insert((source_idx, record));
                }
                Entry::Occupied(slot) => {
                    let (first_idx, existing) = slot.get();
                    return Err(PathCollisionError {
                        path: slot.key().clone(),
                        first: sources[*first_idx].clone(),
                        second: sources[source_idx].clone(),
                        records: Box::new([existing.clone(), record]),
                    });
                }
            }
        }
    }

    let entries: BTreeMap<FqPath, ItemRecord> = staged
        .into_iter()
        .map(|(path, (_, record))| (path, record))
        .collect();

    tracing::debug!(
        "Aggregated {} payloads into {} entries across {} modules in {:?}",
        sources.len(),
        entries.len(),
        module_tree.len(),
        start.elapsed()
    );

    Ok(GlobalIndex {
        entries,
        module_tree,
    })
}
