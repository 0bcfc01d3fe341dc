//! Navigation views over a [`GlobalIndex`].
//!
//! A [`NavTree`] borrows everything it shows from the index it was rendered from, so a
//! sidebar can never disagree with search results taken from the same snapshot.

use crate::aggregate::{GlobalIndex, ModuleNode};
use crate::item::{Kind, ModulePath};
use crate::wire::SidebarItems;
use serde::{Serialize, Serializer};
use std::fmt;

/// Sidebar for one module: its non-empty kind buckets and its direct child modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavTree<'a> {
    #[serde(serialize_with = "as_display")]
    pub module: &'a ModulePath,
    pub buckets: Vec<NavBucket<'a>>,
    pub children: Vec<NavChild<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavBucket<'a> {
    pub kind: Kind,
    pub items: Vec<NavItem<'a>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem<'a> {
    pub name: &'a str,
    pub summary: &'a str,
}

/// Link to a child module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavChild<'a> {
    pub name: &'a str,
    #[serde(serialize_with = "as_display")]
    pub path: &'a ModulePath,
    /// Items declared directly in the child module.
    pub item_count: usize,
    pub has_children: bool,
}

impl<'a> NavChild<'a> {
    fn from_node(node: &'a ModuleNode) -> Self {
        Self {
            name: node.name(),
            path: node.path(),
            item_count: node.item_count(),
            has_children: node.children().next().is_some(),
        }
    }
}

fn as_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Render the sidebar for `module`, or `None` if the index has no such module.
///
/// Buckets and items keep the payload order: kinds in declared order, names in sidebar order.
/// Empty buckets are left out.
pub fn render_sidebar<'a>(global: &'a GlobalIndex, module: &ModulePath) -> Option<NavTree<'a>> {
    let node = global.module_tree().get(module)?;

    let mut buckets: Vec<NavBucket<'a>> = Vec::new();
    for (path, record) in global.module_entries(node.path()) {
        let item = NavItem {
            name: &record.name,
            summary: &record.summary,
        };
        match buckets.last_mut() {
            Some(bucket) if bucket.kind == path.kind => bucket.items.push(item),
            _ => buckets.push(NavBucket {
                kind: path.kind,
                items: vec![item],
            }),
        }
    }

    Some(NavTree {
        module: node.path(),
        buckets,
        children: node.children().map(NavChild::from_node).collect(),
    })
}

/// Top-level modules of the index.
pub fn render_roots(global: &GlobalIndex) -> Vec<NavChild<'_>> {
    global
        .module_tree()
        .roots()
        .map(NavChild::from_node)
        .collect()
}

impl<'a> NavTree<'a> {
    /// Wire form of this module's sidebar.
    pub fn to_sidebar_items(&self) -> SidebarItems<'a> {
        SidebarItems::from_buckets(self.buckets.iter().map(|bucket| {
            (
                bucket.kind,
                bucket.items.iter().map(|item| (item.name, item.summary)),
            )
        }))
    }

    pub fn bucket(&self, kind: Kind) -> Option<&NavBucket<'a>> {
        self.buckets.iter().find(|bucket| bucket.kind == kind)
    }

    pub fn item_count(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.items.len()).sum()
    }
}

impl fmt::Display for NavTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.module)?;
        for bucket in &self.buckets {
            writeln!(f, "  {}", bucket.kind.label())?;
            for item in &bucket.items {
                if item.summary.is_empty() {
                    writeln!(f, "    {}", item.name)?;
                } else {
                    writeln!(f, "    {} - {}", item.name, item.summary)?;
                }
            }
        }
        if !self.children.is_empty() {
            writeln!(f, "  Modules")?;
            for child in &self.children {
                write!(f, "    {} ({} items", child.name, child.item_count)?;
                if child.has_children {
                    write!(f, ", has submodules")?;
                }
                writeln!(f, ")")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::item::ItemRecord;
    use crate::module_index::build_module_payload;
    use assert2::{check, let_assert};

    fn path(module: &str) -> ModulePath {
        ModulePath::parse(module).unwrap()
    }

    fn global() -> GlobalIndex {
        let automod = path("guild::automod");
        let record = |kind, name: &str, summary: &str| {
            ItemRecord::new(automod.clone(), kind, name, summary).unwrap()
        };
        let automod_payload = build_module_payload(
            automod.clone(),
            "test",
            vec![
                record(Kind::Struct, "TriggerMetadata", ""),
                record(Kind::Enum, "Trigger", "Trigger data."),
                record(Kind::Struct, "Rule", "Configured rule."),
                record(Kind::Enum, "Action", "An action."),
            ],
        )
        .unwrap();
        let guild_payload = build_module_payload(
            path("guild"),
            "test",
            vec![ItemRecord::new(path("guild"), Kind::Struct, "Guild", "").unwrap()],
        )
        .unwrap();
        aggregate([guild_payload, automod_payload]).unwrap()
    }

    #[test]
    fn test_buckets_keep_payload_order() {
        let global = global();
        let_assert!(Some(tree) = render_sidebar(&global, &path("guild::automod")));

        let kinds: Vec<Kind> = tree.buckets.iter().map(|b| b.kind).collect();
        check!(kinds == vec![Kind::Enum, Kind::Struct]);

        let enums: Vec<&str> = tree.buckets[0].items.iter().map(|i| i.name).collect();
        let structs: Vec<&str> = tree.buckets[1].items.iter().map(|i| i.name).collect();
        check!(enums == vec!["Action", "Trigger"]);
        check!(structs == vec!["Rule", "TriggerMetadata"]);
        check!(tree.children.is_empty());
        check!(tree.item_count() == 4);
    }

    #[test]
    fn test_children_reference_submodules() {
        let global = global();
        let_assert!(Some(tree) = render_sidebar(&global, &path("guild")));

        check!(tree.children.len() == 1);
        check!(tree.children[0].name == "automod");
        check!(tree.children[0].item_count == 4);
        check!(!tree.children[0].has_children);
        check!(tree.bucket(Kind::Struct).map(|b| b.items.len()) == Some(1));
    }

    #[test]
    fn test_unknown_module_is_none() {
        check!(render_sidebar(&global(), &path("guild::missing")).is_none());
    }

    #[test]
    fn test_wire_form_matches_payload_script() {
        let global = global();
        let_assert!(Some(tree) = render_sidebar(&global, &path("guild::automod")));
        check!(
            tree.to_sidebar_items().to_js()
                == r#"window.SIDEBAR_ITEMS = {"enum":[["Action","An action."],["Trigger","Trigger data."]],"struct":[["Rule","Configured rule."],["TriggerMetadata",""]]};"#
        );
    }

    #[test]
    fn test_text_outline() {
        let global = global();
        let_assert!(Some(tree) = render_sidebar(&global, &path("guild")));
        check!(
            tree.to_string() == "guild\n  Structs\n    Guild\n  Modules\n    automod (4 items)\n"
        );
    }

    #[test]
    fn test_json_uses_display_paths() {
        let global = global();
        let roots = render_roots(&global);
        let json = serde_json::to_value(&roots).unwrap();
        check!(json[0]["path"] == "guild");
        check!(json[0]["has_children"] == true);
    }
}
