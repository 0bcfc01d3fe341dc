//! Item records and the identifiers used to key them.
//!
//! An [`ItemRecord`] is one documented entity as reported by the source analyzer. Records are
//! grouped into kind buckets per module and keyed globally by [`FqPath`].

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Category of a documented item.
///
/// Variants are declared in the lexical order of their wire names, so the derived `Ord` is the
/// bucket order used by payloads, the sidebar and the `SIDEBAR_ITEMS` script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Attr,
    Constant,
    Derive,
    Enum,
    #[serde(rename = "fn")]
    Function,
    Keyword,
    Macro,
    Primitive,
    Static,
    Struct,
    Trait,
    TraitAlias,
    #[serde(rename = "type")]
    TypeAlias,
    Union,
}

impl Kind {
    /// Every declared kind, in bucket order.
    pub const ALL: [Self; 14] = [
        Self::Attr,
        Self::Constant,
        Self::Derive,
        Self::Enum,
        Self::Function,
        Self::Keyword,
        Self::Macro,
        Self::Primitive,
        Self::Static,
        Self::Struct,
        Self::Trait,
        Self::TraitAlias,
        Self::TypeAlias,
        Self::Union,
    ];

    /// Wire name used as the bucket key in sidebar payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attr => "attr",
            Self::Constant => "constant",
            Self::Derive => "derive",
            Self::Enum => "enum",
            Self::Function => "fn",
            Self::Keyword => "keyword",
            Self::Macro => "macro",
            Self::Primitive => "primitive",
            Self::Static => "static",
            Self::Struct => "struct",
            Self::Trait => "trait",
            Self::TraitAlias => "traitalias",
            Self::TypeAlias => "type",
            Self::Union => "union",
        }
    }

    /// Section heading shown above the bucket in rendered navigation.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Attr => "Attribute Macros",
            Self::Constant => "Constants",
            Self::Derive => "Derive Macros",
            Self::Enum => "Enums",
            Self::Function => "Functions",
            Self::Keyword => "Keywords",
            Self::Macro => "Macros",
            Self::Primitive => "Primitive Types",
            Self::Static => "Statics",
            Self::Struct => "Structs",
            Self::Trait => "Traits",
            Self::TraitAlias => "Trait Aliases",
            Self::TypeAlias => "Type Aliases",
            Self::Union => "Unions",
        }
    }

    /// Search tie-break priority; lower ranks first.
    ///
    /// - 0: type-like items (structs, enums, unions, traits, aliases, primitives)
    /// - 1: functions
    /// - 2: constants and statics
    /// - 3: macros of any flavour
    /// - 4: everything else
    pub const fn search_priority(self) -> u8 {
        match self {
            Self::Struct
            | Self::Enum
            | Self::Union
            | Self::Trait
            | Self::TraitAlias
            | Self::TypeAlias
            | Self::Primitive => 0,
            Self::Function => 1,
            Self::Constant | Self::Static => 2,
            Self::Macro | Self::Attr | Self::Derive => 3,
            Self::Keyword => 4,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| IngestError::UnknownKind(s.to_string()))
    }
}

/// Ordered namespace segments identifying a module, e.g. `guild::automod`.
///
/// Always non-empty; segments are non-empty and never contain `::`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// Validate and wrap a list of segments.
    pub fn new<I, S>(segments: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(IngestError::EmptyModulePath);
        }
        if let Some(bad) = segments
            .iter()
            .find(|s| s.trim().is_empty() || s.contains("::"))
        {
            return Err(IngestError::InvalidSegment {
                segment: bad.clone(),
                path: segments.join("::"),
            });
        }
        Ok(Self(segments))
    }

    /// Parse a `::`-joined path such as `guild::automod`.
    pub fn parse(path: &str) -> Result<Self, IngestError> {
        Self::new(path.split("::").map(str::trim))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Name of the module itself (last segment).
    pub fn name(&self) -> &str {
        // Non-empty by construction.
        self.0.last().map_or("", String::as_str)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The enclosing module, or `None` for a root module.
    pub fn parent(&self) -> Option<Self> {
        (self.0.len() > 1).then(|| Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// The ancestor (or self) made of the first `len` segments; `len` must be in `1..=depth`.
    pub(crate) fn truncated(&self, len: usize) -> Self {
        Self(self.0[..len].to_vec())
    }

    /// Path of a direct child module.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("::"))
    }
}

impl FromStr for ModulePath {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Sidebar ordering for item names: case-insensitive first, case-sensitive to break ties.
///
/// Two names compare equal only when they are byte-identical, so the order is total and
/// regenerating from unchanged input always yields the same sequence.
pub fn sidebar_order(a: &str, b: &str) -> Ordering {
    folded(a).cmp(folded(b)).then_with(|| a.cmp(b))
}

fn folded(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

/// Lowercase `name` one char at a time, without context-dependent rules such as final sigma.
///
/// Search keys and queries both go through this, so matching agrees with [`sidebar_order`].
pub fn fold_case(name: &str) -> String {
    folded(name).collect()
}

/// Reduce doc text to the one-line summary stored on a record.
///
/// Keeps the first paragraph and collapses every whitespace run (including line breaks) into
/// a single space.
pub fn summarize(docs: &str) -> String {
    docs.lines()
        .skip_while(|line| line.trim().is_empty())
        .take_while(|line| !line.trim().is_empty())
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One documented entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRecord {
    pub name: String,
    pub kind: Kind,
    /// Single-line summary, possibly empty.
    pub summary: String,
    pub module_path: ModulePath,
}

impl ItemRecord {
    /// Create a record, reducing `docs` to its one-line summary.
    pub fn new(
        module_path: ModulePath,
        kind: Kind,
        name: impl Into<String>,
        docs: &str,
    ) -> Result<Self, IngestError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IngestError::EmptyName {
                module: module_path.to_string(),
            });
        }
        Ok(Self {
            name,
            kind,
            summary: summarize(docs),
            module_path,
        })
    }

    /// Global key of this record.
    pub fn fq_path(&self) -> FqPath {
        FqPath {
            module: self.module_path.clone(),
            kind: self.kind,
            name: self.name.clone(),
        }
    }
}

/// Fully-qualified path: module path, kind and item name.
///
/// Ordered by module path, then kind, then [`sidebar_order`] of the name, so a module's
/// entries are contiguous in any ordered map keyed by `FqPath` and already in sidebar order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FqPath {
    pub module: ModulePath,
    pub kind: Kind,
    pub name: String,
}

impl FqPath {
    /// Smallest key belonging to `module`; used as a range start.
    pub(crate) fn module_start(module: &ModulePath) -> Self {
        Self {
            module: module.clone(),
            kind: Kind::ALL[0],
            name: String::new(),
        }
    }
}

impl Ord for FqPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.module
            .cmp(&other.module)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| sidebar_order(&self.name, &other.name))
    }
}

impl PartialOrd for FqPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FqPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("Action", "Trigger", Ordering::Less)]
    #[case("apple", "Banana", Ordering::Less)]
    #[case("Banana", "apple", Ordering::Greater)]
    #[case("Rule", "rule", Ordering::Less)]
    #[case("rule", "Rule", Ordering::Greater)]
    #[case("Trigger", "TriggerMetadata", Ordering::Less)]
    #[case("Same", "Same", Ordering::Equal)]
    fn test_sidebar_order(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        check!(sidebar_order(a, b) == expected);
    }

    #[rstest]
    #[case("Trigger", "trigger")]
    #[case("ΟΔΟΣ", "οδοσ")]
    #[case("ΟΔΟΣΑ", "οδοσα")]
    fn test_fold_case_ignores_word_position(#[case] name: &str, #[case] expected: &str) {
        check!(fold_case(name) == expected);
    }

    #[rstest]
    #[case("Configured auto moderation rule.", "Configured auto moderation rule.")]
    #[case(
        "Gateway event payload sent when a rule is triggered and an action is executed (e.g. message is\nblocked).\n\n[Discord docs](https://example.invalid).",
        "Gateway event payload sent when a rule is triggered and an action is executed (e.g. message is blocked)."
    )]
    #[case(
        "\n\n  Leading blank lines.\n\nSecond paragraph.",
        "Leading blank lines."
    )]
    #[case("First paragraph.\r\n\r\nSecond paragraph.", "First paragraph.")]
    #[case("First line\r\ncontinues.\r\n", "First line continues.")]
    #[case("First paragraph.\n   \nSecond paragraph.", "First paragraph.")]
    #[case("First paragraph.\n\t\nSecond paragraph.", "First paragraph.")]
    #[case("", "")]
    #[case("  \n \r\n", "")]
    fn test_summarize(#[case] docs: &str, #[case] expected: &str) {
        check!(summarize(docs) == expected);
    }

    #[test]
    fn test_kind_wire_names_round_trip_in_declared_order() {
        let names: Vec<&str> = Kind::ALL.iter().map(|k| k.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        check!(names == sorted);

        for kind in Kind::ALL {
            check!(kind.as_str().parse::<Kind>().ok() == Some(kind));
            let json = serde_json::to_string(&kind).unwrap();
            check!(json == format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "class".parse::<Kind>().unwrap_err();
        check!(matches!(err, IngestError::UnknownKind(ref k) if k == "class"));
    }

    #[rstest]
    #[case("guild::automod", Some(2))]
    #[case("guild", Some(1))]
    #[case(" guild :: automod ", Some(2))]
    #[case("", None)]
    #[case("guild::::automod", None)]
    fn test_module_path_parse(#[case] input: &str, #[case] expected_depth: Option<usize>) {
        let parsed = ModulePath::parse(input).ok();
        check!(parsed.as_ref().map(ModulePath::depth) == expected_depth);
    }

    #[test]
    fn test_module_path_navigation() {
        let path = ModulePath::parse("model::guild::automod").unwrap();
        check!(path.name() == "automod");
        check!(path.depth() == 3);
        check!(path.parent().map(|p| p.to_string()) == Some("model::guild".to_string()));
        check!(ModulePath::parse("model").unwrap().parent().is_none());
        check!(path.child("rule").to_string() == "model::guild::automod::rule");
    }

    #[test]
    fn test_fq_path_groups_module_entries() {
        let automod = ModulePath::parse("guild::automod").unwrap();
        let nested = ModulePath::parse("guild::automod::inner").unwrap();
        let rule = FqPath {
            module: automod.clone(),
            kind: Kind::Struct,
            name: "Rule".into(),
        };
        let action = FqPath {
            module: automod.clone(),
            kind: Kind::Enum,
            name: "Action".into(),
        };
        let inner = FqPath {
            module: nested,
            kind: Kind::Attr,
            name: "a".into(),
        };
        check!(FqPath::module_start(&automod) <= action);
        check!(action < rule);
        check!(rule < inner);
        check!(rule.to_string() == "guild::automod::Rule");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let module = ModulePath::parse("guild").unwrap();
        let err = ItemRecord::new(module, Kind::Struct, "  ", "").unwrap_err();
        check!(matches!(err, IngestError::EmptyName { .. }));
    }
}
