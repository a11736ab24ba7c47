//! Flattening a [`PathTree`] into a sorted, searchable file list.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::tree::{NodeId, PathTree};

/// One file of a flattened repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    name: String,
    location: String,
    visible: bool,
}

/// Every file of a repository (after exclusion), sorted by location and name.
pub type FlatIndex = Vec<FlatEntry>;

impl FlatEntry {
    /// Creates a visible entry for file `name` inside directory `location`.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            visible: true,
        }
    }

    /// The bare file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute directory containing the file.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Absolute path of the file.
    pub fn full_path(&self) -> PathBuf {
        Path::new(&self.location).join(&self.name)
    }
}

/// Collects every file below `from` into a flat list.
///
/// `location` of each entry is `base_location` joined with the directories
/// leading to the file. Files whose bare name matches `exclude` are left out
/// entirely. The result is in traversal order; see [`sort_entries`].
pub fn flatten(
    tree: &PathTree,
    from: NodeId,
    base_location: &Path,
    exclude: Option<&Regex>,
) -> Vec<FlatEntry> {
    let mut entries = Vec::with_capacity(tree.file_count());
    let mut excluded = 0usize;
    // Consecutive files share a parent, so the joined location is reused.
    let mut last_parent: Option<(Rc<str>, String)> = None;

    for item in tree.traverse_grouped(from) {
        let node = tree.node(item.node);
        if !node.is_file() {
            continue;
        }
        if exclude.is_some_and(|re| re.is_match(node.name())) {
            excluded += 1;
            continue;
        }
        let location = match &last_parent {
            Some((parent, location)) if Rc::ptr_eq(parent, &item.parent_path) => {
                location.clone()
            }
            _ => {
                let location = join_location(base_location, &item.parent_path);
                last_parent = Some((Rc::clone(&item.parent_path), location.clone()));
                location
            }
        };
        entries.push(FlatEntry::new(node.name(), location));
    }

    tracing::debug!(files = entries.len(), excluded, "flattened repository tree");
    entries
}

/// Stable sort by location, then name, using [`collate`].
pub fn sort_entries(entries: &mut [FlatEntry]) {
    entries.sort_by_cached_key(|e| (CollationKey::new(&e.location), CollationKey::new(&e.name)));
}

/// Flattens and sorts in one go.
pub fn build_index(
    tree: &PathTree,
    base_location: &Path,
    exclude: Option<&Regex>,
) -> FlatIndex {
    let mut entries = flatten(tree, tree.root(), base_location, exclude);
    sort_entries(&mut entries);
    entries
}

/// Human-friendly string ordering.
///
/// Compatibility-decomposes both strings, drops combining marks and
/// compares case-insensitively, so `"émile"` sorts next to `"Emile"`. Ties
/// fall back to plain byte order, keeping the ordering total.
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    folded: String,
    raw: String,
}

impl CollationKey {
    fn new(s: &str) -> Self {
        let folded = s
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect();
        Self {
            folded,
            raw: s.to_owned(),
        }
    }
}

fn join_location(base: &Path, relative: &str) -> String {
    if relative.is_empty() {
        base.to_string_lossy().into_owned()
    } else {
        base.join(relative).to_string_lossy().into_owned()
    }
}
