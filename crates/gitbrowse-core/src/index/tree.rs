//! Ordered n-ary tree built from repository-relative paths.
//!
//! Nodes live in an arena owned by [`PathTree`] and are addressed by
//! [`NodeId`]. Every directory keeps its children sorted by name, so the
//! tree never needs a separate sorting pass. Whether a node is a directory
//! or a file is fixed when the node is created; see [`PathTree::build`] for
//! how a name claimed both ways is resolved.

use std::rc::Rc;

use super::tokenize::{lines, segments, PATH_SEPARATOR};

const SEPARATOR_STR: &str = "/";

/// Handle of a node inside a [`PathTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Directory or file. Directories own their (sorted) child handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Directory(Vec<NodeId>),
    File,
}

/// A single named node of the tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl TreeNode {
    /// The path segment this node represents. Empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent handle, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File)
    }

    /// Child handles in ascending name order. Empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory(children) => children,
            NodeKind::File => &[],
        }
    }
}

/// How a name that was claimed as both a file and a directory was resolved.
///
/// Directories always win; the variant records which side lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// An existing file node was turned into a directory.
    FileBecameDirectory,
    /// A file path ended on a name that is already a directory.
    FileShadowedByDirectory,
}

/// A dropped file entry, identified by its repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConflict {
    pub path: String,
    pub kind: ConflictKind,
}

/// Summary of a [`PathTree::build`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Number of paths consumed, including empty and duplicate ones.
    pub paths_seen: usize,
    /// Paths that contained no segment at all.
    pub empty_paths: usize,
    /// File entries dropped by the directory-wins rule.
    pub conflicts: Vec<PathConflict>,
}

/// Arena-backed tree of path segments. Node `0` is the root directory.
#[derive(Debug, Clone)]
pub struct PathTree {
    nodes: Vec<TreeNode>,
    files: usize,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTree {
    /// Creates a tree holding only the (nameless) root directory.
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode {
                name: String::new(),
                parent: None,
                kind: NodeKind::Directory(Vec::new()),
            }],
            files: 0,
        }
    }

    /// Builds a tree from `paths`, in input order.
    ///
    /// Input need not be sorted or unique. Empty paths are skipped. When a
    /// name is needed as a directory but was recorded as a file (or the
    /// reverse), the directory wins and the file entry is dropped; the
    /// outcome does not depend on which path came first.
    pub fn build<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build_with_report(paths).0
    }

    /// Like [`PathTree::build`], also returning what was skipped or dropped.
    pub fn build_with_report<I, S>(paths: I) -> (Self, BuildReport)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        let mut report = BuildReport::default();
        for path in paths {
            tree.insert_path(path.as_ref(), &mut report);
        }
        (tree, report)
    }

    /// Builds a tree straight from newline-delimited lister output.
    pub fn from_listing(text: &str) -> (Self, BuildReport) {
        Self::build_with_report(lines(text))
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Returns the node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was produced by a different tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Returns the node behind `id`, or `None` for a foreign handle.
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// `true` when the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Number of file leaves.
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Looks up the child of `parent` named `name`.
    pub fn child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.lookup(parent, name).ok()
    }

    /// Resolves a repository-relative path to its node.
    ///
    /// An empty path resolves to the root.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        segments(path, PATH_SEPARATOR)
            .try_fold(self.root(), |node, seg| self.child_named(node, seg))
    }

    /// Depth-first traversal of the subtree below `from` (exclusive).
    ///
    /// At every level all directories (with their subtrees) come before any
    /// file, each group in name order. A handle from a different tree yields
    /// nothing.
    pub fn traverse_grouped(&self, from: NodeId) -> GroupedTraversal<'_> {
        let mut traversal = GroupedTraversal {
            tree: self,
            stack: Vec::new(),
        };
        let path: Rc<str> = Rc::from(self.path_to_root(from));
        traversal.push_children(from, 0, &path);
        traversal
    }

    /// Joins the segment names from the root down to `id` with `/`.
    ///
    /// The root itself and a handle from a different tree yield an empty
    /// string.
    pub fn path_to_root(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id.0) else {
                return String::new();
            };
            if node.parent.is_some() {
                names.push(node.name.as_str());
            }
            current = node.parent;
        }
        names.reverse();
        names.join(SEPARATOR_STR)
    }

    fn lookup(&self, parent: NodeId, name: &str) -> Result<NodeId, usize> {
        let children = self.nodes[parent.0].children();
        children
            .binary_search_by(|child| self.nodes[child.0].name.as_str().cmp(name))
            .map(|i| children[i])
    }

    fn insert_path(&mut self, path: &str, report: &mut BuildReport) {
        report.paths_seen += 1;
        let segs: Vec<&str> = segments(path, PATH_SEPARATOR).collect();
        let Some(last) = segs.len().checked_sub(1) else {
            report.empty_paths += 1;
            return;
        };

        let mut current = self.root();
        for (i, seg) in segs.iter().enumerate() {
            let is_last = i == last;
            match self.lookup(current, seg) {
                Ok(child) => {
                    let child_is_dir = self.nodes[child.0].is_dir();
                    if is_last {
                        if child_is_dir {
                            tracing::warn!(
                                path = %path,
                                "file entry shadowed by directory, dropped"
                            );
                            report.conflicts.push(PathConflict {
                                path: segs.join(SEPARATOR_STR),
                                kind: ConflictKind::FileShadowedByDirectory,
                            });
                        }
                        return;
                    }
                    if !child_is_dir {
                        let dropped = self.path_to_root(child);
                        tracing::warn!(path = %dropped, "file entry became a directory, dropped");
                        self.nodes[child.0].kind = NodeKind::Directory(Vec::new());
                        self.files -= 1;
                        report.conflicts.push(PathConflict {
                            path: dropped,
                            kind: ConflictKind::FileBecameDirectory,
                        });
                    }
                    current = child;
                }
                Err(pos) => {
                    let kind = if is_last {
                        self.files += 1;
                        NodeKind::File
                    } else {
                        NodeKind::Directory(Vec::new())
                    };
                    current = self.insert_child(current, pos, seg, kind);
                }
            }
        }
    }

    fn insert_child(&mut self, parent: NodeId, pos: usize, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            name: name.to_owned(),
            parent: Some(parent),
            kind,
        });
        if let NodeKind::Directory(children) = &mut self.nodes[parent.0].kind {
            children.insert(pos, id);
        }
        id
    }
}

/// One step of a [`GroupedTraversal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalItem {
    pub node: NodeId,
    /// Depth below the traversal start; its direct children are at 0.
    pub depth: usize,
    /// Relative path of the node's parent (empty at the repository root).
    pub parent_path: Rc<str>,
}

/// Lazy, single-pass traversal returned by [`PathTree::traverse_grouped`].
#[derive(Debug, Clone)]
pub struct GroupedTraversal<'a> {
    tree: &'a PathTree,
    stack: Vec<(NodeId, usize, Rc<str>)>,
}

impl GroupedTraversal<'_> {
    fn push_children(&mut self, node: NodeId, depth: usize, path: &Rc<str>) {
        let tree = self.tree;
        let children = tree.nodes.get(node.0).map_or(&[][..], TreeNode::children);
        // Popped in reverse push order: directories first, then files.
        for &child in children.iter().rev().filter(|c| tree.nodes[c.0].is_file()) {
            self.stack.push((child, depth, Rc::clone(path)));
        }
        for &child in children.iter().rev().filter(|c| tree.nodes[c.0].is_dir()) {
            self.stack.push((child, depth, Rc::clone(path)));
        }
    }
}

impl Iterator for GroupedTraversal<'_> {
    type Item = TraversalItem;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth, parent_path) = self.stack.pop()?;
        let entry = &self.tree.nodes[node.0];
        if entry.is_dir() {
            let own: Rc<str> = if parent_path.is_empty() {
                Rc::from(entry.name.as_str())
            } else {
                Rc::from(format!("{parent_path}{PATH_SEPARATOR}{}", entry.name))
            };
            self.push_children(node, depth + 1, &own);
        }
        Some(TraversalItem {
            node,
            depth,
            parent_path,
        })
    }
}
