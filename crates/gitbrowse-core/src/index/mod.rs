//! Repository file index.
//!
//! Raw lister output is split by [`tokenize`], folded into an ordered
//! [`tree::PathTree`], and on demand flattened into a sorted
//! [`flatten::FlatIndex`] for quick-open searching.

pub mod flatten;
pub mod tokenize;
pub mod tree;

pub use flatten::{build_index, collate, flatten, sort_entries, FlatEntry, FlatIndex};
pub use tree::{
    BuildReport, ConflictKind, GroupedTraversal, NodeId, NodeKind, PathConflict, PathTree,
    TraversalItem, TreeNode,
};
