//! Repository handling: listing tracked files, the registry of known
//! repositories, persistence of their roots, and branch information.

pub mod branch;
pub mod lister;
pub mod registry;
pub mod store;

pub use branch::{get_branch_info, BranchInfo};
pub use lister::{
    find_repository_root, is_repository_root, list_or_empty, GitCommandLister, GitIndexLister,
    ListerBackend, RepositoryLister,
};
pub use registry::{Repositories, RepositoryIndex, ScanOutcome};
pub use store::RepositoryStore;
