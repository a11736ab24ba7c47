//! Branch summary shown next to a registered repository.

use std::path::Path;

use git2::{ErrorCode, Repository, Status};

use crate::error::CoreResult;

/// Current branch state of a working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    /// Branch name, or `"HEAD"` when detached.
    pub name: String,
    pub is_detached: bool,
    /// Abbreviated HEAD commit id.
    pub commit_short: Option<String>,
    /// `true` when tracked files have uncommitted changes.
    pub is_dirty: bool,
}

impl BranchInfo {
    /// Compact label such as `main*` (the star marks a dirty tree).
    pub fn label(&self) -> String {
        let dirty = if self.is_dirty { "*" } else { "" };
        match (&self.commit_short, self.is_detached) {
            (Some(short), true) => format!("{short}{dirty}"),
            _ => format!("{}{dirty}", self.name),
        }
    }
}

/// Reads branch state of the repository at `root`.
///
/// `Ok(None)` for paths that are not repositories and for repositories
/// without any commit yet.
pub fn get_branch_info(root: &Path) -> CoreResult<Option<BranchInfo>> {
    let Ok(repo) = Repository::open(root) else {
        return Ok(None);
    };
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if e.code() == ErrorCode::UnbornBranch => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let is_detached = repo.head_detached().unwrap_or(false);
    let name = if is_detached {
        "HEAD".to_owned()
    } else {
        head.shorthand().unwrap_or("HEAD").to_owned()
    };
    let commit_short = head.target().map(|oid| {
        let mut id = oid.to_string();
        id.truncate(7);
        id
    });

    Ok(Some(BranchInfo {
        name,
        is_detached,
        commit_short,
        is_dirty: has_changes(&repo),
    }))
}

fn has_changes(repo: &Repository) -> bool {
    repo.statuses(None)
        .map(|statuses| {
            statuses.iter().any(|entry| {
                let status = entry.status();
                !status.is_ignored() && !status.is_wt_new() && status != Status::CURRENT
            })
        })
        .unwrap_or(false)
}
