//! Listing the tracked files of a working tree.
//!
//! A [`RepositoryLister`] produces the newline-delimited path listing that
//! [`PathTree::from_listing`](crate::index::PathTree::from_listing) consumes.
//! Two backends exist: reading the index through `git2`, and running
//! `git ls-files`.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Produces the tracked-file listing of the working tree at `root`.
pub trait RepositoryLister {
    /// Returns one repository-relative path per line.
    fn list(&self, root: &Path) -> CoreResult<String>;
}

/// Reads paths straight from the repository index.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitIndexLister;

impl RepositoryLister for GitIndexLister {
    fn list(&self, root: &Path) -> CoreResult<String> {
        let repo = Repository::open(root).map_err(|e| CoreError::Lister(e.message().to_string()))?;
        let index = repo.index()?;

        let mut out = String::new();
        for entry in index.iter() {
            out.push_str(&String::from_utf8_lossy(&entry.path));
            out.push('\n');
        }
        Ok(out)
    }
}

/// Runs `<program> ls-files -z` inside the working tree.
///
/// NUL-terminated output keeps paths unquoted regardless of `core.quotePath`;
/// the terminators are turned into line feeds.
#[derive(Debug, Clone)]
pub struct GitCommandLister {
    program: String,
}

impl Default for GitCommandLister {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCommandLister {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl RepositoryLister for GitCommandLister {
    fn list(&self, root: &Path) -> CoreResult<String> {
        let output = Command::new(&self.program)
            .args(["ls-files", "-z"])
            .current_dir(root)
            .output()
            .map_err(|e| CoreError::Lister(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Lister(format!(
                "{} ls-files exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).replace('\0', "\n"))
    }
}

/// Which [`RepositoryLister`] to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListerBackend {
    #[default]
    Git2,
    Command,
}

impl ListerBackend {
    pub fn lister(self) -> Box<dyn RepositoryLister> {
        match self {
            ListerBackend::Git2 => Box::new(GitIndexLister),
            ListerBackend::Command => Box::new(GitCommandLister::default()),
        }
    }
}

/// Lists `root`, treating any failure as an empty listing.
///
/// The second element carries a status message for the user when the
/// lister failed.
pub fn list_or_empty(lister: &dyn RepositoryLister, root: &Path) -> (String, Option<String>) {
    match lister.list(root) {
        Ok(text) => (text, None),
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "listing repository failed");
            (
                String::new(),
                Some(format!("Could not list files of {}: {e}", root.display())),
            )
        }
    }
}

/// Returns `true` when `path` is the top of a working tree (`path/.git`
/// exists, as a directory or as a gitlink file).
pub fn is_repository_root(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Walks up from a file or directory to the enclosing working tree.
///
/// Returns `None` outside of any repository and for bare repositories.
pub fn find_repository_root(path: &Path) -> Option<PathBuf> {
    let start = if path.is_file() { path.parent()? } else { path };
    Repository::discover(start)
        .ok()
        .and_then(|repo| repo.workdir().map(|w| w.components().collect()))
}
