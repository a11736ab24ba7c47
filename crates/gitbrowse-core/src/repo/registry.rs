//! Registered repositories and their file trees.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::error::{CoreError, CoreResult};
use crate::index::{build_index, BuildReport, FlatIndex, NodeId, PathTree};

use super::lister::{find_repository_root, is_repository_root, list_or_empty, RepositoryLister};

/// One repository: its root directory and the tree of its tracked files.
#[derive(Debug, Clone)]
pub struct RepositoryIndex {
    root: PathBuf,
    tree: PathTree,
    report: BuildReport,
    build_time: Duration,
}

impl RepositoryIndex {
    /// Builds the index for `root` from a ready-made listing.
    pub fn from_listing(root: impl Into<PathBuf>, listing: &str) -> Self {
        let started = Instant::now();
        let (tree, report) = PathTree::from_listing(listing);
        let build_time = started.elapsed();
        let root = root.into();
        tracing::debug!(
            root = %root.display(),
            files = tree.file_count(),
            conflicts = report.conflicts.len(),
            ?build_time,
            "built repository tree"
        );
        Self {
            root,
            tree,
            report,
            build_time,
        }
    }

    /// Lists `root` and builds its tree from scratch.
    ///
    /// A failing lister yields an empty tree; the message explains why.
    pub fn scan(root: impl Into<PathBuf>, lister: &dyn RepositoryLister) -> (Self, Option<String>) {
        let root = root.into();
        let (listing, failure) = list_or_empty(lister, &root);
        (Self::from_listing(root, &listing), failure)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn file_count(&self) -> usize {
        self.tree.file_count()
    }

    pub fn build_time(&self) -> Duration {
        self.build_time
    }

    /// Last component of the root path.
    pub fn display_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Absolute filesystem path of `node`.
    pub fn absolute_path(&self, node: NodeId) -> PathBuf {
        let relative = self.tree.path_to_root(node);
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Sorted flat list of every file, minus those matching `exclude`.
    pub fn flat_index(&self, exclude: Option<&Regex>) -> FlatIndex {
        build_index(&self.tree, &self.root, exclude)
    }

    /// One-line summary of the last build.
    pub fn status_message(&self) -> String {
        format!(
            "Built repository \"{}\", {} files added in {:.1} ms.",
            self.display_name(),
            self.file_count(),
            self.build_time.as_secs_f64() * 1e3
        )
    }
}

/// Result of adding or rescanning a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Position of the repository in the list.
    pub position: usize,
    /// Message for the status bar.
    pub message: String,
    /// `true` when the lister failed and the tree is empty.
    pub lister_failed: bool,
}

/// Ordered list of registered repositories.
///
/// Order is controlled by the user through [`Repositories::move_up`] and
/// [`Repositories::move_down`].
#[derive(Debug, Clone, Default)]
pub struct Repositories {
    repos: Vec<RepositoryIndex>,
}

impl Repositories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&RepositoryIndex> {
        self.repos.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryIndex> {
        self.repos.iter()
    }

    /// Position of the repository rooted exactly at `root`.
    pub fn position_of(&self, root: &Path) -> Option<usize> {
        self.repos.iter().position(|r| r.root == root)
    }

    /// Registers the working tree at `root` and builds its index.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if `root` does not exist.
    /// - [`CoreError::NotARepository`] if `root` is not the top of a
    ///   working tree.
    /// - [`CoreError::AlreadyRegistered`] if it is already in the list.
    ///
    /// A lister failure is not an error: the repository is kept with an
    /// empty tree so it can be rescanned later.
    pub fn add(&mut self, root: &Path, lister: &dyn RepositoryLister) -> CoreResult<ScanOutcome> {
        let root = std::fs::canonicalize(root).map_err(|e| CoreError::from_io(e, root))?;
        if !is_repository_root(&root) {
            return Err(CoreError::NotARepository(root));
        }
        if self.position_of(&root).is_some() {
            return Err(CoreError::AlreadyRegistered(root));
        }

        let (index, failure) = RepositoryIndex::scan(root, lister);
        tracing::info!(
            root = %index.root.display(),
            files = index.file_count(),
            "repository added"
        );
        self.repos.push(index);
        Ok(self.outcome(self.repos.len() - 1, failure))
    }

    /// Adds the repository enclosing `document`.
    ///
    /// Returns `Ok(None)` when that repository is already registered.
    pub fn add_from_document(
        &mut self,
        document: &Path,
        lister: &dyn RepositoryLister,
    ) -> CoreResult<Option<ScanOutcome>> {
        let root = find_repository_root(document)
            .ok_or_else(|| CoreError::NotARepository(document.to_path_buf()))?;
        let root = std::fs::canonicalize(&root).map_err(|e| CoreError::from_io(e, &root))?;
        if self.position_of(&root).is_some() {
            return Ok(None);
        }
        self.add(&root, lister).map(Some)
    }

    /// Unregisters the repository at `position`, dropping its tree.
    pub fn remove(&mut self, position: usize) -> Option<RepositoryIndex> {
        (position < self.repos.len()).then(|| {
            let removed = self.repos.remove(position);
            tracing::info!(root = %removed.root.display(), "repository removed");
            removed
        })
    }

    pub fn remove_all(&mut self) {
        tracing::info!(count = self.repos.len(), "all repositories removed");
        self.repos.clear();
    }

    /// Swaps the repository with its predecessor. `false` at the top.
    pub fn move_up(&mut self, position: usize) -> bool {
        if position == 0 || position >= self.repos.len() {
            return false;
        }
        self.repos.swap(position - 1, position);
        true
    }

    /// Swaps the repository with its successor. `false` at the bottom.
    pub fn move_down(&mut self, position: usize) -> bool {
        if position + 1 >= self.repos.len() {
            return false;
        }
        self.repos.swap(position, position + 1);
        true
    }

    /// Rebuilds the tree of the repository at `position` from a fresh listing.
    pub fn rescan(
        &mut self,
        position: usize,
        lister: &dyn RepositoryLister,
    ) -> Option<ScanOutcome> {
        let root = self.repos.get(position)?.root.clone();
        let (index, failure) = RepositoryIndex::scan(root, lister);
        tracing::info!(
            root = %index.root.display(),
            files = index.file_count(),
            "repository rescanned"
        );
        self.repos[position] = index;
        Some(self.outcome(position, failure))
    }

    /// The repository containing `path`; the deepest root wins when
    /// repositories are nested.
    pub fn find_by_path(&self, path: &Path) -> Option<usize> {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.repos
            .iter()
            .enumerate()
            .filter(|(_, r)| path.starts_with(&r.root))
            .max_by_key(|(_, r)| r.root.components().count())
            .map(|(i, _)| i)
    }

    /// Root directories in list order, for persistence.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.repos.iter().map(|r| r.root.clone()).collect()
    }

    /// Re-registers persisted `roots`, skipping any that fail.
    ///
    /// Returns one status message per root.
    pub fn restore(&mut self, roots: &[PathBuf], lister: &dyn RepositoryLister) -> Vec<String> {
        roots
            .iter()
            .map(|root| match self.add(root, lister) {
                Ok(outcome) => outcome.message,
                Err(e) => {
                    tracing::warn!(
                        root = %root.display(),
                        error = %e,
                        "skipping persisted repository"
                    );
                    format!("Skipped {}: {e}", root.display())
                }
            })
            .collect()
    }

    fn outcome(&self, position: usize, failure: Option<String>) -> ScanOutcome {
        let lister_failed = failure.is_some();
        let message = failure.unwrap_or_else(|| self.repos[position].status_message());
        ScanOutcome {
            position,
            message,
            lister_failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::lister::GitIndexLister;
    use std::fs;
    use tempfile::TempDir;

    struct FailingLister;

    impl RepositoryLister for FailingLister {
        fn list(&self, _root: &Path) -> CoreResult<String> {
            Err(CoreError::Lister("boom".to_string()))
        }
    }

    struct FixedLister(&'static str);

    impl RepositoryLister for FixedLister {
        fn list(&self, _root: &Path) -> CoreResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn init_repo(parent: &Path, name: &str) -> PathBuf {
        let root = parent.join(name);
        fs::create_dir_all(&root).unwrap();
        git2::Repository::init(&root).unwrap();
        root.canonicalize().unwrap()
    }

    #[test]
    fn index_from_listing_counts_files() {
        let index = RepositoryIndex::from_listing("/src/proj", "a/b.txt\na/c.txt\nd.txt\n");
        assert_eq!(index.file_count(), 3);
        assert_eq!(index.display_name(), "proj");
        assert!(index.status_message().starts_with("Built repository \"proj\", 3 files added in "));
        assert!(index.status_message().ends_with(" ms."));
    }

    #[test]
    fn absolute_path_resolves_nodes() {
        let index = RepositoryIndex::from_listing("/src/proj", "a/b.txt\n");
        let node = index.tree().find("a/b.txt").unwrap();
        assert_eq!(index.absolute_path(node), Path::new("/src/proj/a/b.txt"));
        assert_eq!(index.absolute_path(index.tree().root()), Path::new("/src/proj"));
    }

    #[test]
    fn flat_index_uses_root_as_base() {
        let index = RepositoryIndex::from_listing("/src/proj", "a/b.txt\nx.tmp\n");
        let re = Regex::new(r"\.tmp$").unwrap();
        let flat = index.flat_index(Some(&re));
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].location(), "/src/proj/a");
    }

    #[test]
    fn add_registers_repository() {
        let tmp = TempDir::new().unwrap();
        let root = init_repo(tmp.path(), "alpha");
        let mut repos = Repositories::new();

        let outcome = repos.add(&root, &FixedLister("one.rs\ntwo.rs\n")).unwrap();
        assert_eq!(outcome.position, 0);
        assert!(!outcome.lister_failed);
        assert!(outcome.message.contains("\"alpha\", 2 files"));
        assert_eq!(repos.roots(), vec![root]);
    }

    #[test]
    fn add_rejects_plain_directory() {
        let tmp = TempDir::new().unwrap();
        let plain = tmp.path().join("plain");
        fs::create_dir(&plain).unwrap();
        let err = Repositories::new().add(&plain, &GitIndexLister).unwrap_err();
        assert!(matches!(err, CoreError::NotARepository(_)));
    }

    #[test]
    fn add_rejects_missing_path() {
        let tmp = TempDir::new().unwrap();
        let err = Repositories::new()
            .add(&tmp.path().join("missing"), &GitIndexLister)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn add_rejects_duplicates() {
        let tmp = TempDir::new().unwrap();
        let root = init_repo(tmp.path(), "alpha");
        let mut repos = Repositories::new();
        repos.add(&root, &GitIndexLister).unwrap();
        let err = repos.add(&root, &GitIndexLister).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyRegistered(_)));
        assert_eq!(repos.len(), 1);
    }

    #[test]
    fn lister_failure_keeps_repository_with_empty_tree() {
        let tmp = TempDir::new().unwrap();
        let root = init_repo(tmp.path(), "alpha");
        let mut repos = Repositories::new();
        let outcome = repos.add(&root, &FailingLister).unwrap();
        assert!(outcome.lister_failed);
        assert!(outcome.message.contains("boom"));
        assert_eq!(repos.len(), 1);
        assert!(repos.get(0).unwrap().tree().is_empty());
    }

    #[test]
    fn rescan_replaces_tree() {
        let tmp = TempDir::new().unwrap();
        let root = init_repo(tmp.path(), "alpha");
        let mut repos = Repositories::new();
        repos.add(&root, &FixedLister("a.rs\n")).unwrap();
        let outcome = repos.rescan(0, &FixedLister("a.rs\nb.rs\nc/d.rs\n")).unwrap();
        assert_eq!(outcome.position, 0);
        assert_eq!(repos.get(0).unwrap().file_count(), 3);
        assert!(repos.rescan(5, &GitIndexLister).is_none());
    }

    #[test]
    fn move_and_remove_keep_order() {
        let tmp = TempDir::new().unwrap();
        let a = init_repo(tmp.path(), "a");
        let b = init_repo(tmp.path(), "b");
        let c = init_repo(tmp.path(), "c");
        let mut repos = Repositories::new();
        for root in [&a, &b, &c] {
            repos.add(root, &FixedLister("")).unwrap();
        }

        assert!(!repos.move_up(0));
        assert!(!repos.move_down(2));
        assert!(repos.move_down(0));
        assert_eq!(repos.roots(), vec![b.clone(), a.clone(), c.clone()]);
        assert!(repos.move_up(2));
        assert_eq!(repos.roots(), vec![b.clone(), c.clone(), a.clone()]);

        let removed = repos.remove(1).unwrap();
        assert_eq!(removed.root(), c.as_path());
        assert!(repos.remove(9).is_none());
        repos.remove_all();
        assert!(repos.is_empty());
    }

    #[test]
    fn find_by_path_prefers_deepest_root() {
        let tmp = TempDir::new().unwrap();
        let outer = init_repo(tmp.path(), "outer");
        let inner = init_repo(&outer, "vendor/inner");
        fs::write(inner.join("lib.rs"), "").unwrap();
        fs::write(outer.join("main.rs"), "").unwrap();

        let mut repos = Repositories::new();
        repos.add(&outer, &FixedLister("")).unwrap();
        repos.add(&inner, &FixedLister("")).unwrap();

        assert_eq!(repos.find_by_path(&inner.join("lib.rs")), Some(1));
        assert_eq!(repos.find_by_path(&outer.join("main.rs")), Some(0));
        assert_eq!(repos.find_by_path(tmp.path()), None);
    }

    #[test]
    fn find_by_path_matches_whole_components() {
        let tmp = TempDir::new().unwrap();
        let root = init_repo(tmp.path(), "proj");
        let sibling = tmp.path().join("project-notes.txt");
        fs::write(&sibling, "").unwrap();

        let mut repos = Repositories::new();
        repos.add(&root, &FixedLister("")).unwrap();
        assert_eq!(repos.find_by_path(&sibling), None);
    }

    #[test]
    fn add_from_document_discovers_root() {
        let tmp = TempDir::new().unwrap();
        let root = init_repo(tmp.path(), "alpha");
        fs::create_dir_all(root.join("src")).unwrap();
        let doc = root.join("src/main.rs");
        fs::write(&doc, "").unwrap();

        let mut repos = Repositories::new();
        let first = repos.add_from_document(&doc, &FixedLister("src/main.rs\n")).unwrap();
        assert!(first.is_some());
        assert_eq!(repos.roots(), vec![root]);
        let second = repos.add_from_document(&doc, &FixedLister("")).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn restore_skips_invalid_roots() {
        let tmp = TempDir::new().unwrap();
        let good = init_repo(tmp.path(), "good");
        let bad = tmp.path().join("gone");
        let mut repos = Repositories::new();

        let messages = repos.restore(&[bad, good.clone()], &FixedLister("x.rs\n"));
        assert_eq!(messages.len(), 2);
        assert!(messages[0].starts_with("Skipped"));
        assert_eq!(repos.roots(), vec![good]);
    }
}
