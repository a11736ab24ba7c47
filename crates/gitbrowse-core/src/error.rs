//! Error types for `gitbrowse-core`.
//!
//! Only the glue around the index (registry, listers, configuration and
//! persistence) is fallible. Tokenizing, tree building, flattening and
//! filtering are total and never produce a [`CoreError`].

use std::path::PathBuf;

/// Unified error type for all fallible core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path is not the root of (or inside) a git working tree.
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// The repository root is already registered.
    #[error("repository already registered: {0}")]
    AlreadyRegistered(PathBuf),

    /// An exclusion pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Failed to parse or serialise a TOML file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// A git operation failed.
    #[error("git error: {0}")]
    Git(String),

    /// The repository lister could not produce a listing.
    #[error("lister failed: {0}")]
    Lister(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `gitbrowse-core`.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Maps an I/O error on `path` to the most specific variant.
    pub(crate) fn from_io(e: std::io::Error, path: &std::path::Path) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(e),
        }
    }
}

impl From<git2::Error> for CoreError {
    fn from(e: git2::Error) -> Self {
        CoreError::Git(e.message().to_string())
    }
}
