//! gitbrowse core library: UI-agnostic repository indexing and quick open.
//!
//! `gitbrowse-core` turns the tracked-file listing of a git working tree
//! into an ordered, directories-first tree, flattens it into a sorted file
//! index on demand, and filters that index incrementally while the user
//! types. It knows nothing about terminals; `gitbrowse-tui` drives it.
//!
//! # Modules
//!
//! - [`index`]: Listing tokenizer, [`PathTree`], and [`FlatEntry`] flattening.
//! - [`nav`]: The budgeted [`IncrementalFilter`] and the [`QuickOpen`] session.
//! - [`repo`]: Repository listers, the [`Repositories`] registry, persistence and branch info.
//! - [`config`]: TOML settings and key bindings.
//! - [`action`]: User-triggerable [`Action`]s and their metadata.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod action;
pub mod config;
pub mod error;
pub mod index;
pub mod nav;
pub mod repo;

pub use action::{Action, ActionCategory, ActionDescriptor, ActionRegistry};
pub use config::keymap::Keymap;
pub use config::settings::Config;
pub use error::{CoreError, CoreResult};
pub use index::{FlatEntry, FlatIndex, NodeId, NodeKind, PathTree, TraversalItem};
pub use nav::{Clock, FilterPhase, IncrementalFilter, QuickOpen, SystemClock, TickOutcome};
pub use repo::{
    BranchInfo, GitCommandLister, GitIndexLister, ListerBackend, Repositories, RepositoryIndex,
    RepositoryLister, RepositoryStore,
};
