//! Key binding configuration.
//!
//! Key names (`"j"`, `"G"`, `"Ctrl+o"`) map to [`Action`] values. The
//! default bindings follow vim conventions. `keymap.toml` uses string
//! action ids under `[bindings]`, resolved through
//! [`ActionRegistry::find_by_id`].

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::action::{Action, ActionRegistry};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
struct RawKeymap {
    #[serde(default)]
    bindings: HashMap<String, String>,
}

/// Complete set of key bindings.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, Action>,
    /// Action → bound keys, sorted, for the help popup.
    reverse: HashMap<Action, Vec<String>>,
}

const DEFAULT_BINDINGS: &[(&str, Action)] = &[
    ("j", Action::CursorDown),
    ("k", Action::CursorUp),
    ("G", Action::CursorBottom),
    ("gg", Action::CursorTop),
    ("Enter", Action::Activate),
    ("l", Action::Expand),
    ("h", Action::Collapse),
    ("e", Action::OpenFile),
    ("a", Action::RepoAdd),
    ("A", Action::RepoAddFromDocument),
    ("d", Action::RepoRemove),
    ("D", Action::RepoRemoveAll),
    ("K", Action::RepoMoveUp),
    ("J", Action::RepoMoveDown),
    ("r", Action::RepoRescan),
    ("o", Action::QuickOpen),
    ("O", Action::QuickOpenFromDocument),
    ("Ctrl+o", Action::QuickOpenFromDocument),
    ("p", Action::Preferences),
    ("?", Action::Help),
    ("q", Action::Quit),
];

impl Default for Keymap {
    fn default() -> Self {
        let bindings: HashMap<String, Action> = DEFAULT_BINDINGS
            .iter()
            .map(|(key, action)| ((*key).to_string(), *action))
            .collect();
        let reverse = build_reverse(&bindings);
        Self { bindings, reverse }
    }
}

fn build_reverse(bindings: &HashMap<String, Action>) -> HashMap<Action, Vec<String>> {
    let mut reverse: HashMap<Action, Vec<String>> = HashMap::new();
    for (key, action) in bindings {
        reverse.entry(*action).or_default().push(key.clone());
    }
    for keys in reverse.values_mut() {
        keys.sort();
    }
    reverse
}

impl Keymap {
    /// Loads key bindings from a TOML file at `path`.
    ///
    /// The file replaces the defaults entirely. Unknown action ids are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::from_io(e, path))?;
        let raw: RawKeymap =
            toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        Ok(Self::from_raw(raw))
    }

    /// Like [`Keymap::load`], falling back to the defaults when the file is
    /// missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(keymap) => keymap,
            Err(CoreError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default key bindings");
                Self::default()
            }
        }
    }

    fn from_raw(raw: RawKeymap) -> Self {
        let registry = ActionRegistry::new();
        let bindings: HashMap<String, Action> = raw
            .bindings
            .into_iter()
            .filter_map(|(key, id)| match registry.find_by_id(&id) {
                Some(action) => Some((key, action)),
                None => {
                    tracing::warn!(key = %key, id = %id, "unknown action in keymap");
                    None
                }
            })
            .collect();
        let reverse = build_reverse(&bindings);
        Self { bindings, reverse }
    }

    /// Returns the action bound to `key`, if any.
    pub fn action_for_key(&self, key: &str) -> Option<Action> {
        self.bindings.get(key).copied()
    }

    /// Returns the key(s) bound to `action`.
    pub fn keys_for_action(&self, action: Action) -> Option<&[String]> {
        self.reverse.get(&action).map(|v| v.as_slice())
    }

    pub fn bindings(&self) -> &HashMap<String, Action> {
        &self.bindings
    }
}
