//! User-triggerable commands.
//!
//! Every command is an [`Action`]. [`ActionRegistry`] holds the metadata
//! (id, name, description, category) used by the help popup and for
//! resolving the string ids found in `keymap.toml`.

/// Every user-triggerable action.
///
/// Variants carry no parameters; the target (selected repository, node or
/// current document) is determined at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Navigation
    CursorUp,
    CursorDown,
    CursorTop,
    CursorBottom,
    Activate,
    Expand,
    Collapse,
    OpenFile,
    // Repositories
    RepoAdd,
    RepoAddFromDocument,
    RepoRemove,
    RepoRemoveAll,
    RepoMoveUp,
    RepoMoveDown,
    RepoRescan,
    // Quick open
    QuickOpen,
    QuickOpenFromDocument,
    // System
    Preferences,
    Help,
    Quit,
}

/// Broad category for grouping actions in the help popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Navigation,
    Repository,
    QuickOpen,
    System,
}

impl ActionCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Navigation => "Navigation",
            Self::Repository => "Repository",
            Self::QuickOpen => "Quick Open",
            Self::System => "System",
        }
    }
}

/// Metadata for a single action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub action: Action,
    /// Snake-case identifier used in `keymap.toml` (e.g. `"quick_open"`).
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ActionCategory,
}

/// Registry of all available actions.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    descriptors: Vec<ActionDescriptor>,
}

const fn descriptor(
    action: Action,
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: ActionCategory,
) -> ActionDescriptor {
    ActionDescriptor {
        action,
        id,
        name,
        description,
        category,
    }
}

impl ActionRegistry {
    /// Builds the registry containing every known action.
    pub fn new() -> Self {
        use Action as A;
        use ActionCategory as C;

        let descriptors = vec![
            descriptor(
                A::CursorUp,
                "cursor_up",
                "Cursor Up",
                "Move cursor up one row",
                C::Navigation,
            ),
            descriptor(
                A::CursorDown,
                "cursor_down",
                "Cursor Down",
                "Move cursor down one row",
                C::Navigation,
            ),
            descriptor(
                A::CursorTop,
                "go_first",
                "Go to First",
                "Jump to the first row",
                C::Navigation,
            ),
            descriptor(
                A::CursorBottom,
                "go_last",
                "Go to Last",
                "Jump to the last row",
                C::Navigation,
            ),
            descriptor(
                A::Activate,
                "activate",
                "Activate",
                "Toggle a directory or open a file",
                C::Navigation,
            ),
            descriptor(
                A::Expand,
                "expand",
                "Expand",
                "Expand the selected directory",
                C::Navigation,
            ),
            descriptor(
                A::Collapse,
                "collapse",
                "Collapse",
                "Collapse the selected directory",
                C::Navigation,
            ),
            descriptor(
                A::OpenFile,
                "open",
                "Open",
                "Open the selected file in $EDITOR",
                C::Navigation,
            ),
            descriptor(
                A::RepoAdd,
                "repo_add",
                "Add Repository",
                "Register a repository by path",
                C::Repository,
            ),
            descriptor(
                A::RepoAddFromDocument,
                "repo_add_from_document",
                "Add From Document",
                "Register the repository of the current document",
                C::Repository,
            ),
            descriptor(
                A::RepoRemove,
                "repo_remove",
                "Remove Repository",
                "Unregister the selected repository",
                C::Repository,
            ),
            descriptor(
                A::RepoRemoveAll,
                "repo_remove_all",
                "Remove All",
                "Unregister every repository",
                C::Repository,
            ),
            descriptor(
                A::RepoMoveUp,
                "repo_move_up",
                "Move Up",
                "Move the selected repository up",
                C::Repository,
            ),
            descriptor(
                A::RepoMoveDown,
                "repo_move_down",
                "Move Down",
                "Move the selected repository down",
                C::Repository,
            ),
            descriptor(
                A::RepoRescan,
                "repo_rescan",
                "Rescan",
                "Rebuild the file tree of the selected repository",
                C::Repository,
            ),
            descriptor(
                A::QuickOpen,
                "quick_open",
                "Quick Open",
                "Search files of the selected repository",
                C::QuickOpen,
            ),
            descriptor(
                A::QuickOpenFromDocument,
                "quick_open_from_document",
                "Quick Open From Document",
                "Search files of the current document's repository",
                C::QuickOpen,
            ),
            descriptor(
                A::Preferences,
                "preferences",
                "Preferences",
                "Edit quick-open settings",
                C::System,
            ),
            descriptor(A::Help, "help", "Help", "Show keyboard shortcuts", C::System),
            descriptor(A::Quit, "quit", "Quit", "Exit gitbrowse", C::System),
        ];
        Self { descriptors }
    }

    pub fn all(&self) -> &[ActionDescriptor] {
        &self.descriptors
    }

    /// Descriptors of one category, in registry order.
    pub fn in_category(&self, category: ActionCategory) -> impl Iterator<Item = &ActionDescriptor> {
        self.descriptors.iter().filter(move |d| d.category == category)
    }

    /// Resolves a `keymap.toml` identifier.
    pub fn find_by_id(&self, id: &str) -> Option<Action> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.action)
    }

    pub fn descriptor_for(&self, action: Action) -> Option<&ActionDescriptor> {
        self.descriptors.iter().find(|d| d.action == action)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_action_has_exactly_one_descriptor() {
        let registry = ActionRegistry::new();
        let actions: HashSet<Action> = registry.all().iter().map(|d| d.action).collect();
        assert_eq!(actions.len(), registry.all().len());
        assert_eq!(actions.len(), 20);
    }

    #[test]
    fn ids_are_unique() {
        let registry = ActionRegistry::new();
        let ids: HashSet<&str> = registry.all().iter().map(|d| d.id).collect();
        assert_eq!(ids.len(), registry.all().len());
    }

    #[test]
    fn find_by_id_resolves_quick_open_actions() {
        let registry = ActionRegistry::new();
        assert_eq!(registry.find_by_id("quick_open"), Some(Action::QuickOpen));
        assert_eq!(
            registry.find_by_id("quick_open_from_document"),
            Some(Action::QuickOpenFromDocument)
        );
        assert_eq!(registry.find_by_id("repo_rescan"), Some(Action::RepoRescan));
    }

    #[test]
    fn find_by_id_unknown_returns_none() {
        let registry = ActionRegistry::new();
        assert_eq!(registry.find_by_id("yank"), None);
        assert_eq!(registry.find_by_id(""), None);
    }

    #[test]
    fn descriptor_for_returns_metadata() {
        let registry = ActionRegistry::new();
        let desc = registry.descriptor_for(Action::RepoRemoveAll).unwrap();
        assert_eq!(desc.id, "repo_remove_all");
        assert_eq!(desc.category, ActionCategory::Repository);
    }

    #[test]
    fn categories_group_actions() {
        let registry = ActionRegistry::new();
        let quick: Vec<Action> = registry
            .in_category(ActionCategory::QuickOpen)
            .map(|d| d.action)
            .collect();
        assert_eq!(quick, vec![Action::QuickOpen, Action::QuickOpenFromDocument]);
        assert_eq!(ActionCategory::QuickOpen.label(), "Quick Open");
    }
}
