use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use gitbrowse_core::action::ActionRegistry;
use gitbrowse_core::config::keymap::Keymap;
use gitbrowse_core::config::settings::{Config, QuickOpenConfig};
use gitbrowse_core::index::NodeId;
use gitbrowse_core::nav::QuickOpen;
use gitbrowse_core::repo::{get_branch_info, BranchInfo, Repositories, RepositoryLister};
use regex::Regex;

const NOT_IN_KNOWN_REPOSITORY: &str =
    "Current document is not part of a known repository. Use Add to add a repository.";

/// Application mode; decides how input is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Normal,
    /// Typing the path of a repository to add.
    AddRepository(String),
    Confirm(ConfirmAction),
    /// The quick-open dialog is up; its session lives in [`App::quick_open`].
    QuickOpen,
    Preferences(PreferencesForm),
    Help,
}

/// What action is pending user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    Remove { position: usize, name: String },
    RemoveAll,
}

/// Field of the preferences popup that receives input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
    HidePattern,
    FilterTime,
}

/// Draft of the quick-open settings being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferencesForm {
    pub draft: QuickOpenConfig,
    pub field: PreferenceField,
    /// Why the last apply was rejected.
    pub error: Option<String>,
}

impl PreferencesForm {
    fn new(current: &QuickOpenConfig) -> Self {
        Self {
            draft: current.clone(),
            field: PreferenceField::HidePattern,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Repository,
    Directory,
    File,
}

/// One visible line of the repository tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Position of the owning repository.
    pub repo: usize,
    /// `None` on the repository row itself.
    pub node: Option<NodeId>,
    pub kind: RowKind,
    pub depth: usize,
    pub name: String,
    pub expanded: bool,
}

/// Whole UI state. Transitions consume the app and return the next one.
pub struct App {
    mode: AppMode,
    should_quit: bool,
    status_message: Option<String>,
    repositories: Repositories,
    lister: Box<dyn RepositoryLister>,
    config: Config,
    config_path: PathBuf,
    hide_pattern: Option<Regex>,
    keymap: Keymap,
    action_registry: ActionRegistry,
    rows: Vec<TreeRow>,
    selected: usize,
    /// Repository roots whose row is folded. Repositories start expanded.
    collapsed_repos: HashSet<PathBuf>,
    /// Per repository root, the relative paths of unfolded directories.
    expanded_dirs: HashMap<PathBuf, HashSet<String>>,
    quick_open: Option<QuickOpen>,
    current_document: Option<PathBuf>,
    /// Branch of the repository under the cursor, keyed by its root.
    branch: Option<(PathBuf, Option<BranchInfo>)>,
}

impl App {
    pub fn new(
        config: Config,
        keymap: Keymap,
        lister: Box<dyn RepositoryLister>,
        config_path: PathBuf,
    ) -> Self {
        let hide_pattern = config.quick_open.compile_hide_pattern();
        Self {
            mode: AppMode::Normal,
            should_quit: false,
            status_message: None,
            repositories: Repositories::new(),
            lister,
            config,
            config_path,
            hide_pattern,
            keymap,
            action_registry: ActionRegistry::new(),
            rows: Vec::new(),
            selected: 0,
            collapsed_repos: HashSet::new(),
            expanded_dirs: HashMap::new(),
            quick_open: None,
            current_document: None,
            branch: None,
        }
    }

    // --- Accessors ---

    pub fn mode(&self) -> &AppMode {
        &self.mode
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn action_registry(&self) -> &ActionRegistry {
        &self.action_registry
    }

    pub fn rows(&self) -> &[TreeRow] {
        &self.rows
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.selected)
    }

    pub fn quick_open(&self) -> Option<&QuickOpen> {
        self.quick_open.as_ref()
    }

    pub fn current_document(&self) -> Option<&Path> {
        self.current_document.as_deref()
    }

    pub fn branch_info(&self) -> Option<&BranchInfo> {
        self.branch.as_ref().and_then(|(_, info)| info.as_ref())
    }

    /// `true` while a quick-open filter pass is unfinished.
    pub fn is_filtering(&self) -> bool {
        self.quick_open.as_ref().is_some_and(QuickOpen::is_scanning)
    }

    /// Absolute path of the file under the cursor.
    pub fn selected_file(&self) -> Option<PathBuf> {
        let row = self.selected_row()?;
        let node = row.node.filter(|_| row.kind == RowKind::File)?;
        let repo = self.repositories.get(row.repo)?;
        Some(repo.absolute_path(node))
    }

    // --- Generic transitions ---

    pub fn with_mode(self, mode: AppMode) -> Self {
        Self { mode, ..self }
    }

    pub fn with_quit(self) -> Self {
        Self {
            should_quit: true,
            ..self
        }
    }

    pub fn with_status(self, msg: String) -> Self {
        Self {
            status_message: Some(msg),
            ..self
        }
    }

    pub fn with_clear_status(self) -> Self {
        Self {
            status_message: None,
            ..self
        }
    }

    /// Records `path` as the document being edited.
    pub fn with_document(self, path: PathBuf) -> Self {
        Self {
            current_document: Some(path),
            ..self
        }
    }

    /// Registers persisted roots, reporting the last outcome.
    pub fn with_restored(mut self, roots: &[PathBuf]) -> Self {
        let messages = self.repositories.restore(roots, self.lister.as_ref());
        for msg in &messages {
            tracing::info!("{msg}");
        }
        let app = self.refreshed();
        match messages.last() {
            Some(last) if messages.len() > 1 => {
                let count = app.repositories.len();
                app.with_status(format!("{count} repositories registered. {last}"))
            }
            Some(last) => app.with_status(last.clone()),
            None => app,
        }
    }

    // --- Cursor ---

    pub fn with_cursor_down(self) -> Self {
        let last = self.rows.len().saturating_sub(1);
        let selected = (self.selected + 1).min(last);
        Self { selected, ..self }.refreshed_branch()
    }

    pub fn with_cursor_up(self) -> Self {
        let selected = self.selected.saturating_sub(1);
        Self { selected, ..self }.refreshed_branch()
    }

    pub fn with_cursor_top(self) -> Self {
        Self { selected: 0, ..self }.refreshed_branch()
    }

    pub fn with_cursor_bottom(self) -> Self {
        let selected = self.rows.len().saturating_sub(1);
        Self { selected, ..self }.refreshed_branch()
    }

    // --- Tree folding ---

    /// Folds or unfolds the repository or directory under the cursor.
    pub fn with_toggle_selected(self) -> Self {
        match self.selected_row().map(|r| r.expanded) {
            Some(true) => self.with_collapse(),
            Some(false) => self.with_expand(),
            None => self,
        }
    }

    pub fn with_expand(mut self) -> Self {
        let Some(row) = self.selected_row().cloned() else {
            return self;
        };
        let Some(root) = self.repositories.get(row.repo).map(|r| r.root().to_path_buf()) else {
            return self;
        };
        match (row.kind, row.node) {
            (RowKind::Repository, _) => {
                self.collapsed_repos.remove(&root);
            }
            (RowKind::Directory, Some(node)) => {
                let key = self.relative_path(row.repo, node);
                self.expanded_dirs.entry(root).or_default().insert(key);
            }
            _ => return self,
        }
        self.refreshed()
    }

    /// Folds the row under the cursor, or jumps to its parent row when it
    /// is a file or already folded.
    pub fn with_collapse(mut self) -> Self {
        let Some(row) = self.selected_row().cloned() else {
            return self;
        };
        let Some(root) = self.repositories.get(row.repo).map(|r| r.root().to_path_buf()) else {
            return self;
        };
        if row.expanded {
            match (row.kind, row.node) {
                (RowKind::Repository, _) => {
                    self.collapsed_repos.insert(root);
                }
                (_, Some(node)) => {
                    let key = self.relative_path(row.repo, node);
                    if let Some(dirs) = self.expanded_dirs.get_mut(&root) {
                        dirs.remove(&key);
                    }
                }
                _ => {}
            }
            return self.refreshed();
        }
        let parent = self.rows[..self.selected]
            .iter()
            .rposition(|r| r.depth + 1 == row.depth && r.repo == row.repo);
        match parent {
            Some(selected) => Self { selected, ..self }.refreshed_branch(),
            None => self,
        }
    }

    // --- Repository commands ---

    /// Opens the add prompt, prefilled with the current document's directory.
    pub fn with_add_prompt(self) -> Self {
        let initial = self
            .current_document
            .as_deref()
            .and_then(Path::parent)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.with_mode(AppMode::AddRepository(initial))
    }

    pub fn with_prompt_char(self, c: char) -> Self {
        match self.mode {
            AppMode::AddRepository(mut text) => {
                text.push(c);
                Self {
                    mode: AppMode::AddRepository(text),
                    ..self
                }
            }
            _ => self,
        }
    }

    pub fn with_prompt_backspace(self) -> Self {
        match self.mode {
            AppMode::AddRepository(mut text) => {
                text.pop();
                Self {
                    mode: AppMode::AddRepository(text),
                    ..self
                }
            }
            _ => self,
        }
    }

    /// Adds the repository typed into the prompt.
    pub fn with_prompt_submitted(self) -> Self {
        let AppMode::AddRepository(text) = &self.mode else {
            return self;
        };
        let input = text.trim().to_string();
        let app = self.with_mode(AppMode::Normal);
        if input.is_empty() {
            return app;
        }
        app.with_repository_added(&expand_home(&input))
    }

    pub fn with_repository_added(mut self, path: &Path) -> Self {
        match self.repositories.add(path, self.lister.as_ref()) {
            Ok(outcome) => self
                .refreshed()
                .with_repository_selected(outcome.position)
                .with_status(outcome.message),
            Err(e) => self.with_status(format!("Could not add {}: {e}", path.display())),
        }
    }

    pub fn with_add_from_document(mut self) -> Self {
        let Some(document) = self.current_document.clone() else {
            return self.with_status("No current document.".to_string());
        };
        match self
            .repositories
            .add_from_document(&document, self.lister.as_ref())
        {
            Ok(Some(outcome)) => self
                .refreshed()
                .with_repository_selected(outcome.position)
                .with_status(outcome.message),
            Ok(None) => self.with_status(
                "The repository of the current document is already added.".to_string(),
            ),
            Err(e) => self.with_status(format!("Could not add repository: {e}")),
        }
    }

    /// Asks before unregistering the repository under the cursor.
    pub fn with_remove_requested(self) -> Self {
        let Some(position) = self.selected_row().map(|r| r.repo) else {
            return self.with_status("No repository selected.".to_string());
        };
        let name = self
            .repositories
            .get(position)
            .map(|r| r.display_name())
            .unwrap_or_default();
        self.with_mode(AppMode::Confirm(ConfirmAction::Remove { position, name }))
    }

    pub fn with_remove_all_requested(self) -> Self {
        if self.repositories.is_empty() {
            return self.with_status("No repositories to remove.".to_string());
        }
        self.with_mode(AppMode::Confirm(ConfirmAction::RemoveAll))
    }

    /// Carries out the pending confirmation.
    pub fn with_confirm_approved(mut self) -> Self {
        let mode = std::mem::replace(&mut self.mode, AppMode::Normal);
        match mode {
            AppMode::Confirm(ConfirmAction::Remove { position, .. }) => {
                match self.repositories.remove(position) {
                    Some(removed) => {
                        self.forget_state(removed.root());
                        let msg = format!("Removed repository \"{}\".", removed.display_name());
                        self.refreshed().with_status(msg)
                    }
                    None => self,
                }
            }
            AppMode::Confirm(ConfirmAction::RemoveAll) => {
                self.repositories.remove_all();
                self.collapsed_repos.clear();
                self.expanded_dirs.clear();
                self.refreshed()
                    .with_status("Removed all repositories.".to_string())
            }
            _ => self,
        }
    }

    pub fn with_repository_moved_up(mut self) -> Self {
        let Some(position) = self.selected_row().map(|r| r.repo) else {
            return self;
        };
        if self.repositories.move_up(position) {
            return self.refreshed().with_repository_selected(position - 1);
        }
        self
    }

    pub fn with_repository_moved_down(mut self) -> Self {
        let Some(position) = self.selected_row().map(|r| r.repo) else {
            return self;
        };
        if self.repositories.move_down(position) {
            return self.refreshed().with_repository_selected(position + 1);
        }
        self
    }

    /// Rebuilds the tree of the repository under the cursor.
    pub fn with_rescan(mut self) -> Self {
        let Some(position) = self.selected_row().map(|r| r.repo) else {
            return self.with_status("No repository selected.".to_string());
        };
        match self.repositories.rescan(position, self.lister.as_ref()) {
            Some(outcome) => {
                self.branch = None;
                self.refreshed().with_status(outcome.message)
            }
            None => self,
        }
    }

    // --- Quick open ---

    /// Opens quick open over the repository under the cursor.
    pub fn with_quick_open(self) -> Self {
        match self.selected_row().map(|r| r.repo) {
            Some(position) => self.with_quick_open_for(position),
            None => self.with_status("No repository selected.".to_string()),
        }
    }

    /// Opens quick open over the repository of the current document.
    pub fn with_quick_open_from_document(self) -> Self {
        let position = self
            .current_document
            .as_deref()
            .and_then(|doc| self.repositories.find_by_path(doc));
        match position {
            Some(position) => self.with_quick_open_for(position),
            None => self.with_status(NOT_IN_KNOWN_REPOSITORY.to_string()),
        }
    }

    fn with_quick_open_for(self, position: usize) -> Self {
        let Some(repo) = self.repositories.get(position) else {
            return self;
        };
        let session = QuickOpen::open(
            repo,
            self.hide_pattern.as_ref(),
            self.config.quick_open.budget(),
        );
        tracing::debug!(
            repository = %session.repository(),
            entries = session.entries().len(),
            "quick open"
        );
        Self {
            mode: AppMode::QuickOpen,
            quick_open: Some(session),
            ..self
        }
        .with_clear_status()
    }

    fn with_session(mut self, f: impl FnOnce(&mut QuickOpen)) -> Self {
        if let Some(session) = self.quick_open.as_mut() {
            f(session);
        }
        self
    }

    pub fn with_quick_open_char(self, c: char) -> Self {
        self.with_session(|s| s.push_char(c))
    }

    pub fn with_quick_open_backspace(self) -> Self {
        self.with_session(QuickOpen::pop_char)
    }

    pub fn with_quick_open_cleared(self) -> Self {
        self.with_session(QuickOpen::clear_query)
    }

    pub fn with_quick_open_down(self) -> Self {
        self.with_session(QuickOpen::move_down)
    }

    pub fn with_quick_open_up(self) -> Self {
        self.with_session(QuickOpen::move_up)
    }

    pub fn with_quick_open_page_down(self, rows: usize) -> Self {
        self.with_session(|s| s.page_down(rows))
    }

    pub fn with_quick_open_page_up(self, rows: usize) -> Self {
        self.with_session(|s| s.page_up(rows))
    }

    pub fn with_quick_open_mark_toggled(self) -> Self {
        self.with_session(QuickOpen::toggle_mark)
    }

    /// Closes the dialog, dropping its index.
    pub fn with_quick_open_closed(self) -> Self {
        Self {
            mode: AppMode::Normal,
            quick_open: None,
            ..self
        }
    }

    /// Closes the dialog and hands back the files to open. The dialog stays
    /// up when nothing is selectable.
    pub fn with_quick_open_confirmed(self) -> (Self, Vec<PathBuf>) {
        let paths = self
            .quick_open
            .as_ref()
            .map(QuickOpen::confirm)
            .unwrap_or_default();
        if paths.is_empty() {
            return (self, paths);
        }
        (self.with_quick_open_closed(), paths)
    }

    /// Runs one budgeted filter slice when a pass is pending.
    pub fn with_tick(self) -> Self {
        if !self.is_filtering() {
            return self;
        }
        self.with_session(|s| {
            s.tick();
        })
    }

    // --- Preferences ---

    pub fn with_preferences(self) -> Self {
        let form = PreferencesForm::new(&self.config.quick_open);
        self.with_mode(AppMode::Preferences(form))
    }

    fn with_form(self, f: impl FnOnce(&mut PreferencesForm)) -> Self {
        match self.mode {
            AppMode::Preferences(mut form) => {
                f(&mut form);
                Self {
                    mode: AppMode::Preferences(form),
                    ..self
                }
            }
            _ => self,
        }
    }

    pub fn with_preferences_char(self, c: char) -> Self {
        self.with_form(|form| match form.field {
            PreferenceField::HidePattern => form.draft.hide_pattern.push(c),
            PreferenceField::FilterTime => match c {
                '+' | 'l' | 'k' => form.draft.adjust_budget(1),
                '-' | 'h' | 'j' => form.draft.adjust_budget(-1),
                _ => {}
            },
        })
    }

    pub fn with_preferences_backspace(self) -> Self {
        self.with_form(|form| {
            if form.field == PreferenceField::HidePattern {
                form.draft.hide_pattern.pop();
            }
        })
    }

    pub fn with_preferences_next_field(self) -> Self {
        self.with_form(|form| {
            form.field = match form.field {
                PreferenceField::HidePattern => PreferenceField::FilterTime,
                PreferenceField::FilterTime => PreferenceField::HidePattern,
            };
        })
    }

    pub fn with_preferences_adjusted(self, steps: i64) -> Self {
        self.with_form(|form| form.draft.adjust_budget(steps))
    }

    /// Validates and stores the edited settings, then saves the config file.
    pub fn with_preferences_applied(self) -> Self {
        let AppMode::Preferences(form) = &self.mode else {
            return self;
        };
        let draft = form.draft.clone();
        let hide_pattern = match draft.compile_hide_pattern_strict() {
            Ok(re) => re,
            Err(e) => {
                let msg = e.to_string();
                return self.with_form(|form| form.error = Some(msg));
            }
        };

        let mut config = self.config.clone();
        config.quick_open = draft;
        let status = match config.save(&self.config_path) {
            Ok(()) => "Preferences saved.".to_string(),
            Err(e) => {
                tracing::warn!(
                    path = %self.config_path.display(),
                    error = %e,
                    "saving preferences failed"
                );
                format!("Could not save preferences: {e}")
            }
        };
        Self {
            mode: AppMode::Normal,
            config,
            hide_pattern,
            ..self
        }
        .with_status(status)
    }

    // --- Internals ---

    fn relative_path(&self, position: usize, node: NodeId) -> String {
        self.repositories
            .get(position)
            .map(|r| r.tree().path_to_root(node))
            .unwrap_or_default()
    }

    fn forget_state(&mut self, root: &Path) {
        self.collapsed_repos.remove(root);
        self.expanded_dirs.remove(root);
    }

    fn with_repository_selected(self, position: usize) -> Self {
        match self
            .rows
            .iter()
            .position(|r| r.repo == position && r.node.is_none())
        {
            Some(selected) => Self { selected, ..self }.refreshed_branch(),
            None => self,
        }
    }

    /// Rebuilds the visible rows and keeps the cursor in range.
    fn refreshed(self) -> Self {
        let rows = build_rows(&self.repositories, &self.collapsed_repos, &self.expanded_dirs);
        let selected = self.selected.min(rows.len().saturating_sub(1));
        Self {
            rows,
            selected,
            ..self
        }
        .refreshed_branch()
    }

    /// Reloads branch info when the cursor moved to another repository.
    fn refreshed_branch(self) -> Self {
        if !self.config.ui.show_branch {
            return self;
        }
        let root = self
            .selected_row()
            .and_then(|r| self.repositories.get(r.repo))
            .map(|r| r.root().to_path_buf());
        let Some(root) = root else {
            return Self {
                branch: None,
                ..self
            };
        };
        if self.branch.as_ref().is_some_and(|(cached, _)| *cached == root) {
            return self;
        }
        let info = get_branch_info(&root).unwrap_or_else(|e| {
            tracing::debug!(root = %root.display(), error = %e, "no branch info");
            None
        });
        Self {
            branch: Some((root, info)),
            ..self
        }
    }
}

/// Lays out every repository followed by its unfolded subtree.
fn build_rows(
    repositories: &Repositories,
    collapsed: &HashSet<PathBuf>,
    expanded: &HashMap<PathBuf, HashSet<String>>,
) -> Vec<TreeRow> {
    let no_dirs = HashSet::new();
    let mut rows = Vec::new();
    for (position, repo) in repositories.iter().enumerate() {
        let open = !collapsed.contains(repo.root());
        rows.push(TreeRow {
            repo: position,
            node: None,
            kind: RowKind::Repository,
            depth: 0,
            name: repo.display_name(),
            expanded: open,
        });
        if !open {
            continue;
        }

        let unfolded = expanded.get(repo.root()).unwrap_or(&no_dirs);
        let tree = repo.tree();
        let mut folded_at: Option<usize> = None;
        for item in tree.traverse_grouped(tree.root()) {
            match folded_at {
                Some(depth) if item.depth > depth => continue,
                _ => folded_at = None,
            }
            let node = tree.node(item.node);
            let (kind, is_open) = if node.is_dir() {
                let path = if item.parent_path.is_empty() {
                    node.name().to_string()
                } else {
                    format!("{}/{}", item.parent_path, node.name())
                };
                let is_open = unfolded.contains(&path);
                if !is_open {
                    folded_at = Some(item.depth);
                }
                (RowKind::Directory, is_open)
            } else {
                (RowKind::File, false)
            };
            rows.push(TreeRow {
                repo: position,
                node: Some(item.node),
                kind,
                depth: item.depth + 1,
                name: node.name().to_string(),
                expanded: is_open,
            });
        }
    }
    rows
}

/// Expands a leading `~/` to `$HOME`.
fn expand_home(input: &str) -> PathBuf {
    match (input.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(input),
    }
}
