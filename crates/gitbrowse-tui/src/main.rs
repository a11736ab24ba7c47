//! gitbrowse: browse and quick-open the tracked files of git repositories.
//!
//! This binary initialises the terminal, runs the main event loop,
//! and restores the terminal on exit or panic.

mod app;
mod icons;
mod input;
mod render;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gitbrowse_core::action::Action;
use gitbrowse_core::config::keymap::Keymap;
use gitbrowse_core::config::settings::Config;
use gitbrowse_core::config::{config_dir, CONFIG_FILE, KEYMAP_FILE, REPOSITORIES_FILE};
use gitbrowse_core::repo::RepositoryStore;
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use crate::app::{App, AppMode};
use crate::input::{handle_key, InputAction, InputState};
use crate::render::render;

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Poll timeout while no filter pass is pending.
const IDLE_POLL: Duration = Duration::from_millis(100);

fn setup_terminal() -> anyhow::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Term) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before printing the panic.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_tracing() -> anyhow::Result<()> {
    let path = std::env::temp_dir().join("gitbrowse.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    install_panic_hook();

    let dir = config_dir();
    let config = Config::load_or_default(&dir.join(CONFIG_FILE));
    let keymap = Keymap::load_or_default(&dir.join(KEYMAP_FILE));
    let store_path = dir.join(REPOSITORIES_FILE);
    let store = RepositoryStore::load_or_default(&store_path).unwrap_or_else(|e| {
        tracing::warn!(path = %store_path.display(), error = %e, "ignoring repository list");
        RepositoryStore::default()
    });

    let lister = config.lister.backend.lister();
    let mut app =
        App::new(config, keymap, lister, dir.join(CONFIG_FILE)).with_restored(&store.roots);
    // An optional argument names the current document.
    if let Some(document) = std::env::args_os().nth(1).map(PathBuf::from) {
        let document = std::fs::canonicalize(&document).unwrap_or(document);
        app = app.with_document(document);
    }

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, app);
    restore_terminal(&mut terminal)?;

    let app = result?;
    RepositoryStore::new(app.repositories().roots())
        .save_to_file(&store_path)
        .with_context(|| format!("failed to save {}", store_path.display()))?;
    Ok(())
}

/// Event loop. While a quick-open filter pass is pending, events are polled
/// without waiting so ticks run back to back; at most one tick per turn.
fn run_app(terminal: &mut Term, mut app: App) -> anyhow::Result<App> {
    let mut input_state = InputState::new();

    loop {
        terminal.draw(|f| render(f, &app))?;

        let timeout = if app.is_filtering() {
            Duration::ZERO
        } else {
            IDLE_POLL
        };
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let (action, new_state) =
                        handle_key(key, app.mode(), &input_state, app.keymap());
                    input_state = new_state;
                    app = dispatch(terminal, app, action)?;
                }
            }
        }

        app = app.with_tick();
        if app.should_quit() {
            return Ok(app);
        }
    }
}

fn dispatch(terminal: &mut Term, app: App, action: InputAction) -> anyhow::Result<App> {
    let app = match action {
        InputAction::Dispatch(action) => return dispatch_action(terminal, app, action),
        InputAction::EnterMode(mode) => app.with_mode(mode),
        InputAction::Quit => app.with_quit(),
        InputAction::ConfirmApproved => app.with_confirm_approved(),
        InputAction::PromptChar(c) => app.with_prompt_char(c),
        InputAction::PromptBackspace => app.with_prompt_backspace(),
        InputAction::PromptSubmit => app.with_prompt_submitted(),
        InputAction::QuickOpenChar(c) => app.with_quick_open_char(c),
        InputAction::QuickOpenBackspace => app.with_quick_open_backspace(),
        InputAction::QuickOpenClear => app.with_quick_open_cleared(),
        InputAction::QuickOpenDown => app.with_quick_open_down(),
        InputAction::QuickOpenUp => app.with_quick_open_up(),
        InputAction::QuickOpenPageDown => app.with_quick_open_page_down(page_rows(terminal)?),
        InputAction::QuickOpenPageUp => app.with_quick_open_page_up(page_rows(terminal)?),
        InputAction::QuickOpenToggleMark => app.with_quick_open_mark_toggled(),
        InputAction::QuickOpenCancel => app.with_quick_open_closed(),
        InputAction::QuickOpenConfirm => {
            let (app, paths) = app.with_quick_open_confirmed();
            return open_files(terminal, app, paths);
        }
        InputAction::PreferencesChar(c) => app.with_preferences_char(c),
        InputAction::PreferencesBackspace => app.with_preferences_backspace(),
        InputAction::PreferencesNextField => app.with_preferences_next_field(),
        InputAction::PreferencesAdjust(steps) => app.with_preferences_adjusted(steps),
        InputAction::PreferencesApply => app.with_preferences_applied(),
        InputAction::None => app,
    };
    Ok(app)
}

fn dispatch_action(terminal: &mut Term, app: App, action: Action) -> anyhow::Result<App> {
    let app = app.with_clear_status();
    let app = match action {
        Action::CursorUp => app.with_cursor_up(),
        Action::CursorDown => app.with_cursor_down(),
        Action::CursorTop => app.with_cursor_top(),
        Action::CursorBottom => app.with_cursor_bottom(),
        Action::Activate => match app.selected_file() {
            Some(path) => return open_files(terminal, app, vec![path]),
            None => app.with_toggle_selected(),
        },
        Action::Expand => app.with_expand(),
        Action::Collapse => app.with_collapse(),
        Action::OpenFile => match app.selected_file() {
            Some(path) => return open_files(terminal, app, vec![path]),
            None => app.with_status("Select a file to open.".to_string()),
        },
        Action::RepoAdd => app.with_add_prompt(),
        Action::RepoAddFromDocument => app.with_add_from_document(),
        Action::RepoRemove => app.with_remove_requested(),
        Action::RepoRemoveAll => app.with_remove_all_requested(),
        Action::RepoMoveUp => app.with_repository_moved_up(),
        Action::RepoMoveDown => app.with_repository_moved_down(),
        Action::RepoRescan => app.with_rescan(),
        Action::QuickOpen => app.with_quick_open(),
        Action::QuickOpenFromDocument => app.with_quick_open_from_document(),
        Action::Preferences => app.with_preferences(),
        Action::Help => app.with_mode(AppMode::Help),
        Action::Quit => app.with_quit(),
    };
    Ok(app)
}

/// Rows moved by PageUp/PageDown in the quick-open list.
fn page_rows(terminal: &Term) -> anyhow::Result<usize> {
    let height = terminal.size()?.height;
    Ok(usize::from(height / 2).max(1))
}

/// Opens `paths` in the editor; the last one becomes the current document.
fn open_files(terminal: &mut Term, app: App, paths: Vec<PathBuf>) -> anyhow::Result<App> {
    let Some(last) = paths.last().cloned() else {
        return Ok(app);
    };
    match launch_editor(terminal, &paths) {
        Ok(()) => Ok(app.with_document(last)),
        Err(e) => {
            tracing::warn!(error = %e, "editor failed");
            Ok(app.with_document(last).with_status(format!("Editor error: {e}")))
        }
    }
}

/// Suspends the TUI, launches `$EDITOR` (or `vi`) on the given files, then resumes.
fn launch_editor(terminal: &mut Term, paths: &[PathBuf]) -> anyhow::Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    // Leave alternate screen and restore normal terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let status = std::process::Command::new(&editor)
        .args(paths)
        .status();

    // Re-enter alternate screen regardless of editor result
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    enable_raw_mode()?;
    terminal.hide_cursor()?;
    terminal.clear()?;

    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => anyhow::bail!("{editor} exited with {s}"),
        Err(e) => anyhow::bail!("failed to launch {editor}: {e}"),
    }
}
