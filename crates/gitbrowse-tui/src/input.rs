use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gitbrowse_core::action::Action;
use gitbrowse_core::config::keymap::Keymap;

use crate::app::{AppMode, PreferenceField};

/// Actions that can result from a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Run a keymap action against the tree.
    Dispatch(Action),
    /// Enter a new AppMode.
    EnterMode(AppMode),
    Quit,
    /// User confirmed the pending action.
    ConfirmApproved,
    PromptChar(char),
    PromptBackspace,
    PromptSubmit,
    QuickOpenChar(char),
    QuickOpenBackspace,
    /// Empty the query (the dialog's clear button).
    QuickOpenClear,
    QuickOpenDown,
    QuickOpenUp,
    QuickOpenPageDown,
    QuickOpenPageUp,
    QuickOpenToggleMark,
    QuickOpenConfirm,
    QuickOpenCancel,
    PreferencesChar(char),
    PreferencesBackspace,
    PreferencesNextField,
    /// Move the filter budget by this many steps.
    PreferencesAdjust(i64),
    PreferencesApply,
    /// No action.
    None,
}

/// Tracks state for multi-key sequences like "gg".
#[derive(Debug, Default)]
pub struct InputState {
    pending_g: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self { pending_g: false }
    }
}

/// Maps a key event to an InputAction based on the current mode.
/// Returns the action and a new InputState (immutable pattern).
///
/// In Normal mode, character keys (with or without Ctrl) are resolved
/// through the `Keymap`; arrow keys, Enter, Ctrl+C and the `gg` sequence
/// are hardcoded. Modal modes are hardcoded.
pub fn handle_key(
    key: KeyEvent,
    mode: &AppMode,
    state: &InputState,
    keymap: &Keymap,
) -> (InputAction, InputState) {
    match mode {
        AppMode::Normal => handle_normal_key(key, state, keymap),
        AppMode::AddRepository(_) => handle_prompt_key(key),
        AppMode::Confirm(_) => handle_confirm_key(key),
        AppMode::QuickOpen => handle_quick_open_key(key),
        AppMode::Preferences(form) => handle_preferences_key(key, form.field),
        AppMode::Help => handle_help_key(key),
    }
}

/// Converts an `Action` to the corresponding `InputAction`.
fn action_to_input_action(action: Action) -> InputAction {
    match action {
        Action::Help => InputAction::EnterMode(AppMode::Help),
        Action::Quit => InputAction::Quit,
        other => InputAction::Dispatch(other),
    }
}

fn keymap_action(keymap: &Keymap, key: &str) -> InputAction {
    keymap
        .action_for_key(key)
        .map_or(InputAction::None, action_to_input_action)
}

fn handle_normal_key(
    key: KeyEvent,
    state: &InputState,
    keymap: &Keymap,
) -> (InputAction, InputState) {
    // Handle "gg" sequence
    if state.pending_g {
        let new_state = InputState { pending_g: false };
        return match key.code {
            KeyCode::Char('g') => (keymap_action(keymap, "gg"), new_state),
            _ => (InputAction::None, new_state),
        };
    }

    let new_state = InputState { pending_g: false };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Hardcoded keys: arrows, Enter, Ctrl+C (not remappable)
    let action = match key.code {
        KeyCode::Down => InputAction::Dispatch(Action::CursorDown),
        KeyCode::Up => InputAction::Dispatch(Action::CursorUp),
        KeyCode::Left => InputAction::Dispatch(Action::Collapse),
        KeyCode::Right => InputAction::Dispatch(Action::Expand),
        KeyCode::Home => InputAction::Dispatch(Action::CursorTop),
        KeyCode::End => InputAction::Dispatch(Action::CursorBottom),
        KeyCode::Enter => InputAction::Dispatch(Action::Activate),
        KeyCode::Char('c') if ctrl => InputAction::Quit,
        KeyCode::Char(c) if ctrl => keymap_action(keymap, &format!("Ctrl+{c}")),
        KeyCode::Char('g') => {
            return (InputAction::None, InputState { pending_g: true });
        }
        KeyCode::Char(c) => keymap_action(keymap, &c.to_string()),
        _ => InputAction::None,
    };

    (action, new_state)
}

fn handle_prompt_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Esc => InputAction::EnterMode(AppMode::Normal),
        KeyCode::Enter => InputAction::PromptSubmit,
        KeyCode::Backspace => InputAction::PromptBackspace,
        KeyCode::Char(c) => InputAction::PromptChar(c),
        _ => InputAction::None,
    };
    (action, new_state)
}

fn handle_confirm_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => InputAction::ConfirmApproved,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            InputAction::EnterMode(AppMode::Normal)
        }
        _ => InputAction::None,
    };
    (action, new_state)
}

/// Every printable key edits the query, so navigation uses arrows and Ctrl.
fn handle_quick_open_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let action = match key.code {
        KeyCode::Esc => InputAction::QuickOpenCancel,
        KeyCode::Enter => InputAction::QuickOpenConfirm,
        KeyCode::Backspace => InputAction::QuickOpenBackspace,
        KeyCode::Down => InputAction::QuickOpenDown,
        KeyCode::Up => InputAction::QuickOpenUp,
        KeyCode::PageDown => InputAction::QuickOpenPageDown,
        KeyCode::PageUp => InputAction::QuickOpenPageUp,
        KeyCode::Tab => InputAction::QuickOpenToggleMark,
        KeyCode::Char('c') if ctrl => InputAction::QuickOpenCancel,
        KeyCode::Char('n') if ctrl => InputAction::QuickOpenDown,
        KeyCode::Char('p') if ctrl => InputAction::QuickOpenUp,
        KeyCode::Char('u') if ctrl => InputAction::QuickOpenClear,
        KeyCode::Char(_) if ctrl => InputAction::None,
        KeyCode::Char(c) => InputAction::QuickOpenChar(c),
        _ => InputAction::None,
    };
    (action, new_state)
}

fn handle_preferences_key(key: KeyEvent, field: PreferenceField) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let on_budget = field == PreferenceField::FilterTime;
    let action = match key.code {
        KeyCode::Esc => InputAction::EnterMode(AppMode::Normal),
        KeyCode::Enter => InputAction::PreferencesApply,
        KeyCode::Tab | KeyCode::BackTab => InputAction::PreferencesNextField,
        KeyCode::Up | KeyCode::Right if on_budget => InputAction::PreferencesAdjust(1),
        KeyCode::Down | KeyCode::Left if on_budget => InputAction::PreferencesAdjust(-1),
        KeyCode::PageUp if on_budget => InputAction::PreferencesAdjust(10),
        KeyCode::PageDown if on_budget => InputAction::PreferencesAdjust(-10),
        KeyCode::Backspace => InputAction::PreferencesBackspace,
        KeyCode::Char(c) => InputAction::PreferencesChar(c),
        _ => InputAction::None,
    };
    (action, new_state)
}

fn handle_help_key(key: KeyEvent) -> (InputAction, InputState) {
    let new_state = InputState::new();
    let action = match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            InputAction::EnterMode(AppMode::Normal)
        }
        _ => InputAction::None,
    };
    (action, new_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ConfirmAction, PreferencesForm};
    use crossterm::event::{KeyEventKind, KeyEventState};
    use gitbrowse_core::config::settings::QuickOpenConfig;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn key_with_mod(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn normal(code: KeyCode) -> InputAction {
        let km = Keymap::default();
        handle_key(key(code), &AppMode::Normal, &InputState::new(), &km).0
    }

    fn prefs_mode(field: PreferenceField) -> AppMode {
        AppMode::Preferences(PreferencesForm {
            draft: QuickOpenConfig::default(),
            field,
            error: None,
        })
    }

    // --- Normal mode ---

    #[test]
    fn normal_j_k_move_cursor() {
        assert_eq!(normal(KeyCode::Char('j')), InputAction::Dispatch(Action::CursorDown));
        assert_eq!(normal(KeyCode::Char('k')), InputAction::Dispatch(Action::CursorUp));
    }

    #[test]
    fn normal_arrows_are_hardcoded() {
        assert_eq!(normal(KeyCode::Down), InputAction::Dispatch(Action::CursorDown));
        assert_eq!(normal(KeyCode::Left), InputAction::Dispatch(Action::Collapse));
        assert_eq!(normal(KeyCode::Right), InputAction::Dispatch(Action::Expand));
        assert_eq!(normal(KeyCode::Enter), InputAction::Dispatch(Action::Activate));
    }

    #[test]
    fn normal_g_sets_pending() {
        let km = Keymap::default();
        let (action, state) =
            handle_key(key(KeyCode::Char('g')), &AppMode::Normal, &InputState::new(), &km);
        assert_eq!(action, InputAction::None);
        assert!(state.pending_g);
    }

    #[test]
    fn normal_gg_cursor_top() {
        let km = Keymap::default();
        let pending = InputState { pending_g: true };
        let (action, state) = handle_key(key(KeyCode::Char('g')), &AppMode::Normal, &pending, &km);
        assert_eq!(action, InputAction::Dispatch(Action::CursorTop));
        assert!(!state.pending_g);
    }

    #[test]
    fn normal_g_then_other_key_cancels() {
        let km = Keymap::default();
        let pending = InputState { pending_g: true };
        let (action, state) = handle_key(key(KeyCode::Char('j')), &AppMode::Normal, &pending, &km);
        assert_eq!(action, InputAction::None);
        assert!(!state.pending_g);
    }

    #[test]
    fn normal_quick_open_keys() {
        assert_eq!(normal(KeyCode::Char('o')), InputAction::Dispatch(Action::QuickOpen));
        assert_eq!(
            normal(KeyCode::Char('O')),
            InputAction::Dispatch(Action::QuickOpenFromDocument)
        );
    }

    #[test]
    fn normal_ctrl_o_resolves_through_keymap() {
        let km = Keymap::default();
        let (action, _) = handle_key(
            key_with_mod(KeyCode::Char('o'), KeyModifiers::CONTROL),
            &AppMode::Normal,
            &InputState::new(),
            &km,
        );
        assert_eq!(action, InputAction::Dispatch(Action::QuickOpenFromDocument));
    }

    #[test]
    fn normal_ctrl_c_quits() {
        let km = Keymap::default();
        let (action, _) = handle_key(
            key_with_mod(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &AppMode::Normal,
            &InputState::new(),
            &km,
        );
        assert_eq!(action, InputAction::Quit);
    }

    #[test]
    fn normal_help_and_quit() {
        assert_eq!(normal(KeyCode::Char('?')), InputAction::EnterMode(AppMode::Help));
        assert_eq!(normal(KeyCode::Char('q')), InputAction::Quit);
    }

    #[test]
    fn normal_repository_commands() {
        assert_eq!(normal(KeyCode::Char('a')), InputAction::Dispatch(Action::RepoAdd));
        assert_eq!(normal(KeyCode::Char('d')), InputAction::Dispatch(Action::RepoRemove));
        assert_eq!(normal(KeyCode::Char('r')), InputAction::Dispatch(Action::RepoRescan));
    }

    #[test]
    fn normal_unknown_key_none() {
        assert_eq!(normal(KeyCode::Char('z')), InputAction::None);
        assert_eq!(normal(KeyCode::F(5)), InputAction::None);
    }

    #[test]
    fn custom_keymap_remaps_keys() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("keymap.toml");
        std::fs::write(&path, "[bindings]\nf = \"quick_open\"\n").unwrap();
        let km = Keymap::load(&path).unwrap();
        let (action, _) =
            handle_key(key(KeyCode::Char('f')), &AppMode::Normal, &InputState::new(), &km);
        assert_eq!(action, InputAction::Dispatch(Action::QuickOpen));
        let (action, _) =
            handle_key(key(KeyCode::Char('o')), &AppMode::Normal, &InputState::new(), &km);
        assert_eq!(action, InputAction::None);
    }

    // --- Prompt ---

    #[test]
    fn prompt_keys() {
        let km = Keymap::default();
        let mode = AppMode::AddRepository(String::new());
        let state = InputState::new();
        assert_eq!(
            handle_key(key(KeyCode::Char('j')), &mode, &state, &km).0,
            InputAction::PromptChar('j')
        );
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mode, &state, &km).0,
            InputAction::PromptSubmit
        );
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mode, &state, &km).0,
            InputAction::EnterMode(AppMode::Normal)
        );
    }

    // --- Confirm ---

    #[test]
    fn confirm_y_approves_and_n_cancels() {
        let km = Keymap::default();
        let mode = AppMode::Confirm(ConfirmAction::RemoveAll);
        let state = InputState::new();
        assert_eq!(
            handle_key(key(KeyCode::Char('Y')), &mode, &state, &km).0,
            InputAction::ConfirmApproved
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('n')), &mode, &state, &km).0,
            InputAction::EnterMode(AppMode::Normal)
        );
        assert_eq!(handle_key(key(KeyCode::Char('x')), &mode, &state, &km).0, InputAction::None);
    }

    // --- Quick open ---

    #[test]
    fn quick_open_letters_edit_query() {
        let km = Keymap::default();
        let state = InputState::new();
        assert_eq!(
            handle_key(key(KeyCode::Char('j')), &AppMode::QuickOpen, &state, &km).0,
            InputAction::QuickOpenChar('j')
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('q')), &AppMode::QuickOpen, &state, &km).0,
            InputAction::QuickOpenChar('q')
        );
    }

    #[test]
    fn quick_open_navigation_keys() {
        let km = Keymap::default();
        let state = InputState::new();
        let mode = AppMode::QuickOpen;
        assert_eq!(
            handle_key(key(KeyCode::Down), &mode, &state, &km).0,
            InputAction::QuickOpenDown
        );
        assert_eq!(
            handle_key(
                key_with_mod(KeyCode::Char('p'), KeyModifiers::CONTROL),
                &mode,
                &state,
                &km
            )
            .0,
            InputAction::QuickOpenUp
        );
        assert_eq!(
            handle_key(key(KeyCode::PageDown), &mode, &state, &km).0,
            InputAction::QuickOpenPageDown
        );
        assert_eq!(
            handle_key(key(KeyCode::Tab), &mode, &state, &km).0,
            InputAction::QuickOpenToggleMark
        );
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mode, &state, &km).0,
            InputAction::QuickOpenConfirm
        );
        assert_eq!(
            handle_key(key(KeyCode::Esc), &mode, &state, &km).0,
            InputAction::QuickOpenCancel
        );
    }

    #[test]
    fn quick_open_ctrl_u_clears() {
        let km = Keymap::default();
        let (action, _) = handle_key(
            key_with_mod(KeyCode::Char('u'), KeyModifiers::CONTROL),
            &AppMode::QuickOpen,
            &InputState::new(),
            &km,
        );
        assert_eq!(action, InputAction::QuickOpenClear);
    }

    // --- Preferences ---

    #[test]
    fn preferences_arrows_adjust_only_on_budget_field() {
        let km = Keymap::default();
        let state = InputState::new();
        let budget = prefs_mode(PreferenceField::FilterTime);
        let pattern = prefs_mode(PreferenceField::HidePattern);
        assert_eq!(
            handle_key(key(KeyCode::Up), &budget, &state, &km).0,
            InputAction::PreferencesAdjust(1)
        );
        assert_eq!(handle_key(key(KeyCode::Up), &pattern, &state, &km).0, InputAction::None);
        assert_eq!(
            handle_key(key(KeyCode::Char('x')), &pattern, &state, &km).0,
            InputAction::PreferencesChar('x')
        );
        assert_eq!(
            handle_key(key(KeyCode::Tab), &pattern, &state, &km).0,
            InputAction::PreferencesNextField
        );
    }

    // --- Help ---

    #[test]
    fn help_closes_on_esc_q_question() {
        let km = Keymap::default();
        let state = InputState::new();
        for code in [KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('?')] {
            assert_eq!(
                handle_key(key(code), &AppMode::Help, &state, &km).0,
                InputAction::EnterMode(AppMode::Normal)
            );
        }
        assert_eq!(
            handle_key(key(KeyCode::Char('j')), &AppMode::Help, &state, &km).0,
            InputAction::None
        );
    }

    #[test]
    fn input_state_default_not_pending() {
        assert!(!InputState::default().pending_g);
        assert!(!InputState::new().pending_g);
    }
}
