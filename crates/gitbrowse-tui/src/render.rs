use gitbrowse_core::action::{ActionCategory, ActionRegistry};
use gitbrowse_core::config::keymap::Keymap;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

use crate::app::{App, AppMode, ConfirmAction};
use crate::ui::popup::render_popup;
use crate::ui::preferences::render_preferences;
use crate::ui::quick_open::render_quick_open;
use crate::ui::statusbar::{render_statusbar, StatusBarProps};
use crate::ui::tree::render_tree;

/// Main render function; composes the full UI each frame.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let show_icons = app.config().ui.show_icons;
    render_tree(f, chunks[0], app.rows(), app.selected_index(), show_icons);

    let repository = app
        .selected_row()
        .and_then(|row| app.repositories().get(row.repo))
        .map(|repo| (repo.display_name(), repo.file_count()));
    let props = StatusBarProps {
        row_count: app.rows().len(),
        selected_index: app.selected_index(),
        repository: repository.as_ref().map(|(name, files)| (name.as_str(), *files)),
        branch_info: app.branch_info(),
        status_message: app.status_message(),
    };
    render_statusbar(f, chunks[1], &props);

    // Render modal overlays based on mode
    match app.mode() {
        AppMode::Help => render_help_popup(f, app.action_registry(), app.keymap()),
        AppMode::Confirm(action) => render_confirm_popup(f, action),
        AppMode::AddRepository(text) => render_add_popup(f, text),
        AppMode::Preferences(form) => render_preferences(f, form),
        AppMode::QuickOpen => {
            if let Some(session) = app.quick_open() {
                render_quick_open(f, session, show_icons);
            }
        }
        AppMode::Normal => {}
    }
}

fn render_help_popup(f: &mut Frame, registry: &ActionRegistry, keymap: &Keymap) {
    render_popup(f, " Help ", help_lines(registry, keymap), 70, 80);
}

/// One section per action category, listing each action with its keys.
fn help_lines(registry: &ActionRegistry, keymap: &Keymap) -> Vec<Line<'static>> {
    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();
    for category in [
        ActionCategory::Navigation,
        ActionCategory::Repository,
        ActionCategory::QuickOpen,
        ActionCategory::System,
    ] {
        lines.push(Line::from(Span::styled(category.label(), heading)));
        for desc in registry.in_category(category) {
            let keys = keymap
                .keys_for_action(desc.action)
                .map(|keys| keys.join("/"))
                .unwrap_or_else(|| "-".to_owned());
            lines.push(Line::from(format!("  {keys:<10} {}", desc.description)));
        }
        lines.push(Line::default());
    }
    lines.push(Line::from("Press Esc or ? to close"));
    lines
}

fn render_confirm_popup(f: &mut Frame, action: &ConfirmAction) {
    let question = match action {
        ConfirmAction::Remove { name, .. } => format!("Remove repository \"{name}\"?"),
        ConfirmAction::RemoveAll => "Remove all repositories?".to_owned(),
    };
    let lines = vec![
        Line::from(question),
        Line::default(),
        Line::from("(y)es / (n)o"),
    ];
    render_popup(f, " Confirm ", lines, 50, 20);
}

fn render_add_popup(f: &mut Frame, text: &str) {
    let lines = vec![
        Line::from("Path of the repository root:"),
        Line::from(format!("{text}_")),
        Line::default(),
        Line::from(Span::styled(
            "Enter add  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    render_popup(f, " Add Repository ", lines, 60, 25);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitbrowse_core::action::Action;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn help_lists_every_action() {
        let registry = ActionRegistry::new();
        let lines = help_lines(&registry, &Keymap::default());
        let all: Vec<String> = lines.iter().map(text).collect();
        for desc in registry.all() {
            assert!(
                all.iter().any(|l| l.contains(desc.description)),
                "{} missing",
                desc.id
            );
        }
    }

    #[test]
    fn help_shows_bound_keys() {
        let registry = ActionRegistry::new();
        let lines = help_lines(&registry, &Keymap::default());
        let desc = registry.descriptor_for(Action::QuickOpenFromDocument).unwrap();
        let line = lines
            .iter()
            .map(text)
            .find(|l| l.contains(desc.description))
            .unwrap();
        assert!(line.contains("Ctrl+o/O"));
    }

    #[test]
    fn help_starts_with_navigation_section() {
        let lines = help_lines(&ActionRegistry::new(), &Keymap::default());
        assert_eq!(text(&lines[0]), "Navigation");
    }
}
