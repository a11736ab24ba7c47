//! Preferences popup for the quick-open settings.

use gitbrowse_core::config::settings::{MAX_FILTER_TIME_MS, MIN_FILTER_TIME_MS};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    Frame,
};

use super::popup::render_popup;
use crate::app::{PreferenceField, PreferencesForm};

pub fn render_preferences(f: &mut Frame, form: &PreferencesForm) {
    render_popup(f, " Preferences ", preference_lines(form), 60, 40);
}

fn field_style(active: bool) -> Style {
    if active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn preference_lines(form: &PreferencesForm) -> Vec<Line<'static>> {
    let on_pattern = form.field == PreferenceField::HidePattern;
    let cursor = |active: bool| if active { "_" } else { "" };

    let mut lines = vec![
        Line::from(Span::styled(
            "Quick open: hide files matching",
            field_style(on_pattern),
        )),
        Line::from(format!(
            "  {}{}",
            form.draft.hide_pattern,
            cursor(on_pattern)
        )),
        Line::default(),
        Line::from(Span::styled(
            format!("Filter time per tick ({MIN_FILTER_TIME_MS}-{MAX_FILTER_TIME_MS} ms)"),
            field_style(!on_pattern),
        )),
        Line::from(format!(
            "  {} ms{}",
            form.draft.filter_max_time_ms,
            cursor(!on_pattern)
        )),
        Line::default(),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        "Tab switch field  Up/Down adjust  Enter save  Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}
