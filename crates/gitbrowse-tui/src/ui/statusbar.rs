//! Status bar rendering with git branch information.
//!
//! The status bar occupies a single row at the bottom of the terminal and
//! shows the cursor position, the selected repository with its file count
//! and branch, and the latest status message.

use gitbrowse_core::repo::BranchInfo;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const BAR_BG: Color = Color::Black;

/// Data needed to render the status bar.
pub struct StatusBarProps<'a> {
    pub row_count: usize,
    pub selected_index: usize,
    /// Name and file count of the repository under the cursor.
    pub repository: Option<(&'a str, usize)>,
    pub branch_info: Option<&'a BranchInfo>,
    pub status_message: Option<&'a str>,
}

pub fn render_statusbar(f: &mut Frame, area: Rect, props: &StatusBarProps<'_>) {
    let bar = Paragraph::new(status_line(props)).style(Style::default().bg(BAR_BG));
    f.render_widget(bar, area);
}

fn status_line(props: &StatusBarProps<'_>) -> Line<'static> {
    let position = if props.row_count > 0 {
        format!(" {}/{}", props.selected_index + 1, props.row_count)
    } else {
        " 0/0".to_owned()
    };

    let repository = props
        .repository
        .map(|(name, files)| format!("  {name} ({files} files)"))
        .unwrap_or_default();

    let status = props
        .status_message
        .map(|msg| {
            Span::styled(
                format!("  {msg}"),
                Style::default()
                    .fg(Color::Yellow)
                    .bg(BAR_BG)
                    .add_modifier(Modifier::ITALIC),
            )
        })
        .unwrap_or_default();

    Line::from(vec![
        Span::styled(
            position,
            Style::default()
                .fg(Color::White)
                .bg(BAR_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(repository, Style::default().fg(Color::White).bg(BAR_BG)),
        branch_info_span(props.branch_info),
        status,
    ])
}

/// Returns a styled span for the git branch indicator.
fn branch_info_span(info: Option<&BranchInfo>) -> Span<'static> {
    let Some(info) = info else {
        return Span::raw("");
    };
    let color = if info.is_dirty {
        Color::Yellow
    } else {
        Color::Green
    };
    Span::styled(
        format!("  [{}]", info.label()),
        Style::default().fg(color).bg(BAR_BG),
    )
}
