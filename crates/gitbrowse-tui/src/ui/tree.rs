//! Repository tree rendering.
//!
//! Every registered repository is a top-level row; unfolded directories
//! show their children indented one step per level, directories first.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::app::{RowKind, TreeRow};
use crate::icons::row_icon;

const INDENT: &str = "  ";

/// Renders the tree with the selected row highlighted.
pub fn render_tree(f: &mut Frame, area: Rect, rows: &[TreeRow], selected: usize, show_icons: bool) {
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| ListItem::new(row_line(row, show_icons)))
        .collect();

    let title = if rows.is_empty() {
        " Repositories (press a to add) ".to_owned()
    } else {
        " Repositories ".to_owned()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !rows.is_empty() {
        state.select(Some(selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn row_line(row: &TreeRow, show_icons: bool) -> Line<'static> {
    let indent = INDENT.repeat(row.depth);
    let icon = row_icon(row.kind, &row.name, row.expanded, show_icons);
    Line::from(vec![
        Span::raw(indent),
        Span::styled(format!("{icon}{}", row.name), row_style(row.kind)),
    ])
}

fn row_style(kind: RowKind) -> Style {
    match kind {
        RowKind::Repository => Style::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        RowKind::Directory => Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        RowKind::File => Style::default(),
    }
}
