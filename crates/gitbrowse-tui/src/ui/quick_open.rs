//! Quick-open dialog: query line, match counter and the visible files.

use gitbrowse_core::nav::QuickOpen;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::popup::{centered_rect, POPUP_BORDER};
use crate::icons::file_icon;

/// Computes the visible window `(start, end)` for a list of `total` items
/// so that `selected` is always in view within `max_visible` lines.
pub fn visible_window(selected: usize, total: usize, max_visible: usize) -> (usize, usize) {
    if total <= max_visible {
        return (0, total);
    }
    let half = max_visible / 2;
    let start = if selected <= half {
        0
    } else if selected + half >= total {
        total.saturating_sub(max_visible)
    } else {
        selected - half
    };
    let end = (start + max_visible).min(total);
    (start, end)
}

/// Renders the dialog over the whole frame.
pub fn render_quick_open(f: &mut Frame, session: &QuickOpen, show_icons: bool) {
    let area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Quick Open: {} ", session.repository()))
        .border_style(Style::default().fg(POPUP_BORDER));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(inner);

    let query = Paragraph::new(Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Yellow)),
        Span::raw(format!("{}_", session.query())),
    ]));
    f.render_widget(query, chunks[0]);
    f.render_widget(Paragraph::new(header_line(session)), chunks[1]);
    render_results(f, chunks[2], session, show_icons);
    f.render_widget(
        Paragraph::new(Line::styled(
            "Enter open  Tab mark  Ctrl+u clear  Esc close",
            Style::default().fg(Color::DarkGray),
        )),
        chunks[3],
    );
}

fn header_line(session: &QuickOpen) -> Line<'static> {
    let (visible, total) = session.counts();
    let mut spans = vec![Span::styled(
        format!("{visible}/{total} files"),
        Style::default().fg(Color::Gray),
    )];
    if session.marked_count() > 0 {
        spans.push(Span::raw(format!("  {} marked", session.marked_count())));
    }
    if session.is_scanning() {
        spans.push(Span::styled(
            "  filtering...",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    Line::from(spans)
}

fn render_results(f: &mut Frame, area: Rect, session: &QuickOpen, show_icons: bool) {
    let visible = session.visible_indices();
    let cursor = session
        .selected()
        .and_then(|sel| visible.iter().position(|&i| i == sel));
    let max_rows = usize::from(area.height).max(1);
    let (start, end) = visible_window(cursor.unwrap_or(0), visible.len(), max_rows);

    let entries = session.entries();
    let items: Vec<ListItem> = visible[start..end]
        .iter()
        .map(|&i| {
            let entry = &entries[i];
            let mark = if session.is_marked(i) { "+ " } else { "  " };
            let icon = if show_icons { file_icon(entry.name()) } else { "" };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(Color::Green)),
                Span::raw(format!("{icon}{}", entry.name())),
                Span::styled(
                    format!("  {}", entry.location()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(cursor.map(|c| c - start));
    f.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitbrowse_core::index::FlatEntry;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn session() -> QuickOpen {
        let entries = vec![
            FlatEntry::new("alpha.rs", "/r/src"),
            FlatEntry::new("beta.rs", "/r/src"),
        ];
        QuickOpen::from_entries("r", entries, Duration::from_millis(50))
    }

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn window_fits_all_when_small() {
        assert_eq!(visible_window(3, 5, 10), (0, 5));
    }

    #[test]
    fn window_centers_selection() {
        assert_eq!(visible_window(50, 100, 10), (45, 55));
    }

    #[test]
    fn window_clamps_at_ends() {
        assert_eq!(visible_window(1, 100, 10), (0, 10));
        assert_eq!(visible_window(99, 100, 10), (90, 100));
    }

    #[test]
    fn header_counts_files() {
        assert_eq!(text(&header_line(&session())), "2/2 files");
    }

    #[test]
    fn header_shows_progress_while_filtering() {
        let mut s = session();
        s.set_query("beta");
        assert!(text(&header_line(&s)).contains("filtering"));
    }

    #[test]
    fn header_shows_marked_count() {
        let mut s = session();
        s.toggle_mark();
        assert!(text(&header_line(&s)).contains("1 marked"));
    }

    #[test]
    fn render_lists_entries() {
        let backend = TestBackend::new(60, 20);
        let mut terminal = Terminal::new(backend).unwrap();
        let s = session();
        terminal.draw(|f| render_quick_open(f, &s, false)).unwrap();
        let buffer = terminal.backend().buffer();
        let screen: String = (0..20u16)
            .flat_map(|y| (0..60u16).map(move |x| (x, y)))
            .map(|pos| buffer[pos].symbol())
            .collect();
        assert!(screen.contains("alpha.rs"));
        assert!(screen.contains("Quick Open: r"));
    }
}
