//! Quick-open session: one repository's flat index, a live query and a
//! (multi-)selection over the entries the query leaves visible.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;

use crate::index::{FlatEntry, FlatIndex};
use crate::repo::RepositoryIndex;

use super::filter::{Clock, FilterPhase, IncrementalFilter, SystemClock, TickOutcome};

/// State of one quick-open dialog.
///
/// The flat index is built when the session opens and dropped with it.
#[derive(Debug, Clone)]
pub struct QuickOpen {
    repository: String,
    entries: FlatIndex,
    filter: IncrementalFilter,
    selected: Option<usize>,
    marked: BTreeSet<usize>,
}

impl QuickOpen {
    /// Flattens `repo` (minus files matching `exclude`) into a new session.
    pub fn open(repo: &RepositoryIndex, exclude: Option<&Regex>, budget: Duration) -> Self {
        Self::from_entries(repo.display_name(), repo.flat_index(exclude), budget)
    }

    /// Starts a session over an already built index.
    pub fn from_entries(
        repository: impl Into<String>,
        entries: FlatIndex,
        budget: Duration,
    ) -> Self {
        let selected = entries.iter().position(FlatEntry::visible);
        Self {
            repository: repository.into(),
            entries,
            filter: IncrementalFilter::new(budget),
            selected,
            marked: BTreeSet::new(),
        }
    }

    /// Display name of the repository being searched.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        self.filter.query()
    }

    pub fn phase(&self) -> FilterPhase {
        self.filter.phase()
    }

    pub fn is_scanning(&self) -> bool {
        self.filter.is_scanning()
    }

    /// Replaces the query and restarts filtering. Unchanged queries are
    /// ignored.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query != self.filter.query() || self.filter.phase() == FilterPhase::Idle {
            self.filter.on_query_change(query);
        }
    }

    pub fn push_char(&mut self, c: char) {
        let mut query = self.filter.query().to_owned();
        query.push(c);
        self.set_query(query);
    }

    pub fn pop_char(&mut self) {
        let mut query = self.filter.query().to_owned();
        if query.pop().is_some() {
            self.set_query(query);
        }
    }

    pub fn clear_query(&mut self) {
        if !self.filter.query().is_empty() {
            self.set_query(String::new());
        }
    }

    /// Runs one budgeted filter slice against the system clock.
    pub fn tick(&mut self) -> TickOutcome {
        self.tick_with(&SystemClock)
    }

    /// Runs one budgeted filter slice against `clock`.
    ///
    /// When the pass completes, the selection jumps to the first visible
    /// entry and marks on hidden entries are dropped.
    pub fn tick_with(&mut self, clock: &dyn Clock) -> TickOutcome {
        let outcome = self.filter.tick(&mut self.entries, clock);
        if let TickOutcome::Done { first_visible, .. } = outcome {
            self.selected = first_visible;
            let entries = &self.entries;
            self.marked.retain(|&i| entries[i].visible());
        }
        outcome
    }

    /// Indices (into [`QuickOpen::entries`]) of the visible entries.
    pub fn visible_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.visible())
            .map(|(i, _)| i)
            .collect()
    }

    /// `(visible, total)` entry counts.
    pub fn counts(&self) -> (usize, usize) {
        let visible = self.entries.iter().filter(|e| e.visible()).count();
        (visible, self.entries.len())
    }

    /// Index of the entry under the cursor.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&FlatEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    pub fn is_marked(&self, index: usize) -> bool {
        self.marked.contains(&index)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    /// Moves the cursor to the next visible entry.
    pub fn move_down(&mut self) {
        let start = self.selected.map_or(0, |i| i + 1);
        if let Some(next) = self.entries[start.min(self.entries.len())..]
            .iter()
            .position(FlatEntry::visible)
        {
            self.selected = Some(start + next);
        } else if self.selected.is_none() {
            self.selected = self.first_visible();
        }
    }

    /// Moves the cursor to the previous visible entry.
    pub fn move_up(&mut self) {
        let Some(current) = self.selected else {
            self.selected = self.first_visible();
            return;
        };
        let end = current.min(self.entries.len());
        if let Some(prev) = self.entries[..end].iter().rposition(FlatEntry::visible) {
            self.selected = Some(prev);
        }
    }

    pub fn page_down(&mut self, rows: usize) {
        for _ in 0..rows.max(1) {
            let before = self.selected;
            self.move_down();
            if self.selected == before {
                break;
            }
        }
    }

    pub fn page_up(&mut self, rows: usize) {
        for _ in 0..rows.max(1) {
            let before = self.selected;
            self.move_up();
            if self.selected == before {
                break;
            }
        }
    }

    /// Adds or removes the cursor entry from the multi-selection.
    pub fn toggle_mark(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        if !self.marked.remove(&index) {
            self.marked.insert(index);
        }
    }

    /// Absolute paths to open: every visible marked entry, or the cursor
    /// entry when nothing is marked. Empty when nothing is selectable.
    pub fn confirm(&self) -> Vec<PathBuf> {
        let marked: Vec<PathBuf> = self
            .marked
            .iter()
            .filter_map(|&i| self.entries.get(i))
            .filter(|e| e.visible())
            .map(FlatEntry::full_path)
            .collect();
        if !marked.is_empty() {
            return marked;
        }
        self.selected_entry()
            .filter(|e| e.visible())
            .map(FlatEntry::full_path)
            .into_iter()
            .collect()
    }

    fn first_visible(&self) -> Option<usize> {
        self.entries.iter().position(FlatEntry::visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn session(budget: Duration) -> QuickOpen {
        let repo = RepositoryIndex::from_listing("/r", "a/b.txt\na/c.txt\nd.txt\n");
        QuickOpen::open(&repo, None, budget)
    }

    fn visible_names(qo: &QuickOpen) -> Vec<&str> {
        qo.visible_indices()
            .into_iter()
            .map(|i| qo.entries()[i].name())
            .collect()
    }

    fn finish(qo: &mut QuickOpen) -> TickOutcome {
        loop {
            match qo.tick() {
                TickOutcome::Pending { .. } => continue,
                outcome => return outcome,
            }
        }
    }

    #[test]
    fn open_lists_sorted_entries_all_visible() {
        let qo = session(Duration::from_millis(50));
        assert_eq!(qo.repository(), "r");
        assert_eq!(visible_names(&qo), vec!["d.txt", "b.txt", "c.txt"]);
        assert_eq!(qo.counts(), (3, 3));
        assert_eq!(qo.selected(), Some(0));
        assert_eq!(qo.phase(), FilterPhase::Idle);
    }

    #[test]
    fn open_applies_exclusion() {
        let repo = RepositoryIndex::from_listing("/r", "keep.rs\ndrop.tmp\n");
        let re = Regex::new(r"\.tmp$").unwrap();
        let qo = QuickOpen::open(&repo, Some(&re), Duration::from_millis(50));
        assert_eq!(qo.counts(), (1, 1));
    }

    #[test]
    fn typing_filters_and_selects_first_match() {
        let mut qo = session(Duration::from_millis(50));
        qo.push_char('c');
        assert!(qo.is_scanning());
        let outcome = finish(&mut qo);

        assert!(matches!(outcome, TickOutcome::Done { first_visible: Some(2), .. }));
        assert_eq!(visible_names(&qo), vec!["c.txt"]);
        assert_eq!(qo.selected(), Some(2));
        assert_eq!(qo.confirm(), vec![Path::new("/r/a/c.txt").to_path_buf()]);
    }

    #[test]
    fn no_match_clears_selection() {
        let mut qo = session(Duration::from_millis(50));
        qo.set_query("zzz");
        finish(&mut qo);
        assert_eq!(qo.selected(), None);
        assert!(qo.confirm().is_empty());
        assert_eq!(qo.counts(), (0, 3));
    }

    #[test]
    fn pop_and_clear_query_restore_entries() {
        let mut qo = session(Duration::from_millis(50));
        qo.push_char('b');
        qo.push_char('x');
        finish(&mut qo);
        assert_eq!(qo.counts().0, 0);

        qo.pop_char();
        assert_eq!(qo.query(), "b");
        finish(&mut qo);
        assert_eq!(visible_names(&qo), vec!["b.txt"]);

        qo.clear_query();
        finish(&mut qo);
        assert_eq!(qo.counts(), (3, 3));
    }

    #[test]
    fn unchanged_query_does_not_restart() {
        let mut qo = session(Duration::from_millis(50));
        qo.set_query("t");
        finish(&mut qo);
        qo.set_query("t");
        assert!(!qo.is_scanning());
    }

    #[test]
    fn cursor_moves_over_visible_entries_only() {
        let mut qo = session(Duration::from_millis(50));
        qo.set_query(".txt");
        finish(&mut qo);
        qo.set_query("d");
        finish(&mut qo);
        qo.set_query("t");
        finish(&mut qo);

        assert_eq!(qo.selected(), Some(0));
        qo.move_down();
        assert_eq!(qo.selected(), Some(1));
        qo.page_down(10);
        assert_eq!(qo.selected(), Some(2));
        qo.move_down();
        assert_eq!(qo.selected(), Some(2));
        qo.page_up(10);
        assert_eq!(qo.selected(), Some(0));
        qo.move_up();
        assert_eq!(qo.selected(), Some(0));
    }

    #[test]
    fn marked_entries_win_over_cursor() {
        let mut qo = session(Duration::from_millis(50));
        qo.toggle_mark();
        qo.move_down();
        qo.move_down();
        qo.toggle_mark();
        assert_eq!(qo.marked_count(), 2);
        assert_eq!(
            qo.confirm(),
            vec![PathBuf::from("/r/d.txt"), PathBuf::from("/r/a/c.txt")]
        );

        qo.toggle_mark();
        assert_eq!(qo.confirm(), vec![PathBuf::from("/r/d.txt")]);
    }

    #[test]
    fn completed_pass_drops_hidden_marks() {
        let mut qo = session(Duration::from_millis(50));
        qo.toggle_mark();
        assert!(qo.is_marked(0));
        qo.set_query("b");
        finish(&mut qo);
        assert!(!qo.is_marked(0));
    }

    #[test]
    fn empty_repository_session() {
        let repo = RepositoryIndex::from_listing("/r", "");
        let mut qo = QuickOpen::open(&repo, None, Duration::ZERO);
        assert_eq!(qo.selected(), None);
        qo.move_down();
        qo.move_up();
        qo.toggle_mark();
        qo.push_char('x');
        assert!(matches!(qo.tick(), TickOutcome::Done { first_visible: None, .. }));
        assert!(qo.confirm().is_empty());
    }
}
