//! Time-budgeted, resumable substring filter over a [`FlatIndex`].
//!
//! Filtering tens of thousands of entries on every keystroke would stall the
//! UI, so the work is split into ticks. Each [`IncrementalFilter::tick`]
//! updates visibility flags from the saved cursor onward until its budget
//! runs out, and the caller schedules the next tick while the filter reports
//! [`FilterPhase::Scanning`].
//!
//! [`FlatIndex`]: crate::index::FlatIndex

use std::time::{Duration, Instant};

use crate::index::FlatEntry;

/// Source of the current time, injectable for tests.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Lifecycle of a filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPhase {
    /// No query has been applied yet.
    Idle,
    /// A pass is in progress; more ticks are needed.
    Scanning,
    /// The last pass reached the end of the index.
    Done,
}

/// What a single tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The filter was not scanning; nothing was touched.
    Inactive,
    /// Budget ran out before the end of the index.
    Pending { processed: usize },
    /// The pass completed. `first_visible` is where the view's selection
    /// should move to, if anything is visible.
    Done {
        processed: usize,
        first_visible: Option<usize>,
    },
}

/// Query, resume position, budget and phase of the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    query: String,
    cursor: usize,
    budget: Duration,
    phase: FilterPhase,
}

/// Cooperative filter state machine. The entries themselves are owned by
/// the caller and passed to every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalFilter {
    state: FilterState,
}

/// Case-sensitive containment; an empty query matches everything.
pub fn matches_query(name: &str, query: &str) -> bool {
    query.is_empty() || name.contains(query)
}

impl IncrementalFilter {
    /// Creates an idle filter with an empty query.
    pub fn new(budget: Duration) -> Self {
        Self {
            state: FilterState {
                query: String::new(),
                cursor: 0,
                budget,
                phase: FilterPhase::Idle,
            },
        }
    }

    pub fn query(&self) -> &str {
        &self.state.query
    }

    /// Index of the next entry a tick will examine.
    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    pub fn phase(&self) -> FilterPhase {
        self.state.phase
    }

    pub fn budget(&self) -> Duration {
        self.state.budget
    }

    pub fn set_budget(&mut self, budget: Duration) {
        self.state.budget = budget;
    }

    pub fn is_scanning(&self) -> bool {
        self.state.phase == FilterPhase::Scanning
    }

    /// Stores `query` and restarts the pass from the first entry.
    ///
    /// Entries not yet revisited keep the visibility computed for the
    /// previous query until the new pass reaches them.
    pub fn on_query_change(&mut self, query: impl Into<String>) {
        self.state.query = query.into();
        self.state.cursor = 0;
        self.state.phase = FilterPhase::Scanning;
    }

    /// Runs one budgeted slice of the current pass over `entries`.
    ///
    /// At least one entry is processed per call, however small the budget,
    /// so a pass over `n` entries needs at most `n` ticks.
    pub fn tick(&mut self, entries: &mut [FlatEntry], clock: &dyn Clock) -> TickOutcome {
        if self.state.phase != FilterPhase::Scanning {
            return TickOutcome::Inactive;
        }

        let start = clock.now();
        let mut processed = 0;
        while self.state.cursor < entries.len() {
            let entry = &mut entries[self.state.cursor];
            let visible = matches_query(entry.name(), &self.state.query);
            if visible != entry.visible() {
                entry.set_visible(visible);
            }
            self.state.cursor += 1;
            processed += 1;

            if clock.now().saturating_duration_since(start) >= self.state.budget {
                break;
            }
        }

        if self.state.cursor >= entries.len() {
            self.state.phase = FilterPhase::Done;
            let first_visible = entries.iter().position(FlatEntry::visible);
            tracing::debug!(query = %self.state.query, processed, "filter pass complete");
            TickOutcome::Done {
                processed,
                first_visible,
            }
        } else {
            TickOutcome::Pending { processed }
        }
    }

    /// Ticks until the pass completes. Mostly useful for tests and for
    /// callers without a scheduler.
    pub fn run_to_completion(
        &mut self,
        entries: &mut [FlatEntry],
        clock: &dyn Clock,
    ) -> TickOutcome {
        loop {
            match self.tick(entries, clock) {
                TickOutcome::Pending { .. } => continue,
                outcome => return outcome,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;

    /// Clock that moves forward by `step` every time it is read.
    struct FakeClock {
        now: Cell<Instant>,
        step: Duration,
    }

    impl FakeClock {
        fn stepping(step: Duration) -> Self {
            Self {
                now: Cell::new(Instant::now()),
                step,
            }
        }

        fn frozen() -> Self {
            Self::stepping(Duration::ZERO)
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            let now = self.now.get();
            self.now.set(now + self.step);
            now
        }
    }

    fn sample_index() -> Vec<FlatEntry> {
        vec![
            FlatEntry::new("b.txt", "root/a"),
            FlatEntry::new("c.txt", "root/a"),
            FlatEntry::new("d.txt", "root"),
        ]
    }

    fn visible_names(entries: &[FlatEntry]) -> Vec<&str> {
        entries.iter().filter(|e| e.visible()).map(|e| e.name()).collect()
    }

    #[test]
    fn new_filter_is_idle() {
        let filter = IncrementalFilter::new(Duration::from_millis(50));
        assert_eq!(filter.phase(), FilterPhase::Idle);
        assert_eq!(filter.cursor(), 0);
        assert_eq!(filter.query(), "");
    }

    #[test]
    fn tick_when_idle_is_inactive() {
        let mut entries = sample_index();
        let mut filter = IncrementalFilter::new(Duration::from_millis(50));
        assert_eq!(filter.tick(&mut entries, &SystemClock), TickOutcome::Inactive);
        assert_eq!(filter.cursor(), 0);
    }

    #[test]
    fn query_c_leaves_only_c_txt_visible() {
        let mut entries = sample_index();
        let mut filter = IncrementalFilter::new(Duration::from_secs(1));
        filter.on_query_change("c");
        let outcome = filter.run_to_completion(&mut entries, &FakeClock::frozen());

        assert_eq!(visible_names(&entries), vec!["c.txt"]);
        assert_eq!(
            outcome,
            TickOutcome::Done {
                processed: 3,
                first_visible: Some(1),
            }
        );
        assert_eq!(filter.phase(), FilterPhase::Done);
    }

    #[test]
    fn zero_budget_processes_one_entry_per_tick() {
        let mut entries = sample_index();
        let mut filter = IncrementalFilter::new(Duration::ZERO);
        filter.on_query_change("x");

        assert_eq!(
            filter.tick(&mut entries, &FakeClock::frozen()),
            TickOutcome::Pending { processed: 1 }
        );
        assert_eq!(filter.cursor(), 1);
        assert_eq!(
            filter.tick(&mut entries, &FakeClock::frozen()),
            TickOutcome::Pending { processed: 1 }
        );
        assert_eq!(
            filter.tick(&mut entries, &FakeClock::frozen()),
            TickOutcome::Done {
                processed: 1,
                first_visible: None,
            }
        );
    }

    #[test]
    fn budget_limits_work_per_tick() {
        let entries_len = 10;
        let mut entries: Vec<FlatEntry> = (0..entries_len)
            .map(|i| FlatEntry::new(format!("f{i}.rs"), "/r"))
            .collect();
        let mut filter = IncrementalFilter::new(Duration::from_millis(3));
        filter.on_query_change("f");
        // Every clock read costs 1 ms: the start read plus one per entry.
        let clock = FakeClock::stepping(Duration::from_millis(1));

        assert_eq!(filter.tick(&mut entries, &clock), TickOutcome::Pending { processed: 3 });
        assert_eq!(filter.cursor(), 3);
    }

    #[test]
    fn query_change_restarts_from_zero() {
        let mut entries = sample_index();
        let mut filter = IncrementalFilter::new(Duration::ZERO);
        filter.on_query_change("b");
        filter.tick(&mut entries, &FakeClock::frozen());
        filter.tick(&mut entries, &FakeClock::frozen());
        assert_eq!(filter.cursor(), 2);

        filter.on_query_change("d");
        assert_eq!(filter.cursor(), 0);
        assert_eq!(filter.phase(), FilterPhase::Scanning);
    }

    #[test]
    fn stale_visibility_persists_until_revisited() {
        let mut entries = sample_index();
        let mut filter = IncrementalFilter::new(Duration::from_secs(1));
        filter.on_query_change("b");
        filter.run_to_completion(&mut entries, &FakeClock::frozen());
        assert_eq!(visible_names(&entries), vec!["b.txt"]);

        filter.set_budget(Duration::ZERO);
        filter.on_query_change("");
        filter.tick(&mut entries, &FakeClock::frozen());
        // Only the first entry has been revisited so far.
        assert_eq!(visible_names(&entries), vec!["b.txt"]);
        filter.run_to_completion(&mut entries, &FakeClock::frozen());
        assert_eq!(visible_names(&entries), vec!["b.txt", "c.txt", "d.txt"]);
    }

    #[test]
    fn empty_query_shows_everything() {
        let mut entries = sample_index();
        for e in entries.iter_mut() {
            e.set_visible(false);
        }
        let mut filter = IncrementalFilter::new(Duration::from_secs(1));
        filter.on_query_change("");
        filter.run_to_completion(&mut entries, &SystemClock);
        assert!(entries.iter().all(FlatEntry::visible));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(matches_query("Makefile", "Make"));
        assert!(!matches_query("Makefile", "make"));
        assert!(matches_query("anything", ""));
    }

    #[test]
    fn empty_index_completes_immediately() {
        let mut entries: Vec<FlatEntry> = Vec::new();
        let mut filter = IncrementalFilter::new(Duration::ZERO);
        filter.on_query_change("q");
        assert_eq!(
            filter.tick(&mut entries, &FakeClock::frozen()),
            TickOutcome::Done {
                processed: 0,
                first_visible: None,
            }
        );
    }

    #[test]
    fn tick_after_done_is_inactive() {
        let mut entries = sample_index();
        let mut filter = IncrementalFilter::new(Duration::from_secs(1));
        filter.on_query_change("t");
        filter.run_to_completion(&mut entries, &FakeClock::frozen());
        assert_eq!(filter.tick(&mut entries, &FakeClock::frozen()), TickOutcome::Inactive);
    }

    fn name() -> impl Strategy<Value = String> {
        "[abc]{1,5}\\.rs"
    }

    proptest! {
        #[test]
        fn completed_pass_is_consistent(
            names in prop::collection::vec(name(), 0..50),
            first in "[abc]{0,2}",
            second in "[abc]{0,2}",
            budget_ms in 0u64..3,
        ) {
            let mut entries: Vec<FlatEntry> =
                names.iter().map(|n| FlatEntry::new(n.as_str(), "/r")).collect();
            let mut filter = IncrementalFilter::new(Duration::from_millis(budget_ms));
            let clock = FakeClock::stepping(Duration::from_millis(1));

            filter.on_query_change(first);
            filter.tick(&mut entries, &clock);
            filter.on_query_change(second.clone());
            filter.run_to_completion(&mut entries, &clock);

            for e in &entries {
                prop_assert_eq!(e.visible(), matches_query(e.name(), &second));
            }
        }

        #[test]
        fn zero_budget_scan_takes_at_most_len_ticks(
            names in prop::collection::vec(name(), 1..50),
        ) {
            let mut entries: Vec<FlatEntry> =
                names.iter().map(|n| FlatEntry::new(n.as_str(), "/r")).collect();
            let mut filter = IncrementalFilter::new(Duration::ZERO);
            filter.on_query_change("a");
            let mut ticks = 0;
            while filter.is_scanning() {
                filter.tick(&mut entries, &FakeClock::frozen());
                ticks += 1;
            }
            prop_assert_eq!(ticks, entries.len());
        }
    }
}
