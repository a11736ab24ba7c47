//! Quick-open navigation.
//!
//! [`filter::IncrementalFilter`] is the budgeted substring filter;
//! [`quick_open::QuickOpen`] wraps it with a repository's flat index and a
//! selection for the dialog.

pub mod filter;
pub mod quick_open;

pub use filter::{
    matches_query, Clock, FilterPhase, FilterState, IncrementalFilter, SystemClock, TickOutcome,
};
pub use quick_open::QuickOpen;
