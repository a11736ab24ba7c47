//! UI widget modules for the TUI frontend.
//!
//! Each sub-module renders a single UI component using ratatui.

pub mod popup;
pub mod preferences;
pub mod quick_open;
pub mod statusbar;
pub mod tree;
