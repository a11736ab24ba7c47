//! Application configuration loaded from a TOML file.

use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::repo::ListerBackend;

/// Smallest accepted quick-open tick budget, in milliseconds.
pub const MIN_FILTER_TIME_MS: u64 = 10;
/// Largest accepted quick-open tick budget, in milliseconds.
pub const MAX_FILTER_TIME_MS: u64 = 400;
/// Step used when the budget is adjusted interactively.
pub const FILTER_TIME_STEP_MS: u64 = 10;

/// Top-level application configuration.
///
/// Every field has a default, so gitbrowse works without a config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub quick_open: QuickOpenConfig,
    #[serde(default)]
    pub lister: ListerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::PermissionDenied`] if the file is not readable.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::from_io(e, path))?;
        toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    /// Loads `path`, using defaults when it is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(CoreError::NotFound(_)) => Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Writes the configuration, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Quick-open dialog settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickOpenConfig {
    /// Regular expression; files whose name matches are left out of
    /// quick open. Empty disables exclusion.
    #[serde(default)]
    pub hide_pattern: String,
    /// Time budget of one filter tick, in milliseconds.
    #[serde(default = "default_filter_max_time_ms")]
    pub filter_max_time_ms: u64,
}

impl Default for QuickOpenConfig {
    fn default() -> Self {
        Self {
            hide_pattern: String::new(),
            filter_max_time_ms: default_filter_max_time_ms(),
        }
    }
}

impl QuickOpenConfig {
    /// Filter tick budget, clamped to the supported range.
    pub fn budget(&self) -> Duration {
        Duration::from_millis(
            self.filter_max_time_ms
                .clamp(MIN_FILTER_TIME_MS, MAX_FILTER_TIME_MS),
        )
    }

    /// Compiles the hide pattern. An invalid pattern disables exclusion.
    pub fn compile_hide_pattern(&self) -> Option<Regex> {
        match self.compile_hide_pattern_strict() {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(pattern = %self.hide_pattern, error = %e, "ignoring hide pattern");
                None
            }
        }
    }

    /// Compiles the hide pattern, reporting an invalid one.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidPattern`] if the pattern does not compile.
    pub fn compile_hide_pattern_strict(&self) -> CoreResult<Option<Regex>> {
        if self.hide_pattern.is_empty() {
            return Ok(None);
        }
        Regex::new(&self.hide_pattern)
            .map(Some)
            .map_err(|e| CoreError::InvalidPattern(e.to_string()))
    }

    /// Moves the budget by `steps` increments, staying within range.
    pub fn adjust_budget(&mut self, steps: i64) {
        let current = self
            .filter_max_time_ms
            .clamp(MIN_FILTER_TIME_MS, MAX_FILTER_TIME_MS) as i64;
        let next = current + steps * FILTER_TIME_STEP_MS as i64;
        self.filter_max_time_ms =
            next.clamp(MIN_FILTER_TIME_MS as i64, MAX_FILTER_TIME_MS as i64) as u64;
    }
}

/// Which repository lister to use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListerConfig {
    #[serde(default)]
    pub backend: ListerBackend,
}

/// Display preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_icons: bool,
    #[serde(default = "default_true")]
    pub show_branch: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_icons: true,
            show_branch: true,
        }
    }
}

fn default_filter_max_time_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}
