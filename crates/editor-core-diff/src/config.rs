//! Differ configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce delay before a (re)initialization runs.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default bound on the lines an edit may touch (removed or inserted) and still be handled
/// incrementally.
pub const DEFAULT_MAX_INCREMENTAL_LINES: usize = 50;

/// Tunables of a [`LineDiffer`](crate::LineDiffer).
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
    /// Delay (ms) a requested initialization waits for further requests before running.
    pub debounce_ms: u64,
    /// Edits touching more lines than this trigger a full reinitialization.
    pub max_incremental_lines: usize,
    /// Largest re-diff window (on either side) handled incrementally.
    pub max_window_lines: usize,
    /// How far past an edit a repeated-line run is followed when widening the re-diff window.
    pub max_repetition_scan: usize,
}

impl Default for DifferConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_incremental_lines: DEFAULT_MAX_INCREMENTAL_LINES,
            // Two anchor runs of `size` lines around an edit of up to `max_incremental_lines`.
            max_window_lines: 3 * DEFAULT_MAX_INCREMENTAL_LINES + 2,
            max_repetition_scan: DEFAULT_MAX_INCREMENTAL_LINES,
        }
    }
}

impl DifferConfig {
    /// Parses a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// Called by [`from_json`](Self::from_json) and
    /// [`LineDiffer::try_with_config`](crate::LineDiffer::try_with_config).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_window_lines == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_window_lines",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Debounce delay as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Returns a copy with a different debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = u64::try_from(debounce.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
