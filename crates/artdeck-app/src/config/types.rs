//! Configuration types for the Artdeck console
//!
//! Defines:
//! - `Settings` - Console settings (`.artdeck/config.toml`)
//! - Its sections: behavior, product view and ui

use serde::{Deserialize, Serialize};

use artdeck_core::view_dim::layout::DEFAULT_MAX_COLS;

/// Console settings (.artdeck/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub behavior: BehaviorSettings,

    #[serde(default)]
    pub product_view: ProductViewSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

/// Behavior settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Job monitor poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Idle shutdown of the web process in seconds
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Ask before quitting with running jobs
    #[serde(default = "default_true")]
    pub confirm_quit: bool,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            idle_timeout_secs: default_idle_timeout_secs(),
            confirm_quit: true,
        }
    }
}

/// Product grid settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProductViewSettings {
    /// Column cap of the outermost row
    #[serde(default = "default_max_cols")]
    pub max_cols_top: usize,

    /// Column cap of every nested row
    #[serde(default = "default_max_cols")]
    pub max_cols_per_row: usize,

    /// Watch the production definition for changes
    #[serde(default = "default_true")]
    pub watch_production: bool,

    /// Debounce of the production watcher in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ProductViewSettings {
    fn default() -> Self {
        Self {
            max_cols_top: default_max_cols(),
            max_cols_per_row: default_max_cols(),
            watch_production: true,
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UiSettings {
    /// Lines of job output kept per stream
    #[serde(default = "default_output_lines")]
    pub output_lines: usize,

    /// Height of the job output pane in rows
    #[serde(default = "default_output_height")]
    pub output_height: u16,

    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            output_lines: default_output_lines(),
            output_height: default_output_height(),
            show_timestamps: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_idle_timeout_secs() -> u64 {
    10
}

fn default_max_cols() -> usize {
    DEFAULT_MAX_COLS
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_output_lines() -> usize {
    10_000
}

fn default_output_height() -> u16 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.behavior.poll_interval_ms, 1000);
        assert_eq!(settings.behavior.idle_timeout_secs, 10);
        assert_eq!(settings.product_view.max_cols_top, 10);
        assert_eq!(settings.product_view.max_cols_per_row, 10);
        assert!(settings.ui.show_timestamps);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[product_view]
max_cols_top = 4
"#,
        )
        .unwrap();
        assert_eq!(settings.product_view.max_cols_top, 4);
        assert_eq!(settings.product_view.max_cols_per_row, 10);
        assert_eq!(settings.behavior, BehaviorSettings::default());
    }
}
