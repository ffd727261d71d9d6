//! Settings parser for .artdeck/config.toml

use std::path::{Path, PathBuf};

use artdeck_core::prelude::*;
use artdeck_core::LayoutConfig;
use artdeck_daemon::CONSOLE_DIR;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";

pub fn settings_path(workspace: &Path) -> PathBuf {
    workspace.join(CONSOLE_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `<workspace>/.artdeck/config.toml`.
///
/// A missing or unparsable file yields the defaults.
pub fn load_settings(workspace: &Path) -> Settings {
    let config_path = settings_path(workspace);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Write settings atomically, creating `.artdeck/` if needed
pub fn save_settings(workspace: &Path, settings: &Settings) -> Result<()> {
    let console_dir = workspace.join(CONSOLE_DIR);

    if !console_dir.exists() {
        std::fs::create_dir_all(&console_dir)
            .map_err(|e| Error::config(format!("Failed to create {} dir: {}", CONSOLE_DIR, e)))?;
    }

    let config_path = console_dir.join(CONFIG_FILENAME);
    let temp_path = console_dir.join(".config.toml.tmp");

    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("# Artdeck console configuration\n\n{}", content);

    std::fs::write(&temp_path, &full_content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;

    std::fs::rename(&temp_path, &config_path)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;

    info!("Saved settings to {:?}", config_path);
    Ok(())
}

/// Column caps for the product grid, clamped to the allowed range
pub fn layout_config(settings: &Settings) -> LayoutConfig {
    LayoutConfig::new(
        settings.product_view.max_cols_top,
        settings.product_view.max_cols_per_row,
    )
}
