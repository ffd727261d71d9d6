//! Web process configuration
//!
//! Two JSON documents configure the web process:
//! - the user config `<user dir>/gui/gui-web-config.json` holding the
//!   cookie secret, created on first use;
//! - the workspace config `<workspace>/.catharsys/<env>/gui/gui-web-config.json`
//!   holding the port and certificate path. Port `0` is replaced by a free
//!   port and saved.

use std::net::TcpListener;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use artdeck_core::prelude::*;

use super::typed::{load_typed_opt, save_typed};

pub const WEB_CONFIG_DTI: &str = "/catharsys/gui/web:1.0";
const WEB_CONFIG_PATTERN: &str = "/catharsys/gui/web:1";
pub const WEB_CONFIG_FILE: &str = "gui-web-config.json";

/// Workspace settings directory below the workspace root
pub const WORKSPACE_SETTINGS_DIR: &str = ".catharsys";

/// Environment variables naming the active environment, first match wins
const ENV_NAME_VARS: &[&str] = &["ARTDECK_ENV", "CONDA_DEFAULT_ENV"];
const DEFAULT_ENV_NAME: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserWebConfig {
    #[serde(rename = "sSecretKey")]
    pub secret_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceWebConfig {
    #[serde(rename = "iPort", default)]
    pub port: u16,
    /// Relative to the workspace root
    #[serde(rename = "sPathCertFile", default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<String>,
}

/// Merged configuration the web process runs with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub secret_key: String,
    pub port: u16,
    pub cert_file: Option<PathBuf>,
}

/// Name of the active environment
pub fn env_name() -> String {
    ENV_NAME_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_ENV_NAME.to_string())
}

/// Per-user Artdeck directory
pub fn user_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join("artdeck"))
        .ok_or_else(|| Error::config("Could not determine user config directory"))
}

/// `<workspace>/.catharsys/<env>/gui`; also holds the user database
pub fn workspace_gui_dir(workspace: &Path) -> PathBuf {
    workspace
        .join(WORKSPACE_SETTINGS_DIR)
        .join(env_name())
        .join("gui")
}

/// Load the user config from `<user_dir>/gui`, creating it with a fresh
/// secret if missing
pub fn load_user_config(user_dir: &Path) -> Result<UserWebConfig> {
    let path = user_dir.join("gui").join(WEB_CONFIG_FILE);
    if let Some(config) = load_typed_opt(&path, WEB_CONFIG_PATTERN)? {
        return Ok(config);
    }
    let config = UserWebConfig {
        secret_key: uuid::Uuid::new_v4().simple().to_string(),
    };
    save_typed(&path, WEB_CONFIG_DTI, &config)?;
    info!("Created web user config at {:?}", path);
    Ok(config)
}

/// Load the workspace config from `gui_dir`, assigning and saving a free
/// port when none is configured
pub fn load_workspace_config(gui_dir: &Path) -> Result<WorkspaceWebConfig> {
    let path = gui_dir.join(WEB_CONFIG_FILE);
    let (mut config, mut save) = match load_typed_opt(&path, WEB_CONFIG_PATTERN)? {
        Some(config) => (config, false),
        None => (WorkspaceWebConfig::default(), true),
    };

    if config.port == 0 {
        config.port = find_free_port()?;
        info!("Automatically assigned port '{}'", config.port);
        save = true;
    }

    if save {
        save_typed(&path, WEB_CONFIG_DTI, &config)?;
    }
    Ok(config)
}

/// Both configs merged; the certificate path is resolved against the
/// workspace root
pub fn load_web_config(workspace: &Path, user_dir: &Path) -> Result<WebConfig> {
    let user = load_user_config(user_dir)?;
    let ws = load_workspace_config(&workspace_gui_dir(workspace))?;
    Ok(WebConfig {
        secret_key: user.secret_key,
        port: ws.port,
        cert_file: ws.cert_file.map(|p| workspace.join(p)),
    })
}

/// Ask the OS for an unused local TCP port
pub fn find_free_port() -> Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).map_err(|e| {
        warn!("Failed to bind an ephemeral port: {}", e);
        Error::NoFreePort
    })?;
    let port = listener.local_addr().map_err(|_| Error::NoFreePort)?.port();
    Ok(port)
}
