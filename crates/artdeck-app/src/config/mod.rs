//! Configuration files of the Artdeck console
//!
//! Supports:
//! - `.artdeck/config.toml` - Console settings (TOML)
//! - `gui-web-config.json` - Web process settings, per user and per workspace
//! - `.gui/product_view_settings.json`, `.gui/product_categories.json` -
//!   Product view state per variant group
//!
//! JSON documents are typed by a document type identifier, see [`typed`].

pub mod product_view;
pub mod settings;
pub mod typed;
pub mod types;
pub mod web;

pub use product_view::{
    load_categories, load_product_view, save_categories, save_product_view, ProductViewFile,
};
pub use settings::{layout_config, load_settings, save_settings, settings_path};
pub use typed::{check_typed, load_typed, load_typed_as, load_typed_opt, save_typed};
pub use types::*;
pub use web::{
    env_name, find_free_port, load_user_config, load_web_config, load_workspace_config, user_dir,
    workspace_gui_dir, UserWebConfig, WebConfig, WorkspaceWebConfig,
};
