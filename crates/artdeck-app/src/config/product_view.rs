//! Per variant group product view files
//!
//! Stored below `<variant group>/.gui/`:
//! - `product_view_settings.json` - value selections and dimension order per
//!   production group
//! - `product_categories.json` - category values

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use artdeck_core::prelude::*;
use artdeck_core::{CategoryStore, VarSelections};
use artdeck_daemon::workspace::{read_json, write_json_atomic};

pub const SETTINGS_DIR: &str = ".gui";
pub const PRODUCT_VIEW_SETTINGS_FILE: &str = "product_view_settings.json";
pub const PRODUCT_CATEGORIES_FILE: &str = "product_categories.json";

/// Saved product view state of one variant group, keyed by group id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductViewFile {
    #[serde(rename = "dicVgGrpVarSel", default)]
    pub group_var_sel: BTreeMap<String, VarSelections>,

    #[serde(rename = "dicVgArtTypeVarSel", default)]
    pub art_type_var_sel: BTreeMap<String, BTreeMap<String, VarSelections>>,

    #[serde(rename = "dicVgViewDimNamesSel", default)]
    pub view_dim_names: BTreeMap<String, Vec<String>>,

    #[serde(rename = "dicVgArtTypeViewDimNamesSel", default)]
    pub art_type_view_dim_names: BTreeMap<String, BTreeMap<String, Vec<String>>>,

    /// Active artefact types; all types when missing
    #[serde(rename = "dicVgActiveArtTypes", default)]
    pub active_art_types: BTreeMap<String, Vec<String>>,
}

pub fn settings_dir(variant_group: &Path) -> PathBuf {
    variant_group.join(SETTINGS_DIR)
}

/// Load the view settings; a missing or broken file gives the defaults
pub fn load_product_view(variant_group: &Path) -> ProductViewFile {
    let path = settings_dir(variant_group).join(PRODUCT_VIEW_SETTINGS_FILE);
    if !path.exists() {
        return ProductViewFile::default();
    }
    match read_json(&path).and_then(|v| serde_json::from_value::<ProductViewFile>(v).map_err(Error::from)) {
        Ok(file) => file,
        Err(e) => {
            warn!("Ignoring product view settings {:?}: {}", path, e);
            ProductViewFile::default()
        }
    }
}

pub fn save_product_view(variant_group: &Path, file: &ProductViewFile) -> Result<()> {
    let path = settings_dir(variant_group).join(PRODUCT_VIEW_SETTINGS_FILE);
    write_json_atomic(&path, &serde_json::to_value(file)?)
}

/// Load category values; a missing file gives an empty store
pub fn load_categories(variant_group: &Path) -> Result<CategoryStore> {
    let path = settings_dir(variant_group).join(PRODUCT_CATEGORIES_FILE);
    if !path.exists() {
        return Ok(CategoryStore::new());
    }
    let value = read_json(&path)?;
    serde_json::from_value(value)
        .map_err(|e| Error::config_invalid(format!("{}: {}", path.display(), e)))
}

pub fn save_categories(variant_group: &Path, store: &CategoryStore) -> Result<()> {
    let path = settings_dir(variant_group).join(PRODUCT_CATEGORIES_FILE);
    write_json_atomic(&path, &serde_json::to_value(store)?)
}
