//! Filesystem scan cache
//!
//! Scanning a production tree can take a while, so the discovered catalog
//! is kept in `<vg>/_cache/fs-scan-{group}.json` together with the stamp of
//! the production definition it was built from. A changed definition or an
//! explicit rescan invalidates the cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use artdeck_core::prelude::*;
use artdeck_core::{BoolGroup, Catalog};
use artdeck_daemon::workspace::{read_json, write_json_atomic};
use artdeck_daemon::{scan_group, FileStamp, ProductionDef};

/// Cache directory below a variant group
pub const CACHE_DIR: &str = "_cache";

const CACHE_DTI: &str = "/artdeck/cache/fs-scan:1.0";
const CACHE_DTI_PATTERN: &str = "/artdeck/cache/fs-scan:1";

/// Format of the cache date shown next to the group selector
pub const DATE_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

pub fn cache_path(variant_group: &Path, group_id: &str) -> PathBuf {
    variant_group
        .join(CACHE_DIR)
        .join(format!("fs-scan-{}.json", group_id))
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    #[serde(rename = "sDTI")]
    dti: String,
    #[serde(rename = "xStamp")]
    stamp: FileStamp,
    #[serde(rename = "sCreated")]
    created: DateTime<Utc>,
    #[serde(rename = "xCatalog")]
    catalog: Catalog,
}

/// What to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub production_path: PathBuf,
    pub variant_group: PathBuf,
    /// Production group, the first one of the definition if `None`
    pub group_id: Option<String>,
    /// Ignore an existing cache
    pub rescan: bool,
}

/// A loaded catalog and where it came from
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub catalog: Catalog,
    pub group_ids: Vec<String>,
    pub categories: BTreeMap<String, BoolGroup>,
    pub created: DateTime<Utc>,
    pub from_cache: bool,
}

impl ScanResult {
    /// Cache date in local time
    pub fn date_text(&self) -> String {
        date_text(&self.created)
    }
}

pub fn date_text(created: &DateTime<Utc>) -> String {
    created.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// Load a cached catalog that still matches `stamp`
fn read_cache(path: &Path, stamp: &FileStamp) -> Option<(Catalog, DateTime<Utc>)> {
    if !path.is_file() {
        return None;
    }
    let value = match read_json(path) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unreadable scan cache {}: {}", path.display(), e);
            return None;
        }
    };
    if artdeck_core::dti::check(&value, CACHE_DTI_PATTERN).is_none() {
        warn!("Ignoring scan cache of unknown type: {}", path.display());
        return None;
    }
    let file: CacheFile = match serde_json::from_value(value) {
        Ok(file) => file,
        Err(e) => {
            warn!("Ignoring corrupt scan cache {}: {}", path.display(), e);
            return None;
        }
    };
    if &file.stamp != stamp {
        debug!("Scan cache {} is stale", path.display());
        return None;
    }
    let mut catalog = file.catalog;
    catalog.rebuild_index();
    Some((catalog, file.created))
}

/// Load the catalog of a variant group, from cache when possible.
///
/// Blocking; run it on a worker thread.
pub fn load_or_scan(request: &ScanRequest) -> Result<ScanResult> {
    let production = ProductionDef::load(&request.production_path)?;
    let group_ids: Vec<String> = production.group_ids().into_iter().map(str::to_string).collect();
    let group_id = match &request.group_id {
        Some(id) if production.group(id).is_some() => id.clone(),
        Some(id) => return Err(Error::scan(format!("production group '{}' not defined", id))),
        None => group_ids
            .first()
            .cloned()
            .ok_or_else(|| Error::scan("production definition has no groups"))?,
    };

    let stamp = FileStamp::of(&request.production_path)?;
    let path = cache_path(&request.variant_group, &group_id);

    if !request.rescan {
        if let Some((catalog, created)) = read_cache(&path, &stamp) {
            debug!("Loaded catalog of '{}' from {}", group_id, path.display());
            return Ok(ScanResult {
                catalog,
                group_ids,
                categories: production.categories,
                created,
                from_cache: true,
            });
        }
    }

    info!("Scanning artefacts of production group '{}'", group_id);
    let catalog = scan_group(&production, &group_id)?;
    let created = Utc::now();
    let file = CacheFile {
        dti: CACHE_DTI.to_string(),
        stamp,
        created,
        catalog,
    };
    let value = serde_json::to_value(&file)?;
    if let Err(e) = write_json_atomic(&path, &value) {
        warn!("Failed to write scan cache {}: {}", path.display(), e);
    }

    Ok(ScanResult {
        catalog: file.catalog,
        group_ids,
        categories: production.categories,
        created,
        from_cache: false,
    })
}

/// Source of variant group catalogs
#[trait_variant::make(ScanSource: Send)]
pub trait LocalScanSource {
    /// Load the catalog described by `request`
    async fn load(&self, request: ScanRequest) -> Result<ScanResult>;
}

/// [`ScanSource`] backed by [`load_or_scan`] on the blocking pool
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedScan;

impl ScanSource for CachedScan {
    async fn load(&self, request: ScanRequest) -> Result<ScanResult> {
        tokio::task::spawn_blocking(move || load_or_scan(&request))
            .await
            .map_err(|e| Error::scan(format!("scan task failed: {}", e)))?
    }
}
