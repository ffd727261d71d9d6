//! Product view: browse produced artefacts along view dimensions
//!
//! - [`cache`] - Scan a variant group, cached per production group
//! - [`state`] - Selections, dimension slots, ranges and categories

pub mod cache;
pub mod state;

pub use cache::{load_or_scan, CachedScan, LocalScanSource, ScanRequest, ScanResult, ScanSource};
pub use state::{ProductViewState, Selector, SelectorKey, SlotRow, SlotView};
