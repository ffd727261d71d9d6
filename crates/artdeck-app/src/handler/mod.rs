//! Handler module - TEA update function and page handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `keys`: Key event handlers per UI mode and page
//! - `config`: Configuration page handlers
//! - `launch`: Launch tab and job monitor handlers
//! - `product`: Product view handlers

pub(crate) mod config;
pub(crate) mod keys;
pub(crate) mod launch;
pub(crate) mod product;
pub(crate) mod update;

use std::path::PathBuf;

use crate::message::Message;
use crate::product_view::ScanRequest;

pub use update::update;

/// Delay of the deferred product grid rebuild
pub const VIEW_UPDATE_DELAY_MS: u64 = 200;

/// Actions that the event loop performs after update
#[derive(Debug, Clone)]
pub enum UpdateAction {
    /// Load the catalog of a variant group on the blocking pool
    ScanProduction { project: String, request: ScanRequest },

    /// Watch a production definition, replacing the current watch
    WatchProduction { path: PathBuf },

    StopWatching,

    /// Rebuild the product grid after [`VIEW_UPDATE_DELAY_MS`]
    ScheduleViewUpdate { project: String },

    /// Replace a corrected range window by its stored values after
    /// [`artdeck_core::range::DEFERRED_RESET_MS`]
    ScheduleRangeReset { project: String },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}
