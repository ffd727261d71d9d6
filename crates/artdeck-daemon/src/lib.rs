//! # artdeck-daemon - Process and Filesystem Plumbing
//!
//! Child processes, the workspace lock, the workspace and action handler
//! collaborators, production definitions and the artefact scan.
//!
//! Depends on [`artdeck_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Process Management
//! - [`ManagedProcess`] - Child process with streamed output and exit tracking
//! - [`ServerProcess`] - The web server child of the CLI entry point
//! - [`WorkspaceLock`] - Lock file guarding one web server per workspace
//!
//! ### Collaborators
//! - [`WorkspaceApi`] - Projects, value dictionaries, variants, launches
//! - [`FsWorkspace`] - Directory-tree implementation of [`WorkspaceApi`]
//! - [`ActionHandler`] - Launch/monitor/terminate jobs of one launch
//! - [`ProcessActionHandler`] - Child-process implementation of [`ActionHandler`]
//!
//! ### Production Data
//! - [`ProductionDef`] - Parsed production definition of a variant group
//! - [`scan_group()`] - Scan produced artefacts into a [`artdeck_core::Catalog`]

pub mod action;
pub mod jobs;
pub mod lock;
pub mod process;
pub mod production;
pub mod scan;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;
pub mod workspace;

pub use action::{ActionHandler, JobConfig, JobStatus, LaunchEvent, OUTPUT_STDERR, OUTPUT_STDOUT};
#[cfg(any(test, feature = "test-helpers"))]
pub use action::MockActionHandler;
pub use jobs::ProcessActionHandler;
pub use lock::{lock_path, WorkspaceLock, CONSOLE_DIR};
pub use process::{CommandSpec, ManagedProcess, ProcessEvent, ServerArgs, ServerProcess};
pub use production::{ArtefactDef, FileStamp, GroupDef, ProductionDef};
pub use scan::scan_group;
#[cfg(any(test, feature = "test-helpers"))]
pub use workspace::MockWorkspaceApi;
pub use workspace::{
    FoundInstance, FsWorkspace, JobSpec, LaunchRequest, PreparedLaunch, VariantKey, WorkspaceApi,
    META_ACTION_PATH, META_LAUNCH_FILE_ID, META_TRIAL,
};
