//! Artdeck
//!
//! Operator console and web process for render-automation workspaces. The
//! binary `gui_workspace` either opens the terminal console, adds users, or
//! starts the web process of a workspace as a child guarded by the
//! workspace lock.

pub mod cli;
pub mod launcher;
pub mod users;

pub use launcher::{resolve_workspace, run_web_server, LaunchOutcome};
