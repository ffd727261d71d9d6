//! artdeck-web - Web process of Artdeck
//!
//! Serves the workspace overview, login, password reset links and shared
//! product views over HTTP. One process runs per workspace; the CLI entry
//! point spawns it and guards it with the workspace lock.
//!
//! ## Public API
//!
//! - [`serve`], [`WebArgs`]: run the process until idle shutdown
//! - [`router`], [`WebState`]: the axum application, for embedding and tests

pub mod handlers;
pub mod pages;
pub mod server;
pub mod session;
pub mod state;

pub use server::{router, serve, WebArgs};
pub use state::{WebClient, WebState};
