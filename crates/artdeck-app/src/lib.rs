//! artdeck-app - Application state and orchestration for Artdeck
//!
//! This crate implements the TEA (The Elm Architecture) pattern for the
//! operator console, the per-client state shared with the web front end,
//! configuration loading, credentials and sessions, and the product view.
//!
//! ## Public API
//!
//! - [`AppState`], [`Message`], [`handler::update`]: console state machine
//! - [`client::ClientState`]: tabs, launches and product views of one client
//! - [`auth`], [`session_store`], [`guard`]: credentials and web sessions
//! - [`product_view`]: scan cache and view state of a variant group

pub mod actions;
pub mod auth;
pub mod client;
pub mod config;
pub mod controls;
pub mod guard;
pub mod handler;
pub mod idle;
pub mod input_key;
pub mod job_monitor;
pub mod launch;
pub mod message;
pub mod process;
pub mod product_view;
pub mod routes;
pub mod session_store;
pub mod signals;
pub mod state;
pub mod tabs;
pub mod watcher;

// Re-export primary types
pub use actions::Services;
pub use client::ClientState;
pub use handler::{UpdateAction, UpdateResult};
pub use input_key::InputKey;
pub use message::Message;
pub use state::AppState;
