//! artdeck-tui - Terminal console for Artdeck
//!
//! Renders the state of the console client with ratatui and feeds key
//! events and ticks into the update loop of artdeck-app.

pub mod event;
pub mod layout;
pub mod render;
pub mod runner;
pub mod theme;
pub mod widgets;

#[cfg(test)]
pub mod test_utils;

pub use runner::run;
