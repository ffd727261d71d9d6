//! Widgets of the console

mod config_page;
mod header;
mod job_panel;
mod modal;
mod product_view;
mod status_bar;

pub use config_page::ConfigPageView;
pub use header::{truncate_name, MainHeader};
pub use job_panel::{output_viewport, LaunchPanel};
pub use modal::{ConfirmQuitDialog, ConfirmRemoveDialog, ErrorDialog};
pub use product_view::ProductViewPanel;
pub use status_bar::StatusBar;
