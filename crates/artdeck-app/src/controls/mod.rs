//! Value controls
//!
//! - [`factory`] - Control kind from metadata or value name
//! - [`grid`] - Grid of controls bound to a value dictionary

pub mod factory;
pub mod grid;

pub use factory::{ControlDef, ControlSpec};
pub use grid::{
    workspace_exclusions, ChangeOutcome, GridGroup, GuiArgs, Validator, ValueGrid, WORKSPACE_EXCLUDE,
};
