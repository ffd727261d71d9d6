//! Console theme
//!
//! - `palette`: raw color constants
//! - `styles`: semantic style builders
//! - `icons`: glyphs for the icon names used by tabs and job states

pub mod icons;
pub mod palette;
pub mod styles;
