//! # artdeck-core - Core Domain Types
//!
//! Foundation crate for Artdeck. Provides error handling, logging setup,
//! the artefact catalog, value selection, view dimension traversal and the
//! clamped range windows used by the console.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ### Catalog (`catalog`)
//! - [`Catalog`] - Discovered artefacts of one production group
//! - [`VariableValueList`] - Ordered (value, label) pairs of one variable
//! - [`ArtefactType`], [`ArtefactReference`] - Artefact types and files
//!
//! ### Selection (`selection`)
//! - [`EffectiveSelection`] - Value lists that take part in a view
//! - [`ALL`] - The "do not filter" sentinel
//!
//! ### View Dimensions (`view_dim`)
//! - [`ViewDimKey`], [`ViewDim`] - Dimension identity and range
//! - [`ViewIterationBuilder`], [`ViewIteration`], [`ViewDimNode`] - Nested traversal
//! - [`SlotAssignment`] - Assignment of dimensions to grid slots
//! - [`LayoutNode`] - Row/column layout tree built from a traversal
//!
//! ### Categories (`category`)
//! - [`CategoryPath`], [`CategoryStore`], [`BoolGroup`]
//!
//! ### Ranges (`range`)
//! - [`PosRange`] - Position + width window
//! - [`WindowRange`] - Two-handle window with width limits
//!
//! ### Naming and Type Tags (`naming`, `dti`)
//! - [`parse_value_name()`] - Control inference from `iFrameCount`-style names
//! - [`Dti`] - Document type identifiers of persisted JSON
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use artdeck_core::prelude::*;
//! ```

pub mod catalog;
pub mod category;
pub mod dti;
pub mod error;
pub mod logging;
pub mod naming;
pub mod range;
pub mod selection;
pub mod view_dim;

/// Prelude for common imports used throughout all Artdeck crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use catalog::{ArtefactReference, ArtefactType, Catalog, VarDecl, VariableValueList};
pub use category::{BoolGroup, CategoryPath, CategoryStore, Choice};
pub use dti::{Dti, DTI_KEY};
pub use error::{Error, Result, ResultExt};
pub use naming::{parse_value_name, ControlKind, NamePrefix, ParsedName, ValueKind};
pub use range::{has_int_step, PosRange, PosRangeConfig, PosRangeStyle, WindowRange, WindowUpdate};
pub use selection::{EffectiveSelection, TypeSelection, VarSelections, ALL};
pub use view_dim::{
    available_dims, build_layout, AvailableDims, DimOption, LayoutConfig, LayoutNode,
    SlotAssignment, ViewDim, ViewDimKey, ViewDimNode, ViewIteration, ViewIterationBuilder,
};
