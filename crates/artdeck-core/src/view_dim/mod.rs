//! View dimensions over an artefact catalog
//!
//! A product view shows the artefacts of one production group as a nested
//! grid. Every discrete variable with more than one selected value can be
//! assigned to a grid dimension; the nested product of all dimensions is
//! traversed level by level while the grid is laid out.
//!
//! ## Dimension keys
//!
//! - [`ViewDimKey::Group`]: a path variable of the production group
//! - [`ViewDimKey::ArtefactType`]: the axis of active artefact types
//! - [`ViewDimKey::ArtefactCommon`]: an artefact variable shared by two or
//!   more active artefact types
//! - [`ViewDimKey::Artefact`]: a variable of one artefact type only
//!
//! The first three form the shared chain. Type-specific dimensions are
//! nested below the shared chain, separately per artefact type.
//!
//! ## Modules
//!
//! - [`dims`]: slot assignment of keys and range windows
//! - [`iteration`]: the nested cursor traversal
//! - [`layout`]: the row/column layout tree built from a traversal

pub mod dims;
pub mod iteration;
pub mod layout;


use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, VariableValueList};
use crate::error::{Error, Result};
use crate::selection::EffectiveSelection;

pub use dims::{range_for_option, shared_slot_label, type_slot_label, SlotAssignment};
pub use iteration::{ViewDimNode, ViewIteration, ViewIterationBuilder};
pub use layout::{build_layout, ArtefactCell, LayoutColumn, LayoutConfig, LayoutNode, RowBlock};

/// Label of the artefact type dimension
pub const ARTEFACT_TYPE_LABEL: &str = "Artefact Type";

/// Variable id used for the artefact type in category paths
pub const ARTEFACT_TYPE_VAR: &str = "artefact-type";

/// Identifies one view dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewDimKey {
    Group(String),
    ArtefactType,
    ArtefactCommon(String),
    Artefact { type_id: String, var: String },
}

impl ViewDimKey {
    pub fn is_type_specific(&self) -> bool {
        matches!(self, Self::Artefact { .. })
    }

    /// Variable id this dimension iterates
    pub fn var_id(&self) -> &str {
        match self {
            Self::Group(var) | Self::ArtefactCommon(var) | Self::Artefact { var, .. } => var,
            Self::ArtefactType => ARTEFACT_TYPE_VAR,
        }
    }
}

impl fmt::Display for ViewDimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(var) => write!(f, "grp:{}", var),
            Self::ArtefactType => write!(f, "arttype"),
            Self::ArtefactCommon(var) => write!(f, "artcom:{}", var),
            Self::Artefact { type_id, var } => write!(f, "art:{}:{}", type_id, var),
        }
    }
}

impl FromStr for ViewDimKey {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        if text == "arttype" {
            return Ok(Self::ArtefactType);
        }
        let invalid = || Error::view_dim(format!("invalid dimension key '{}'", text));
        let (kind, rest) = text.split_once(':').ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }
        match kind {
            "grp" => Ok(Self::Group(rest.to_string())),
            "artcom" => Ok(Self::ArtefactCommon(rest.to_string())),
            "art" => {
                let (type_id, var) = rest.split_once(':').ok_or_else(invalid)?;
                if type_id.is_empty() || var.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::Artefact {
                    type_id: type_id.to_string(),
                    var: var.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// A dimension requested for a traversal, with an optional 0-based
/// inclusive index range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDim {
    pub key: ViewDimKey,
    pub range: Option<(usize, usize)>,
}

impl ViewDim {
    pub fn new(key: ViewDimKey) -> Self {
        Self { key, range: None }
    }

    pub fn with_range(mut self, min: usize, max: usize) -> Self {
        self.range = Some((min, max));
        self
    }
}

/// A dimension that can be assigned to a slot
#[derive(Debug, Clone, PartialEq)]
pub struct DimOption {
    pub key: ViewDimKey,
    pub label: String,
    pub value_count: usize,
}

/// Dimensions offered for the current selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableDims {
    pub shared: Vec<DimOption>,
    /// Per active artefact type: type id, type name, type-specific options
    pub per_type: Vec<(String, String, Vec<DimOption>)>,
}

/// An artefact variable present in several active artefact types
#[derive(Debug, Clone, PartialEq)]
pub struct CommonVar {
    pub id: String,
    pub name: String,
    /// Union of the effective values over all types having the variable
    pub values: VariableValueList,
    pub type_ids: Vec<String>,
}

/// Artefact variables shared by at least two active artefact types
pub fn common_vars(catalog: &Catalog, selection: &EffectiveSelection) -> Vec<CommonVar> {
    let mut vars: Vec<CommonVar> = Vec::new();
    for type_sel in &selection.types {
        let Some(art_type) = catalog.artefact_type(&type_sel.type_id) else {
            continue;
        };
        for (var, values) in art_type.vars.iter().zip(&type_sel.values) {
            match vars.iter_mut().find(|c| c.id == var.id) {
                Some(common) => {
                    common.values.merge(values);
                    common.type_ids.push(type_sel.type_id.clone());
                }
                None => vars.push(CommonVar {
                    id: var.id.clone(),
                    name: var.name.clone(),
                    values: values.clone(),
                    type_ids: vec![type_sel.type_id.clone()],
                }),
            }
        }
    }
    vars.retain(|c| c.type_ids.len() > 1);
    vars
}

/// Collect the dimensions that have more than one value to show
pub fn available_dims(catalog: &Catalog, selection: &EffectiveSelection) -> AvailableDims {
    let mut dims = AvailableDims::default();

    for (var, values) in catalog.group_vars.iter().zip(&selection.group) {
        if values.len() > 1 {
            dims.shared.push(DimOption {
                key: ViewDimKey::Group(var.id.clone()),
                label: var.name.clone(),
                value_count: values.len(),
            });
        }
    }

    if selection.types.len() > 1 {
        dims.shared.push(DimOption {
            key: ViewDimKey::ArtefactType,
            label: ARTEFACT_TYPE_LABEL.to_string(),
            value_count: selection.types.len(),
        });
    }

    let common = common_vars(catalog, selection);
    for var in &common {
        if var.values.len() > 1 {
            dims.shared.push(DimOption {
                key: ViewDimKey::ArtefactCommon(var.id.clone()),
                label: var.name.clone(),
                value_count: var.values.len(),
            });
        }
    }

    for type_sel in &selection.types {
        let Some(art_type) = catalog.artefact_type(&type_sel.type_id) else {
            continue;
        };
        let options = art_type
            .vars
            .iter()
            .zip(&type_sel.values)
            .filter(|(var, values)| values.len() > 1 && !common.iter().any(|c| c.id == var.id))
            .map(|(var, values)| DimOption {
                key: ViewDimKey::Artefact {
                    type_id: art_type.id.clone(),
                    var: var.id.clone(),
                },
                label: var.name.clone(),
                value_count: values.len(),
            })
            .collect();
        dims.per_type
            .push((art_type.id.clone(), art_type.name.clone(), options));
    }

    dims
}
