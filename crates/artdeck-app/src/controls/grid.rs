//! Value grid
//!
//! Binds the controls of a value dictionary into a grid, either as a flat
//! grid of four columns or following a grouped layout from the gui
//! arguments. Edits go through [`ValueGrid::change`], which converts the
//! input, asks an optional validator and either commits or rolls back.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use artdeck_core::dti;
use artdeck_core::prelude::*;

use super::factory::{self, ControlDef};
use crate::guard::Reentrancy;

/// Columns of a grid without explicit layout
pub const FLAT_COLUMNS: usize = 4;

/// Suffix of the per-value metadata entry, e.g. `iFrameCount/gui`
pub const GUI_SUFFIX: &str = "/gui";

/// Values never shown in workspace value grids
pub const WORKSPACE_EXCLUDE: &[&str] = &["sDTI", "sTrialFile", "lTrialFileOptions", "sExecFile", "sInfo"];

/// Decides whether a change is accepted: `(data_id, name, value)`
pub type Validator<'a> = dyn FnMut(Option<&str>, &str, &Value) -> bool + 'a;

#[derive(Debug, Clone, Default, Deserialize)]
struct LayoutGroupArgs {
    #[serde(rename = "sTitle", default)]
    title: String,
    #[serde(rename = "lRows", default)]
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GridLayoutArgs {
    #[serde(rename = "iColumnCount", default = "default_layout_columns")]
    columns: usize,
    #[serde(rename = "lGroups", default)]
    groups: Option<Vec<LayoutGroupArgs>>,
}

fn default_layout_columns() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Gui arguments of a value grid
#[derive(Debug, Clone, Deserialize)]
pub struct GuiArgs {
    /// Control metadata per value name
    #[serde(rename = "mVars", default)]
    pub vars: Map<String, Value>,
    /// Metadata merged into every control whose tag matches the key pattern
    #[serde(rename = "mControlDefaults", default)]
    pub control_defaults: Map<String, Value>,
    #[serde(rename = "bShowAllVars", default = "default_true")]
    pub show_all: bool,
    #[serde(rename = "lIncludeVars", default)]
    pub include: Vec<String>,
    #[serde(rename = "lExcludeVars", default)]
    pub exclude: Vec<String>,
    #[serde(rename = "mGridLayout", default)]
    grid_layout: BTreeMap<String, GridLayoutArgs>,
}

impl Default for GuiArgs {
    fn default() -> Self {
        Self {
            vars: Map::new(),
            control_defaults: Map::new(),
            show_all: true,
            include: Vec::new(),
            exclude: Vec::new(),
            grid_layout: BTreeMap::new(),
        }
    }
}

impl GuiArgs {
    /// Merge `args` over `defaults` key by key and parse the result
    pub fn merged(defaults: Option<&Map<String, Value>>, args: Option<&Map<String, Value>>) -> Result<Self> {
        let mut merged = Map::new();
        for source in [defaults, args].into_iter().flatten() {
            for (key, value) in source {
                merged.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(Value::Object(merged))
            .map_err(|e| Error::config_invalid(format!("gui arguments: {}", e)))
    }
}

/// A titled block of rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridGroup {
    pub title: Option<String>,
    pub rows: Vec<Vec<String>>,
}

/// Result of an edit
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOutcome {
    /// Written to the dictionary
    Committed(Value),
    /// Rejected; the displayed value returned to the committed one
    RolledBack(Value),
    /// Arrived while a rollback was in progress and was not processed
    Suppressed,
    UnknownControl,
}

#[derive(Debug)]
pub struct ValueGrid {
    data_id: Option<String>,
    columns: usize,
    groups: Vec<GridGroup>,
    controls: BTreeMap<String, ControlDef>,
    displayed: BTreeMap<String, Value>,
    notifications: Vec<String>,
    rollback: Reentrancy,
}

/// Compile exclusion patterns for full matches
pub fn exclusion_regexes<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(&format!("^(?:{})$", p.as_ref()))
                .map_err(|e| Error::config_invalid(format!("exclude pattern '{}': {}", p.as_ref(), e)))
        })
        .collect()
}

/// Exclusions of workspace value grids
pub fn workspace_exclusions() -> Result<Vec<Regex>> {
    let escaped: Vec<String> = WORKSPACE_EXCLUDE.iter().map(|n| regex::escape(n)).collect();
    exclusion_regexes(&escaped)
}

impl ValueGrid {
    /// Build the grid for `values`.
    ///
    /// Controls that cannot be created are left out and reported in
    /// [`ValueGrid::notifications`]. A layout naming an unknown value, or a
    /// value twice, is an error.
    pub fn build(
        values: &Map<String, Value>,
        args: &GuiArgs,
        exclude: &[Regex],
        data_id: Option<&str>,
    ) -> Result<Self> {
        let mut grid = Self {
            data_id: data_id.map(str::to_string),
            columns: FLAT_COLUMNS,
            groups: Vec::new(),
            controls: BTreeMap::new(),
            displayed: BTreeMap::new(),
            notifications: Vec::new(),
            rollback: Reentrancy::new(),
        };

        let layout = match data_id.and_then(|id| args.grid_layout.get(id).map(|l| (id, l))) {
            Some((id, layout)) => {
                let groups = layout.groups.as_ref().ok_or_else(|| {
                    Error::layout(format!(
                        "No element 'lGroups' found in 'mGridLayout' for data type '{}'",
                        id
                    ))
                })?;
                grid.columns = layout.columns.max(1);
                Some(groups)
            }
            None => None,
        };

        match layout {
            None => {
                let mut names = Vec::new();
                for name in values.keys() {
                    if grid.add_control(values, args, exclude, name) {
                        names.push(name.clone());
                    }
                }
                let rows = names.chunks(FLAT_COLUMNS).map(<[String]>::to_vec).collect();
                grid.groups.push(GridGroup { title: None, rows });
            }
            Some(groups) => {
                let data_type = data_id.unwrap_or_default();
                let mut seen = BTreeSet::new();
                for group in groups {
                    let mut rows = Vec::new();
                    for row in &group.rows {
                        let mut cells = Vec::new();
                        for name in row {
                            if !values.contains_key(name) {
                                return Err(Error::layout(format!(
                                    "Variable '{}' in row layout for data type '{}' not available",
                                    name, data_type
                                )));
                            }
                            if !seen.insert(name.clone()) {
                                return Err(Error::layout(format!(
                                    "Variable '{}' is referenced more than once in grid layout",
                                    name
                                )));
                            }
                            if grid.add_control(values, args, exclude, name) {
                                cells.push(name.clone());
                            }
                        }
                        rows.push(cells);
                    }
                    grid.groups.push(GridGroup {
                        title: Some(group.title.clone()).filter(|t| !t.is_empty()),
                        rows,
                    });
                }
            }
        }

        Ok(grid)
    }

    fn add_control(
        &mut self,
        values: &Map<String, Value>,
        args: &GuiArgs,
        exclude: &[Regex],
        name: &str,
    ) -> bool {
        match control_for(values, args, exclude, name) {
            Ok(Some(ctrl)) => {
                self.displayed.insert(name.to_string(), ctrl.read(values));
                self.controls.insert(name.to_string(), ctrl);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Control for '{}' omitted: {}", name, e);
                self.notifications
                    .push(format!("Error creating control for value '{}'\n{}", name, e));
                false
            }
        }
    }

    pub fn data_id(&self) -> Option<&str> {
        self.data_id.as_deref()
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn groups(&self) -> &[GridGroup] {
        &self.groups
    }

    /// An empty grid is hidden
    pub fn is_visible(&self) -> bool {
        !self.controls.is_empty()
    }

    pub fn control(&self, name: &str) -> Option<&ControlDef> {
        self.controls.get(name)
    }

    /// Control names in display order
    pub fn names(&self) -> Vec<&str> {
        self.groups
            .iter()
            .flat_map(|g| g.rows.iter())
            .flat_map(|r| r.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn displayed(&self, name: &str) -> Option<&Value> {
        self.displayed.get(name)
    }

    pub fn notifications(&self) -> &[String] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    /// Handle an edit of the displayed value of `name`.
    ///
    /// The input is converted to the control type and offered to the
    /// validator. Accepted values are written to `values`; rejected ones
    /// reset the displayed value under the rollback guard, so the reset
    /// does not come back as another change.
    pub fn change(
        &mut self,
        values: &mut Map<String, Value>,
        name: &str,
        input: &Value,
        validator: Option<&mut Validator<'_>>,
    ) -> ChangeOutcome {
        let Some(ctrl) = self.controls.get(name) else {
            return ChangeOutcome::UnknownControl;
        };
        let value = ctrl.convert(input);
        self.displayed.insert(name.to_string(), value.clone());
        if self.rollback.is_active() {
            return ChangeOutcome::Suppressed;
        }

        let mut validator = validator;
        let accept = match validator.as_deref_mut() {
            Some(check) => check(self.data_id.as_deref(), name, &value),
            None => true,
        };

        if accept {
            values.insert(name.to_string(), value.clone());
            return ChangeOutcome::Committed(value);
        }

        let committed = ctrl.read(values);
        let _guard = self.rollback.enter();
        self.change(values, name, &committed, validator);
        ChangeOutcome::RolledBack(committed)
    }

    /// Re-read every displayed value from `values`
    pub fn refresh(&mut self, values: &Map<String, Value>) {
        for (name, ctrl) in &self.controls {
            self.displayed.insert(name.clone(), ctrl.read(values));
        }
    }
}

/// Control of one value, `Ok(None)` if it is not shown
pub fn control_for(
    values: &Map<String, Value>,
    args: &GuiArgs,
    exclude: &[Regex],
    name: &str,
) -> Result<Option<ControlDef>> {
    if name.len() < 2 || name.contains('/') {
        return Ok(None);
    }
    if exclude.iter().any(|re| re.is_match(name)) {
        return Ok(None);
    }
    if args.exclude.iter().any(|n| n == name) {
        return Ok(None);
    }

    let meta = values
        .get(&format!("{}{}", name, GUI_SUFFIX))
        .and_then(Value::as_object)
        .or_else(|| args.vars.get(name).and_then(Value::as_object));

    if !args.show_all && meta.is_none() && !args.include.iter().any(|n| n == name) {
        return Ok(None);
    }

    let Some(meta) = meta else {
        return factory::from_name(name);
    };

    let mut ctrl = meta.clone();
    if dti::check(&Value::Object(ctrl.clone()), factory::CONTROL_DTI_PATTERN).is_none() {
        let mut inferred = factory::config_from_name(name).ok_or_else(|| {
            Error::control(name, "no control type given and none can be inferred from the name")
        })?;
        inferred.extend(ctrl);
        ctrl = inferred;
    }

    let tagged = Value::Object(ctrl.clone());
    for (pattern, defaults) in &args.control_defaults {
        if dti::check(&tagged, pattern).is_some() {
            if let Some(defaults) = defaults.as_object() {
                ctrl.extend(defaults.clone());
            }
        }
    }

    factory::from_dict(name, &ctrl)
}
