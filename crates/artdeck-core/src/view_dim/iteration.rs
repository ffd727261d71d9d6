//! Nested cursor traversal of view dimensions

use super::{common_vars, CommonVar, ViewDim, ViewDimKey, ARTEFACT_TYPE_LABEL};
use crate::catalog::{ArtefactReference, Catalog, VariableValueList};
use crate::category::CategoryPath;
use crate::error::{Error, Result};
use crate::selection::EffectiveSelection;

#[derive(Debug, Clone)]
struct Level {
    key: ViewDimKey,
    label: String,
    values: VariableValueList,
    lo: usize,
    hi: usize,
    cursor: usize,
    dim_idx: usize,
}

impl Level {
    fn new(dim: &ViewDim, label: String, values: VariableValueList, dim_idx: usize) -> Self {
        let last = values.len().saturating_sub(1);
        let (lo, hi) = match dim.range {
            Some((min, max)) => {
                let lo = min.min(last);
                (lo, max.clamp(lo, last))
            }
            None => (0, last),
        };
        Self {
            key: dim.key.clone(),
            label,
            values,
            lo,
            hi,
            cursor: lo,
            dim_idx,
        }
    }

    fn current_value(&self) -> &str {
        self.values.values()[self.cursor].as_str()
    }
}

/// Where a variable of an artefact coordinate takes its value from
#[derive(Debug, Clone)]
enum Source {
    Shared(usize),
    Own(usize),
    Fixed(String),
}

#[derive(Debug, Clone)]
struct TypeChain {
    type_id: String,
    levels: Vec<Level>,
    sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    Shared,
    Type(usize),
}

/// Handle to one level of a [`ViewIteration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDimNode {
    chain: Chain,
    level: usize,
}

impl ViewDimNode {
    /// First level of an artefact type's own dimensions, reached after the
    /// shared levels are exhausted
    pub fn is_unique_art_var_start(&self) -> bool {
        matches!(self.chain, Chain::Type(_)) && self.level == 0
    }
}

/// Collects the dimensions of a traversal and validates them
pub struct ViewIterationBuilder<'a> {
    catalog: &'a Catalog,
    selection: &'a EffectiveSelection,
    common: Vec<CommonVar>,
    shared: Vec<ViewDim>,
    per_type: Vec<(String, Vec<ViewDim>)>,
}

impl<'a> ViewIterationBuilder<'a> {
    pub fn new(catalog: &'a Catalog, selection: &'a EffectiveSelection) -> Self {
        Self {
            catalog,
            selection,
            common: common_vars(catalog, selection),
            shared: Vec::new(),
            per_type: Vec::new(),
        }
    }

    fn contains(&self, key: &ViewDimKey) -> bool {
        self.shared.iter().any(|d| &d.key == key)
            || self
                .per_type
                .iter()
                .flat_map(|(_, dims)| dims.iter())
                .any(|d| &d.key == key)
    }

    /// Label and effective values of a dimension, `None` if unknown
    fn resolve(&self, key: &ViewDimKey) -> Option<(String, VariableValueList)> {
        match key {
            ViewDimKey::Group(var) => {
                let idx = self.catalog.group_var_index(var)?;
                Some((
                    self.catalog.group_vars[idx].name.clone(),
                    self.selection.group.get(idx)?.clone(),
                ))
            }
            ViewDimKey::ArtefactType => {
                let mut values = VariableValueList::new();
                for type_sel in &self.selection.types {
                    let name = self
                        .catalog
                        .artefact_type(&type_sel.type_id)
                        .map(|t| t.name.as_str())
                        .unwrap_or(type_sel.type_id.as_str());
                    values.push(type_sel.type_id.clone(), name);
                }
                Some((ARTEFACT_TYPE_LABEL.to_string(), values))
            }
            ViewDimKey::ArtefactCommon(var) => self
                .common
                .iter()
                .find(|c| &c.id == var)
                .map(|c| (c.name.clone(), c.values.clone())),
            ViewDimKey::Artefact { type_id, var } => {
                if self.common.iter().any(|c| &c.id == var) {
                    return None;
                }
                let art_type = self.catalog.artefact_type(type_id)?;
                let type_sel = self.selection.type_selection(type_id)?;
                let idx = art_type.var_index(var)?;
                Some((art_type.vars[idx].name.clone(), type_sel.values.get(idx)?.clone()))
            }
        }
    }

    fn check_new(&self, key: &ViewDimKey) -> Result<()> {
        if self.contains(key) {
            return Err(Error::view_dim(format!("dimension '{}' added twice", key)));
        }
        if self.resolve(key).is_none() {
            return Err(Error::view_dim(format!("unknown dimension '{}'", key)));
        }
        Ok(())
    }

    /// Add a shared dimension
    pub fn add_dim(&mut self, dim: ViewDim) -> Result<()> {
        if dim.key.is_type_specific() {
            return Err(Error::view_dim(format!(
                "dimension '{}' is specific to an artefact type",
                dim.key
            )));
        }
        self.check_new(&dim.key)?;
        self.shared.push(dim);
        Ok(())
    }

    /// Add a dimension specific to one artefact type
    pub fn add_type_dim(&mut self, type_id: &str, dim: ViewDim) -> Result<()> {
        match &dim.key {
            ViewDimKey::Artefact { type_id: key_type, .. } if key_type == type_id => {}
            _ => {
                return Err(Error::view_dim(format!(
                    "dimension '{}' is not specific to artefact type '{}'",
                    dim.key, type_id
                )))
            }
        }
        self.check_new(&dim.key)?;
        match self.per_type.iter_mut().find(|(id, _)| id == type_id) {
            Some((_, dims)) => dims.push(dim),
            None => self.per_type.push((type_id.to_string(), vec![dim])),
        }
        Ok(())
    }

    pub fn build(self) -> ViewIteration<'a> {
        let mut shared_dims = self.shared.clone();
        if !shared_dims.iter().any(|d| d.key == ViewDimKey::ArtefactType) {
            shared_dims.push(ViewDim::new(ViewDimKey::ArtefactType));
        }

        let mut empty = self.selection.types.is_empty()
            || self.selection.group.iter().any(VariableValueList::is_empty);

        let mut shared = Vec::with_capacity(shared_dims.len());
        for dim in &shared_dims {
            if let Some((label, values)) = self.resolve(&dim.key) {
                empty |= values.is_empty();
                shared.push(Level::new(dim, label, values, shared.len()));
            }
        }
        let shared_cnt = shared.len();
        let type_level = shared
            .iter()
            .position(|l| l.key == ViewDimKey::ArtefactType)
            .unwrap_or(0);

        let find_shared = |key: &ViewDimKey| shared.iter().position(|l| &l.key == key);

        let group_sources = self
            .catalog
            .group_vars
            .iter()
            .zip(&self.selection.group)
            .map(|(var, values)| match find_shared(&ViewDimKey::Group(var.id.clone())) {
                Some(idx) => Source::Shared(idx),
                None => Source::Fixed(values.first().unwrap_or_default().to_string()),
            })
            .collect();

        let mut types = Vec::with_capacity(self.selection.types.len());
        for type_sel in &self.selection.types {
            empty |= type_sel.values.iter().any(VariableValueList::is_empty);

            let dims = self
                .per_type
                .iter()
                .find(|(id, _)| id == &type_sel.type_id)
                .map(|(_, dims)| dims.as_slice())
                .unwrap_or(&[]);
            let mut levels = Vec::with_capacity(dims.len());
            for dim in dims {
                if let Some((label, values)) = self.resolve(&dim.key) {
                    empty |= values.is_empty();
                    levels.push(Level::new(dim, label, values, shared_cnt + levels.len()));
                }
            }

            let sources = match self.catalog.artefact_type(&type_sel.type_id) {
                Some(art_type) => art_type
                    .vars
                    .iter()
                    .zip(&type_sel.values)
                    .map(|(var, values)| {
                        let own = ViewDimKey::Artefact {
                            type_id: type_sel.type_id.clone(),
                            var: var.id.clone(),
                        };
                        if let Some(idx) = levels.iter().position(|l| l.key == own) {
                            Source::Own(idx)
                        } else if let Some(idx) =
                            find_shared(&ViewDimKey::ArtefactCommon(var.id.clone()))
                        {
                            Source::Shared(idx)
                        } else {
                            Source::Fixed(values.first().unwrap_or_default().to_string())
                        }
                    })
                    .collect(),
                None => Vec::new(),
            };

            types.push(TypeChain {
                type_id: type_sel.type_id.clone(),
                levels,
                sources,
            });
        }

        ViewIteration {
            catalog: self.catalog,
            shared,
            type_level,
            group_sources,
            types,
            empty,
        }
    }
}

/// Nested traversal over the product of all view dimensions
#[derive(Debug, Clone)]
pub struct ViewIteration<'a> {
    catalog: &'a Catalog,
    shared: Vec<Level>,
    type_level: usize,
    group_sources: Vec<Source>,
    types: Vec<TypeChain>,
    empty: bool,
}

impl<'a> ViewIteration<'a> {
    fn level(&self, node: ViewDimNode) -> &Level {
        match node.chain {
            Chain::Shared => &self.shared[node.level],
            Chain::Type(t) => &self.types[t].levels[node.level],
        }
    }

    fn level_mut(&mut self, node: ViewDimNode) -> &mut Level {
        match node.chain {
            Chain::Shared => &mut self.shared[node.level],
            Chain::Type(t) => &mut self.types[t].levels[node.level],
        }
    }

    fn current_type(&self) -> usize {
        self.shared[self.type_level].cursor
    }

    /// Number of dimensions on the deepest path
    pub fn dim_count(&self) -> usize {
        self.shared.len() + self.types.iter().map(|t| t.levels.len()).max().unwrap_or(0)
    }

    /// Root node with all cursors rewound, `None` if nothing can be shown
    pub fn start(&mut self) -> Option<ViewDimNode> {
        if self.empty || self.shared.is_empty() {
            return None;
        }
        for level in self
            .shared
            .iter_mut()
            .chain(self.types.iter_mut().flat_map(|t| t.levels.iter_mut()))
        {
            level.cursor = level.lo;
        }
        Some(ViewDimNode {
            chain: Chain::Shared,
            level: 0,
        })
    }

    /// The next inner level, rewound, or `None` at the innermost level
    pub fn next_dim(&mut self, node: ViewDimNode) -> Option<ViewDimNode> {
        let child = match node.chain {
            Chain::Shared if node.level + 1 < self.shared.len() => ViewDimNode {
                chain: Chain::Shared,
                level: node.level + 1,
            },
            Chain::Shared => {
                let t = self.current_type();
                if self.types.get(t)?.levels.is_empty() {
                    return None;
                }
                ViewDimNode {
                    chain: Chain::Type(t),
                    level: 0,
                }
            }
            Chain::Type(t) if node.level + 1 < self.types[t].levels.len() => ViewDimNode {
                chain: Chain::Type(t),
                level: node.level + 1,
            },
            Chain::Type(_) => return None,
        };
        self.reset(child);
        Some(child)
    }

    /// Advance the cursor; false once the range end is reached
    pub fn next(&mut self, node: ViewDimNode) -> bool {
        let level = self.level_mut(node);
        if level.cursor < level.hi {
            level.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self, node: ViewDimNode) {
        let level = self.level_mut(node);
        level.cursor = level.lo;
    }

    /// Number of values inside the range
    pub fn range(&self, node: ViewDimNode) -> usize {
        let level = self.level(node);
        level.hi - level.lo + 1
    }

    pub fn labels(&self, node: ViewDimNode) -> &[String] {
        let level = self.level(node);
        &level.values.labels()[level.lo..=level.hi]
    }

    pub fn values(&self, node: ViewDimNode) -> &[String] {
        let level = self.level(node);
        &level.values.values()[level.lo..=level.hi]
    }

    pub fn dim_idx(&self, node: ViewDimNode) -> usize {
        self.level(node).dim_idx
    }

    pub fn dim_label(&self, node: ViewDimNode) -> &str {
        &self.level(node).label
    }

    pub fn key(&self, node: ViewDimNode) -> &ViewDimKey {
        &self.level(node).key
    }

    /// Absolute index of the current value in the full value list
    pub fn index(&self, node: ViewDimNode) -> usize {
        self.level(node).cursor
    }

    /// Current (value, label)
    pub fn value(&self, node: ViewDimNode) -> (&str, &str) {
        let level = self.level(node);
        (
            level.current_value(),
            level.values.labels()[level.cursor].as_str(),
        )
    }

    /// Artefact type a type-specific level belongs to
    pub fn art_type(&self, node: ViewDimNode) -> Option<&str> {
        match node.chain {
            Chain::Shared => None,
            Chain::Type(t) => Some(self.types[t].type_id.as_str()),
        }
    }

    /// Artefact type at the current coordinate
    pub fn current_art_type(&self) -> Option<&str> {
        self.types
            .get(self.current_type())
            .map(|t| t.type_id.as_str())
    }

    /// Full variable coordinate at the current cursors
    fn coordinate(&self) -> Option<(&TypeChain, Vec<String>)> {
        let chain = self.types.get(self.current_type())?;
        let resolve = |source: &Source| match source {
            Source::Shared(idx) => self.shared[*idx].current_value().to_string(),
            Source::Own(idx) => chain.levels[*idx].current_value().to_string(),
            Source::Fixed(value) => value.clone(),
        };
        let values = self
            .group_sources
            .iter()
            .chain(chain.sources.iter())
            .map(resolve)
            .collect();
        Some((chain, values))
    }

    /// Artefact at the current coordinate, `None` if it was not produced
    pub fn artefact(&self) -> Option<&'a ArtefactReference> {
        let (chain, values) = self.coordinate()?;
        self.catalog.lookup(&chain.type_id, &values)
    }

    /// Category path of the levels from the root down to `node`
    pub fn category_path(&self, node: ViewDimNode) -> CategoryPath {
        let shared_end = match node.chain {
            Chain::Shared => node.level + 1,
            Chain::Type(_) => self.shared.len(),
        };
        let mut pairs: Vec<(&str, &str)> = self.shared[..shared_end]
            .iter()
            .map(|l| (l.key.var_id(), l.current_value()))
            .collect();
        if let Chain::Type(t) = node.chain {
            pairs.extend(
                self.types[t].levels[..=node.level]
                    .iter()
                    .map(|l| (l.key.var_id(), l.current_value())),
            );
        }
        CategoryPath::new(pairs)
    }
}
