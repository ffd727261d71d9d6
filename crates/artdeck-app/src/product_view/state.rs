//! Product view state of one variant group
//!
//! Holds the scanned catalog together with everything the user picked:
//! value selections, active artefact types, the assignment of variables to
//! view dimension slots, range windows and category values. Selections and
//! slot assignments are persisted per production group.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use artdeck_core::prelude::*;
use artdeck_core::selection::{self, toggle_artefact_type, EffectiveSelection, VarSelections};
use artdeck_core::view_dim::{
    available_dims, build_layout, common_vars, range_for_option, shared_slot_label,
    type_slot_label, LayoutConfig, LayoutNode, SlotAssignment, ViewDimKey, ViewIterationBuilder,
};
use artdeck_core::{BoolGroup, Catalog, CategoryPath, CategoryStore, PosRange, VariableValueList};

use super::cache::{self, ScanResult};
use crate::config::product_view::{
    load_categories, load_product_view, save_categories, save_product_view, ProductViewFile,
};

/// What a value selector filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorKey {
    Group(String),
    Common(String),
    Artefact { type_id: String, var: String },
}

/// A value selector to show
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub key: SelectorKey,
    pub label: String,
    pub options: VariableValueList,
    pub selection: Vec<String>,
}

/// One dimension slot with its current key
#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub label: String,
    pub key: ViewDimKey,
    pub key_label: String,
}

/// A shared or type-specific slot in display order
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRow {
    /// `None` for shared slots
    pub type_id: Option<String>,
    pub slot: usize,
    pub view: SlotView,
}

#[derive(Debug)]
pub struct ProductViewState {
    variant_group: PathBuf,
    group_id: String,
    group_ids: Vec<String>,
    catalog: Catalog,
    category_defs: BTreeMap<String, BoolGroup>,
    categories: CategoryStore,
    file: ProductViewFile,
    active: BTreeSet<String>,
    shared_slots: SlotAssignment,
    type_slots: Vec<(String, String, SlotAssignment)>,
    ranges: BTreeMap<ViewDimKey, PosRange>,
    layout_config: LayoutConfig,
    created: DateTime<Utc>,
    stale: bool,
}

impl ProductViewState {
    /// Build the state from a scan, restoring persisted choices
    pub fn new(variant_group: &Path, scan: ScanResult, layout_config: LayoutConfig) -> Self {
        let file = load_product_view(variant_group);
        let categories = load_categories(variant_group).unwrap_or_else(|e| {
            warn!("Category values of {} not loaded: {}", variant_group.display(), e);
            CategoryStore::default()
        });

        let group_id = scan.catalog.group_id.clone();
        let all_types = type_ids(&scan.catalog);
        let mut active: BTreeSet<String> = file
            .active_art_types
            .get(&group_id)
            .map(|stored| {
                stored
                    .iter()
                    .filter(|t| all_types.contains(t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if active.is_empty() {
            active = all_types.into_iter().collect();
        }

        let mut state = Self {
            variant_group: variant_group.to_path_buf(),
            group_id,
            group_ids: scan.group_ids,
            catalog: scan.catalog,
            category_defs: scan.categories,
            categories,
            file,
            active,
            shared_slots: SlotAssignment::assign(Vec::new(), &[]),
            type_slots: Vec::new(),
            ranges: BTreeMap::new(),
            layout_config,
            created: scan.created,
            stale: false,
        };
        state.refresh_dims();
        state
    }

    pub fn variant_group(&self) -> &Path {
        &self.variant_group
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn group_ids(&self) -> &[String] {
        &self.group_ids
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache_date(&self) -> String {
        cache::date_text(&self.created)
    }

    /// Production definition changed since the scan
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.layout_config = config;
    }

    // ─────────────────────────────────────────────────────────
    // Selections
    // ─────────────────────────────────────────────────────────

    fn group_sel(&self) -> Option<&VarSelections> {
        self.file.group_var_sel.get(&self.group_id)
    }

    fn type_sel(&self) -> Option<&BTreeMap<String, VarSelections>> {
        self.file.art_type_var_sel.get(&self.group_id)
    }

    /// Effective values of the current selection
    pub fn effective(&self) -> EffectiveSelection {
        let empty_group = VarSelections::new();
        let empty_types = BTreeMap::new();
        EffectiveSelection::resolve(
            &self.catalog,
            self.group_sel().unwrap_or(&empty_group),
            self.type_sel().unwrap_or(&empty_types),
            &self.active,
        )
    }

    /// Selectors for every variable with more than one value
    pub fn selectors(&self) -> Vec<Selector> {
        let mut out = Vec::new();
        for (var, values) in self.catalog.group_vars.iter().zip(&self.catalog.group_values) {
            if !selection::needs_selector(values) {
                continue;
            }
            let stored = self.group_sel().and_then(|s| s.get(&var.id));
            out.push(Selector {
                key: SelectorKey::Group(var.id.clone()),
                label: var.name.clone(),
                options: values.clone(),
                selection: selection::restore(stored.map(Vec::as_slice), values),
            });
        }

        let unfiltered = EffectiveSelection::resolve(
            &self.catalog,
            &VarSelections::new(),
            &BTreeMap::new(),
            &self.active,
        );
        let common = common_vars(&self.catalog, &unfiltered);
        for var in &common {
            if !selection::needs_selector(&var.values) {
                continue;
            }
            let stored = var
                .type_ids
                .first()
                .and_then(|t| self.type_sel().and_then(|s| s.get(t)))
                .and_then(|s| s.get(&var.id));
            out.push(Selector {
                key: SelectorKey::Common(var.id.clone()),
                label: var.name.clone(),
                options: var.values.clone(),
                selection: selection::restore(stored.map(Vec::as_slice), &var.values),
            });
        }

        for art_type in &self.catalog.artefact_types {
            if !self.active.contains(&art_type.id) {
                continue;
            }
            for (var, values) in art_type.vars.iter().zip(&art_type.values) {
                if !selection::needs_selector(values) || common.iter().any(|c| c.id == var.id) {
                    continue;
                }
                let stored = self
                    .type_sel()
                    .and_then(|s| s.get(&art_type.id))
                    .and_then(|s| s.get(&var.id));
                out.push(Selector {
                    key: SelectorKey::Artefact {
                        type_id: art_type.id.clone(),
                        var: var.id.clone(),
                    },
                    label: format!("{}: {}", art_type.name, var.name),
                    options: values.clone(),
                    selection: selection::restore(stored.map(Vec::as_slice), values),
                });
            }
        }
        out
    }

    /// Apply a selector change; the last entry is the value just picked
    pub fn set_selection(&mut self, key: &SelectorKey, picked: Vec<String>) -> Result<()> {
        let sel = selection::apply_change(picked);
        match key {
            SelectorKey::Group(var) => {
                self.file
                    .group_var_sel
                    .entry(self.group_id.clone())
                    .or_default()
                    .insert(var.clone(), sel);
            }
            SelectorKey::Common(var) => {
                let type_sel = self
                    .file
                    .art_type_var_sel
                    .entry(self.group_id.clone())
                    .or_default();
                let updated =
                    selection::propagate_common(&self.catalog, type_sel, &self.active, var, &sel);
                debug!("Selection of '{}' propagated to {:?}", var, updated);
            }
            SelectorKey::Artefact { type_id, var } => {
                self.file
                    .art_type_var_sel
                    .entry(self.group_id.clone())
                    .or_default()
                    .entry(type_id.clone())
                    .or_default()
                    .insert(var.clone(), sel);
            }
        }
        self.refresh_dims();
        self.save()
    }

    // ─────────────────────────────────────────────────────────
    // Artefact types
    // ─────────────────────────────────────────────────────────

    pub fn is_type_active(&self, type_id: &str) -> bool {
        self.active.contains(type_id)
    }

    /// Switch an artefact type on or off; one type always stays active
    pub fn toggle_type(&mut self, type_id: &str, on: bool) -> Result<()> {
        if self.catalog.artefact_type(type_id).is_none() {
            return Err(Error::view_dim(format!("unknown artefact type '{}'", type_id)));
        }
        let all_types = type_ids(&self.catalog);
        toggle_artefact_type(&mut self.active, &all_types, type_id, on);
        self.file
            .active_art_types
            .insert(self.group_id.clone(), self.active.iter().cloned().collect());
        self.refresh_dims();
        self.save()
    }

    // ─────────────────────────────────────────────────────────
    // Dimension slots and ranges
    // ─────────────────────────────────────────────────────────

    /// Reassign slots and ranges after the selection changed
    pub fn refresh_dims(&mut self) {
        let effective = self.effective();
        let dims = available_dims(&self.catalog, &effective);

        let stored = self
            .file
            .view_dim_names
            .get(&self.group_id)
            .cloned()
            .unwrap_or_default();
        self.shared_slots = SlotAssignment::assign(dims.shared, &stored);

        let stored_types = self
            .file
            .art_type_view_dim_names
            .get(&self.group_id)
            .cloned()
            .unwrap_or_default();
        self.type_slots = dims
            .per_type
            .into_iter()
            .filter(|(_, _, options)| !options.is_empty())
            .map(|(type_id, name, options)| {
                let stored = stored_types.get(&type_id).cloned().unwrap_or_default();
                let slots = SlotAssignment::assign(options, &stored);
                (type_id, name, slots)
            })
            .collect();

        let mut ranges = BTreeMap::new();
        let options = self
            .shared_slots
            .options()
            .iter()
            .chain(self.type_slots.iter().flat_map(|(_, _, s)| s.options().iter()));
        for option in options {
            let kept = self
                .ranges
                .remove(&option.key)
                .filter(|r| r.total_max() as usize == option.value_count);
            if let Some(range) = kept.or_else(|| range_for_option(option)) {
                ranges.insert(option.key.clone(), range);
            }
        }
        self.ranges = ranges;
    }

    fn slot_views(slots: &SlotAssignment, label: fn(usize) -> String) -> Vec<SlotView> {
        slots
            .slots()
            .iter()
            .enumerate()
            .map(|(idx, key)| SlotView {
                label: label(idx),
                key: key.clone(),
                key_label: slots
                    .option(key)
                    .map(|o| o.label.clone())
                    .unwrap_or_else(|| key.to_string()),
            })
            .collect()
    }

    pub fn shared_slots(&self) -> Vec<SlotView> {
        Self::slot_views(&self.shared_slots, shared_slot_label)
    }

    /// Type-specific slots: type id, type name, slots
    pub fn type_slots(&self) -> Vec<(String, String, Vec<SlotView>)> {
        self.type_slots
            .iter()
            .map(|(id, name, slots)| (id.clone(), name.clone(), Self::slot_views(slots, type_slot_label)))
            .collect()
    }

    /// Shared slots followed by the slots of every artefact type
    pub fn slot_rows(&self) -> Vec<SlotRow> {
        let shared = self.shared_slots().into_iter().enumerate().map(|(slot, view)| SlotRow {
            type_id: None,
            slot,
            view,
        });
        let typed = self.type_slots().into_iter().flat_map(|(type_id, _, views)| {
            views.into_iter().enumerate().map(move |(slot, view)| SlotRow {
                type_id: Some(type_id.clone()),
                slot,
                view,
            })
        });
        shared.chain(typed).collect()
    }

    /// Step the key of a slot row to the next or previous offered key
    pub fn cycle_slot(&mut self, row: usize, forward: bool) -> Result<()> {
        let row = self
            .slot_rows()
            .into_iter()
            .nth(row)
            .ok_or_else(|| Error::view_dim(format!("no dimension slot {}", row)))?;
        let options = match &row.type_id {
            Some(type_id) => self.type_options(type_id),
            None => self.shared_options(),
        };
        let n = options.len();
        if n < 2 {
            return Ok(());
        }
        let current = options.iter().position(|k| *k == row.view.key).unwrap_or(0);
        let next = if forward { (current + 1) % n } else { (current + n - 1) % n };
        let key = options[next].clone();
        match &row.type_id {
            Some(type_id) => self.select_type_slot(type_id, row.slot, key),
            None => self.select_shared_slot(row.slot, key),
        }
    }

    /// Keys offered for the shared slots
    pub fn shared_options(&self) -> Vec<ViewDimKey> {
        self.shared_slots.options().iter().map(|o| o.key.clone()).collect()
    }

    pub fn type_options(&self, type_id: &str) -> Vec<ViewDimKey> {
        self.type_slots
            .iter()
            .find(|(id, _, _)| id == type_id)
            .map(|(_, _, s)| s.options().iter().map(|o| o.key.clone()).collect())
            .unwrap_or_default()
    }

    /// Put `key` into a shared slot, swapping with the slot that held it
    pub fn select_shared_slot(&mut self, slot: usize, key: ViewDimKey) -> Result<()> {
        self.shared_slots.select(slot, key)?;
        self.file
            .view_dim_names
            .insert(self.group_id.clone(), self.shared_slots.to_stored());
        self.save()
    }

    pub fn select_type_slot(&mut self, type_id: &str, slot: usize, key: ViewDimKey) -> Result<()> {
        let (_, _, slots) = self
            .type_slots
            .iter_mut()
            .find(|(id, _, _)| id == type_id)
            .ok_or_else(|| Error::view_dim(format!("artefact type '{}' has no dimensions", type_id)))?;
        slots.select(slot, key)?;
        let stored = slots.to_stored();
        self.file
            .art_type_view_dim_names
            .entry(self.group_id.clone())
            .or_default()
            .insert(type_id.to_string(), stored);
        self.save()
    }

    /// Dimensions that offer a range window, in key order
    pub fn range_keys(&self) -> Vec<ViewDimKey> {
        self.ranges.keys().cloned().collect()
    }

    pub fn range(&self, key: &ViewDimKey) -> Option<&PosRange> {
        self.ranges.get(key)
    }

    pub fn range_mut(&mut self, key: &ViewDimKey) -> Option<&mut PosRange> {
        self.ranges.get_mut(key)
    }

    // ─────────────────────────────────────────────────────────
    // View
    // ─────────────────────────────────────────────────────────

    /// Lay out the current view, `None` when there are no artefacts
    pub fn layout(&self) -> Result<Option<LayoutNode>> {
        let effective = self.effective();
        let range_of = |key: &ViewDimKey| self.ranges.get(key).map(PosRange::index_window);

        let mut builder = ViewIterationBuilder::new(&self.catalog, &effective);
        for dim in self.shared_slots.view_dims(range_of) {
            builder.add_dim(dim)?;
        }
        for (type_id, _, slots) in &self.type_slots {
            for dim in slots.view_dims(range_of) {
                builder.add_type_dim(type_id, dim)?;
            }
        }
        let mut iteration = builder.build();
        Ok(build_layout(&mut iteration, &self.layout_config))
    }

    // ─────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────

    pub fn category_defs(&self) -> &BTreeMap<String, BoolGroup> {
        &self.category_defs
    }

    /// Choice index of a category at a path, the default if unset
    pub fn category(&self, path: &CategoryPath, category: &str) -> Option<usize> {
        let def = self.category_defs.get(category)?;
        Some(def.value_index(self.categories.get(path, category)))
    }

    pub fn set_category(&mut self, path: &CategoryPath, category: &str, value: usize) -> Result<()> {
        let def = self
            .category_defs
            .get(category)
            .ok_or_else(|| Error::view_dim(format!("unknown category '{}'", category)))?;
        let value = def.value_index(Some(value));
        self.categories.set(path, category, value);
        save_categories(&self.variant_group, &self.categories)
    }

    /// Step a category to its next choice
    pub fn cycle_category(&mut self, path: &CategoryPath, category: &str) -> Result<usize> {
        let def = self
            .category_defs
            .get(category)
            .ok_or_else(|| Error::view_dim(format!("unknown category '{}'", category)))?;
        let count = def.choices.len().max(1);
        let next = (def.value_index(self.categories.get(path, category)) + 1) % count;
        self.set_category(path, category, next)?;
        Ok(next)
    }

    fn save(&self) -> Result<()> {
        save_product_view(&self.variant_group, &self.file)
    }
}

fn type_ids(catalog: &Catalog) -> Vec<String> {
    catalog.artefact_types.iter().map(|t| t.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use artdeck_core::{ArtefactReference, ArtefactType, VarDecl};
    use artdeck_core::view_dim::ArtefactCell;
    use tempfile::TempDir;

    /// Group vars trial (4 values) and cam (3 values), one type `img` with
    /// a frame variable (2 values) and one type `depth` sharing `frame`.
    fn catalog() -> Catalog {
        let mut catalog = Catalog::new(
            "main",
            vec![VarDecl::new("trial", "Trial"), VarDecl::new("cam", "Camera")],
        );
        let frame = || vec![VarDecl::new("frame", "Frame")];
        catalog
            .add_artefact_type(ArtefactType::new("img", "Images", frame()))
            .unwrap();
        catalog
            .add_artefact_type(ArtefactType::new("depth", "Depth", frame()))
            .unwrap();
        for trial in ["t1", "t2", "t3", "t4"] {
            for cam in ["a", "b", "c"] {
                for frame in ["1", "2"] {
                    for type_id in ["img", "depth"] {
                        catalog
                            .insert(ArtefactReference {
                                type_id: type_id.to_string(),
                                path: PathBuf::from(format!("{}/{}/{}/{}.png", trial, cam, type_id, frame)),
                                vars: vec![
                                    ("trial".into(), trial.into()),
                                    ("cam".into(), cam.into()),
                                    ("frame".into(), frame.into()),
                                ],
                            })
                            .unwrap();
                    }
                }
            }
        }
        catalog
    }

    fn scan() -> ScanResult {
        let quality: BoolGroup = serde_json::from_value(serde_json::json!({
            "sName": "Quality",
            "lChoices": [{"sIcon": "check"}, {"sIcon": "close"}, {"sIcon": "help"}],
            "iDefaultValue": 0
        }))
        .unwrap();
        ScanResult {
            catalog: catalog(),
            group_ids: vec!["main".into()],
            categories: BTreeMap::from([("quality".to_string(), quality)]),
            created: Utc::now(),
            from_cache: false,
        }
    }

    fn state(dir: &Path) -> ProductViewState {
        ProductViewState::new(dir, scan(), LayoutConfig::default())
    }

    #[test]
    fn test_initial_slots_and_ranges() {
        let temp = TempDir::new().unwrap();
        let state = state(temp.path());
        let keys: Vec<String> = state.shared_slots().iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["grp:trial", "grp:cam", "arttype", "artcom:frame"]);
        assert_eq!(state.shared_slots()[0].label, "Along Row 1");
        assert_eq!(state.shared_slots()[1].label, "Along Column 1");
        assert!(state.range(&ViewDimKey::Group("trial".into())).is_some());
        assert!(state.range(&ViewDimKey::Group("cam".into())).is_none());
    }

    #[test]
    fn test_full_layout_leaf_count() {
        let temp = TempDir::new().unwrap();
        let state = state(temp.path());
        let layout = state.layout().unwrap().unwrap();
        assert_eq!(layout.leaf_count(), 4 * 3 * 2 * 2);
    }

    #[test]
    fn test_range_restricts_layout() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        let trial = ViewDimKey::Group("trial".into());
        state.range_mut(&trial).unwrap().set_values(2.0, 3.0);
        let layout = state.layout().unwrap().unwrap();
        assert_eq!(layout.leaf_count(), 2 * 3 * 2 * 2);
    }

    #[test]
    fn test_group_selection_persists() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        state
            .set_selection(&SelectorKey::Group("cam".into()), vec![selection::ALL.into(), "b".into()])
            .unwrap();
        assert_eq!(state.layout().unwrap().unwrap().leaf_count(), 4 * 2 * 2);

        let restored = ProductViewState::new(temp.path(), scan(), LayoutConfig::default());
        let cam = restored
            .selectors()
            .into_iter()
            .find(|s| s.key == SelectorKey::Group("cam".into()))
            .unwrap();
        assert_eq!(cam.selection, vec!["b"]);
    }

    #[test]
    fn test_common_selection_propagates() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        state
            .set_selection(&SelectorKey::Common("frame".into()), vec!["2".into()])
            .unwrap();
        let effective = state.effective();
        for type_sel in &effective.types {
            assert_eq!(type_sel.values[0].values(), ["2"]);
        }
    }

    #[test]
    fn test_last_type_stays_active() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        state.toggle_type("img", false).unwrap();
        assert!(!state.is_type_active("img"));
        state.toggle_type("depth", false).unwrap();
        assert!(state.is_type_active("img"));
        assert!(!state.is_type_active("depth"));
        assert!(state.toggle_type("nope", true).is_err());
    }

    #[test]
    fn test_slot_swap_persists() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        state
            .select_shared_slot(0, ViewDimKey::Group("cam".into()))
            .unwrap();
        let keys: Vec<String> = state.shared_slots().iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys[..2], ["grp:cam", "grp:trial"]);

        let restored = ProductViewState::new(temp.path(), scan(), LayoutConfig::default());
        assert_eq!(restored.shared_slots()[0].key, ViewDimKey::Group("cam".into()));
    }

    #[test]
    fn test_categories_roundtrip_through_reordered_path() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        let written = CategoryPath::new([("trial", "t1"), ("cam", "a")]);
        assert_eq!(state.category(&written, "quality"), Some(0));
        assert_eq!(state.cycle_category(&written, "quality").unwrap(), 1);

        let restored = ProductViewState::new(temp.path(), scan(), LayoutConfig::default());
        let reread = CategoryPath::new([("cam", "a"), ("trial", "t1")]);
        assert_eq!(restored.category(&reread, "quality"), Some(1));
        assert!(restored.category(&reread, "unknown").is_none());
    }

    #[test]
    fn test_set_category_clamps() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        let path = CategoryPath::new([("trial", "t2")]);
        state.set_category(&path, "quality", 99).unwrap();
        assert_eq!(state.category(&path, "quality"), Some(2));
    }

    #[test]
    fn test_layout_cells_present() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        state
            .set_selection(&SelectorKey::Group("trial".into()), vec!["t1".into()])
            .unwrap();
        state
            .set_selection(&SelectorKey::Group("cam".into()), vec!["a".into()])
            .unwrap();
        state.toggle_type("depth", false).unwrap();
        state
            .set_selection(&SelectorKey::Artefact { type_id: "img".into(), var: "frame".into() }, vec!["1".into()])
            .unwrap();
        let layout = state.layout().unwrap().unwrap();
        assert_eq!(layout.leaf_count(), 1);
        assert!(matches!(first_cell(&layout), Some(ArtefactCell::Present { type_id, .. }) if type_id == "img"));
    }

    fn first_cell(node: &LayoutNode) -> Option<&ArtefactCell> {
        match node {
            LayoutNode::Artefact(cell) => Some(cell),
            LayoutNode::Column(nodes) => nodes.iter().find_map(first_cell),
            LayoutNode::Row { blocks, .. } => blocks
                .iter()
                .flat_map(|b| b.columns.iter())
                .filter_map(|c| c.content.as_ref())
                .find_map(first_cell),
        }
    }

    #[test]
    fn test_cycle_slot_swaps_keys() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        let rows = state.slot_rows();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.type_id.is_none()));

        state.cycle_slot(0, true).unwrap();
        let keys: Vec<String> = state.slot_rows().iter().map(|r| r.view.key.to_string()).collect();
        assert_eq!(keys[0], "grp:cam");
        assert_eq!(keys[1], "grp:trial");
        assert!(state.cycle_slot(9, true).is_err());
    }

    #[test]
    fn test_stale_flag() {
        let temp = TempDir::new().unwrap();
        let mut state = state(temp.path());
        assert!(!state.is_stale());
        state.mark_stale();
        assert!(state.is_stale());
    }
}
