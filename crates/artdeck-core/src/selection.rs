//! Variable value selection with the "all" sentinel
//!
//! Each selector holds either `[ALL]` (no filtering) or a list of concrete
//! values. Selections are persisted per variant group and re-validated
//! against the discovered values whenever the catalog changes.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Catalog, VariableValueList};

/// Sentinel entry meaning "do not filter"
pub const ALL: &str = "* All";

/// Display label of the [`ALL`] entry
pub const ALL_LABEL: &str = "All";

/// Selected values per variable id
pub type VarSelections = BTreeMap<String, Vec<String>>;

pub fn all() -> Vec<String> {
    vec![ALL.to_string()]
}

pub fn is_all(selection: &[String]) -> bool {
    selection.iter().any(|s| s == ALL)
}

/// Normalize a selector value after a user change.
///
/// The last entry is the one just picked: picking `ALL` clears concrete
/// values, picking a concrete value while `ALL` is selected replaces it.
pub fn apply_change(selection: Vec<String>) -> Vec<String> {
    let Some(last) = selection.last().cloned() else {
        return all();
    };
    if last == ALL {
        all()
    } else if is_all(&selection) {
        vec![last]
    } else {
        selection
    }
}

/// Validate a stored selection against the current options
pub fn restore(stored: Option<&[String]>, options: &VariableValueList) -> Vec<String> {
    let Some(stored) = stored else {
        return all();
    };
    let valid: Vec<String> = stored
        .iter()
        .filter(|s| *s == ALL || options.contains(s))
        .cloned()
        .collect();
    if valid.is_empty() {
        all()
    } else {
        valid
    }
}

/// Values that take part in the view
pub fn effective(selection: &[String], discovered: &VariableValueList) -> VariableValueList {
    if selection.is_empty() || is_all(selection) {
        discovered.clone()
    } else {
        discovered.select(selection)
    }
}

/// Only variables with more than one discovered value get a selector
pub fn needs_selector(discovered: &VariableValueList) -> bool {
    discovered.len() > 1
}

/// Effective values of one active artefact type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSelection {
    pub type_id: String,
    /// Parallel to the artefact type's variables
    pub values: Vec<VariableValueList>,
}

/// Effective value lists of a whole catalog
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectiveSelection {
    /// Parallel to the catalog's group variables
    pub group: Vec<VariableValueList>,
    /// Active artefact types in catalog order
    pub types: Vec<TypeSelection>,
}

impl EffectiveSelection {
    /// Apply stored selections to a catalog.
    ///
    /// Artefact types missing from `active` are left out entirely.
    pub fn resolve(
        catalog: &Catalog,
        group_sel: &VarSelections,
        type_sel: &BTreeMap<String, VarSelections>,
        active: &BTreeSet<String>,
    ) -> Self {
        let group = catalog
            .group_vars
            .iter()
            .zip(&catalog.group_values)
            .map(|(var, discovered)| {
                let sel = restore(group_sel.get(&var.id).map(Vec::as_slice), discovered);
                effective(&sel, discovered)
            })
            .collect();

        let types = catalog
            .artefact_types
            .iter()
            .filter(|t| active.contains(&t.id))
            .map(|t| {
                let stored = type_sel.get(&t.id);
                let values = t
                    .vars
                    .iter()
                    .zip(&t.values)
                    .map(|(var, discovered)| {
                        let sel = restore(
                            stored.and_then(|s| s.get(&var.id)).map(Vec::as_slice),
                            discovered,
                        );
                        effective(&sel, discovered)
                    })
                    .collect();
                TypeSelection {
                    type_id: t.id.clone(),
                    values,
                }
            })
            .collect();

        Self { group, types }
    }

    /// Everything selected, all types active
    pub fn unfiltered(catalog: &Catalog) -> Self {
        let active = catalog.artefact_types.iter().map(|t| t.id.clone()).collect();
        Self::resolve(catalog, &VarSelections::new(), &BTreeMap::new(), &active)
    }

    pub fn type_selection(&self, type_id: &str) -> Option<&TypeSelection> {
        self.types.iter().find(|t| t.type_id == type_id)
    }
}

/// Toggle an artefact type on or off.
///
/// Switching off the last active type switches every other type back on.
pub fn toggle_artefact_type(
    active: &mut BTreeSet<String>,
    all_types: &[String],
    type_id: &str,
    on: bool,
) {
    if on {
        active.insert(type_id.to_string());
        return;
    }
    active.remove(type_id);
    if active.is_empty() {
        active.extend(all_types.iter().filter(|t| *t != type_id).cloned());
        if active.is_empty() {
            active.insert(type_id.to_string());
        }
    }
}

/// Copy a changed artefact variable selection to every active type that has
/// the same variable. Returns the ids of the types that were updated.
pub fn propagate_common(
    catalog: &Catalog,
    type_sel: &mut BTreeMap<String, VarSelections>,
    active: &BTreeSet<String>,
    var_id: &str,
    selection: &[String],
) -> Vec<String> {
    let mut updated = Vec::new();
    for art_type in &catalog.artefact_types {
        if !active.contains(&art_type.id) {
            continue;
        }
        let Some(discovered) = art_type.values_of(var_id) else {
            continue;
        };
        if !needs_selector(discovered) {
            continue;
        }
        let sel = restore(Some(selection), discovered);
        type_sel
            .entry(art_type.id.clone())
            .or_default()
            .insert(var_id.to_string(), sel);
        updated.push(art_type.id.clone());
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArtefactReference, ArtefactType, VarDecl};
    use std::path::PathBuf;

    fn s(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new("g", vec![VarDecl::new("trial", "Trial")]);
        for type_id in ["rgb", "depth"] {
            catalog
                .add_artefact_type(ArtefactType::new(
                    type_id,
                    type_id,
                    vec![VarDecl::new("frame", "Frame")],
                ))
                .unwrap();
        }
        for (type_id, trial, frame) in [
            ("rgb", "t1", "1"),
            ("rgb", "t2", "2"),
            ("depth", "t1", "1"),
            ("depth", "t1", "3"),
        ] {
            catalog
                .insert(ArtefactReference {
                    type_id: type_id.to_string(),
                    path: PathBuf::from(format!("/{type_id}/{trial}/{frame}")),
                    vars: vec![
                        ("trial".to_string(), trial.to_string()),
                        ("frame".to_string(), frame.to_string()),
                    ],
                })
                .unwrap();
        }
        catalog
    }

    #[test]
    fn test_apply_change_rules() {
        assert_eq!(apply_change(vec![]), all());
        assert_eq!(apply_change(s(&["a", ALL])), all());
        assert_eq!(apply_change(s(&[ALL, "b"])), s(&["b"]));
        assert_eq!(apply_change(s(&["a", "b"])), s(&["a", "b"]));
    }

    #[test]
    fn test_restore_filters_and_falls_back() {
        let options = VariableValueList::from_values(["a", "b"]);
        assert_eq!(restore(None, &options), all());
        assert_eq!(restore(Some(&s(&["b", "zz"])), &options), s(&["b"]));
        assert_eq!(restore(Some(&s(&["zz"])), &options), all());
    }

    #[test]
    fn test_effective_list() {
        let discovered = VariableValueList::from_values(["a", "b", "c"]);
        assert_eq!(effective(&all(), &discovered), discovered);
        assert_eq!(effective(&s(&["c", "a"]), &discovered).values(), &["c", "a"]);
    }

    #[test]
    fn test_resolve_skips_inactive_types() {
        let catalog = catalog();
        let mut group_sel = VarSelections::new();
        group_sel.insert("trial".to_string(), s(&["t1"]));
        let active: BTreeSet<String> = ["depth".to_string()].into();

        let sel = EffectiveSelection::resolve(&catalog, &group_sel, &BTreeMap::new(), &active);
        assert_eq!(sel.group[0].values(), &["t1"]);
        assert_eq!(sel.types.len(), 1);
        assert_eq!(sel.types[0].type_id, "depth");
        assert_eq!(sel.types[0].values[0].values(), &["1", "3"]);
    }

    #[test]
    fn test_toggle_keeps_one_type_active() {
        let all_types = s(&["rgb", "depth"]);
        let mut active: BTreeSet<String> = ["rgb".to_string()].into();
        toggle_artefact_type(&mut active, &all_types, "rgb", false);
        assert_eq!(active, ["depth".to_string()].into());

        toggle_artefact_type(&mut active, &all_types, "rgb", true);
        assert_eq!(active.len(), 2);
    }

    #[test]
    fn test_propagate_common_selection() {
        let catalog = catalog();
        let active: BTreeSet<String> = ["rgb".to_string(), "depth".to_string()].into();
        let mut type_sel = BTreeMap::new();

        let updated = propagate_common(&catalog, &mut type_sel, &active, "frame", &s(&["1"]));
        assert_eq!(updated, s(&["rgb", "depth"]));
        assert_eq!(type_sel["rgb"]["frame"], s(&["1"]));
        assert_eq!(type_sel["depth"]["frame"], s(&["1"]));

        // "3" only exists for depth, rgb falls back to all
        propagate_common(&catalog, &mut type_sel, &active, "frame", &s(&["3"]));
        assert_eq!(type_sel["rgb"]["frame"], all());
        assert_eq!(type_sel["depth"]["frame"], s(&["3"]));
    }
}
