//! Artefact catalog of one variant group
//!
//! The catalog is the result of a production scan: for one production group
//! it holds the discovered values of every group path variable, the artefact
//! types with their own path variables, and the artefact files indexed by
//! their full variable coordinate.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ordered (value, label) pairs of one discrete variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValueList {
    values: Vec<String>,
    labels: Vec<String>,
}

impl VariableValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (value, label) pairs; duplicate values are an error
    pub fn from_pairs<I, V, L>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, L)>,
        V: Into<String>,
        L: Into<String>,
    {
        let mut list = Self::new();
        for (value, label) in pairs {
            let value = value.into();
            if !list.push(value.clone(), label) {
                return Err(Error::scan(format!("duplicate value '{}'", value)));
            }
        }
        Ok(list)
    }

    /// Build from values that double as labels; duplicates are skipped
    pub fn from_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut list = Self::new();
        for value in values {
            let value = value.into();
            list.push(value.clone(), value);
        }
        list
    }

    /// Append a pair. Returns false if the value is already present.
    pub fn push(&mut self, value: impl Into<String>, label: impl Into<String>) -> bool {
        let value = value.into();
        if self.contains(&value) {
            return false;
        }
        self.values.push(value);
        self.labels.push(label.into());
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    pub fn label_of(&self, value: &str) -> Option<&str> {
        self.position(value).map(|idx| self.labels[idx].as_str())
    }

    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    pub fn get(&self, idx: usize) -> Option<(&str, &str)> {
        Some((self.values.get(idx)?.as_str(), self.labels.get(idx)?.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter().map(String::as_str))
    }

    /// Sub-list of the given values in selection order, skipping unknown ones
    pub fn select(&self, selection: &[String]) -> Self {
        let mut list = Self::new();
        for value in selection {
            if let Some(label) = self.label_of(value) {
                list.push(value.clone(), label);
            }
        }
        list
    }

    /// Union keeping first-seen order
    pub fn merge(&mut self, other: &VariableValueList) {
        for (value, label) in other.iter() {
            self.push(value, label);
        }
    }
}

/// A path variable declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub id: String,
    pub name: String,
}

impl VarDecl {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One artefact type of a production group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtefactType {
    pub id: String,
    pub name: String,
    pub vars: Vec<VarDecl>,
    /// Discovered values, parallel to `vars`
    pub values: Vec<VariableValueList>,
    /// Metadata declarations (tooltips), passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ArtefactType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, vars: Vec<VarDecl>) -> Self {
        let values = vec![VariableValueList::new(); vars.len()];
        Self {
            id: id.into(),
            name: name.into(),
            vars,
            values,
            meta: None,
        }
    }

    pub fn var_index(&self, var_id: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.id == var_id)
    }

    pub fn values_of(&self, var_id: &str) -> Option<&VariableValueList> {
        self.var_index(var_id).map(|idx| &self.values[idx])
    }
}

/// An artefact file and the variable values that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtefactReference {
    pub type_id: String,
    pub path: PathBuf,
    /// Group variable pairs followed by artefact variable pairs
    pub vars: Vec<(String, String)>,
}

impl ArtefactReference {
    pub fn value_of(&self, var_id: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(id, _)| id == var_id)
            .map(|(_, value)| value.as_str())
    }
}

type IndexKey = (String, Vec<String>);

/// Discovered artefacts of one production group
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub group_id: String,
    pub group_vars: Vec<VarDecl>,
    /// Discovered values, parallel to `group_vars`
    pub group_values: Vec<VariableValueList>,
    pub artefact_types: Vec<ArtefactType>,
    artefacts: Vec<ArtefactReference>,
    #[serde(skip)]
    index: HashMap<IndexKey, usize>,
}

impl Catalog {
    pub fn new(group_id: impl Into<String>, group_vars: Vec<VarDecl>) -> Self {
        let group_values = vec![VariableValueList::new(); group_vars.len()];
        Self {
            group_id: group_id.into(),
            group_vars,
            group_values,
            ..Default::default()
        }
    }

    pub fn add_artefact_type(&mut self, art_type: ArtefactType) -> Result<()> {
        if self.artefact_type(&art_type.id).is_some() {
            return Err(Error::scan(format!(
                "artefact type '{}' declared twice",
                art_type.id
            )));
        }
        self.artefact_types.push(art_type);
        Ok(())
    }

    pub fn artefact_type(&self, type_id: &str) -> Option<&ArtefactType> {
        self.artefact_types.iter().find(|t| t.id == type_id)
    }

    pub fn group_var_index(&self, var_id: &str) -> Option<usize> {
        self.group_vars.iter().position(|v| v.id == var_id)
    }

    pub fn has_group_data(&self) -> bool {
        !self.artefacts.is_empty()
    }

    pub fn artefacts(&self) -> &[ArtefactReference] {
        &self.artefacts
    }

    /// Register an artefact.
    ///
    /// The variable pairs must list every group variable followed by every
    /// variable of the artefact type, in declaration order. Their values are
    /// added to the discovered value lists.
    pub fn insert(&mut self, artefact: ArtefactReference) -> Result<()> {
        let type_idx = self
            .artefact_types
            .iter()
            .position(|t| t.id == artefact.type_id)
            .ok_or_else(|| {
                Error::scan(format!("unknown artefact type '{}'", artefact.type_id))
            })?;

        let group_cnt = self.group_vars.len();
        let art_type = &self.artefact_types[type_idx];
        let expected = self
            .group_vars
            .iter()
            .chain(art_type.vars.iter())
            .map(|v| v.id.as_str());
        let given = artefact.vars.iter().map(|(id, _)| id.as_str());
        if !expected.eq(given) {
            return Err(Error::scan(format!(
                "variables of '{}' do not match its artefact type",
                artefact.path.display()
            )));
        }

        let key = (
            artefact.type_id.clone(),
            artefact.vars.iter().map(|(_, v)| v.clone()).collect(),
        );
        if self.index.contains_key(&key) {
            return Ok(());
        }

        for (idx, (_, value)) in artefact.vars.iter().enumerate() {
            if idx < group_cnt {
                self.group_values[idx].push(value.clone(), value.clone());
            } else {
                self.artefact_types[type_idx].values[idx - group_cnt]
                    .push(value.clone(), value.clone());
            }
        }

        self.index.insert(key, self.artefacts.len());
        self.artefacts.push(artefact);
        Ok(())
    }

    /// Rebuild the lookup index, needed after deserialization
    pub fn rebuild_index(&mut self) {
        self.index = self
            .artefacts
            .iter()
            .enumerate()
            .map(|(idx, art)| {
                (
                    (
                        art.type_id.clone(),
                        art.vars.iter().map(|(_, v)| v.clone()).collect(),
                    ),
                    idx,
                )
            })
            .collect();
    }

    /// Look up the artefact at a full coordinate
    pub fn lookup(&self, type_id: &str, values: &[String]) -> Option<&ArtefactReference> {
        let key = (type_id.to_string(), values.to_vec());
        self.index.get(&key).map(|&idx| &self.artefacts[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn art(type_id: &str, path: &str, vars: &[(&str, &str)]) -> ArtefactReference {
        ArtefactReference {
            type_id: type_id.to_string(),
            path: PathBuf::from(path),
            vars: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn sample() -> Catalog {
        let mut catalog = Catalog::new("rq0001", vec![VarDecl::new("trial", "Trial")]);
        catalog
            .add_artefact_type(ArtefactType::new(
                "images",
                "Images",
                vec![VarDecl::new("frame", "Frame")],
            ))
            .unwrap();
        catalog
    }

    #[test]
    fn test_value_list_rejects_duplicates() {
        let err = VariableValueList::from_pairs([("a", "A"), ("a", "A2")]).unwrap_err();
        assert!(err.to_string().contains("duplicate value 'a'"));

        let list = VariableValueList::from_values(["a", "b", "a"]);
        assert_eq!(list.values(), &["a", "b"]);
        assert_eq!(list.labels().len(), list.values().len());
    }

    #[test]
    fn test_value_list_select_keeps_selection_order() {
        let list = VariableValueList::from_pairs([("1", "One"), ("2", "Two"), ("3", "Three")])
            .unwrap();
        let sel = list.select(&["3".to_string(), "x".to_string(), "1".to_string()]);
        assert_eq!(sel.values(), &["3", "1"]);
        assert_eq!(sel.labels(), &["Three", "One"]);
    }

    #[test]
    fn test_insert_collects_values_and_indexes() {
        let mut catalog = sample();
        catalog
            .insert(art("images", "/p/t1/f1.png", &[("trial", "t1"), ("frame", "1")]))
            .unwrap();
        catalog
            .insert(art("images", "/p/t1/f2.png", &[("trial", "t1"), ("frame", "2")]))
            .unwrap();

        assert!(catalog.has_group_data());
        assert_eq!(catalog.group_values[0].values(), &["t1"]);
        assert_eq!(
            catalog.artefact_type("images").unwrap().values[0].values(),
            &["1", "2"]
        );

        let found = catalog
            .lookup("images", &["t1".to_string(), "2".to_string()])
            .unwrap();
        assert_eq!(found.path, PathBuf::from("/p/t1/f2.png"));
        assert_eq!(found.value_of("frame"), Some("2"));
        assert!(catalog
            .lookup("images", &["t1".to_string(), "3".to_string()])
            .is_none());
    }

    #[test]
    fn test_insert_rejects_mismatched_variables() {
        let mut catalog = sample();
        assert!(catalog
            .insert(art("images", "/x.png", &[("frame", "1"), ("trial", "t1")]))
            .is_err());
        assert!(catalog
            .insert(art("depth", "/x.exr", &[("trial", "t1"), ("frame", "1")]))
            .is_err());
    }

    #[test]
    fn test_rebuild_index_after_deserialize() {
        let mut catalog = sample();
        catalog
            .insert(art("images", "/p/f1.png", &[("trial", "t1"), ("frame", "1")]))
            .unwrap();

        let json = serde_json::to_string(&catalog).unwrap();
        let mut restored: Catalog = serde_json::from_str(&json).unwrap();
        assert!(restored
            .lookup("images", &["t1".to_string(), "1".to_string()])
            .is_none());

        restored.rebuild_index();
        assert!(restored
            .lookup("images", &["t1".to_string(), "1".to_string()])
            .is_some());
    }
}
