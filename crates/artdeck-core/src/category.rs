//! User-assignable categories per traversal path

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Set of (variable id, value) pairs addressing a traversal path.
///
/// Pairs are kept sorted by variable id, so paths that reach the same
/// coordinate through a different dimension order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CategoryPath {
    pairs: Vec<(String, String)>,
}

impl CategoryPath {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        pairs.sort();
        pairs.dedup_by(|a, b| a.0 == b.0);
        Self { pairs }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Stable string key used in the persisted dictionary
    pub fn key(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", escape(k), escape(v)))
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace('=', "\\=")
}

/// One choice of a boolean group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(rename = "sIcon")]
    pub icon: String,
    #[serde(rename = "sColor", default)]
    pub color: String,
    #[serde(rename = "sDescription", default)]
    pub description: String,
}

/// Category type offering one of several exclusive choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolGroup {
    #[serde(rename = "sName", default)]
    pub name: String,
    #[serde(rename = "lChoices")]
    pub choices: Vec<Choice>,
    #[serde(rename = "iDefaultValue", default)]
    pub default_index: usize,
}

impl BoolGroup {
    /// Index to display for a stored value, clamped to the choices
    pub fn value_index(&self, stored: Option<usize>) -> usize {
        let idx = stored.unwrap_or(self.default_index);
        idx.min(self.choices.len().saturating_sub(1))
    }

    /// Colour of a selected choice, falling back to the theme's primary
    pub fn color_of(&self, idx: usize) -> &str {
        match self.choices.get(idx) {
            Some(choice) if !choice.color.is_empty() => &choice.color,
            _ => "primary",
        }
    }
}

/// Category values of one variant group, keyed by path then category id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStore {
    #[serde(rename = "mValues", default)]
    values: BTreeMap<String, BTreeMap<String, usize>>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &CategoryPath, category: &str) -> Option<usize> {
        self.values.get(&path.key())?.get(category).copied()
    }

    pub fn set(&mut self, path: &CategoryPath, category: &str, value: usize) {
        self.values
            .entry(path.key())
            .or_default()
            .insert(category.to_string(), value);
    }

    pub fn remove(&mut self, path: &CategoryPath, category: &str) -> Option<usize> {
        let key = path.key();
        let entry = self.values.get_mut(&key)?;
        let old = entry.remove(category);
        if entry.is_empty() {
            self.values.remove(&key);
        }
        old
    }

    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> BoolGroup {
        BoolGroup {
            name: "Quality".to_string(),
            choices: vec![
                Choice {
                    icon: "thumb_up".to_string(),
                    color: "positive".to_string(),
                    description: "Good".to_string(),
                },
                Choice {
                    icon: "thumb_down".to_string(),
                    color: String::new(),
                    description: "Bad".to_string(),
                },
            ],
            default_index: 5,
        }
    }

    #[test]
    fn test_path_is_order_insensitive() {
        let a = CategoryPath::new([("trial", "t1"), ("frame", "3")]);
        let b = CategoryPath::new([("frame", "3"), ("trial", "t1")]);
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_path_key_escapes_separators() {
        let a = CategoryPath::new([("a", "x;b=y")]);
        let b = CategoryPath::new([("a", "x"), ("b", "y")]);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_store_reads_back_through_reordered_path() {
        let mut store = CategoryStore::new();
        let written = CategoryPath::new([("cam", "left"), ("frame", "1")]);
        store.set(&written, "quality", 1);

        let reread = CategoryPath::new([("frame", "1"), ("cam", "left")]);
        assert_eq!(store.get(&reread, "quality"), Some(1));
        assert_eq!(store.get(&reread, "other"), None);
    }

    #[test]
    fn test_store_roundtrips_json() {
        let mut store = CategoryStore::new();
        store.set(&CategoryPath::new([("frame", "1")]), "quality", 0);
        let json = serde_json::to_string(&store).unwrap();
        let restored: CategoryStore = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn test_remove_drops_empty_paths() {
        let mut store = CategoryStore::new();
        let path = CategoryPath::new([("frame", "1")]);
        store.set(&path, "quality", 0);
        assert_eq!(store.remove(&path, "quality"), Some(0));
        assert!(store.is_empty());
    }

    #[test]
    fn test_bool_group_clamps_index() {
        let group = group();
        assert_eq!(group.value_index(None), 1);
        assert_eq!(group.value_index(Some(0)), 0);
        assert_eq!(group.value_index(Some(9)), 1);
        assert_eq!(group.color_of(0), "positive");
        assert_eq!(group.color_of(1), "primary");
    }
}
