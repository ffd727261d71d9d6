//! Ordered, keyed tab collection

use std::collections::HashMap;

use artdeck_core::prelude::*;

/// Tab id of the product view of a project
pub fn product_view_tab_id(project: &str) -> String {
    format!("prod-view:{}", project)
}

/// What a tab shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabKind {
    /// Launch arguments and trial values of the selected project
    Configuration,
    ProductView { project: String },
    Launch { instance_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub key: String,
    pub title: String,
    pub icon: Option<String>,
    pub visible: bool,
    pub kind: TabKind,
}

impl Tab {
    pub fn new(key: impl Into<String>, title: impl Into<String>, kind: TabKind) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            icon: None,
            visible: true,
            kind,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

#[derive(Debug, Default)]
pub struct Tabs {
    tabs: HashMap<String, Tab>,
    order: Vec<String>,
    selected: Option<String>,
}

impl Tabs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tab. The first tab added is selected.
    pub fn add(&mut self, tab: Tab) -> Result<()> {
        if self.tabs.contains_key(&tab.key) {
            return Err(Error::tab(format!("Tab with key '{}' already exists", tab.key)));
        }
        if self.selected.is_none() {
            self.selected = Some(tab.key.clone());
        }
        self.order.push(tab.key.clone());
        self.tabs.insert(tab.key.clone(), tab);
        Ok(())
    }

    /// Remove a tab; a removed selected tab passes the selection on to the
    /// next tab, or the previous one if it was last.
    pub fn remove(&mut self, key: &str) -> Option<Tab> {
        let pos = self.order.iter().position(|k| k == key)?;
        self.order.remove(pos);
        if self.selected.as_deref() == Some(key) {
            self.selected = self
                .order
                .get(pos)
                .or_else(|| self.order.last())
                .cloned();
        }
        self.tabs.remove(key)
    }

    pub fn select(&mut self, key: &str) -> Result<()> {
        if !self.tabs.contains_key(key) {
            return Err(Error::tab(format!("Tab with key '{}' does not exist", key)));
        }
        self.selected = Some(key.to_string());
        Ok(())
    }

    pub fn select_next(&mut self) {
        self.step(1);
    }

    pub fn select_previous(&mut self) {
        self.step(self.order.len().saturating_sub(1));
    }

    fn step(&mut self, by: usize) {
        if self.order.is_empty() {
            return;
        }
        let current = self.selected_index().unwrap_or(0);
        let next = (current + by) % self.order.len();
        self.selected = self.order.get(next).cloned();
    }

    pub fn selected(&self) -> Option<&Tab> {
        self.selected.as_ref().and_then(|k| self.tabs.get(k))
    }

    pub fn selected_key(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        let key = self.selected.as_ref()?;
        self.order.iter().position(|k| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&Tab> {
        self.tabs.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.tabs.contains_key(key)
    }

    pub fn set_icon(&mut self, key: &str, icon: Option<&str>) -> Result<()> {
        let tab = self
            .tabs
            .get_mut(key)
            .ok_or_else(|| Error::tab(format!("Tab with key '{}' does not exist", key)))?;
        tab.icon = icon.map(str::to_string);
        Ok(())
    }

    pub fn set_visible(&mut self, key: &str, visible: bool) -> Result<()> {
        let tab = self
            .tabs
            .get_mut(key)
            .ok_or_else(|| Error::tab(format!("Tab with key '{}' does not exist", key)))?;
        tab.visible = visible;
        Ok(())
    }

    /// Keys in display order
    pub fn keys(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.order.iter().filter_map(|k| self.tabs.get(k))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.tabs.clear();
        self.order.clear();
        self.selected = None;
    }
}
