//! Per-client page state
//!
//! One [`ClientState`] exists per connected client: the TUI console is one
//! client, every browser session of the web process another. It holds the
//! selected project with its tabs, the launch instances per project and the
//! login state.

use std::collections::{BTreeMap, HashMap};

use artdeck_core::prelude::*;
use artdeck_daemon::{LaunchRequest, WorkspaceApi};

use crate::auth::LoginState;
use crate::launch::{HandlerFactory, LaunchInstance};
use crate::product_view::ProductViewState;
use crate::tabs::{product_view_tab_id, Tab, TabKind, Tabs};

/// Tab id of the configuration page
pub const CONFIG_TAB_ID: &str = "config";

#[derive(Debug)]
pub struct ClientState {
    id: String,
    pub login: LoginState,
    project: Option<String>,
    tabs: Tabs,
    /// Launch instances per project, in creation order
    launches: BTreeMap<String, Vec<LaunchInstance>>,
    product_views: HashMap<String, ProductViewState>,
    notifications: Vec<String>,
}

impl ClientState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login: LoginState::new(),
            project: None,
            tabs: Tabs::new(),
            launches: BTreeMap::new(),
            product_views: HashMap::new(),
            notifications: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn tabs(&self) -> &Tabs {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut Tabs {
        &mut self.tabs
    }

    /// Switch project and rebuild its tabs
    pub fn select_project(&mut self, project: &str) {
        if self.project.as_deref() == Some(project) {
            return;
        }
        self.project = Some(project.to_string());
        self.rebuild_tabs();
    }

    fn rebuild_tabs(&mut self) {
        self.tabs.clear();
        let Some(project) = self.project.clone() else {
            return;
        };
        let config = Tab::new(CONFIG_TAB_ID, "Configuration", TabKind::Configuration).with_icon("tune");
        if let Err(e) = self.tabs.add(config) {
            warn!("{}", e);
        }
        if self.product_views.contains_key(&project) {
            self.add_product_view_tab(&project);
        }
        for instance in self.launches.get(&project).into_iter().flatten() {
            let tab = Tab::new(
                instance.tab_id(),
                instance.label(),
                TabKind::Launch {
                    instance_id: instance.id().to_string(),
                },
            )
            .with_icon(instance.tab_icon());
            if let Err(e) = self.tabs.add(tab) {
                warn!("{}", e);
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Launch instances
    // ─────────────────────────────────────────────────────────

    /// Prepare a launch and open its tab
    pub fn prepare_launch(&mut self, workspace: &dyn WorkspaceApi, request: LaunchRequest) -> Result<String> {
        let instance = LaunchInstance::prepare(workspace, request)?;
        self.add_launch(instance)
    }

    /// Register a launch instance; its tab is shown if its project is selected
    pub fn add_launch(&mut self, instance: LaunchInstance) -> Result<String> {
        self.insert_launch(instance, true)
    }

    /// Register a launch instance found on disk, keeping the selected tab
    pub fn restore_launch(&mut self, instance: LaunchInstance) -> Result<String> {
        self.insert_launch(instance, false)
    }

    fn insert_launch(&mut self, instance: LaunchInstance, select: bool) -> Result<String> {
        let tab_id = instance.tab_id();
        let project = instance.project().to_string();
        if self.project.as_deref() == Some(project.as_str()) {
            let tab = Tab::new(
                tab_id.clone(),
                instance.label(),
                TabKind::Launch {
                    instance_id: instance.id().to_string(),
                },
            )
            .with_icon(instance.tab_icon());
            self.tabs.add(tab)?;
            if select {
                self.tabs.select(&tab_id)?;
            }
        }
        info!("Added launch instance {}", instance.label());
        self.launches.entry(project).or_default().push(instance);
        Ok(tab_id)
    }

    pub fn launch(&self, instance_id: &str) -> Option<&LaunchInstance> {
        self.launches.values().flatten().find(|i| i.id() == instance_id)
    }

    pub fn launch_mut(&mut self, instance_id: &str) -> Option<&mut LaunchInstance> {
        self.launches
            .values_mut()
            .flatten()
            .find(|i| i.id() == instance_id)
    }

    /// Launch instances of the selected project
    pub fn project_launches(&self) -> &[LaunchInstance] {
        self.project
            .as_ref()
            .and_then(|p| self.launches.get(p))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Launch instance behind the selected tab, creating its handler
    pub fn selected_launch_mut(&mut self, factory: &HandlerFactory) -> Option<&mut LaunchInstance> {
        let instance_id = match &self.tabs.selected()?.kind {
            TabKind::Launch { instance_id } => instance_id.clone(),
            _ => return None,
        };
        let instance = self.launch_mut(&instance_id)?;
        instance.monitor_mut(factory);
        Some(instance)
    }

    /// Remove a launch instance, its tab and its variant instance
    pub fn remove_launch(&mut self, workspace: &dyn WorkspaceApi, instance_id: &str) -> Result<()> {
        let mut removed = None;
        for instances in self.launches.values_mut() {
            if let Some(pos) = instances.iter().position(|i| i.id() == instance_id) {
                removed = Some(instances.remove(pos));
                break;
            }
        }
        self.launches.retain(|_, instances| !instances.is_empty());
        let instance =
            removed.ok_or_else(|| Error::action(format!("no launch instance '{}'", instance_id)))?;
        self.tabs.remove(&instance.tab_id());
        instance.remove(workspace)
    }

    /// Poll every launch and refresh tab icons; `true` if anything changed
    pub fn poll_launches(&mut self) -> bool {
        let mut changed = false;
        for instance in self.launches.values_mut().flatten() {
            if instance.poll() {
                changed = true;
            }
            if self.tabs.contains(&instance.tab_id()) {
                if let Err(e) = self.tabs.set_icon(&instance.tab_id(), Some(instance.tab_icon())) {
                    warn!("{}", e);
                }
            }
        }
        changed
    }

    pub fn has_running_launches(&self) -> bool {
        self.launches.values().flatten().any(LaunchInstance::is_running)
    }

    // ─────────────────────────────────────────────────────────
    // Product views
    // ─────────────────────────────────────────────────────────

    fn add_product_view_tab(&mut self, project: &str) {
        let id = product_view_tab_id(project);
        if self.tabs.contains(&id) {
            return;
        }
        let tab = Tab::new(
            id,
            format!("Products {}", project),
            TabKind::ProductView {
                project: project.to_string(),
            },
        )
        .with_icon("image");
        if let Err(e) = self.tabs.add(tab) {
            warn!("{}", e);
        }
    }

    /// Show the product view of a project, replacing an older one
    pub fn open_product_view(&mut self, project: &str, state: ProductViewState) -> Result<()> {
        self.product_views.insert(project.to_string(), state);
        if self.project.as_deref() == Some(project) {
            self.add_product_view_tab(project);
            self.tabs.select(&product_view_tab_id(project))?;
        }
        Ok(())
    }

    pub fn product_view(&self, project: &str) -> Option<&ProductViewState> {
        self.product_views.get(project)
    }

    pub fn product_view_mut(&mut self, project: &str) -> Option<&mut ProductViewState> {
        self.product_views.get_mut(project)
    }

    pub fn product_views_mut(&mut self) -> impl Iterator<Item = &mut ProductViewState> {
        self.product_views.values_mut()
    }

    pub fn close_product_view(&mut self, project: &str) {
        self.product_views.remove(project);
        self.tabs.remove(&product_view_tab_id(project));
    }

    // ─────────────────────────────────────────────────────────
    // Notifications
    // ─────────────────────────────────────────────────────────

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notifications.push(message.into());
    }

    pub fn take_notifications(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notifications)
    }

    /// Release everything the client holds: running jobs are terminated
    /// and variant instances removed.
    pub fn teardown(&mut self, workspace: &dyn WorkspaceApi) {
        let launches = std::mem::take(&mut self.launches);
        for instance in launches.into_values().flatten() {
            let label = instance.label();
            if let Err(e) = instance.remove(workspace) {
                warn!("Failed to remove launch instance {}: {}", label, e);
            }
        }
        self.product_views.clear();
        self.tabs.clear();
        debug!("Client {} torn down", self.id);
    }
}
