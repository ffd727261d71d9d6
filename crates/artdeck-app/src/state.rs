//! Application state (Model in TEA pattern)

use std::collections::VecDeque;
use std::sync::Arc;

use serde_json::{Map, Value};

use artdeck_core::prelude::*;
use artdeck_core::view_dim::ArtefactCell;
use artdeck_core::LayoutNode;
use artdeck_daemon::{FoundInstance, LaunchRequest, VariantKey, WorkspaceApi};

use crate::client::ClientState;
use crate::config::{layout_config, Settings};
use crate::controls::{workspace_exclusions, GuiArgs, ValueGrid};
use crate::launch::{process_handler, HandlerFactory, LaunchInstance};
use crate::message::{ConfigFocus, Message, ProductPane};
use crate::tabs::TabKind;

/// Id of the console's own client state
pub const CONSOLE_CLIENT_ID: &str = "console";

/// Key of the gui arguments inside a value dictionary
pub const GUI_ARGS_KEY: &str = "mGui";

/// Notifications kept for the status bar
const MAX_NOTIFICATIONS: usize = 20;

/// Current UI mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiMode {
    #[default]
    Normal,
    /// Text editing of one configuration value
    EditValue,
    /// Text editing of the info of the selected variant
    EditInfo,
    /// Quit confirmation while jobs are running
    ConfirmQuit,
    /// Confirmation of [`ConfigPage::pending_removal`]
    ConfirmRemoveVariant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

/// Collaborator failure shown in place of the page
#[derive(Debug, Clone)]
pub struct ErrorCard {
    pub title: String,
    pub message: String,
    /// Message that repeats the failed operation
    pub retry: Option<Message>,
}

/// Selector rows of the configuration page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSelector {
    LaunchFile,
    Action,
    VariantGroup,
    Trial,
}

impl ConfigSelector {
    pub const ALL: [ConfigSelector; 4] = [
        ConfigSelector::LaunchFile,
        ConfigSelector::Action,
        ConfigSelector::VariantGroup,
        ConfigSelector::Trial,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ConfigSelector::LaunchFile => "Launch File",
            ConfigSelector::Action => "Action",
            ConfigSelector::VariantGroup => "Variant Group",
            ConfigSelector::Trial => "Trial",
        }
    }
}

/// A list of choices with the selected index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choices {
    pub items: Vec<String>,
    pub selected: usize,
}

impl Choices {
    pub fn new(items: Vec<String>) -> Self {
        Self { items, selected: 0 }
    }

    pub fn current(&self) -> Option<&str> {
        self.items.get(self.selected).map(String::as_str)
    }

    /// Select `item` if present
    pub fn select_item(&mut self, item: &str) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// Step to the next or previous item, wrapping around
    pub fn cycle(&mut self, forward: bool) -> bool {
        let n = self.items.len();
        if n < 2 {
            return false;
        }
        self.selected = if forward {
            (self.selected + 1) % n
        } else {
            (self.selected + n - 1) % n
        };
        true
    }
}

/// Configuration page of the selected project
#[derive(Debug)]
pub struct ConfigPage {
    pub project: String,
    pub launch_files: Choices,
    pub actions: Choices,
    pub variant_groups: Choices,
    pub trials: Choices,
    pub launch_args: Map<String, Value>,
    pub launch_grid: Option<ValueGrid>,
    pub trial_values: Map<String, Value>,
    pub trial_grid: Option<ValueGrid>,
    pub focus: ConfigFocus,
    /// Row of the focused section
    pub cursor: usize,
    pub group_info: String,
    pub launch_info: String,
    pub trial_info: String,
    /// Variant waiting for the removal confirmation
    pub pending_removal: Option<VariantKey>,
}

impl ConfigPage {
    /// Read launch files, variant groups and their values of a project
    pub fn load(workspace: &dyn WorkspaceApi, project: &str) -> Result<Self> {
        let mut launch_files = Choices::new(workspace.launch_ids(project)?);
        if let Some(default) = workspace.default_launch_id(project)? {
            launch_files.select_item(&default);
        }
        let mut page = Self {
            project: project.to_string(),
            launch_files,
            actions: Choices::default(),
            variant_groups: Choices::new(workspace.variant_groups(project)?),
            trials: Choices::default(),
            launch_args: Map::new(),
            launch_grid: None,
            trial_values: Map::new(),
            trial_grid: None,
            focus: ConfigFocus::Selectors,
            cursor: 0,
            group_info: String::new(),
            launch_info: String::new(),
            trial_info: String::new(),
            pending_removal: None,
        };
        page.reload_launch(workspace)?;
        page.reload_variant_group(workspace)?;
        Ok(page)
    }

    /// Re-read actions and arguments of the selected launch file
    pub fn reload_launch(&mut self, workspace: &dyn WorkspaceApi) -> Result<()> {
        match self.launch_files.current().map(str::to_string) {
            Some(launch_id) => {
                self.actions = Choices::new(workspace.actions(&self.project, &launch_id)?);
                self.launch_args = workspace.launch_args(&self.project, &launch_id)?;
                self.launch_grid = Some(build_grid(&self.launch_args, Some(&launch_id))?);
                self.launch_info =
                    workspace.variant_info(&self.project, &VariantKey::LaunchFile(launch_id))?;
            }
            None => {
                self.actions = Choices::default();
                self.launch_args = Map::new();
                self.launch_grid = None;
                self.launch_info.clear();
            }
        }
        Ok(())
    }

    /// Re-read the trials of the selected variant group
    pub fn reload_variant_group(&mut self, workspace: &dyn WorkspaceApi) -> Result<()> {
        match self.variant_groups.current().map(str::to_string) {
            Some(group) => {
                self.trials = Choices::new(workspace.trials(&self.project, &group)?);
                self.group_info = workspace.variant_info(&self.project, &VariantKey::Group(group))?;
            }
            None => {
                self.trials = Choices::default();
                self.group_info.clear();
            }
        }
        self.reload_trial(workspace)
    }

    pub fn reload_trial(&mut self, workspace: &dyn WorkspaceApi) -> Result<()> {
        match (self.variant_groups.current(), self.trials.current()) {
            (Some(group), Some(trial)) => {
                self.trial_values = workspace.trial_values(&self.project, group, trial)?;
                self.trial_grid = Some(build_grid(&self.trial_values, Some(trial))?);
                let key = VariantKey::Trial {
                    group: group.to_string(),
                    trial: trial.to_string(),
                };
                self.trial_info = workspace.variant_info(&self.project, &key)?;
            }
            _ => {
                self.trial_values = Map::new();
                self.trial_grid = None;
                self.trial_info.clear();
            }
        }
        Ok(())
    }

    /// Variant shown by a selector; actions are not variants
    pub fn variant_key(&self, selector: ConfigSelector) -> Option<VariantKey> {
        match selector {
            ConfigSelector::LaunchFile => {
                Some(VariantKey::LaunchFile(self.launch_files.current()?.to_string()))
            }
            ConfigSelector::Action => None,
            ConfigSelector::VariantGroup => {
                Some(VariantKey::Group(self.variant_groups.current()?.to_string()))
            }
            ConfigSelector::Trial => Some(VariantKey::Trial {
                group: self.variant_groups.current()?.to_string(),
                trial: self.trials.current()?.to_string(),
            }),
        }
    }

    /// Selector under the cursor and its variant
    pub fn selected_variant(&self) -> Option<(ConfigSelector, VariantKey)> {
        let selector = self.selected_selector()?;
        Some((selector, self.variant_key(selector)?))
    }

    /// Info text of the variant of a selector
    pub fn info(&self, selector: ConfigSelector) -> Option<&str> {
        match selector {
            ConfigSelector::LaunchFile => Some(self.launch_info.as_str()),
            ConfigSelector::Action => None,
            ConfigSelector::VariantGroup => Some(self.group_info.as_str()),
            ConfigSelector::Trial => Some(self.trial_info.as_str()),
        }
    }

    pub fn info_mut(&mut self, selector: ConfigSelector) -> Option<&mut String> {
        match selector {
            ConfigSelector::LaunchFile => Some(&mut self.launch_info),
            ConfigSelector::Action => None,
            ConfigSelector::VariantGroup => Some(&mut self.group_info),
            ConfigSelector::Trial => Some(&mut self.trial_info),
        }
    }

    /// Re-read the list `key` belongs to and select it; the first entry is
    /// selected if `key` no longer exists
    pub fn show_variant(&mut self, workspace: &dyn WorkspaceApi, key: &VariantKey) -> Result<()> {
        match key {
            VariantKey::Group(group) => {
                self.variant_groups = Choices::new(workspace.variant_groups(&self.project)?);
                self.variant_groups.select_item(group);
                self.reload_variant_group(workspace)
            }
            VariantKey::LaunchFile(launch_id) => {
                self.launch_files = Choices::new(workspace.launch_ids(&self.project)?);
                self.launch_files.select_item(launch_id);
                self.reload_launch(workspace)
            }
            VariantKey::Trial { group, trial } => {
                self.trials = Choices::new(workspace.trials(&self.project, group)?);
                self.trials.select_item(trial);
                self.reload_trial(workspace)
            }
        }
    }

    pub fn choices_mut(&mut self, selector: ConfigSelector) -> &mut Choices {
        match selector {
            ConfigSelector::LaunchFile => &mut self.launch_files,
            ConfigSelector::Action => &mut self.actions,
            ConfigSelector::VariantGroup => &mut self.variant_groups,
            ConfigSelector::Trial => &mut self.trials,
        }
    }

    pub fn choices(&self, selector: ConfigSelector) -> &Choices {
        match selector {
            ConfigSelector::LaunchFile => &self.launch_files,
            ConfigSelector::Action => &self.actions,
            ConfigSelector::VariantGroup => &self.variant_groups,
            ConfigSelector::Trial => &self.trials,
        }
    }

    /// Grid of the focused section, `None` on the selectors
    pub fn focused_grid(&self) -> Option<&ValueGrid> {
        match self.focus {
            ConfigFocus::Selectors => None,
            ConfigFocus::LaunchArgs => self.launch_grid.as_ref(),
            ConfigFocus::TrialValues => self.trial_grid.as_ref(),
        }
    }

    /// Number of rows of the focused section
    pub fn row_count(&self) -> usize {
        match self.focus {
            ConfigFocus::Selectors => ConfigSelector::ALL.len(),
            _ => self.focused_grid().map(|g| g.names().len()).unwrap_or(0),
        }
    }

    pub fn selected_selector(&self) -> Option<ConfigSelector> {
        match self.focus {
            ConfigFocus::Selectors => ConfigSelector::ALL.get(self.cursor).copied(),
            _ => None,
        }
    }

    /// Value name under the cursor of a grid section
    pub fn selected_name(&self) -> Option<String> {
        self.focused_grid()
            .and_then(|g| g.names().get(self.cursor).map(|n| n.to_string()))
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let rows = self.row_count();
        if rows == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, rows as isize - 1) as usize;
    }

    /// Cycle the focus through the sections that have content
    pub fn focus_next(&mut self) {
        let order = [ConfigFocus::Selectors, ConfigFocus::LaunchArgs, ConfigFocus::TrialValues];
        let start = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        for step in 1..=order.len() {
            let candidate = order[(start + step) % order.len()];
            let has_rows = match candidate {
                ConfigFocus::Selectors => true,
                ConfigFocus::LaunchArgs => self.launch_grid.as_ref().is_some_and(ValueGrid::is_visible),
                ConfigFocus::TrialValues => self.trial_grid.as_ref().is_some_and(ValueGrid::is_visible),
            };
            if has_rows {
                self.focus = candidate;
                self.cursor = 0;
                return;
            }
        }
    }

    /// Launch request of the current selection
    pub fn launch_request(&self) -> Option<LaunchRequest> {
        Some(LaunchRequest {
            project: self.project.clone(),
            variant_group: self.variant_groups.current()?.to_string(),
            trial: self.trials.current()?.to_string(),
            launch_id: self.launch_files.current()?.to_string(),
            action: self.actions.current()?.to_string(),
        })
    }
}

/// Value grid of a workspace value dictionary
fn build_grid(values: &Map<String, Value>, data_id: Option<&str>) -> Result<ValueGrid> {
    let args = GuiArgs::merged(None, values.get(GUI_ARGS_KEY).and_then(Value::as_object))?;
    ValueGrid::build(values, &args, &workspace_exclusions()?, data_id)
}

/// Cursor and cached layout of the product view of the selected project
#[derive(Debug, Default)]
pub struct ProductPage {
    pub pane: ProductPane,
    /// Row inside the focused pane
    pub index: usize,
    /// Selected artefact cell in layout order
    pub cell: usize,
    pub layout: Option<LayoutNode>,
    /// A scan of this project is running
    pub scanning: bool,
    /// A deferred grid rebuild is pending
    pub updating: bool,
    /// Window the user asked for while the corrected one is pending
    pub range_preview: Option<RangePreview>,
}

/// Requested endpoints of a range row, shown until the deferred reset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangePreview {
    pub row: usize,
    pub value_min: f64,
    pub value_max: f64,
}

impl ProductPage {
    /// Artefact cells of the cached layout, in render order
    pub fn cells(&self) -> Vec<&ArtefactCell> {
        let mut out = Vec::new();
        if let Some(node) = &self.layout {
            collect_cells(node, &mut out);
        }
        out
    }

    pub fn selected_cell(&self) -> Option<&ArtefactCell> {
        self.cells().get(self.cell).copied()
    }
}

/// Push the artefact cells below `node` in render order
pub fn collect_cells<'a>(node: &'a LayoutNode, out: &mut Vec<&'a ArtefactCell>) {
    match node {
        LayoutNode::Row { blocks, .. } => {
            for column in blocks.iter().flat_map(|b| b.columns.iter()) {
                if let Some(content) = &column.content {
                    collect_cells(content, out);
                }
            }
        }
        LayoutNode::Column(children) => {
            for child in children {
                collect_cells(child, out);
            }
        }
        LayoutNode::Artefact(cell) => out.push(cell),
    }
}

/// Complete application state
pub struct AppState {
    pub ui_mode: UiMode,
    pub phase: AppPhase,
    pub settings: Settings,
    pub workspace: Arc<dyn WorkspaceApi>,
    /// Client state of the console
    pub client: ClientState,
    pub projects: Vec<String>,
    pub config: Option<ConfigPage>,
    pub product: ProductPage,
    pub error: Option<ErrorCard>,
    /// Buffer of [`UiMode::EditValue`]
    pub edit_buffer: String,
    notifications: VecDeque<String>,
    handler_factory: Arc<HandlerFactory>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("ui_mode", &self.ui_mode)
            .field("phase", &self.phase)
            .field("projects", &self.projects)
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(workspace: Arc<dyn WorkspaceApi>, settings: Settings) -> Self {
        Self {
            ui_mode: UiMode::Normal,
            phase: AppPhase::Running,
            settings,
            workspace,
            client: ClientState::new(CONSOLE_CLIENT_ID),
            projects: Vec::new(),
            config: None,
            product: ProductPage::default(),
            error: None,
            edit_buffer: String::new(),
            notifications: VecDeque::new(),
            handler_factory: Arc::new(process_handler),
        }
    }

    /// Replace the creator of action handlers
    pub fn with_handler_factory(mut self, factory: Arc<HandlerFactory>) -> Self {
        self.handler_factory = factory;
        self
    }

    pub fn handler_factory(&self) -> Arc<HandlerFactory> {
        self.handler_factory.clone()
    }

    // ─────────────────────────────────────────────────────────
    // Projects
    // ─────────────────────────────────────────────────────────

    /// Discover the projects and select the first one
    pub fn load_projects(&mut self) {
        match self.workspace.project_ids() {
            Ok(projects) => {
                self.projects = projects;
                if let Some(first) = self.projects.first().cloned() {
                    self.select_project(&first);
                } else {
                    self.notify("No projects found in workspace");
                }
            }
            Err(e) => self.show_error("Loading projects failed", &e, None),
        }
    }

    pub fn selected_project_index(&self) -> Option<usize> {
        let project = self.client.project()?;
        self.projects.iter().position(|p| p == project)
    }

    /// Switch project; the configuration page is re-read
    pub fn select_project(&mut self, project: &str) {
        if !self.projects.iter().any(|p| p == project) {
            self.notify(format!("Unknown project '{}'", project));
            return;
        }
        self.client.select_project(project);
        self.product = ProductPage::default();
        self.reload_config();
        if let Err(e) = self.restore_instances() {
            self.show_error("Finding launch instances failed", &e, Some(Message::FindInstances));
        }
    }

    /// Show the variant instances of the selected project that are on disk
    /// but not open yet; returns how many were added
    pub fn restore_instances(&mut self) -> Result<usize> {
        let Some(project) = self.client.project().map(str::to_string) else {
            return Ok(0);
        };
        let mut restored = 0;
        for FoundInstance { request, prepared } in self.workspace.find_instances(&project)? {
            if self.client.launch(&prepared.instance_id).is_some() {
                continue;
            }
            let instance = LaunchInstance::from_prepared(request, prepared)?;
            self.client.restore_launch(instance)?;
            restored += 1;
        }
        if restored > 0 {
            info!("Restored {} launch instances of {}", restored, project);
        }
        Ok(restored)
    }

    /// Re-read the configuration page of the selected project
    pub fn reload_config(&mut self) {
        let Some(project) = self.client.project().map(str::to_string) else {
            return;
        };
        match ConfigPage::load(self.workspace.as_ref(), &project) {
            Ok(page) => {
                for note in page
                    .launch_grid
                    .iter()
                    .chain(page.trial_grid.iter())
                    .flat_map(|g| g.notifications().to_vec())
                {
                    self.notify(note);
                }
                self.config = Some(page);
                self.error = None;
            }
            Err(e) => {
                self.config = None;
                self.show_error(
                    format!("Loading project '{}' failed", project),
                    &e,
                    Some(Message::ReloadConfig),
                );
            }
        }
    }

    /// Kind of the selected tab
    pub fn selected_tab_kind(&self) -> Option<&TabKind> {
        self.client.tabs().selected().map(|t| &t.kind)
    }

    pub fn layout_config(&self) -> artdeck_core::LayoutConfig {
        layout_config(&self.settings)
    }

    // ─────────────────────────────────────────────────────────
    // Feedback
    // ─────────────────────────────────────────────────────────

    /// Non-blocking message for the status bar
    pub fn notify(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(text);
    }

    /// Move notifications queued on the client into the status bar
    pub fn collect_client_notifications(&mut self) {
        for note in self.client.take_notifications() {
            self.notify(note);
        }
    }

    pub fn last_notification(&self) -> Option<&str> {
        self.notifications.back().map(String::as_str)
    }

    pub fn notifications(&self) -> impl Iterator<Item = &str> {
        self.notifications.iter().map(String::as_str)
    }

    /// Show a collaborator failure as error card
    pub fn show_error(&mut self, title: impl Into<String>, error: &Error, retry: Option<Message>) {
        let title = title.into();
        warn!("{}: {}", title, error);
        self.error = Some(ErrorCard {
            title,
            message: error.to_string(),
            retry,
        });
    }

    // ─────────────────────────────────────────────────────────
    // Quit
    // ─────────────────────────────────────────────────────────

    /// Quit, or ask first when jobs are running
    pub fn request_quit(&mut self) {
        if self.client.has_running_launches() && self.settings.behavior.confirm_quit {
            self.ui_mode = UiMode::ConfirmQuit;
        } else {
            self.phase = AppPhase::Quitting;
        }
    }

    pub fn confirm_quit(&mut self) {
        self.phase = AppPhase::Quitting;
    }

    pub fn cancel_quit(&mut self) {
        self.ui_mode = UiMode::Normal;
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }
}
