//! Configuration page handlers

use serde_json::Value;

use artdeck_core::prelude::*;
use artdeck_core::{ControlKind, ValueKind};
use artdeck_daemon::VariantKey;

use crate::controls::factory::{to_float, to_text};
use crate::controls::{ChangeOutcome, ControlSpec, Validator};
use crate::message::{ConfigFocus, Message};
use crate::state::{AppState, ConfigPage, ConfigSelector, UiMode};

use super::UpdateResult;

pub fn handle_focus_next(state: &mut AppState) -> UpdateResult {
    if let Some(page) = state.config.as_mut() {
        page.focus_next();
    }
    UpdateResult::none()
}

pub fn handle_cursor(state: &mut AppState, delta: isize) -> UpdateResult {
    if let Some(page) = state.config.as_mut() {
        page.move_cursor(delta);
    }
    UpdateResult::none()
}

/// Step a selector, or the value of a switch, select or number control
pub fn handle_cycle(state: &mut AppState, forward: bool) -> UpdateResult {
    let workspace = state.workspace.clone();
    let Some(page) = state.config.as_mut() else {
        return UpdateResult::none();
    };

    if let Some(selector) = page.selected_selector() {
        if !page.choices_mut(selector).cycle(forward) {
            return UpdateResult::none();
        }
        let reloaded = match selector {
            ConfigSelector::LaunchFile => page.reload_launch(workspace.as_ref()),
            ConfigSelector::Action => Ok(()),
            ConfigSelector::VariantGroup => page.reload_variant_group(workspace.as_ref()),
            ConfigSelector::Trial => page.reload_trial(workspace.as_ref()),
        };
        if let Err(e) = reloaded {
            state.show_error(
                format!("Loading {} failed", selector.label().to_lowercase()),
                &e,
                Some(Message::ReloadConfig),
            );
        }
        return UpdateResult::none();
    }

    let Some(name) = page.selected_name() else {
        return UpdateResult::none();
    };
    let Some(grid) = page.focused_grid() else {
        return UpdateResult::none();
    };
    let Some(ctrl) = grid.control(&name) else {
        return UpdateResult::none();
    };
    let current = grid.displayed(&name).cloned().unwrap_or(Value::Null);
    let next = match &ctrl.spec {
        ControlSpec::Number { kind } => {
            let step = if forward { 1.0 } else { -1.0 };
            match kind {
                ValueKind::Float => Some(Value::from(to_float(&current) + step * 0.1)),
                _ => Some(Value::from(to_float(&current) + step)),
            }
        }
        _ => ctrl.next_value(&current),
    };
    match next {
        Some(value) => commit_value(state, &name, value),
        None => UpdateResult::none(),
    }
}

/// Enter text editing for number and text controls
pub fn handle_start_edit(state: &mut AppState) -> UpdateResult {
    let Some(page) = state.config.as_ref() else {
        return UpdateResult::none();
    };
    if page.focus == ConfigFocus::Selectors {
        return UpdateResult::message(Message::ConfigCycle { forward: true });
    }
    let Some(name) = page.selected_name() else {
        return UpdateResult::none();
    };
    let Some(grid) = page.focused_grid() else {
        return UpdateResult::none();
    };
    let Some(ctrl) = grid.control(&name) else {
        return UpdateResult::none();
    };
    match ctrl.kind() {
        ControlKind::Number | ControlKind::Input => {
            state.edit_buffer = to_text(grid.displayed(&name).unwrap_or(&Value::Null));
            state.ui_mode = UiMode::EditValue;
            UpdateResult::none()
        }
        ControlKind::Switch | ControlKind::Select => {
            UpdateResult::message(Message::ConfigCycle { forward: true })
        }
    }
}

pub fn handle_commit_edit(state: &mut AppState) -> UpdateResult {
    if state.ui_mode == UiMode::EditInfo {
        return commit_info(state);
    }
    state.ui_mode = UiMode::Normal;
    let text = std::mem::take(&mut state.edit_buffer);
    let Some(name) = state.config.as_ref().and_then(|p| p.selected_name()) else {
        return UpdateResult::none();
    };
    commit_value(state, &name, Value::String(text))
}

/// Offer a value change to the focused grid. The change is only committed
/// when it could be saved; otherwise the displayed value rolls back.
fn commit_value(state: &mut AppState, name: &str, input: Value) -> UpdateResult {
    let workspace = state.workspace.clone();
    let Some(page) = state.config.as_mut() else {
        return UpdateResult::none();
    };
    let project = page.project.clone();

    let outcome = match page.focus {
        ConfigFocus::Selectors => return UpdateResult::none(),
        ConfigFocus::LaunchArgs => {
            let (Some(launch_id), Some(grid)) =
                (page.launch_files.current().map(str::to_string), page.launch_grid.as_mut())
            else {
                return UpdateResult::none();
            };
            let snapshot = page.launch_args.clone();
            let mut save = |_: Option<&str>, name: &str, value: &Value| {
                let mut values = snapshot.clone();
                values.insert(name.to_string(), value.clone());
                match workspace.save_launch_args(&project, &launch_id, &values) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Saving launch arguments failed: {}", e);
                        false
                    }
                }
            };
            let validator: &mut Validator<'_> = &mut save;
            grid.change(&mut page.launch_args, name, &input, Some(validator))
        }
        ConfigFocus::TrialValues => {
            let (Some(group), Some(trial), Some(grid)) = (
                page.variant_groups.current().map(str::to_string),
                page.trials.current().map(str::to_string),
                page.trial_grid.as_mut(),
            ) else {
                return UpdateResult::none();
            };
            let snapshot = page.trial_values.clone();
            let mut save = |_: Option<&str>, name: &str, value: &Value| {
                let mut values = snapshot.clone();
                values.insert(name.to_string(), value.clone());
                match workspace.save_trial_values(&project, &group, &trial, &values) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Saving trial values failed: {}", e);
                        false
                    }
                }
            };
            let validator: &mut Validator<'_> = &mut save;
            grid.change(&mut page.trial_values, name, &input, Some(validator))
        }
    };

    match outcome {
        ChangeOutcome::Committed(value) => debug!("Set {} = {}", name, value),
        ChangeOutcome::RolledBack(_) => state.notify(format!("Value '{}' could not be saved", name)),
        ChangeOutcome::Suppressed => {}
        ChangeOutcome::UnknownControl => state.notify(format!("No control for '{}'", name)),
    }
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────────────
// Variants
// ─────────────────────────────────────────────────────────────────

fn selected_variant(state: &AppState) -> Option<(ConfigSelector, VariantKey)> {
    state.config.as_ref().and_then(ConfigPage::selected_variant)
}

/// Copy the variant under the cursor and select the copy
pub fn handle_add_variant(state: &mut AppState) -> UpdateResult {
    let Some((_, key)) = selected_variant(state) else {
        state.notify("Select a launch file, variant group or trial to copy");
        return UpdateResult::none();
    };
    let workspace = state.workspace.clone();
    let Some(page) = state.config.as_mut() else {
        return UpdateResult::none();
    };
    let added = workspace
        .add_variant(&page.project, &key)
        .and_then(|added| page.show_variant(workspace.as_ref(), &added).map(|()| added));
    match added {
        Ok(added) => state.notify(format!("Added {} '{}'", added.kind_label(), added.name())),
        Err(e) => state.show_error(
            format!("Adding {} failed", key.kind_label()),
            &e,
            Some(Message::ReloadConfig),
        ),
    }
    UpdateResult::none()
}

/// Ask before removing the variant under the cursor; the last one of a
/// kind is refused right away
pub fn handle_remove_variant(state: &mut AppState) -> UpdateResult {
    let Some((selector, key)) = selected_variant(state) else {
        state.notify("Select a launch file, variant group or trial to remove");
        return UpdateResult::none();
    };
    let Some(page) = state.config.as_mut() else {
        return UpdateResult::none();
    };
    if page.choices(selector).items.len() <= 1 {
        state.notify(format!("Cannot remove the last {}", key.kind_label()));
        return UpdateResult::none();
    }
    page.pending_removal = Some(key);
    state.ui_mode = UiMode::ConfirmRemoveVariant;
    UpdateResult::none()
}

pub fn handle_confirm_remove(state: &mut AppState) -> UpdateResult {
    state.ui_mode = UiMode::Normal;
    let workspace = state.workspace.clone();
    let Some(page) = state.config.as_mut() else {
        return UpdateResult::none();
    };
    let Some(key) = page.pending_removal.take() else {
        return UpdateResult::none();
    };
    let removed = workspace
        .remove_variant(&page.project, &key)
        .and_then(|()| page.show_variant(workspace.as_ref(), &key));
    match removed {
        Ok(()) => state.notify(format!("Removed {} '{}'", key.kind_label(), key.name())),
        Err(e) => state.show_error(
            format!("Removing {} failed", key.kind_label()),
            &e,
            Some(Message::ReloadConfig),
        ),
    }
    UpdateResult::none()
}

pub fn handle_start_info_edit(state: &mut AppState) -> UpdateResult {
    let info = state
        .config
        .as_ref()
        .and_then(|page| Some(page.info(page.selected_variant()?.0)?.to_string()));
    let Some(info) = info else {
        state.notify("Select a launch file, variant group or trial to describe");
        return UpdateResult::none();
    };
    state.edit_buffer = info;
    state.ui_mode = UiMode::EditInfo;
    UpdateResult::none()
}

fn commit_info(state: &mut AppState) -> UpdateResult {
    state.ui_mode = UiMode::Normal;
    let text = std::mem::take(&mut state.edit_buffer).trim().to_string();
    let Some((selector, key)) = selected_variant(state) else {
        return UpdateResult::none();
    };
    let workspace = state.workspace.clone();
    let Some(page) = state.config.as_mut() else {
        return UpdateResult::none();
    };
    match workspace.set_variant_info(&page.project, &key, &text) {
        Ok(()) => {
            if let Some(info) = page.info_mut(selector) {
                *info = text;
            }
        }
        Err(e) => state.show_error("Saving variant info failed", &e, None),
    }
    UpdateResult::none()
}

pub fn handle_find_instances(state: &mut AppState) -> UpdateResult {
    match state.restore_instances() {
        Ok(0) => state.notify("No further launch instances found"),
        Ok(n) => state.notify(format!("Found {} launch instances", n)),
        Err(e) => state.show_error(
            "Finding launch instances failed",
            &e,
            Some(Message::FindInstances),
        ),
    }
    UpdateResult::none()
}

/// Prepare a launch instance of the selected launch file, action and trial
pub fn handle_prepare_launch(state: &mut AppState) -> UpdateResult {
    let Some(request) = state.config.as_ref().and_then(|p| p.launch_request()) else {
        state.notify("Select a launch file, action, variant group and trial first");
        return UpdateResult::none();
    };
    let workspace = state.workspace.clone();
    match state.client.prepare_launch(workspace.as_ref(), request) {
        Ok(tab_id) => {
            debug!("Prepared launch tab {}", tab_id);
            let factory = state.handler_factory();
            state.client.selected_launch_mut(factory.as_ref());
        }
        Err(e) => state.show_error("Preparing launch failed", &e, Some(Message::PrepareLaunch)),
    }
    UpdateResult::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::handler::update;
    use crate::tabs::TabKind;
    use artdeck_daemon::test_utils::sample_workspace;
    use crate::launch::HandlerFactory;
    use artdeck_daemon::{ActionHandler, FsWorkspace, MockActionHandler, PreparedLaunch, WorkspaceApi};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_state() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let ws = sample_workspace(temp.path());
        let factory: Arc<HandlerFactory> = Arc::new(|_: &PreparedLaunch| -> Box<dyn ActionHandler> {
            let mut handler = MockActionHandler::new();
            handler.expect_job_count().return_const(0usize);
            handler.expect_output_types().returning(Vec::new);
            Box::new(handler)
        });
        let mut state =
            AppState::new(Arc::new(ws), Settings::default()).with_handler_factory(factory);
        state.load_projects();
        (temp, state)
    }

    fn focus_trial_value(state: &mut AppState, name: &str) {
        let page = state.config.as_mut().unwrap();
        page.focus = ConfigFocus::TrialValues;
        let names = page.trial_grid.as_ref().unwrap().names();
        page.cursor = names.iter().position(|n| *n == name).unwrap();
    }

    #[test]
    fn test_edit_commits_and_saves_trial_value() {
        let (temp, mut state) = test_state();
        focus_trial_value(&mut state, "iFrameCount");

        update(&mut state, Message::StartEdit);
        assert_eq!(state.ui_mode, UiMode::EditValue);
        assert_eq!(state.edit_buffer, "10");

        update(&mut state, Message::EditInput { text: "25".into() });
        update(&mut state, Message::CommitEdit);
        assert_eq!(state.ui_mode, UiMode::Normal);

        let page = state.config.as_ref().unwrap();
        assert_eq!(page.trial_values["iFrameCount"], Value::from(25));

        let ws = FsWorkspace::open(temp.path()).unwrap();
        let saved = ws.trial_values("demo/p1", "vg1", "trial-a").unwrap();
        assert_eq!(saved["iFrameCount"], Value::from(25));
    }

    #[test]
    fn test_cycle_toggles_switch() {
        let (_temp, mut state) = test_state();
        focus_trial_value(&mut state, "bDenoise");
        update(&mut state, Message::ConfigCycle { forward: true });
        let page = state.config.as_ref().unwrap();
        assert_eq!(page.trial_values["bDenoise"], Value::Bool(false));
    }

    #[test]
    fn test_cycle_steps_float_number() {
        let (_temp, mut state) = test_state();
        focus_trial_value(&mut state, "fExposure");
        update(&mut state, Message::ConfigCycle { forward: false });
        let page = state.config.as_ref().unwrap();
        let value = page.trial_values["fExposure"].as_f64().unwrap();
        assert!((value - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_cycle_selector_with_single_choice_is_noop() {
        let (_temp, mut state) = test_state();
        update(&mut state, Message::ConfigCycle { forward: true });
        let page = state.config.as_ref().unwrap();
        assert_eq!(page.launch_files.current(), Some("launch"));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_prepare_launch_opens_tab_with_monitor() {
        let (_temp, mut state) = test_state();
        update(&mut state, Message::PrepareLaunch);
        assert!(state.error.is_none());
        let instance_id = match state.selected_tab_kind() {
            Some(TabKind::Launch { instance_id }) => instance_id.clone(),
            other => panic!("unexpected tab {:?}", other),
        };
        assert!(state.client.launch(&instance_id).unwrap().has_monitor());
    }

    fn select_row(state: &mut AppState, selector: ConfigSelector) {
        let page = state.config.as_mut().unwrap();
        page.focus = ConfigFocus::Selectors;
        page.cursor = ConfigSelector::ALL.iter().position(|s| *s == selector).unwrap();
    }

    #[test]
    fn test_add_trial_variant_selects_copy() {
        let (temp, mut state) = test_state();
        select_row(&mut state, ConfigSelector::Trial);
        update(&mut state, Message::AddVariant);

        let page = state.config.as_ref().unwrap();
        assert_eq!(page.trials.items, vec!["trial-a", "trial-a-2"]);
        assert_eq!(page.trials.current(), Some("trial-a-2"));
        assert_eq!(page.trial_values["iFrameCount"], Value::from(10));
        assert_eq!(state.last_notification(), Some("Added trial 'trial-a-2'"));

        let ws = FsWorkspace::open(temp.path()).unwrap();
        assert_eq!(ws.trials("demo/p1", "vg1").unwrap().len(), 2);
    }

    #[test]
    fn test_add_variant_on_action_row_notifies() {
        let (_temp, mut state) = test_state();
        select_row(&mut state, ConfigSelector::Action);
        update(&mut state, Message::AddVariant);
        assert!(state.last_notification().unwrap().starts_with("Select a launch file"));
    }

    #[test]
    fn test_remove_launch_variant_after_confirmation() {
        let (temp, mut state) = test_state();
        select_row(&mut state, ConfigSelector::LaunchFile);
        update(&mut state, Message::AddVariant);
        assert_eq!(state.config.as_ref().unwrap().launch_files.current(), Some("launch-2"));

        update(&mut state, Message::RemoveVariant);
        assert_eq!(state.ui_mode, UiMode::ConfirmRemoveVariant);
        update(&mut state, Message::CancelRemoveVariant);
        assert_eq!(state.ui_mode, UiMode::Normal);
        assert_eq!(state.config.as_ref().unwrap().launch_files.items.len(), 2);

        update(&mut state, Message::RemoveVariant);
        update(&mut state, Message::ConfirmRemoveVariant);
        let page = state.config.as_ref().unwrap();
        assert_eq!(page.launch_files.items, vec!["launch"]);
        assert_eq!(page.actions.current(), Some("render/std"));
        assert!(page.pending_removal.is_none());

        let ws = FsWorkspace::open(temp.path()).unwrap();
        assert_eq!(ws.launch_ids("demo/p1").unwrap(), vec!["launch"]);
    }

    #[test]
    fn test_remove_last_variant_group_refused() {
        let (_temp, mut state) = test_state();
        select_row(&mut state, ConfigSelector::VariantGroup);
        update(&mut state, Message::RemoveVariant);
        assert_eq!(state.ui_mode, UiMode::Normal);
        assert_eq!(
            state.last_notification(),
            Some("Cannot remove the last variant group")
        );
    }

    #[test]
    fn test_info_edit_saves_variant_info() {
        let (temp, mut state) = test_state();
        select_row(&mut state, ConfigSelector::VariantGroup);
        update(&mut state, Message::StartInfoEdit);
        assert_eq!(state.ui_mode, UiMode::EditInfo);
        assert_eq!(state.edit_buffer, "");

        update(&mut state, Message::EditInput { text: "night scenes ".into() });
        update(&mut state, Message::CommitEdit);
        assert_eq!(state.ui_mode, UiMode::Normal);
        assert_eq!(state.config.as_ref().unwrap().group_info, "night scenes");

        let ws = FsWorkspace::open(temp.path()).unwrap();
        let info = ws.variant_info("demo/p1", &VariantKey::Group("vg1".into())).unwrap();
        assert_eq!(info, "night scenes");

        // a reload reads the info back
        state.reload_config();
        assert_eq!(state.config.as_ref().unwrap().group_info, "night scenes");
    }

    #[test]
    fn test_find_instances_restores_tabs_once() {
        let (temp, mut state) = test_state();
        let ws = FsWorkspace::open(temp.path()).unwrap();
        let request = state.config.as_ref().unwrap().launch_request().unwrap();
        let prepared = ws.prepare_launch(&request).unwrap();

        update(&mut state, Message::FindInstances);
        assert_eq!(state.client.tabs().len(), 2);
        assert_eq!(state.client.tabs().selected_key(), Some("config"));
        assert!(state.client.launch(&prepared.instance_id).is_some());
        assert_eq!(state.last_notification(), Some("Found 1 launch instances"));

        update(&mut state, Message::FindInstances);
        assert_eq!(state.client.tabs().len(), 2);
        assert_eq!(state.last_notification(), Some("No further launch instances found"));
    }

    #[test]
    fn test_prepare_launch_without_selection_notifies() {
        let (_temp, mut state) = test_state();
        state.config.as_mut().unwrap().trials.items.clear();
        update(&mut state, Message::PrepareLaunch);
        assert_eq!(state.client.tabs().len(), 1);
        assert!(state.last_notification().unwrap().starts_with("Select a launch file"));
    }
}
