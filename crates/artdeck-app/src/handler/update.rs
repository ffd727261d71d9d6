//! Main update function - handles state transitions (TEA pattern)
//!
//! Page handlers live in:
//! - `config`: configuration page
//! - `launch`: launch tabs and job monitors
//! - `product`: product view

use crate::message::Message;
use crate::state::{AppState, UiMode};
use crate::tabs::TabKind;

use super::{config, keys::handle_key, launch, product, UpdateAction, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Key(key) => match handle_key(state, key) {
            Some(msg) => UpdateResult::message(msg),
            None => UpdateResult::none(),
        },

        Message::Tick => launch::handle_tick(state),

        Message::RequestQuit => {
            state.request_quit();
            UpdateResult::none()
        }

        Message::Quit | Message::ConfirmQuit => {
            state.confirm_quit();
            UpdateResult::none()
        }

        Message::CancelQuit => {
            state.cancel_quit();
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Projects, tabs and feedback
        // ─────────────────────────────────────────────────────────
        Message::SelectProject { project } => select_project(state, &project),
        Message::NextProject => step_project(state, true),
        Message::PrevProject => step_project(state, false),

        Message::NextTab => {
            state.client.tabs_mut().select_next();
            on_tab_selected(state)
        }
        Message::PrevTab => {
            state.client.tabs_mut().select_previous();
            on_tab_selected(state)
        }
        Message::SelectTab { index } => {
            let key = state.client.tabs().keys().get(index).map(|k| k.to_string());
            match key {
                Some(key) => {
                    if let Err(e) = state.client.tabs_mut().select(&key) {
                        state.notify(e.to_string());
                    }
                    on_tab_selected(state)
                }
                None => UpdateResult::none(),
            }
        }
        Message::CloseTab => close_tab(state),

        Message::RetryError => match state.error.take().and_then(|card| card.retry) {
            Some(retry) => UpdateResult::message(retry),
            None => UpdateResult::none(),
        },
        Message::DismissError => {
            state.error = None;
            UpdateResult::none()
        }
        Message::Notify { text } => {
            state.notify(text);
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Configuration page
        // ─────────────────────────────────────────────────────────
        Message::ReloadConfig => {
            state.reload_config();
            UpdateResult::none()
        }
        Message::ConfigFocusNext => config::handle_focus_next(state),
        Message::ConfigCursor { delta } => config::handle_cursor(state, delta),
        Message::ConfigCycle { forward } => config::handle_cycle(state, forward),
        Message::StartEdit => config::handle_start_edit(state),
        Message::EditInput { text } => {
            state.edit_buffer = text;
            UpdateResult::none()
        }
        Message::CommitEdit => config::handle_commit_edit(state),
        Message::CancelEdit => {
            state.edit_buffer.clear();
            state.ui_mode = UiMode::Normal;
            UpdateResult::none()
        }
        Message::PrepareLaunch => config::handle_prepare_launch(state),
        Message::AddVariant => config::handle_add_variant(state),
        Message::RemoveVariant => config::handle_remove_variant(state),
        Message::ConfirmRemoveVariant => config::handle_confirm_remove(state),
        Message::CancelRemoveVariant => {
            if let Some(page) = state.config.as_mut() {
                page.pending_removal = None;
            }
            state.ui_mode = UiMode::Normal;
            UpdateResult::none()
        }
        Message::StartInfoEdit => config::handle_start_info_edit(state),
        Message::FindInstances => config::handle_find_instances(state),

        // ─────────────────────────────────────────────────────────
        // Launch tabs
        // ─────────────────────────────────────────────────────────
        Message::LaunchJobs => launch::handle_launch_jobs(state),
        Message::TerminateSelected => launch::handle_terminate_selected(state),
        Message::TerminateAll => launch::handle_terminate_all(state),
        Message::SelectJob { delta } => launch::handle_select_job(state, delta),
        Message::ScrollOutput { delta } => launch::handle_scroll(state, delta),
        Message::NextOutputType => launch::handle_next_output_type(state),
        Message::OutputViewport { lines } => launch::handle_viewport(state, lines),

        // ─────────────────────────────────────────────────────────
        // Product view
        // ─────────────────────────────────────────────────────────
        Message::OpenProductView { rescan } => product::handle_open(state, rescan),
        Message::NextProductionGroup => product::handle_next_group(state),
        Message::ScanCompleted {
            project,
            variant_group,
            production_path,
            result,
        } => product::handle_scan_completed(state, project, variant_group, production_path, result),
        Message::ProductionChanged => product::handle_production_changed(state),
        Message::WatcherError { message } => {
            state.notify(format!("Production watcher: {}", message));
            UpdateResult::none()
        }
        Message::ProductPaneNext => product::handle_pane_next(state),
        Message::ProductMove { delta } => product::handle_move(state, delta),
        Message::ProductAdjust { forward } => product::handle_adjust(state, forward),
        Message::ProductToggle => product::handle_toggle(state),
        Message::RangeWidth { delta } => product::handle_range_width(state, delta),
        Message::RangeEndpoint { upper, delta } => product::handle_range_endpoint(state, upper, delta),
        Message::ResetRangePreview { project } => product::handle_range_reset(state, project),
        Message::CycleCategory { category } => product::handle_cycle_category(state, category),
        Message::UpdateProductView { project } => product::handle_update_view(state, &project),
    }
}

fn select_project(state: &mut AppState, project: &str) -> UpdateResult {
    state.select_project(project);
    product::watch_selected(state)
}

fn step_project(state: &mut AppState, forward: bool) -> UpdateResult {
    let n = state.projects.len();
    if n < 2 {
        return UpdateResult::none();
    }
    let current = state.selected_project_index().unwrap_or(0);
    let next = if forward { (current + 1) % n } else { (current + n - 1) % n };
    let project = state.projects[next].clone();
    UpdateResult::message(Message::SelectProject { project })
}

/// Create the action handler of a launch tab on first selection and
/// refresh the grid of a product view tab
fn on_tab_selected(state: &mut AppState) -> UpdateResult {
    match state.selected_tab_kind().cloned() {
        Some(TabKind::Launch { .. }) => {
            let factory = state.handler_factory();
            state.client.selected_launch_mut(factory.as_ref());
            UpdateResult::none()
        }
        Some(TabKind::ProductView { project }) if state.product.layout.is_none() => {
            UpdateResult::message(Message::UpdateProductView { project })
        }
        _ => UpdateResult::none(),
    }
}

fn close_tab(state: &mut AppState) -> UpdateResult {
    match state.selected_tab_kind().cloned() {
        Some(TabKind::Launch { instance_id }) => {
            let closable = state
                .client
                .launch(&instance_id)
                .map(|i| i.monitor().map_or(true, |m| m.can_close()))
                .unwrap_or(false);
            if !closable {
                state.notify("Jobs are still running; terminate them first");
                return UpdateResult::none();
            }
            let workspace = state.workspace.clone();
            if let Err(e) = state.client.remove_launch(workspace.as_ref(), &instance_id) {
                state.show_error("Removing launch instance failed", &e, None);
            }
            UpdateResult::none()
        }
        Some(TabKind::ProductView { project }) => {
            state.client.close_product_view(&project);
            state.product = Default::default();
            UpdateResult::action(UpdateAction::StopWatching)
        }
        Some(TabKind::Configuration) => {
            state.notify("The configuration tab cannot be closed");
            UpdateResult::none()
        }
        None => UpdateResult::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::state::AppPhase;
    use artdeck_core::Error;
    use artdeck_daemon::test_utils::sample_workspace;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_state() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let ws = sample_workspace(temp.path());
        let mut state = AppState::new(Arc::new(ws), Settings::default());
        state.load_projects();
        (temp, state)
    }

    #[test]
    fn test_quit_sets_phase() {
        let (_temp, mut state) = test_state();
        update(&mut state, Message::Quit);
        assert_eq!(state.phase, AppPhase::Quitting);
    }

    #[test]
    fn test_cancel_quit_returns_to_normal() {
        let (_temp, mut state) = test_state();
        state.ui_mode = UiMode::ConfirmQuit;
        update(&mut state, Message::CancelQuit);
        assert_eq!(state.ui_mode, UiMode::Normal);
        assert!(!state.should_quit());
    }

    #[test]
    fn test_retry_error_emits_retry_message() {
        let (_temp, mut state) = test_state();
        state.show_error("Oops", &Error::config("broken"), Some(Message::ReloadConfig));
        let result = update(&mut state, Message::RetryError);
        assert!(matches!(result.message, Some(Message::ReloadConfig)));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_dismiss_error() {
        let (_temp, mut state) = test_state();
        state.show_error("Oops", &Error::config("broken"), None);
        update(&mut state, Message::DismissError);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_configuration_tab_cannot_close() {
        let (_temp, mut state) = test_state();
        update(&mut state, Message::CloseTab);
        assert_eq!(state.client.tabs().len(), 1);
        assert_eq!(
            state.last_notification(),
            Some("The configuration tab cannot be closed")
        );
    }

    #[test]
    fn test_single_project_does_not_step() {
        let (_temp, mut state) = test_state();
        let result = update(&mut state, Message::NextProject);
        assert!(result.message.is_none());
    }

    #[test]
    fn test_select_tab_by_index_out_of_range() {
        let (_temp, mut state) = test_state();
        update(&mut state, Message::SelectTab { index: 5 });
        assert_eq!(state.client.tabs().selected_key(), Some("config"));
    }
}
