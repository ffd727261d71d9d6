//! Launch tab handlers

use artdeck_core::prelude::*;

use crate::job_monitor::JobMonitor;
use crate::message::Message;
use crate::state::AppState;

use super::UpdateResult;

/// Monitor of the selected launch tab, creating its handler on first use
fn selected_monitor(state: &mut AppState) -> Option<&mut JobMonitor> {
    let factory = state.handler_factory();
    let instance = state.client.selected_launch_mut(factory.as_ref())?;
    Some(instance.monitor_mut(factory.as_ref()))
}

/// Poll every job monitor
pub fn handle_tick(state: &mut AppState) -> UpdateResult {
    if state.client.poll_launches() {
        trace!("Job monitors changed");
    }
    state.collect_client_notifications();
    UpdateResult::none()
}

pub fn handle_launch_jobs(state: &mut AppState) -> UpdateResult {
    let Some(monitor) = selected_monitor(state) else {
        return UpdateResult::none();
    };
    if !monitor.can_launch() {
        state.notify("Jobs are already running");
        return UpdateResult::none();
    }
    if let Err(e) = monitor.launch() {
        state.show_error("Launching jobs failed", &e, Some(Message::LaunchJobs));
    }
    UpdateResult::none()
}

pub fn handle_terminate_selected(state: &mut AppState) -> UpdateResult {
    let Some(monitor) = selected_monitor(state) else {
        return UpdateResult::none();
    };
    if let Err(e) = monitor.terminate_selected() {
        state.notify(e.to_string());
    }
    UpdateResult::none()
}

pub fn handle_terminate_all(state: &mut AppState) -> UpdateResult {
    let Some(monitor) = selected_monitor(state) else {
        return UpdateResult::none();
    };
    if monitor.can_terminate_all() {
        monitor.terminate_all();
    } else {
        state.notify("No jobs are running");
    }
    UpdateResult::none()
}

pub fn handle_select_job(state: &mut AppState, delta: isize) -> UpdateResult {
    let Some(monitor) = selected_monitor(state) else {
        return UpdateResult::none();
    };
    let count = monitor.job_count();
    if count == 0 {
        return UpdateResult::none();
    }
    let next = match monitor.selected() {
        Some(idx) => (idx as isize + delta).clamp(0, count as isize - 1) as usize,
        None => 0,
    };
    if let Err(e) = monitor.select_job(next) {
        state.notify(e.to_string());
    }
    UpdateResult::none()
}

pub fn handle_scroll(state: &mut AppState, delta: isize) -> UpdateResult {
    if let Some(monitor) = selected_monitor(state) {
        monitor.scroll_by(delta);
    }
    UpdateResult::none()
}

pub fn handle_next_output_type(state: &mut AppState) -> UpdateResult {
    if let Some(monitor) = selected_monitor(state) {
        monitor.next_output_type();
    }
    UpdateResult::none()
}

/// Height of the output pane as rendered
pub fn handle_viewport(state: &mut AppState, lines: usize) -> UpdateResult {
    if let Some(monitor) = selected_monitor(state) {
        monitor.set_viewport(lines);
    }
    UpdateResult::none()
}
