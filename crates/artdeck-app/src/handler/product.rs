//! Product view handlers
//!
//! Scans run as [`UpdateAction::ScanProduction`] and come back as
//! [`Message::ScanCompleted`]. Every selection change only marks the grid
//! as updating; the rebuild itself is deferred by
//! [`UpdateAction::ScheduleViewUpdate`] so a burst of key presses costs a
//! single layout pass.

use std::path::PathBuf;

use artdeck_core::prelude::*;
use artdeck_core::selection::{self, ALL};
use artdeck_core::view_dim::ArtefactCell;
use artdeck_core::{PosRange, PosRangeStyle, WindowRange};
use artdeck_daemon::production::PRODUCTION_FILE;

use crate::message::{Message, ProductPane};
use crate::product_view::{ProductViewState, ScanRequest, ScanResult};
use crate::state::{AppState, ProductPage, RangePreview};

use super::{UpdateAction, UpdateResult};

/// Watch the production definition of the selected project's product view
pub fn watch_selected(state: &AppState) -> UpdateResult {
    if !state.settings.product_view.watch_production {
        return UpdateResult::action(UpdateAction::StopWatching);
    }
    let pv = state
        .client
        .project()
        .and_then(|project| state.client.product_view(project));
    match pv {
        Some(pv) => UpdateResult::action(UpdateAction::WatchProduction {
            path: pv.variant_group().join(PRODUCTION_FILE),
        }),
        None => UpdateResult::action(UpdateAction::StopWatching),
    }
}

fn scan(state: &mut AppState, project: String, request: ScanRequest) -> UpdateResult {
    if state.product.scanning {
        state.notify("A scan is already running");
        return UpdateResult::none();
    }
    state.product.scanning = true;
    state.notify("Scanning artefacts...");
    UpdateResult::action(UpdateAction::ScanProduction { project, request })
}

/// Open the product view of the selected variant group
pub fn handle_open(state: &mut AppState, rescan: bool) -> UpdateResult {
    let Some(project) = state.client.project().map(str::to_string) else {
        return UpdateResult::none();
    };
    let Some(group) = state
        .config
        .as_ref()
        .and_then(|page| page.variant_groups.current())
        .map(str::to_string)
    else {
        state.notify("Select a variant group first");
        return UpdateResult::none();
    };

    let workspace = state.workspace.clone();
    let paths = workspace
        .variant_group_path(&project, &group)
        .and_then(|vg| Ok((workspace.production_path(&project, &group)?, vg)));
    let (production_path, variant_group) = match paths {
        Ok(paths) => paths,
        Err(e) => {
            state.show_error(
                "Opening product view failed",
                &e,
                Some(Message::OpenProductView { rescan }),
            );
            return UpdateResult::none();
        }
    };

    let group_id = state
        .client
        .product_view(&project)
        .filter(|pv| pv.variant_group() == variant_group)
        .map(|pv| pv.group_id().to_string());

    scan(
        state,
        project,
        ScanRequest {
            production_path,
            variant_group,
            group_id,
            rescan,
        },
    )
}

/// Switch the product view to the next production group
pub fn handle_next_group(state: &mut AppState) -> UpdateResult {
    let Some(project) = state.client.project().map(str::to_string) else {
        return UpdateResult::none();
    };
    let Some(pv) = state.client.product_view(&project) else {
        return UpdateResult::none();
    };
    let ids = pv.group_ids();
    if ids.len() < 2 {
        state.notify("The production defines a single group");
        return UpdateResult::none();
    }
    let current = ids.iter().position(|id| id == pv.group_id()).unwrap_or(0);
    let next = ids[(current + 1) % ids.len()].clone();
    let variant_group = pv.variant_group().to_path_buf();
    let request = ScanRequest {
        production_path: variant_group.join(PRODUCTION_FILE),
        variant_group,
        group_id: Some(next),
        rescan: false,
    };
    scan(state, project, request)
}

pub fn handle_scan_completed(
    state: &mut AppState,
    project: String,
    variant_group: PathBuf,
    production_path: PathBuf,
    result: std::result::Result<ScanResult, String>,
) -> UpdateResult {
    state.product.scanning = false;
    let scan = match result {
        Ok(scan) => scan,
        Err(message) => {
            state.show_error(
                "Scanning artefacts failed",
                &Error::scan(message),
                Some(Message::OpenProductView { rescan: false }),
            );
            return UpdateResult::none();
        }
    };

    let feedback = if scan.from_cache {
        format!("Loaded artefacts cached on {}", scan.date_text())
    } else {
        format!("Scanned {} artefacts", scan.catalog.artefacts().len())
    };
    let pv = ProductViewState::new(&variant_group, scan, state.layout_config());
    if let Err(e) = state.client.open_product_view(&project, pv) {
        state.show_error("Opening product view failed", &e, None);
        return UpdateResult::none();
    }
    state.notify(feedback);

    if state.client.project() != Some(project.as_str()) {
        return UpdateResult::none();
    }
    state.product = ProductPage::default();
    refresh_layout(state, &project);

    if state.settings.product_view.watch_production {
        UpdateResult::action(UpdateAction::WatchProduction {
            path: production_path,
        })
    } else {
        UpdateResult::none()
    }
}

pub fn handle_production_changed(state: &mut AppState) -> UpdateResult {
    let Some(project) = state.client.project().map(str::to_string) else {
        return UpdateResult::none();
    };
    if let Some(pv) = state.client.product_view_mut(&project) {
        if !pv.is_stale() {
            pv.mark_stale();
            state.notify("Production definition changed, press R to rescan");
        }
    }
    UpdateResult::none()
}

pub fn handle_pane_next(state: &mut AppState) -> UpdateResult {
    state.product.pane = match state.product.pane {
        ProductPane::Selectors => ProductPane::Types,
        ProductPane::Types => ProductPane::Slots,
        ProductPane::Slots => ProductPane::Ranges,
        ProductPane::Ranges => ProductPane::Cells,
        ProductPane::Cells => ProductPane::Selectors,
    };
    state.product.index = 0;
    UpdateResult::none()
}

/// Rows of the focused pane
fn pane_len(state: &AppState, pv: &ProductViewState) -> usize {
    match state.product.pane {
        ProductPane::Selectors => pv.selectors().len(),
        ProductPane::Types => pv.catalog().artefact_types.len(),
        ProductPane::Slots => pv.slot_rows().len(),
        ProductPane::Ranges => pv.range_keys().len(),
        ProductPane::Cells => state.product.cells().len(),
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current as isize + delta).clamp(0, len as isize - 1) as usize
}

pub fn handle_move(state: &mut AppState, delta: isize) -> UpdateResult {
    let Some(pv) = state.client.project().and_then(|p| state.client.product_view(p)) else {
        return UpdateResult::none();
    };
    let len = pane_len(state, pv);
    if state.product.pane == ProductPane::Cells {
        state.product.cell = step(state.product.cell, delta, len);
    } else {
        state.product.index = step(state.product.index, delta, len);
    }
    UpdateResult::none()
}

/// Change the focused row: next value, type on/off, slot key or range window
pub fn handle_adjust(state: &mut AppState, forward: bool) -> UpdateResult {
    if state.product.pane == ProductPane::Cells {
        return handle_move(state, if forward { 1 } else { -1 });
    }
    let index = state.product.index;
    let pane = state.product.pane;
    edit_view(state, |pv| match pane {
        ProductPane::Selectors => {
            let Some(sel) = pv.selectors().into_iter().nth(index) else {
                return Ok(false);
            };
            let choices: Vec<&str> = std::iter::once(ALL)
                .chain(sel.options.values().iter().map(String::as_str))
                .collect();
            let current = match sel.selection.as_slice() {
                [single] => choices.iter().position(|c| c == single).unwrap_or(0),
                _ => 0,
            };
            let n = choices.len();
            let next = if forward { (current + 1) % n } else { (current + n - 1) % n };
            pv.set_selection(&sel.key, vec![choices[next].to_string()])?;
            Ok(true)
        }
        ProductPane::Types => toggle_type(pv, index),
        ProductPane::Slots => {
            pv.cycle_slot(index, forward)?;
            Ok(true)
        }
        ProductPane::Ranges => {
            let Some(key) = pv.range_keys().into_iter().nth(index) else {
                return Ok(false);
            };
            let Some(range) = pv.range_mut(&key) else {
                return Ok(false);
            };
            let delta = if forward { range.position_step() } else { -range.position_step() };
            range.set_position(range.position() + delta);
            Ok(true)
        }
        ProductPane::Cells => Ok(false),
    })
}

/// Toggle a type, reset a selector to all values or cycle the first category
pub fn handle_toggle(state: &mut AppState) -> UpdateResult {
    let index = state.product.index;
    match state.product.pane {
        ProductPane::Types => edit_view(state, |pv| toggle_type(pv, index)),
        ProductPane::Selectors => edit_view(state, |pv| {
            let Some(sel) = pv.selectors().into_iter().nth(index) else {
                return Ok(false);
            };
            if selection::is_all(&sel.selection) {
                return Ok(false);
            }
            pv.set_selection(&sel.key, selection::all())?;
            Ok(true)
        }),
        ProductPane::Cells => handle_cycle_category(state, 0),
        ProductPane::Slots | ProductPane::Ranges => UpdateResult::none(),
    }
}

pub fn handle_range_width(state: &mut AppState, delta: isize) -> UpdateResult {
    if state.product.pane != ProductPane::Ranges {
        return UpdateResult::none();
    }
    let index = state.product.index;
    edit_view(state, |pv| {
        let Some(key) = pv.range_keys().into_iter().nth(index) else {
            return Ok(false);
        };
        let Some(range) = pv.range_mut(&key) else {
            return Ok(false);
        };
        range.set_width(range.width() + delta as f64 * range.step());
        Ok(true)
    })
}

/// Two-endpoint view of a position/width range with the same limits
fn endpoint_window(range: &PosRange) -> WindowRange {
    let inclusive = if range.has_int_step() { range.step() } else { 0.0 };
    WindowRange::new(
        range.total_min(),
        range.total_max(),
        range.value_min(),
        range.value_max(),
        range.step(),
        Some(range.range_min() - inclusive),
        Some(range.range_max() - inclusive),
    )
}

/// Move one endpoint of the focused range.
///
/// An integrated range takes the window as is. Otherwise the moved endpoint
/// is kept and the other one follows when the width leaves its limits; the
/// requested window stays on screen until the deferred reset.
pub fn handle_range_endpoint(state: &mut AppState, upper: bool, delta: isize) -> UpdateResult {
    if state.product.pane != ProductPane::Ranges {
        return UpdateResult::none();
    }
    let Some(project) = state.client.project().map(str::to_string) else {
        return UpdateResult::none();
    };
    let row = state.product.index;
    let Some(pv) = state.client.product_view_mut(&project) else {
        return UpdateResult::none();
    };
    let Some(key) = pv.range_keys().into_iter().nth(row) else {
        return UpdateResult::none();
    };
    let Some(range) = pv.range_mut(&key) else {
        return UpdateResult::none();
    };

    let shift = delta as f64 * range.step();
    let (lo, hi) = if upper {
        (range.value_min(), range.value_max() + shift)
    } else {
        (range.value_min() + shift, range.value_max())
    };
    let corrected = if range.style() == PosRangeStyle::Integrated {
        range.set_window(lo, hi);
        false
    } else {
        let update = endpoint_window(range).set(lo, hi);
        range.set_values(update.value_min, update.value_max);
        update.needs_reset
    };

    if corrected {
        state.product.range_preview = Some(RangePreview {
            row,
            value_min: lo,
            value_max: hi,
        });
        UpdateResult::action(UpdateAction::ScheduleRangeReset { project })
    } else {
        schedule_update(state, project)
    }
}

/// Show the stored window again and rebuild the grid
pub fn handle_range_reset(state: &mut AppState, project: String) -> UpdateResult {
    state.product.range_preview = None;
    if state.client.project() != Some(project.as_str()) {
        return UpdateResult::none();
    }
    schedule_update(state, project)
}

fn toggle_type(pv: &mut ProductViewState, index: usize) -> Result<bool> {
    let Some(type_id) = pv.catalog().artefact_types.get(index).map(|t| t.id.clone()) else {
        return Ok(false);
    };
    let on = !pv.is_type_active(&type_id);
    pv.toggle_type(&type_id, on)?;
    Ok(true)
}

/// Apply `edit` to the selected product view and defer a grid rebuild when
/// it reports a change
fn edit_view<F>(state: &mut AppState, edit: F) -> UpdateResult
where
    F: FnOnce(&mut ProductViewState) -> Result<bool>,
{
    let Some(project) = state.client.project().map(str::to_string) else {
        return UpdateResult::none();
    };
    let Some(pv) = state.client.product_view_mut(&project) else {
        return UpdateResult::none();
    };
    match edit(pv) {
        Ok(true) => schedule_update(state, project),
        Ok(false) => UpdateResult::none(),
        Err(e) => {
            state.notify(e.to_string());
            UpdateResult::none()
        }
    }
}

fn schedule_update(state: &mut AppState, project: String) -> UpdateResult {
    if state.product.updating {
        return UpdateResult::none();
    }
    state.product.updating = true;
    UpdateResult::action(UpdateAction::ScheduleViewUpdate { project })
}

/// Step the n-th category of the selected artefact cell
pub fn handle_cycle_category(state: &mut AppState, category: usize) -> UpdateResult {
    let Some(ArtefactCell::Present { category_path, .. }) = state.product.selected_cell() else {
        return UpdateResult::none();
    };
    let path = category_path.clone();
    let Some(project) = state.client.project().map(str::to_string) else {
        return UpdateResult::none();
    };
    let Some(pv) = state.client.product_view_mut(&project) else {
        return UpdateResult::none();
    };
    let Some((id, def)) = pv
        .category_defs()
        .iter()
        .nth(category)
        .map(|(id, def)| (id.clone(), def.clone()))
    else {
        return UpdateResult::none();
    };
    match pv.cycle_category(&path, &id) {
        Ok(value) => {
            let choice = def
                .choices
                .get(value)
                .map(|c| c.description.as_str())
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());
            debug!("Category '{}' of {:?} set to {}", id, path, value);
            state.notify(format!("{}: {}", def.name, choice));
        }
        Err(e) => state.notify(e.to_string()),
    }
    UpdateResult::none()
}

/// Deferred grid rebuild
pub fn handle_update_view(state: &mut AppState, project: &str) -> UpdateResult {
    state.product.updating = false;
    if state.client.project() != Some(project) {
        return UpdateResult::none();
    }
    refresh_layout(state, project);
    UpdateResult::none()
}

fn refresh_layout(state: &mut AppState, project: &str) {
    let Some(pv) = state.client.product_view(project) else {
        state.product.layout = None;
        return;
    };
    match pv.layout() {
        Ok(layout) => {
            state.product.layout = layout;
            let cells = state.product.cells().len();
            state.product.cell = state.product.cell.min(cells.saturating_sub(1));
        }
        Err(e) => state.show_error(
            "Updating view failed",
            &e,
            Some(Message::UpdateProductView {
                project: project.to_string(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::handler::update;
    use crate::product_view::load_or_scan;
    use crate::tabs::TabKind;
    use artdeck_daemon::test_utils::{sample_workspace, touch};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn vg_dir(root: &Path) -> PathBuf {
        root.join("config/demo/p1/variants/vg1")
    }

    fn test_state() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let ws = sample_workspace(temp.path());
        for trial in ["t1", "t2"] {
            for cam in ["a", "b"] {
                touch(&vg_dir(temp.path()).join(format!("production/{}/cam_{}/Frame_1.png", trial, cam)));
            }
        }
        let mut state = AppState::new(Arc::new(ws), Settings::default());
        state.load_projects();
        (temp, state)
    }

    /// Run the scan the open action asks for and feed the result back
    fn open_view(state: &mut AppState) {
        let result = update(state, Message::OpenProductView { rescan: false });
        let Some(UpdateAction::ScanProduction { project, request }) = result.action else {
            panic!("expected a scan action");
        };
        let scanned = load_or_scan(&request).map_err(|e| e.to_string());
        update(
            state,
            Message::ScanCompleted {
                project,
                variant_group: request.variant_group.clone(),
                production_path: request.production_path.clone(),
                result: scanned,
            },
        );
    }

    #[test]
    fn test_open_requests_scan_of_selected_group() {
        let (temp, mut state) = test_state();
        let result = update(&mut state, Message::OpenProductView { rescan: true });
        match result.action {
            Some(UpdateAction::ScanProduction { project, request }) => {
                assert_eq!(project, "demo/p1");
                assert_eq!(request.variant_group, vg_dir(temp.path()));
                assert!(request.rescan);
                assert!(request.group_id.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(state.product.scanning);

        let again = update(&mut state, Message::OpenProductView { rescan: false });
        assert!(again.action.is_none());
        assert_eq!(state.last_notification(), Some("A scan is already running"));
    }

    #[test]
    fn test_scan_completed_opens_tab_and_watches() {
        let (temp, mut state) = test_state();
        let result = update(&mut state, Message::OpenProductView { rescan: false });
        let Some(UpdateAction::ScanProduction { project, request }) = result.action else {
            panic!("expected a scan action");
        };
        let done = update(
            &mut state,
            Message::ScanCompleted {
                project,
                variant_group: request.variant_group.clone(),
                production_path: request.production_path.clone(),
                result: load_or_scan(&request).map_err(|e| e.to_string()),
            },
        );
        assert!(!state.product.scanning);
        assert!(matches!(
            state.selected_tab_kind(),
            Some(TabKind::ProductView { project }) if project == "demo/p1"
        ));
        assert_eq!(state.product.cells().len(), 4);
        assert_eq!(state.last_notification(), Some("Scanned 4 artefacts"));
        match done.action {
            Some(UpdateAction::WatchProduction { path }) => {
                assert_eq!(path, vg_dir(temp.path()).join(PRODUCTION_FILE))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scan_failure_shows_error_with_retry() {
        let (temp, mut state) = test_state();
        state.product.scanning = true;
        update(
            &mut state,
            Message::ScanCompleted {
                project: "demo/p1".into(),
                variant_group: vg_dir(temp.path()),
                production_path: vg_dir(temp.path()).join(PRODUCTION_FILE),
                result: Err("disk on fire".into()),
            },
        );
        let card = state.error.as_ref().unwrap();
        assert_eq!(card.title, "Scanning artefacts failed");
        assert!(card.message.contains("disk on fire"));
        assert!(matches!(card.retry, Some(Message::OpenProductView { rescan: false })));
        assert!(!state.product.scanning);
    }

    #[test]
    fn test_selector_change_defers_view_update() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);

        let result = update(&mut state, Message::ProductAdjust { forward: true });
        assert!(state.product.updating);
        let Some(UpdateAction::ScheduleViewUpdate { project }) = result.action else {
            panic!("expected a deferred update");
        };

        // a second change while pending does not schedule again
        let second = update(&mut state, Message::ProductAdjust { forward: true });
        assert!(second.action.is_none());

        update(&mut state, Message::UpdateProductView { project });
        assert!(!state.product.updating);
        // first selector narrowed to its first value
        assert_eq!(state.product.cells().len(), 2);
    }

    #[test]
    fn test_toggle_resets_selector_to_all() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);
        update(&mut state, Message::ProductAdjust { forward: false });
        update(&mut state, Message::UpdateProductView { project: "demo/p1".into() });
        assert_eq!(state.product.cells().len(), 2);

        update(&mut state, Message::ProductToggle);
        update(&mut state, Message::UpdateProductView { project: "demo/p1".into() });
        assert_eq!(state.product.cells().len(), 4);
    }

    #[test]
    fn test_move_is_clamped_per_pane() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);
        update(&mut state, Message::ProductMove { delta: 10 });
        assert_eq!(state.product.index, 1);

        for _ in 0..4 {
            update(&mut state, Message::ProductPaneNext);
        }
        assert_eq!(state.product.pane, ProductPane::Cells);
        update(&mut state, Message::ProductMove { delta: 10 });
        assert_eq!(state.product.cell, 3);
        update(&mut state, Message::ProductMove { delta: -10 });
        assert_eq!(state.product.cell, 0);
    }

    #[test]
    fn test_cycle_category_of_selected_cell() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);
        state.product.pane = ProductPane::Cells;
        update(&mut state, Message::CycleCategory { category: 0 });
        assert_eq!(state.last_notification(), Some("Quality: bad"));

        let path = match state.product.selected_cell() {
            Some(ArtefactCell::Present { category_path, .. }) => category_path.clone(),
            other => panic!("unexpected {:?}", other),
        };
        let pv = state.client.product_view("demo/p1").unwrap();
        assert_eq!(pv.category(&path, "quality"), Some(1));

        // unknown category index is ignored
        update(&mut state, Message::CycleCategory { category: 5 });
        assert_eq!(state.last_notification(), Some("Quality: bad"));
    }

    #[test]
    fn test_production_change_marks_stale_once() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);
        update(&mut state, Message::ProductionChanged);
        update(&mut state, Message::ProductionChanged);
        assert!(state.client.product_view("demo/p1").unwrap().is_stale());
        let hints = state
            .notifications()
            .filter(|n| n.contains("press R"))
            .count();
        assert_eq!(hints, 1);
    }

    #[test]
    fn test_close_product_tab_stops_watching() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);
        let result = update(&mut state, Message::CloseTab);
        assert!(matches!(result.action, Some(UpdateAction::StopWatching)));
        assert!(state.client.product_view("demo/p1").is_none());
        assert!(state.product.layout.is_none());
    }

    #[test]
    fn test_single_group_does_not_rescan() {
        let (_temp, mut state) = test_state();
        open_view(&mut state);
        let result = update(&mut state, Message::NextProductionGroup);
        assert!(result.action.is_none());
    }

    /// One trial and camera with 25 frames, so only the frame range exists
    fn frames_state() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let ws = sample_workspace(temp.path());
        for frame in 1..=25 {
            touch(&vg_dir(temp.path()).join(format!("production/t1/cam_a/Frame_{}.png", frame)));
        }
        let mut state = AppState::new(Arc::new(ws), Settings::default());
        state.load_projects();
        open_view(&mut state);
        state.product.pane = ProductPane::Ranges;
        state.product.index = 0;
        (temp, state)
    }

    fn frame_range(state: &AppState) -> PosRange {
        let pv = state.client.product_view("demo/p1").unwrap();
        let keys = pv.range_keys();
        assert_eq!(keys.len(), 1);
        pv.range(&keys[0]).unwrap().clone()
    }

    #[test]
    fn test_range_endpoint_within_limits_updates_view() {
        let (_temp, mut state) = frames_state();
        let result = update(&mut state, Message::RangeEndpoint { upper: false, delta: 1 });
        assert!(matches!(result.action, Some(UpdateAction::ScheduleViewUpdate { .. })));
        assert!(state.product.range_preview.is_none());

        let range = frame_range(&state);
        assert_eq!(range.value_min(), 2.0);
        assert_eq!(range.value_max(), 6.0);
    }

    #[test]
    fn test_range_endpoint_past_width_limit_resets_later() {
        let (_temp, mut state) = frames_state();
        let result = update(&mut state, Message::RangeEndpoint { upper: true, delta: 20 });
        let Some(UpdateAction::ScheduleRangeReset { project }) = result.action else {
            panic!("expected a deferred reset");
        };

        // the moved upper endpoint is kept, the lower one followed
        let range = frame_range(&state);
        assert_eq!(range.value_max(), 25.0);
        assert_eq!(range.width(), range.range_max());
        assert_eq!(
            state.product.range_preview,
            Some(RangePreview {
                row: 0,
                value_min: 1.0,
                value_max: 26.0
            })
        );

        let reset = update(&mut state, Message::ResetRangePreview { project });
        assert!(state.product.range_preview.is_none());
        assert!(matches!(reset.action, Some(UpdateAction::ScheduleViewUpdate { .. })));
    }

    #[test]
    fn test_range_endpoint_ignored_outside_ranges_pane() {
        let (_temp, mut state) = frames_state();
        state.product.pane = ProductPane::Cells;
        let result = update(&mut state, Message::RangeEndpoint { upper: true, delta: 1 });
        assert!(result.action.is_none());
        assert_eq!(frame_range(&state).value_max(), 6.0);
    }
}
