//! Main render/view function (View in TEA pattern)

use artdeck_app::state::{AppState, UiMode};
use artdeck_app::tabs::TabKind;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Span;
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::theme::{palette, styles};
use crate::{layout, widgets};

/// What the runner feeds back into the state after a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Lines of the output pane of the selected launch tab
    pub output_viewport: Option<usize>,
}

/// Render the complete UI
pub fn view(frame: &mut Frame, state: &AppState) -> FrameInfo {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(palette::DEEPEST_BG)),
        area,
    );

    let areas = layout::create(area);
    frame.render_widget(
        widgets::MainHeader::new(state.client.project(), state.projects.len(), state.client.tabs()),
        areas.header,
    );

    let info = render_page(frame, state, areas.body);
    frame.render_widget(widgets::StatusBar::new(state), areas.status);

    if let Some(card) = &state.error {
        frame.render_widget(widgets::ErrorDialog::new(card), areas.body);
    }
    match state.ui_mode {
        UiMode::ConfirmQuit => frame.render_widget(widgets::ConfirmQuitDialog, area),
        UiMode::ConfirmRemoveVariant => {
            if let Some(key) = state.config.as_ref().and_then(|p| p.pending_removal.as_ref()) {
                frame.render_widget(widgets::ConfirmRemoveDialog::new(key), area);
            }
        }
        _ => {}
    }
    info
}

fn render_page(frame: &mut Frame, state: &AppState, area: Rect) -> FrameInfo {
    match state.selected_tab_kind() {
        Some(TabKind::Configuration) => {
            match &state.config {
                Some(page) => {
                    let mut view = widgets::ConfigPageView::new(page);
                    match state.ui_mode {
                        UiMode::EditValue => view = view.editing(&state.edit_buffer),
                        UiMode::EditInfo => view = view.editing_info(&state.edit_buffer),
                        _ => {}
                    }
                    frame.render_widget(view, area);
                }
                None => placeholder(frame, area, "No configuration loaded"),
            }
            FrameInfo::default()
        }
        Some(TabKind::ProductView { project }) => {
            match state.client.product_view(project) {
                Some(view) => {
                    frame.render_widget(widgets::ProductViewPanel::new(view, &state.product), area)
                }
                None => placeholder(frame, area, "Scanning artefacts..."),
            }
            FrameInfo::default()
        }
        Some(TabKind::Launch { instance_id }) => match state.client.launch(instance_id) {
            Some(instance) => {
                frame.render_widget(widgets::LaunchPanel::new(instance), area);
                FrameInfo {
                    output_viewport: Some(widgets::output_viewport(area)),
                }
            }
            None => {
                placeholder(frame, area, "Launch instance removed");
                FrameInfo::default()
            }
        },
        None => {
            placeholder(frame, area, "No project selected");
            FrameInfo::default()
        }
    }
}

fn placeholder(frame: &mut Frame, area: Rect, text: &str) {
    let block = styles::glass_block(false);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Span::styled(format!(" {}", text), styles::text_muted())),
        inner,
    );
}
