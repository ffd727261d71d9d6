//! Screen layout of the console
//!
//! A header with the project and tabs, the page of the selected tab and a
//! one-line status bar.

use ratatui::layout::{Constraint, Layout, Rect};

/// Header height: top border, title row, tab row, bottom border
pub const HEADER_HEIGHT: u16 = 4;

#[derive(Debug, Clone, Copy)]
pub struct ScreenAreas {
    pub header: Rect,
    /// Page of the selected tab
    pub body: Rect,
    pub status: Rect,
}

pub fn create(area: Rect) -> ScreenAreas {
    let chunks = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(area);

    ScreenAreas {
        header: chunks[0],
        body: chunks[1],
        status: chunks[2],
    }
}

/// Side panel and main area of the product view and launch pages
pub fn split_side(area: Rect, side_width: u16) -> (Rect, Rect) {
    let width = side_width.min(area.width / 2);
    let chunks = Layout::horizontal([Constraint::Length(width), Constraint::Min(1)]).split(area);
    (chunks[0], chunks[1])
}

/// Centered rectangle of the given size, clamped to `area`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
