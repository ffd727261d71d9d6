//! Status bar widget
//!
//! One row under the page: background work of the product view, the
//! last notification and the key hints of the selected page.

use artdeck_app::message::ProductPane;
use artdeck_app::state::AppState;
use artdeck_app::tabs::TabKind;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::styles;

pub struct StatusBar<'a> {
    state: &'a AppState,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Scan, deferred update or stale production of the product view
    fn activity(&self) -> Option<Span<'static>> {
        let product = &self.state.product;
        if product.scanning {
            return Some(Span::styled("Scanning...", styles::status_yellow()));
        }
        if product.updating {
            return Some(Span::styled("Updating view...", styles::status_yellow()));
        }
        let stale = self
            .state
            .client
            .project()
            .and_then(|p| self.state.client.product_view(p))
            .is_some_and(|pv| pv.is_stale());
        stale.then(|| Span::styled("STALE", styles::status_red()))
    }

    fn key_hints(&self) -> &'static str {
        match self.state.selected_tab_kind() {
            Some(TabKind::Configuration) => {
                "[s] section  [←/→] change  [Enter] edit  [a/d] add/remove  [i] info  [l] launch"
            },
            Some(TabKind::Launch { .. }) => "[l] launch  [t/T] terminate  [o] output  [x] close",
            Some(TabKind::ProductView { .. }) if self.state.product.pane == ProductPane::Ranges => {
                "[s] pane  [←/→] move  [+/-] width  [ [/] ] lower  [{/}] upper"
            }
            Some(TabKind::ProductView { .. }) => "[s] pane  [←/→] adjust  [g] group  [R] rescan",
            None => "",
        }
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let separator = || Span::styled(" │ ", styles::text_muted());
        let mut spans = vec![Span::raw(" ")];

        if let Some(activity) = self.activity() {
            spans.push(activity);
            spans.push(separator());
        }
        if let Some(text) = self.state.last_notification() {
            spans.push(Span::styled(text.to_string(), styles::text_primary()));
            spans.push(separator());
        }
        spans.push(Span::styled(self.key_hints(), styles::text_muted()));

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_state, TestTerminal};

    fn render(state: &AppState) -> TestTerminal {
        let mut term = TestTerminal::with_size(100, 1);
        term.render_widget(StatusBar::new(state), Rect::new(0, 0, 100, 1));
        term
    }

    #[test]
    fn test_shows_key_hints_of_config_page() {
        let (_temp, state) = test_state();
        let term = render(&state);
        assert!(term.buffer_contains("[Enter] edit"));
    }

    #[test]
    fn test_shows_last_notification() {
        let (_temp, mut state) = test_state();
        state.notify("Saved trial values");
        let term = render(&state);
        assert!(term.buffer_contains("Saved trial values │"));
    }

    #[test]
    fn test_scanning_wins_over_updating() {
        let (_temp, mut state) = test_state();
        state.product.updating = true;
        assert!(render(&state).buffer_contains("Updating view..."));

        state.product.scanning = true;
        let term = render(&state);
        assert!(term.buffer_contains("Scanning..."));
        assert!(!term.buffer_contains("Updating view..."));
    }
}
