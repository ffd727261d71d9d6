//! Test utilities for rendering checks
//!
//! Widgets and whole frames are drawn to ratatui's TestBackend and the
//! buffer is searched for text.
//!
//! ```ignore
//! let mut term = TestTerminal::new();
//! term.draw_with(|frame| { view(frame, &state); });
//! assert!(term.buffer_contains("Configuration"));
//! ```

use std::sync::Arc;

use artdeck_app::config::Settings;
use artdeck_app::AppState;
use artdeck_daemon::test_utils::sample_workspace;
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use ratatui::{Frame, Terminal};
use tempfile::TempDir;

/// Standard test terminal size
pub const TEST_WIDTH: u16 = 80;
pub const TEST_HEIGHT: u16 = 24;

pub struct TestTerminal {
    pub terminal: Terminal<TestBackend>,
}

impl TestTerminal {
    pub fn new() -> Self {
        Self::with_size(TEST_WIDTH, TEST_HEIGHT)
    }

    pub fn with_size(width: u16, height: u16) -> Self {
        let backend = TestBackend::new(width, height);
        let terminal = Terminal::new(backend).expect("Failed to create test terminal");
        Self { terminal }
    }

    pub fn area(&self) -> Rect {
        let size = self.terminal.size().expect("Failed to get terminal size");
        Rect::new(0, 0, size.width, size.height)
    }

    pub fn render_widget<W: Widget>(&mut self, widget: W, area: Rect) {
        self.terminal
            .draw(|frame| frame.render_widget(widget, area))
            .expect("Failed to render widget");
    }

    /// Draw a full frame, e.g. with [`crate::render::view`]
    pub fn draw_with<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(f).expect("Failed to draw frame");
    }

    pub fn buffer(&self) -> &Buffer {
        self.terminal.backend().buffer()
    }

    pub fn buffer_contains(&self, text: &str) -> bool {
        buffer_to_string(self.buffer()).contains(text)
    }

    pub fn line_contains(&self, line: u16, text: &str) -> bool {
        line_content(self.buffer(), line).contains(text)
    }

    /// All content, one terminal row per line
    pub fn content(&self) -> String {
        buffer_to_string(self.buffer())
    }
}

impl Default for TestTerminal {
    fn default() -> Self {
        Self::new()
    }
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let mut result = String::new();
    for y in 0..buffer.area.height {
        result.push_str(&line_content(buffer, y));
        result.push('\n');
    }
    result
}

fn line_content(buffer: &Buffer, line: u16) -> String {
    let mut result = String::new();
    if line < buffer.area.height {
        for x in 0..buffer.area.width {
            result.push_str(buffer[(x, line)].symbol());
        }
    }
    result
}

/// Console state on the sample workspace with its project selected
pub fn test_state() -> (TempDir, AppState) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let ws = sample_workspace(temp.path());
    let mut state = AppState::new(Arc::new(ws), Settings::default());
    state.load_projects();
    (temp, state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::widgets::Paragraph;

    #[test]
    fn test_terminal_creation() {
        let term = TestTerminal::new();
        assert_eq!(term.area(), Rect::new(0, 0, TEST_WIDTH, TEST_HEIGHT));
    }

    #[test]
    fn test_buffer_contains() {
        let mut term = TestTerminal::with_size(20, 3);
        term.render_widget(Paragraph::new("Hello World"), term.area());
        assert!(term.buffer_contains("Hello World"));
        assert!(term.line_contains(0, "Hello"));
        assert!(!term.line_contains(1, "Hello"));
        assert_eq!(term.content().lines().count(), 3);
    }

    #[test]
    fn test_state_selects_sample_project() {
        let (_temp, state) = test_state();
        assert_eq!(state.client.project(), Some("demo/p1"));
        assert!(state.config.is_some());
    }
}
