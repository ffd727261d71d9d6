//! Main header: project, key hints and the tabs of the client

use artdeck_app::tabs::Tabs as ClientTabs;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Tabs, Widget},
};

use crate::theme::{icons, styles};

const MAX_TAB_TITLE: usize = 24;

pub struct MainHeader<'a> {
    project: Option<&'a str>,
    project_count: usize,
    tabs: &'a ClientTabs,
}

impl<'a> MainHeader<'a> {
    pub fn new(project: Option<&'a str>, project_count: usize, tabs: &'a ClientTabs) -> Self {
        Self {
            project,
            project_count,
            tabs,
        }
    }

    fn title_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("Project: ", styles::text_secondary()),
            Span::styled(
                self.project.unwrap_or("-").to_string(),
                styles::accent_bold(),
            ),
        ];
        if self.project_count > 1 {
            spans.push(Span::styled(
                format!(" ({} projects, [p] next)", self.project_count),
                styles::text_muted(),
            ));
        }
        spans.push(Span::styled(
            "  [Tab] tabs  [v] product view  [q] quit",
            styles::text_muted(),
        ));
        Line::from(spans)
    }

    /// Titles of the visible tabs and the position of the selected one
    fn tab_titles(&self) -> (Vec<Line<'static>>, Option<usize>) {
        let selected_key = self.tabs.selected_key();
        let mut selected = None;
        let titles = self
            .tabs
            .iter()
            .filter(|tab| tab.visible)
            .enumerate()
            .map(|(idx, tab)| {
                if Some(tab.key.as_str()) == selected_key {
                    selected = Some(idx);
                }
                let icon = tab.icon.as_deref().map(icons::glyph).unwrap_or(" ");
                Line::from(vec![
                    Span::raw(" "),
                    Span::styled(icon, styles::accent()),
                    Span::raw(format!(" {} ", truncate_name(&tab.title, MAX_TAB_TITLE))),
                ])
            })
            .collect();
        (titles, selected)
    }
}

impl Widget for MainHeader<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = styles::glass_block(true).title(Span::styled(" Artdeck ", styles::accent_bold()));
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }

        let padded = Rect {
            x: inner.x + 1,
            width: inner.width.saturating_sub(2),
            ..inner
        };
        Paragraph::new(self.title_line()).render(Rect { height: 1, ..padded }, buf);

        if inner.height < 2 {
            return;
        }
        let (titles, selected) = self.tab_titles();
        Tabs::new(titles)
            .select(selected)
            .highlight_style(styles::focused_selected())
            .divider("│")
            .render(
                Rect {
                    y: padded.y + 1,
                    height: 1,
                    ..padded
                },
                buf,
            );
    }
}

/// Truncate a name to max length, adding ellipsis if needed
pub fn truncate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        name.to_string()
    } else if max_len <= 1 {
        "…".to_string()
    } else {
        let truncated: String = name.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_state, TestTerminal};
    use artdeck_app::tabs::{Tab, TabKind};

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Short", 10), "Short");
        assert_eq!(truncate_name("demo/p1 - vg1 - trial-a", 12), "demo/p1 - v…");
        assert_eq!(truncate_name("abc", 1), "…");
    }

    #[test]
    fn test_header_shows_project_and_config_tab() {
        let (_temp, state) = test_state();
        let mut term = TestTerminal::new();
        let header = MainHeader::new(state.client.project(), state.projects.len(), state.client.tabs());
        term.render_widget(header, Rect::new(0, 0, 80, 4));

        assert!(term.line_contains(0, "Artdeck"));
        assert!(term.line_contains(1, "Project: demo/p1"));
        assert!(!term.line_contains(1, "projects"));
        assert!(term.line_contains(2, "Configuration"));
    }

    #[test]
    fn test_hidden_tabs_are_skipped() {
        let mut tabs = ClientTabs::new();
        tabs.add(Tab::new("a", "First", TabKind::Configuration)).unwrap();
        tabs.add(
            Tab::new(
                "b",
                "Hidden",
                TabKind::ProductView {
                    project: "p".into(),
                },
            )
            .with_icon("image"),
        )
        .unwrap();
        tabs.set_visible("b", false).unwrap();

        let mut term = TestTerminal::new();
        term.render_widget(MainHeader::new(Some("p"), 3, &tabs), Rect::new(0, 0, 80, 4));
        assert!(term.line_contains(1, "(3 projects, [p] next)"));
        assert!(term.line_contains(2, "First"));
        assert!(!term.buffer_contains("Hidden"));
    }
}
