//! Configuration page: launch selection, launch arguments and trial values

use artdeck_app::controls::ValueGrid;
use artdeck_app::message::ConfigFocus;
use artdeck_app::state::{ConfigPage, ConfigSelector};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::theme::styles;

const SELECTOR_LABEL_WIDTH: usize = 15;

pub struct ConfigPageView<'a> {
    page: &'a ConfigPage,
    /// Text being edited for the value under the cursor
    edit: Option<&'a str>,
    /// Info text being edited for the selector under the cursor
    info_edit: Option<&'a str>,
}

impl<'a> ConfigPageView<'a> {
    pub fn new(page: &'a ConfigPage) -> Self {
        Self {
            page,
            edit: None,
            info_edit: None,
        }
    }

    pub fn editing(mut self, buffer: &'a str) -> Self {
        self.edit = Some(buffer);
        self
    }

    pub fn editing_info(mut self, buffer: &'a str) -> Self {
        self.info_edit = Some(buffer);
        self
    }

    fn selector_lines(&self) -> Vec<Line<'static>> {
        let focused = self.page.focus == ConfigFocus::Selectors;
        ConfigSelector::ALL
            .iter()
            .enumerate()
            .map(|(row, selector)| {
                let choices = self.page.choices(*selector);
                let current = choices.current().unwrap_or("-").to_string();
                let value_style = if focused && row == self.page.cursor {
                    styles::focused_selected()
                } else {
                    styles::text_primary()
                };
                let mut spans = vec![
                    Span::styled(
                        format!(" {:<width$}", selector.label(), width = SELECTOR_LABEL_WIDTH),
                        styles::text_secondary(),
                    ),
                    Span::styled(format!("‹ {} ›", current), value_style),
                ];
                if choices.items.len() > 1 {
                    spans.push(Span::styled(
                        format!("  {}/{}", choices.selected + 1, choices.items.len()),
                        styles::text_muted(),
                    ));
                }
                match (self.info_edit, focused && row == self.page.cursor) {
                    (Some(buffer), true) => spans.push(Span::styled(
                        format!("  info: {}▏", buffer),
                        styles::focused_selected(),
                    )),
                    _ => {
                        if let Some(info) = self.page.info(*selector).filter(|i| !i.is_empty()) {
                            spans.push(Span::styled(format!("  {}", info), styles::text_muted()));
                        }
                    }
                }
                Line::from(spans)
            })
            .collect()
    }

    fn render_grid(&self, grid: Option<&ValueGrid>, focus: ConfigFocus, title: &str, area: Rect, buf: &mut Buffer) {
        let focused = self.page.focus == focus;
        let block = styles::pane_block(title, focused);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(grid) = grid.filter(|g| g.is_visible()) else {
            Paragraph::new(Span::styled(" No values", styles::text_muted())).render(inner, buf);
            return;
        };

        let selected = focused.then(|| self.page.selected_name()).flatten();
        let (lines, selected_line) = grid_lines(grid, selected.as_deref(), self.edit, inner.width);
        let offset = scroll_offset(selected_line, inner.height);
        Paragraph::new(lines).scroll((offset, 0)).render(inner, buf);
    }
}

impl Widget for ConfigPageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::vertical([
            Constraint::Length(ConfigSelector::ALL.len() as u16 + 2),
            Constraint::Min(3),
            Constraint::Min(3),
        ])
        .split(area);

        let block = styles::pane_block("Launch", self.page.focus == ConfigFocus::Selectors);
        let inner = block.inner(chunks[0]);
        block.render(chunks[0], buf);
        Paragraph::new(self.selector_lines()).render(inner, buf);

        self.render_grid(
            self.page.launch_grid.as_ref(),
            ConfigFocus::LaunchArgs,
            "Launch Arguments",
            chunks[1],
            buf,
        );
        self.render_grid(
            self.page.trial_grid.as_ref(),
            ConfigFocus::TrialValues,
            "Trial Values",
            chunks[2],
            buf,
        );
    }
}

/// Lines of a value grid and the line of the selected value
pub fn grid_lines(
    grid: &ValueGrid,
    selected: Option<&str>,
    edit: Option<&str>,
    width: u16,
) -> (Vec<Line<'static>>, Option<usize>) {
    let columns = grid.columns().max(1);
    let cell_width = (width as usize / columns).max(1);
    let mut lines = Vec::new();
    let mut selected_line = None;

    for group in grid.groups() {
        if let Some(title) = &group.title {
            lines.push(Line::from(Span::styled(format!("─ {} ", title), styles::accent())));
        }
        for row in &group.rows {
            let mut spans = Vec::with_capacity(row.len());
            for name in row {
                let is_selected = selected == Some(name.as_str());
                if is_selected {
                    selected_line = Some(lines.len());
                }
                let text = match (is_selected, edit) {
                    (true, Some(buffer)) => format!("{}: {}▏", label_of(grid, name), buffer),
                    _ => cell_text(grid, name),
                };
                let style = if is_selected {
                    styles::focused_selected()
                } else {
                    Style::default()
                };
                spans.push(Span::styled(fit(&format!(" {}", text), cell_width), style));
            }
            lines.push(Line::from(spans));
        }
    }
    (lines, selected_line)
}

fn label_of(grid: &ValueGrid, name: &str) -> String {
    grid.control(name)
        .map(|c| c.label.clone())
        .unwrap_or_else(|| name.to_string())
}

/// `label: value` of one control, masked for passwords
fn cell_text(grid: &ValueGrid, name: &str) -> String {
    match (grid.control(name), grid.displayed(name)) {
        (Some(ctrl), Some(value)) => format!("{}: {}", ctrl.label, ctrl.display(value)),
        (Some(ctrl), None) => format!("{}:", ctrl.label),
        (None, _) => name.to_string(),
    }
}

/// Pad or cut `text` to exactly `width` columns
fn fit(text: &str, width: usize) -> String {
    if text.width() <= width {
        return format!("{}{}", text, " ".repeat(width - text.width()));
    }
    let mut out = String::new();
    for c in text.chars() {
        if out.width() + c.to_string().width() >= width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    let pad = width.saturating_sub(out.width());
    out.push_str(&" ".repeat(pad));
    out
}

/// First line to show so that `line` is inside a viewport of `height`
pub fn scroll_offset(line: Option<usize>, height: u16) -> u16 {
    match line {
        Some(line) if height > 0 && line >= height as usize => (line + 1 - height as usize) as u16,
        _ => 0,
    }
}
