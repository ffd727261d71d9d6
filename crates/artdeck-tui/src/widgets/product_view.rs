//! Product view page
//!
//! The side panel holds the value selectors, the artefact types, the
//! dimension slots and the ranges; the main area shows the artefact grid
//! as an indented tree, one line per dimension value and per cell.

use artdeck_app::message::ProductPane;
use artdeck_app::product_view::ProductViewState;
use artdeck_app::state::ProductPage;
use artdeck_core::selection;
use artdeck_core::view_dim::ArtefactCell;
use artdeck_core::{CategoryPath, LayoutNode};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::config_page::scroll_offset;
use crate::layout::split_side;
use crate::theme::{icons, palette, styles};

const SIDE_WIDTH: u16 = 38;

pub struct ProductViewPanel<'a> {
    view: &'a ProductViewState,
    page: &'a ProductPage,
}

impl<'a> ProductViewPanel<'a> {
    pub fn new(view: &'a ProductViewState, page: &'a ProductPage) -> Self {
        Self { view, page }
    }

    fn row_style(&self, pane: ProductPane, row: usize) -> Style {
        if self.page.pane == pane && self.page.index == row {
            styles::focused_selected()
        } else {
            styles::text_primary()
        }
    }

    fn selector_lines(&self) -> Vec<Line<'static>> {
        self.view
            .selectors()
            .into_iter()
            .enumerate()
            .map(|(row, selector)| {
                let picked = if selection::is_all(&selector.selection) {
                    selection::ALL_LABEL.to_string()
                } else {
                    selector.selection.join(", ")
                };
                Line::from(vec![
                    Span::styled(format!(" {}: ", selector.label), styles::text_secondary()),
                    Span::styled(picked, self.row_style(ProductPane::Selectors, row)),
                ])
            })
            .collect()
    }

    fn type_lines(&self) -> Vec<Line<'static>> {
        self.view
            .catalog()
            .artefact_types
            .iter()
            .enumerate()
            .map(|(row, art_type)| {
                let mark = if self.view.is_type_active(&art_type.id) { "[x]" } else { "[ ]" };
                Line::from(Span::styled(
                    format!(" {} {}", mark, art_type.name),
                    self.row_style(ProductPane::Types, row),
                ))
            })
            .collect()
    }

    fn slot_lines(&self) -> Vec<Line<'static>> {
        self.view
            .slot_rows()
            .into_iter()
            .enumerate()
            .map(|(row, slot)| {
                Line::from(vec![
                    Span::styled(format!(" {}: ", slot.view.label), styles::text_secondary()),
                    Span::styled(slot.view.key_label, self.row_style(ProductPane::Slots, row)),
                ])
            })
            .collect()
    }

    fn range_lines(&self) -> Vec<Line<'static>> {
        self.view
            .range_keys()
            .iter()
            .enumerate()
            .filter_map(|(row, key)| {
                let range = self.view.range(key)?;
                let text = match self.page.range_preview {
                    Some(preview) if preview.row == row => format!(
                        " {}: {} to {} (adjusting)",
                        range.label(),
                        preview.value_min,
                        preview.value_max
                    ),
                    _ => format!(" {} ({})", range.position_text(), range.width_text()),
                };
                Some(Line::from(Span::styled(text, self.row_style(ProductPane::Ranges, row))))
            })
            .collect()
    }

    fn render_side(&self, area: Rect, buf: &mut Buffer) {
        let panes = [
            ("Selection", ProductPane::Selectors, self.selector_lines()),
            ("Artefact Types", ProductPane::Types, self.type_lines()),
            ("Dimensions", ProductPane::Slots, self.slot_lines()),
            ("Ranges", ProductPane::Ranges, self.range_lines()),
        ];
        let constraints: Vec<Constraint> = panes
            .iter()
            .enumerate()
            .map(|(idx, (_, _, lines))| {
                if idx + 1 == panes.len() {
                    Constraint::Min(2)
                } else {
                    Constraint::Length(lines.len().max(1) as u16 + 2)
                }
            })
            .collect();
        let chunks = Layout::vertical(constraints).split(area);

        for ((title, pane, lines), chunk) in panes.into_iter().zip(chunks.iter()) {
            let focused = self.page.pane == pane;
            let block = styles::pane_block(title, focused);
            let inner = block.inner(*chunk);
            block.render(*chunk, buf);
            let selected = focused.then_some(self.page.index);
            let lines = if lines.is_empty() {
                vec![Line::from(Span::styled(" none", styles::text_muted()))]
            } else {
                lines
            };
            Paragraph::new(lines)
                .scroll((scroll_offset(selected, inner.height), 0))
                .render(inner, buf);
        }
    }

    fn render_cells(&self, area: Rect, buf: &mut Buffer) {
        let title = format!(
            "{} · cached {}",
            self.view.group_id(),
            self.view.cache_date()
        );
        let focused = self.page.pane == ProductPane::Cells;
        let block = styles::pane_block(&title, focused);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(root) = &self.page.layout else {
            Paragraph::new(Span::styled(" No artefacts to show", styles::text_muted()))
                .render(inner, buf);
            return;
        };

        let mut tree = TreeLines {
            view: self.view,
            selected: focused.then_some(self.page.cell),
            cell: 0,
            lines: Vec::new(),
            selected_line: None,
        };
        tree.push(root, 0);
        let offset = scroll_offset(tree.selected_line, inner.height);
        Paragraph::new(tree.lines).scroll((offset, 0)).render(inner, buf);
    }
}

impl Widget for ProductViewPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (side, main) = split_side(area, SIDE_WIDTH);
        self.render_side(side, buf);
        self.render_cells(main, buf);
    }
}

/// Walks the layout tree into indented lines
struct TreeLines<'a> {
    view: &'a ProductViewState,
    selected: Option<usize>,
    cell: usize,
    lines: Vec<Line<'static>>,
    selected_line: Option<usize>,
}

impl TreeLines<'_> {
    fn push(&mut self, node: &LayoutNode, depth: usize) {
        let indent = "  ".repeat(depth);
        match node {
            LayoutNode::Row {
                dim_label, blocks, ..
            } => {
                for block in blocks {
                    if let Some(title) = &block.title {
                        self.lines.push(Line::from(Span::styled(
                            format!("{}┄ {}", indent, title),
                            styles::text_muted(),
                        )));
                    }
                    for column in &block.columns {
                        let Some(content) = &column.content else {
                            continue;
                        };
                        self.lines.push(Line::from(vec![
                            Span::styled(format!("{} {}: ", indent, dim_label), styles::text_secondary()),
                            Span::styled(column.label.clone(), styles::accent()),
                        ]));
                        self.push(content, depth + 1);
                    }
                }
            }
            LayoutNode::Column(children) => {
                for child in children {
                    self.push(child, depth);
                }
            }
            LayoutNode::Artefact(cell) => {
                let is_selected = self.selected == Some(self.cell);
                if is_selected {
                    self.selected_line = Some(self.lines.len());
                }
                self.cell += 1;
                self.lines.push(self.cell_line(cell, &indent, is_selected));
            }
        }
    }

    fn cell_line(&self, cell: &ArtefactCell, indent: &str, selected: bool) -> Line<'static> {
        let name_style = if selected {
            styles::focused_selected()
        } else {
            styles::text_primary()
        };
        match cell {
            ArtefactCell::Missing => Line::from(Span::styled(
                format!("{} · missing", indent),
                if selected { name_style } else { styles::text_muted() },
            )),
            ArtefactCell::Present {
                path,
                category_path,
                ..
            } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let mut spans = vec![
                    Span::raw(format!("{} ", indent)),
                    Span::styled(format!("▣ {}", name), name_style),
                ];
                spans.extend(self.category_spans(category_path));
                Line::from(spans)
            }
        }
    }

    /// One badge per category: its number key, choice glyph and description
    fn category_spans(&self, path: &CategoryPath) -> Vec<Span<'static>> {
        self.view
            .category_defs()
            .iter()
            .enumerate()
            .filter_map(|(idx, (id, def))| {
                let value = self.view.category(path, id)?;
                let choice = def.choices.get(value)?;
                let text = if choice.description.is_empty() {
                    def.name.clone()
                } else {
                    choice.description.clone()
                };
                Some(Span::styled(
                    format!("  {}:{} {}", idx + 1, icons::glyph(&choice.icon), text),
                    Style::default().fg(palette::named(&choice.color)),
                ))
            })
            .collect()
    }
}
