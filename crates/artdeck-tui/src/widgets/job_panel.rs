//! Launch tab: job list, status and output of the selected job

use artdeck_app::job_monitor::JobMonitor;
use artdeck_app::launch::LaunchInstance;
use artdeck_daemon::JobStatus;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::config_page::scroll_offset;
use crate::layout::split_side;
use crate::theme::{icons, styles};

const JOB_LIST_WIDTH: u16 = 40;

/// Status row, job list with output pane, footer row
struct PanelAreas {
    status: Rect,
    jobs: Rect,
    output: Rect,
    footer: Rect,
}

fn panel_areas(area: Rect) -> PanelAreas {
    let rows = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(area);
    let (jobs, output) = split_side(rows[1], JOB_LIST_WIDTH);
    PanelAreas {
        status: rows[0],
        jobs,
        output,
        footer: rows[2],
    }
}

/// Lines the output pane shows inside `area`
pub fn output_viewport(area: Rect) -> usize {
    panel_areas(area).output.height.saturating_sub(2) as usize
}

pub struct LaunchPanel<'a> {
    instance: &'a LaunchInstance,
}

impl<'a> LaunchPanel<'a> {
    pub fn new(instance: &'a LaunchInstance) -> Self {
        Self { instance }
    }

    fn status_line(&self, monitor: &JobMonitor) -> Line<'static> {
        let status = monitor.status_text();
        let mut spans = vec![Span::styled(format!(" {}", self.instance.label()), styles::accent_bold())];
        if !status.is_empty() {
            spans.push(Span::styled(" │ ", styles::text_muted()));
            spans.push(Span::styled(status, styles::text_secondary()));
        }
        Line::from(spans)
    }

    fn job_lines(monitor: &JobMonitor) -> Vec<Line<'static>> {
        (0..monitor.job_count())
            .map(|idx| {
                let status = monitor.status(idx).unwrap_or(JobStatus::NotStarted);
                let label = monitor.job_label(idx).unwrap_or_default();
                let label_style = if monitor.selected() == Some(idx) {
                    styles::focused_selected()
                } else {
                    styles::text_primary()
                };
                Line::from(vec![
                    Span::styled(format!(" {} ", icons::glyph(monitor.status_icon(idx))), styles::job_status(status)),
                    Span::styled(label, label_style),
                ])
            })
            .collect()
    }

    fn footer_line(monitor: &JobMonitor) -> Line<'static> {
        let mut spans = vec![Span::styled(format!(" {}", monitor.selected_label()), styles::text_secondary())];
        if let Some(output_type) = monitor.output_type() {
            spans.push(Span::styled(" │ ", styles::text_muted()));
            spans.push(Span::styled(format!("output: {}", output_type), styles::text_secondary()));
        }
        let actions = [
            (monitor.can_launch(), "[l] launch"),
            (monitor.can_terminate_selected(), "[t] terminate job"),
            (monitor.can_terminate_all(), "[T] terminate all"),
            (monitor.can_close(), "[x] close"),
        ];
        for (enabled, hint) in actions {
            if enabled {
                spans.push(Span::styled(format!("  {}", hint), styles::text_muted()));
            }
        }
        Line::from(spans)
    }

    fn render_output(monitor: &JobMonitor, area: Rect, buf: &mut Buffer) {
        let block = styles::pane_block("Output", monitor.selected().is_some());
        let inner = block.inner(area);
        block.render(area, buf);

        let lines = monitor.displayed_output();
        let height = inner.height as usize;
        let start = monitor.scroll().offset.min(lines.len().saturating_sub(height));
        let shown: Vec<Line> = lines
            .iter()
            .skip(start)
            .take(height)
            .map(|line| Line::raw(line.to_string()))
            .collect();
        Paragraph::new(shown).render(inner, buf);
    }
}

impl Widget for LaunchPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let areas = panel_areas(area);
        let Some(monitor) = self.instance.monitor() else {
            Paragraph::new(Span::styled(" Preparing job monitor...", styles::text_muted()))
                .render(areas.status, buf);
            return;
        };

        Paragraph::new(self.status_line(monitor)).render(areas.status, buf);

        let block = styles::pane_block("Jobs", true);
        let inner = block.inner(areas.jobs);
        block.render(areas.jobs, buf);
        Paragraph::new(Self::job_lines(monitor))
            .scroll((scroll_offset(monitor.selected(), inner.height), 0))
            .render(inner, buf);

        Self::render_output(monitor, areas.output, buf);
        Paragraph::new(Self::footer_line(monitor)).render(areas.footer, buf);
    }
}
