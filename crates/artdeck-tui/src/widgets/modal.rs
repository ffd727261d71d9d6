//! Modal dialogs: collaborator error card and confirmations

use artdeck_app::state::ErrorCard;
use artdeck_daemon::VariantKey;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Widget, Wrap},
};

use crate::layout::centered_rect;
use crate::theme::styles;

const DIALOG_WIDTH: u16 = 60;

/// Error of a workspace or production call, shown in place of the page
pub struct ErrorDialog<'a> {
    card: &'a ErrorCard,
}

impl<'a> ErrorDialog<'a> {
    pub fn new(card: &'a ErrorCard) -> Self {
        Self { card }
    }
}

impl Widget for ErrorDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hints = if self.card.retry.is_some() {
            "[r] retry  [Esc] dismiss"
        } else {
            "[Esc] dismiss"
        };
        let message_rows = (self.card.message.chars().count() as u16 / (DIALOG_WIDTH - 4)) + 1;
        let rect = centered_rect(DIALOG_WIDTH, message_rows + 4, area);
        Clear.render(rect, buf);

        let block = styles::modal_block(&self.card.title).border_style(styles::status_red());
        let inner = block.inner(rect);
        block.render(rect, buf);

        let lines = vec![
            Line::from(Span::styled(self.card.message.clone(), styles::text_primary())),
            Line::default(),
            Line::from(Span::styled(hints, styles::text_muted())),
        ];
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

/// Asked before quitting while jobs run
pub struct ConfirmQuitDialog;

impl Widget for ConfirmQuitDialog {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rect = centered_rect(48, 5, area);
        Clear.render(rect, buf);
        let block = styles::modal_block("Quit");
        let inner = block.inner(rect);
        block.render(rect, buf);
        Paragraph::new(vec![
            Line::from("Jobs are still running. They will be"),
            Line::from("terminated. Quit anyway?  [y/n]"),
        ])
        .style(styles::text_primary())
        .render(inner, buf);
    }
}

/// Asked before a variant is deleted from the workspace
pub struct ConfirmRemoveDialog<'a> {
    key: &'a VariantKey,
}

impl<'a> ConfirmRemoveDialog<'a> {
    pub fn new(key: &'a VariantKey) -> Self {
        Self { key }
    }
}

impl Widget for ConfirmRemoveDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rect = centered_rect(48, 5, area);
        Clear.render(rect, buf);
        let block = styles::modal_block("Remove");
        let inner = block.inner(rect);
        block.render(rect, buf);
        Paragraph::new(vec![
            Line::from(format!("Remove {} '{}'?", self.key.kind_label(), self.key.name())),
            Line::from(Span::styled("[y] remove  [n] keep", styles::text_muted())),
        ])
        .style(styles::text_primary())
        .wrap(Wrap { trim: true })
        .render(inner, buf);
    }
}
