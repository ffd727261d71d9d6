//! Color palette of the console

use ratatui::style::Color;

// --- Background layers ---
pub const DEEPEST_BG: Color = Color::Black;
pub const POPUP_BG: Color = Color::DarkGray;

// --- Borders ---
pub const BORDER_DIM: Color = Color::DarkGray;
pub const BORDER_ACTIVE: Color = Color::Cyan;

// --- Accent ---
pub const ACCENT: Color = Color::Cyan;

// --- Text ---
pub const TEXT_PRIMARY: Color = Color::White;
pub const TEXT_SECONDARY: Color = Color::Gray;
pub const TEXT_MUTED: Color = Color::DarkGray;
pub const CONTRAST_FG: Color = Color::Black;

// --- Status ---
pub const STATUS_GREEN: Color = Color::Green;
pub const STATUS_RED: Color = Color::Red;
pub const STATUS_YELLOW: Color = Color::Yellow;

/// Color of a category choice; `sColor` names the few colors terminals have
pub fn named(name: &str) -> Color {
    match name.to_ascii_lowercase().as_str() {
        "red" | "negative" => Color::Red,
        "green" | "positive" => Color::Green,
        "yellow" | "warning" | "orange" => Color::Yellow,
        "blue" | "primary" => Color::Blue,
        "purple" | "secondary" => Color::Magenta,
        "cyan" | "accent" | "info" => Color::Cyan,
        "grey" | "gray" => Color::Gray,
        _ => TEXT_PRIMARY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_colors() {
        assert_eq!(named("Red"), Color::Red);
        assert_eq!(named("positive"), Color::Green);
        assert_eq!(named(""), TEXT_PRIMARY);
        assert_eq!(named("teal-4"), TEXT_PRIMARY);
    }
}
