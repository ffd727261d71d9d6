//! Glyphs for icon names
//!
//! Tabs and job states carry Material icon names; the terminal shows a
//! Unicode stand-in.

/// Glyph of a Material icon name, a bullet for unknown names
pub fn glyph(name: &str) -> &'static str {
    match name {
        // tabs
        "tune" => "\u{2699}",          // ⚙
        "image" => "\u{25a3}",         // ▣
        "rocket_launch" => "\u{00bb}", // »
        "play_arrow" => "\u{25b6}",    // ▶
        "stop" => "\u{25a0}",          // ■
        // job states
        "schedule" => "\u{25f7}",    // ◷
        "trending_up" => "\u{2197}", // ↗
        "mediation" => "\u{21c4}",   // ⇄
        "done" => "\u{2713}",        // ✓
        "close" => "\u{2717}",       // ✗
        // categories
        "check" | "check_circle" | "thumb_up" => "\u{2713}",
        "cancel" | "thumb_down" => "\u{2717}",
        "help" | "help_outline" | "question_mark" => "?",
        "star" => "\u{2605}", // ★
        _ => "\u{2022}",      // •
    }
}
