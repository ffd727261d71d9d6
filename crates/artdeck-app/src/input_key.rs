//! Terminal-independent key events
//!
//! The console converts crossterm key events to [`InputKey`] at the TUI
//! boundary. Key handling and its tests never see crossterm types.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    /// Plain character, including shifted ones
    Char(char),
    /// Character with Ctrl held
    CharCtrl(char),

    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    Enter,
    Esc,
    Tab,
    /// Shift+Tab
    BackTab,
    Backspace,
    Delete,

    /// Function key F1-F12
    F(u8),
}

impl InputKey {
    /// Index selected by a number key: `1` is 0, `9` is 8
    pub fn digit_index(&self) -> Option<usize> {
        match self {
            InputKey::Char(c @ '1'..='9') => c.to_digit(10).map(|d| d as usize - 1),
            _ => None,
        }
    }

    /// Vertical movement of a navigation key
    pub fn vertical_delta(&self) -> Option<isize> {
        match self {
            InputKey::Up => Some(-1),
            InputKey::Down => Some(1),
            InputKey::PageUp => Some(-10),
            InputKey::PageDown => Some(10),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_index() {
        assert_eq!(InputKey::Char('1').digit_index(), Some(0));
        assert_eq!(InputKey::Char('9').digit_index(), Some(8));
        assert_eq!(InputKey::Char('0').digit_index(), None);
        assert_eq!(InputKey::CharCtrl('1').digit_index(), None);
    }

    #[test]
    fn test_vertical_delta() {
        assert_eq!(InputKey::Up.vertical_delta(), Some(-1));
        assert_eq!(InputKey::PageDown.vertical_delta(), Some(10));
        assert_eq!(InputKey::Left.vertical_delta(), None);
    }

    #[test]
    fn test_ctrl_differs_from_plain() {
        assert_ne!(InputKey::CharCtrl('c'), InputKey::Char('c'));
    }
}
