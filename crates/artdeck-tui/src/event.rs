//! Terminal event polling

use std::time::Duration;

use artdeck_app::message::Message;
use artdeck_app::InputKey;
use artdeck_core::prelude::*;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// Convert a crossterm key event to an [`InputKey`]
pub fn key_event_to_input(key: crossterm::event::KeyEvent) -> Option<InputKey> {
    match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputKey::CharCtrl(c))
        }
        KeyCode::Char(c) => Some(InputKey::Char(c)),
        KeyCode::Enter => Some(InputKey::Enter),
        KeyCode::Esc => Some(InputKey::Esc),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Some(InputKey::BackTab),
        KeyCode::Tab => Some(InputKey::Tab),
        KeyCode::BackTab => Some(InputKey::BackTab),
        KeyCode::Backspace => Some(InputKey::Backspace),
        KeyCode::Delete => Some(InputKey::Delete),
        KeyCode::Up => Some(InputKey::Up),
        KeyCode::Down => Some(InputKey::Down),
        KeyCode::Left => Some(InputKey::Left),
        KeyCode::Right => Some(InputKey::Right),
        KeyCode::Home => Some(InputKey::Home),
        KeyCode::End => Some(InputKey::End),
        KeyCode::PageUp => Some(InputKey::PageUp),
        KeyCode::PageDown => Some(InputKey::PageDown),
        KeyCode::F(n) => Some(InputKey::F(n)),
        _ => None,
    }
}

/// Wait up to `timeout` for a key press
///
/// Job monitors are polled by a separate interval, so a timeout yields
/// `None` rather than a tick.
pub fn poll(timeout: Duration) -> Result<Option<Message>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            Ok(key_event_to_input(key).map(Message::Key))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn plain(code: KeyCode) -> Option<InputKey> {
        key_event_to_input(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_char_conversion() {
        assert_eq!(plain(KeyCode::Char('v')), Some(InputKey::Char('v')));
    }

    #[test]
    fn test_char_with_ctrl_conversion() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_event_to_input(key), Some(InputKey::CharCtrl('c')));
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(plain(KeyCode::Up), Some(InputKey::Up));
        assert_eq!(plain(KeyCode::Down), Some(InputKey::Down));
        assert_eq!(plain(KeyCode::PageDown), Some(InputKey::PageDown));
        assert_eq!(plain(KeyCode::Home), Some(InputKey::Home));
    }

    #[test]
    fn test_backtab_with_shift() {
        let key = KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT);
        assert_eq!(key_event_to_input(key), Some(InputKey::BackTab));
        assert_eq!(plain(KeyCode::BackTab), Some(InputKey::BackTab));
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(plain(KeyCode::F(2)), Some(InputKey::F(2)));
    }

    #[test]
    fn test_unsupported_keys() {
        assert_eq!(plain(KeyCode::Insert), None);
        assert_eq!(plain(KeyCode::CapsLock), None);
    }
}
