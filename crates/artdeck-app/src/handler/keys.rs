//! Key event handlers for the UI modes and pages

use crate::input_key::InputKey;
use crate::message::{Message, ProductPane};
use crate::state::{AppState, UiMode};
use crate::tabs::TabKind;

/// Convert key events to messages based on current UI mode
pub fn handle_key(state: &AppState, key: InputKey) -> Option<Message> {
    match state.ui_mode {
        UiMode::ConfirmQuit => handle_key_confirm_quit(key),
        UiMode::ConfirmRemoveVariant => handle_key_confirm_remove(key),
        UiMode::EditValue | UiMode::EditInfo => handle_key_edit(state, key),
        UiMode::Normal => handle_key_normal(state, key),
    }
}

fn handle_key_confirm_remove(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Char('y' | 'Y') | InputKey::Enter => Some(Message::ConfirmRemoveVariant),
        InputKey::Char('n' | 'N') | InputKey::Esc => Some(Message::CancelRemoveVariant),
        InputKey::CharCtrl('c') => Some(Message::Quit),
        _ => None,
    }
}

fn handle_key_confirm_quit(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Char('y' | 'Y' | 'q') | InputKey::Enter => Some(Message::ConfirmQuit),
        InputKey::Char('n' | 'N') | InputKey::Esc => Some(Message::CancelQuit),
        InputKey::CharCtrl('c') => Some(Message::Quit),
        _ => None,
    }
}

fn handle_key_edit(state: &AppState, key: InputKey) -> Option<Message> {
    match key {
        InputKey::Esc => Some(Message::CancelEdit),
        InputKey::Enter => Some(Message::CommitEdit),
        InputKey::Backspace => {
            let mut text = state.edit_buffer.clone();
            text.pop();
            Some(Message::EditInput { text })
        }
        InputKey::CharCtrl('u') => Some(Message::EditInput {
            text: String::new(),
        }),
        InputKey::CharCtrl('c') => Some(Message::Quit),
        InputKey::Char(c) => {
            let mut text = state.edit_buffer.clone();
            text.push(c);
            Some(Message::EditInput { text })
        }
        _ => None,
    }
}

fn handle_key_normal(state: &AppState, key: InputKey) -> Option<Message> {
    if state.error.is_some() {
        match key {
            InputKey::Char('r') => return Some(Message::RetryError),
            InputKey::Esc => return Some(Message::DismissError),
            _ => {}
        }
    }

    match key {
        InputKey::CharCtrl('c') => return Some(Message::Quit),
        InputKey::Char('q') => return Some(Message::RequestQuit),
        InputKey::Tab => return Some(Message::NextTab),
        InputKey::BackTab => return Some(Message::PrevTab),
        InputKey::Char('p') => return Some(Message::NextProject),
        InputKey::Char('P') => return Some(Message::PrevProject),
        InputKey::F(n @ 1..=9) => {
            return Some(Message::SelectTab {
                index: usize::from(n) - 1,
            })
        }
        InputKey::Char('x') => return Some(Message::CloseTab),
        InputKey::Char('v') => return Some(Message::OpenProductView { rescan: false }),
        _ => {}
    }

    match state.selected_tab_kind() {
        Some(TabKind::Configuration) => handle_key_config(key),
        Some(TabKind::Launch { .. }) => handle_key_launch(key),
        Some(TabKind::ProductView { .. }) => handle_key_product(state, key),
        None => None,
    }
}

fn handle_key_config(key: InputKey) -> Option<Message> {
    if let Some(delta) = key.vertical_delta() {
        return Some(Message::ConfigCursor { delta });
    }
    match key {
        InputKey::Char('s') => Some(Message::ConfigFocusNext),
        InputKey::Left => Some(Message::ConfigCycle { forward: false }),
        InputKey::Right => Some(Message::ConfigCycle { forward: true }),
        InputKey::Enter => Some(Message::StartEdit),
        InputKey::Char('l') => Some(Message::PrepareLaunch),
        InputKey::Char('a') => Some(Message::AddVariant),
        InputKey::Char('d') => Some(Message::RemoveVariant),
        InputKey::Char('i') => Some(Message::StartInfoEdit),
        InputKey::Char('f') => Some(Message::FindInstances),
        InputKey::Char('R') => Some(Message::ReloadConfig),
        _ => None,
    }
}

fn handle_key_launch(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Char('l') => Some(Message::LaunchJobs),
        InputKey::Char('t') => Some(Message::TerminateSelected),
        InputKey::Char('T') => Some(Message::TerminateAll),
        InputKey::Up => Some(Message::SelectJob { delta: -1 }),
        InputKey::Down => Some(Message::SelectJob { delta: 1 }),
        InputKey::PageUp => Some(Message::ScrollOutput { delta: -10 }),
        InputKey::PageDown => Some(Message::ScrollOutput { delta: 10 }),
        InputKey::Home => Some(Message::ScrollOutput {
            delta: isize::MIN / 2,
        }),
        InputKey::End => Some(Message::ScrollOutput {
            delta: isize::MAX / 2,
        }),
        InputKey::Char('o') => Some(Message::NextOutputType),
        _ => None,
    }
}

fn handle_key_product(state: &AppState, key: InputKey) -> Option<Message> {
    if state.product.pane == ProductPane::Cells {
        if let Some(category) = key.digit_index() {
            return Some(Message::CycleCategory { category });
        }
    }
    match key {
        InputKey::Char('s') => Some(Message::ProductPaneNext),
        InputKey::Up => Some(Message::ProductMove { delta: -1 }),
        InputKey::Down => Some(Message::ProductMove { delta: 1 }),
        InputKey::Left => Some(Message::ProductAdjust { forward: false }),
        InputKey::Right => Some(Message::ProductAdjust { forward: true }),
        InputKey::Enter | InputKey::Char(' ') => Some(Message::ProductToggle),
        InputKey::Char('+') => Some(Message::RangeWidth { delta: 1 }),
        InputKey::Char('-') => Some(Message::RangeWidth { delta: -1 }),
        InputKey::Char('[') => Some(Message::RangeEndpoint { upper: false, delta: -1 }),
        InputKey::Char(']') => Some(Message::RangeEndpoint { upper: false, delta: 1 }),
        InputKey::Char('{') => Some(Message::RangeEndpoint { upper: true, delta: -1 }),
        InputKey::Char('}') => Some(Message::RangeEndpoint { upper: true, delta: 1 }),
        InputKey::Char('g') => Some(Message::NextProductionGroup),
        InputKey::Char('R') => Some(Message::OpenProductView { rescan: true }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::state::ErrorCard;
    use artdeck_daemon::test_utils::sample_workspace;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_state() -> (TempDir, AppState) {
        let temp = TempDir::new().unwrap();
        let ws = sample_workspace(temp.path());
        let mut state = AppState::new(Arc::new(ws), Settings::default());
        state.load_projects();
        (temp, state)
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let (_temp, mut state) = test_state();
        for mode in [
            UiMode::Normal,
            UiMode::EditValue,
            UiMode::EditInfo,
            UiMode::ConfirmQuit,
            UiMode::ConfirmRemoveVariant,
        ] {
            state.ui_mode = mode;
            assert!(matches!(
                handle_key(&state, InputKey::CharCtrl('c')),
                Some(Message::Quit)
            ));
        }
    }

    #[test]
    fn test_confirm_dialog_keys() {
        let (_temp, mut state) = test_state();
        state.ui_mode = UiMode::ConfirmQuit;
        assert!(matches!(handle_key(&state, InputKey::Char('y')), Some(Message::ConfirmQuit)));
        assert!(matches!(handle_key(&state, InputKey::Esc), Some(Message::CancelQuit)));
    }

    #[test]
    fn test_remove_confirmation_keys() {
        let (_temp, mut state) = test_state();
        state.ui_mode = UiMode::ConfirmRemoveVariant;
        assert!(matches!(
            handle_key(&state, InputKey::Char('y')),
            Some(Message::ConfirmRemoveVariant)
        ));
        assert!(matches!(handle_key(&state, InputKey::Esc), Some(Message::CancelRemoveVariant)));
        assert!(handle_key(&state, InputKey::Char('q')).is_none());
    }

    #[test]
    fn test_edit_mode_appends_and_deletes() {
        let (_temp, mut state) = test_state();
        state.ui_mode = UiMode::EditValue;
        state.edit_buffer = "12".into();
        match handle_key(&state, InputKey::Char('3')) {
            Some(Message::EditInput { text }) => assert_eq!(text, "123"),
            other => panic!("unexpected {:?}", other),
        }
        match handle_key(&state, InputKey::Backspace) {
            Some(Message::EditInput { text }) => assert_eq!(text, "1"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_config_page_keys() {
        let (_temp, state) = test_state();
        assert!(matches!(
            handle_key(&state, InputKey::Down),
            Some(Message::ConfigCursor { delta: 1 })
        ));
        assert!(matches!(handle_key(&state, InputKey::Char('l')), Some(Message::PrepareLaunch)));
        assert!(matches!(handle_key(&state, InputKey::Char('a')), Some(Message::AddVariant)));
        assert!(matches!(handle_key(&state, InputKey::Char('f')), Some(Message::FindInstances)));
    }

    #[test]
    fn test_error_card_keys_take_precedence() {
        let (_temp, mut state) = test_state();
        state.error = Some(ErrorCard {
            title: "t".into(),
            message: "m".into(),
            retry: None,
        });
        assert!(matches!(handle_key(&state, InputKey::Char('r')), Some(Message::RetryError)));
        assert!(matches!(handle_key(&state, InputKey::Esc), Some(Message::DismissError)));
    }

    #[test]
    fn test_function_keys_select_tabs() {
        let (_temp, state) = test_state();
        assert!(matches!(
            handle_key(&state, InputKey::F(2)),
            Some(Message::SelectTab { index: 1 })
        ));
    }
}
