//! Adding users from the command line

use std::io::Write;
use std::path::Path;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use artdeck_app::auth::{AuthStore, ADMIN_RIGHT, DEFAULT_RIGHT};
use artdeck_app::config::workspace_gui_dir;
use artdeck_core::prelude::*;

pub fn rights(admin: bool) -> Vec<String> {
    let mut rights = vec![DEFAULT_RIGHT.to_string()];
    if admin {
        rights.push(ADMIN_RIGHT.to_string());
    }
    rights
}

/// Store `user` in the user database of `workspace`
pub fn add_user(workspace: &Path, user: &str, password: &str, repeat: &str, admin: bool) -> Result<()> {
    if user.trim().is_empty() {
        return Err(Error::auth("User name must not be empty"));
    }
    if password != repeat {
        return Err(Error::auth("The two passwords are not identical"));
    }
    let store = AuthStore::new(workspace_gui_dir(workspace));
    store.add_user(user, password, false, None, &rights(admin))
}

/// Prompt twice for the password of `user` and store it
pub fn add_user_from_console(workspace: &Path, user: &str, admin: bool) -> Result<()> {
    let password = read_password(&format!("Please enter password for user '{}': ", user))?;
    let repeat = read_password("Repeat password: ")?;
    add_user(workspace, user, &password, &repeat, admin)
}

/// Read a line from the terminal without echoing it
fn read_password(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    terminal::enable_raw_mode()?;
    let result = read_hidden_line();
    let restored = terminal::disable_raw_mode();
    eprintln!();
    restored?;
    result
}

fn read_hidden_line() -> Result<String> {
    let mut line = String::new();
    loop {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        else {
            continue;
        };
        match code {
            KeyCode::Enter => return Ok(line),
            KeyCode::Backspace => {
                line.pop();
            }
            KeyCode::Esc => return Err(Error::terminal("Password entry cancelled")),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(Error::terminal("Password entry cancelled"));
            }
            KeyCode::Char(c) => line.push(c),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(workspace: &Path) -> AuthStore {
        AuthStore::new(workspace_gui_dir(workspace))
    }

    #[test]
    fn test_add_admin() {
        let temp = TempDir::new().unwrap();
        add_user(temp.path(), "root", "secret", "secret", true).unwrap();
        let store = store(temp.path());
        assert!(store.test_username_password("root", "secret").is_valid());
        assert_eq!(store.user_rights("root").unwrap(), vec!["default", "admin"]);
    }

    #[test]
    fn test_add_user_has_default_right() {
        let temp = TempDir::new().unwrap();
        add_user(temp.path(), "anna", "secret", "secret", false).unwrap();
        assert_eq!(store(temp.path()).user_rights("anna").unwrap(), vec!["default"]);
    }

    #[test]
    fn test_passwords_must_match() {
        let temp = TempDir::new().unwrap();
        let err = add_user(temp.path(), "anna", "secret", "secreT", false).unwrap_err();
        assert!(err.to_string().contains("not identical"));
        assert!(!store(temp.path()).has_user("anna"));
    }

    #[test]
    fn test_existing_user_is_kept() {
        let temp = TempDir::new().unwrap();
        add_user(temp.path(), "anna", "first", "first", false).unwrap();
        assert!(add_user(temp.path(), "anna", "second", "second", true).is_err());
        assert!(store(temp.path()).test_username_password("anna", "first").is_valid());
    }
}
