//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Terminal/TUI Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    #[error("Failed to initialize terminal: {0}")]
    TerminalInit(String),

    // ─────────────────────────────────────────────────────────────
    // Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Process error: {message}")]
    Process { message: String },

    #[error("Failed to spawn process: {reason}")]
    ProcessSpawn { reason: String },

    #[error("Process exited unexpectedly with code: {code:?}")]
    ProcessExit { code: Option<i32> },

    // ─────────────────────────────────────────────────────────────
    // Workspace Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Project path does not exist: {path}")]
    NoWorkspace { path: PathBuf },

    #[error("GUI web server already running for this workspace: {path}")]
    WorkspaceLocked { path: PathBuf },

    #[error("Project '{id}' not available")]
    ProjectNotFound { id: String },

    #[error("Variant group '{id}' not available")]
    VariantGroupNotFound { id: String },

    #[error("Production error: {message}")]
    Production { message: String },

    #[error("Artefact scan failed: {message}")]
    Scan { message: String },

    #[error("Action error: {message}")]
    Action { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    #[error("Unexpected document type '{found}', expected '{expected}'")]
    DocumentType { expected: String, found: String },

    // ─────────────────────────────────────────────────────────────
    // Authentication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("User '{user}' already exists")]
    UserExists { user: String },

    // ─────────────────────────────────────────────────────────────
    // View/Control Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid view dimension: {message}")]
    ViewDim { message: String },

    #[error("Invalid control for '{name}': {message}")]
    Control { name: String, message: String },

    #[error("Invalid layout: {message}")]
    Layout { message: String },

    #[error("Tab error: {message}")]
    Tab { message: String },

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Web Server Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Web server error: {message}")]
    Server { message: String },

    #[error("No free port available")]
    NoFreePort,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
        }
    }

    pub fn production(message: impl Into<String>) -> Self {
        Self::Production {
            message: message.into(),
        }
    }

    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
        }
    }

    pub fn action(message: impl Into<String>) -> Self {
        Self::Action {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn document_type(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::DocumentType {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    pub fn view_dim(message: impl Into<String>) -> Self {
        Self::ViewDim {
            message: message.into(),
        }
    }

    pub fn control(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Control {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
        }
    }

    pub fn tab(message: impl Into<String>) -> Self {
        Self::Tab {
            message: message.into(),
        }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    pub fn project_not_found(id: impl Into<String>) -> Self {
        Self::ProjectNotFound { id: id.into() }
    }

    pub fn variant_group_not_found(id: impl Into<String>) -> Self {
        Self::VariantGroupNotFound { id: id.into() }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors are shown in place (notification or error card)
    /// and leave the rest of the console usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ProjectNotFound { .. }
                | Error::VariantGroupNotFound { .. }
                | Error::Production { .. }
                | Error::Scan { .. }
                | Error::Action { .. }
                | Error::Control { .. }
                | Error::Layout { .. }
                | Error::ViewDim { .. }
                | Error::Tab { .. }
                | Error::Auth { .. }
                | Error::UserExists { .. }
                | Error::ChannelSend { .. }
        )
    }

    /// Check if this error should abort process startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NoWorkspace { .. }
                | Error::WorkspaceLocked { .. }
                | Error::NoFreePort
                | Error::ProcessSpawn { .. }
                | Error::TerminalInit(_)
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions (for use with color-eyre)
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::project_not_found("demo");
        assert_eq!(err.to_string(), "Project 'demo' not available");

        let err = Error::variant_group_not_found("vg/a");
        assert_eq!(err.to_string(), "Variant group 'vg/a' not available");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_fatal() {
        assert!(Error::NoFreePort.is_fatal());
        assert!(Error::NoWorkspace {
            path: PathBuf::from("/ws")
        }
        .is_fatal());
        assert!(!Error::scan("broken").is_fatal());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::scan("broken").is_recoverable());
        assert!(Error::control("iCount", "bad type").is_recoverable());
        assert!(Error::tab("missing").is_recoverable());
        assert!(!Error::NoFreePort.is_recoverable());
    }

    #[test]
    fn test_document_type_error() {
        let err = Error::document_type("/catharsys/gui/web:1.0", "/other:1.0");
        let text = err.to_string();
        assert!(text.contains("/catharsys/gui/web:1.0"));
        assert!(text.contains("/other:1.0"));
    }

    #[test]
    fn test_control_error_names_control() {
        let err = Error::control("sName", "options missing");
        assert_eq!(
            err.to_string(),
            "Invalid control for 'sName': options missing"
        );
    }

    #[test]
    fn test_context_preserves_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = res.context("reading lock file").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
