//! Command line of `gui_workspace`

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default idle timeout of the web process in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Artdeck - operator console for render-automation workspaces
#[derive(Parser, Debug)]
#[command(name = "gui_workspace")]
#[command(about = "Workspace GUI for render-automation workspaces", long_about = None)]
pub struct Args {
    /// Only show projects that have this launch file (basename, no extension)
    #[arg(short, long, value_name = "NAME")]
    pub launch: Option<String>,

    /// Open the interactive terminal console instead of the web server
    #[arg(short, long)]
    pub console: bool,

    /// Workspace path, the current directory if omitted
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Seconds without clients after which the web server shuts down
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Add a user to the workspace, prompting for the password
    #[arg(long, value_name = "NAME", conflicts_with = "add_admin")]
    pub add_user: Option<String>,

    /// Add an administrator to the workspace, prompting for the password
    #[arg(long, value_name = "NAME")]
    pub add_admin: Option<String>,

    /// Serve plain HTTP
    #[arg(long)]
    pub no_ssl: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the web process in the foreground
    #[command(hide = true)]
    Serve {
        #[arg(long)]
        path: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
        #[arg(long)]
        launch: Option<String>,
        #[arg(long)]
        no_ssl: bool,
    },
}

/// What a parsed command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Serve,
    AddUser { name: String, admin: bool },
    Console,
    WebServer,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.command.is_some() {
            return Mode::Serve;
        }
        if let Some(name) = &self.add_user {
            return Mode::AddUser {
                name: name.clone(),
                admin: false,
            };
        }
        if let Some(name) = &self.add_admin {
            return Mode::AddUser {
                name: name.clone(),
                admin: true,
            };
        }
        if self.console {
            Mode::Console
        } else {
            Mode::WebServer
        }
    }
}
