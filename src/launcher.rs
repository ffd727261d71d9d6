//! Web server launcher
//!
//! The web process runs as a child of the CLI. The workspace lock is held
//! for the child's whole lifetime, so a second launcher for the same
//! workspace backs off. An interrupt kills the child; the lock is removed
//! once it has exited.

use std::path::{Path, PathBuf};

use artdeck_app::signals::wait_for_signal;
use artdeck_core::prelude::*;
use artdeck_daemon::{FsWorkspace, ServerArgs, ServerProcess, WorkspaceApi, WorkspaceLock};

/// How a launch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Another live launcher holds the workspace lock
    AlreadyRunning,
    /// The child ran and exited
    Closed { code: Option<i32> },
}

/// Canonical root of the workspace at `path`, the current directory if
/// `None`
pub fn resolve_workspace(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };
    Ok(FsWorkspace::open(&path)?.root())
}

/// Resolves only on an actual termination signal
async fn interrupted() {
    if let Err(e) = wait_for_signal().await {
        warn!("Cannot listen for signals: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Run the web process of a workspace as a child of this executable
pub async fn run_web_server(args: &ServerArgs) -> Result<LaunchOutcome> {
    let program = std::env::current_exe().map_err(|e| Error::ProcessSpawn {
        reason: format!("cannot resolve current executable: {}", e),
    })?;
    run_program(&program, args).await
}

/// Run `program` in server mode under the workspace lock
pub async fn run_program(program: &Path, args: &ServerArgs) -> Result<LaunchOutcome> {
    let lock = match WorkspaceLock::acquire(&args.workspace) {
        Ok(lock) => lock,
        Err(Error::WorkspaceLocked { path }) => {
            info!("Web server of {} is already running", path.display());
            return Ok(LaunchOutcome::AlreadyRunning);
        }
        Err(e) => return Err(e),
    };

    println!("Starting Workspace GUI web service...");
    let mut server = match ServerProcess::spawn_program(program, args) {
        Ok(server) => server,
        Err(e) => {
            lock.release()?;
            return Err(e);
        }
    };
    info!("Web server started (pid {:?})", server.id());

    let exited = tokio::select! {
        code = server.wait() => Some(code),
        _ = interrupted() => None,
    };
    let code = match exited {
        Some(code) => code,
        None => {
            info!("Interrupted, stopping web server");
            server.kill();
            server.wait().await
        }
    };
    info!("Web server exited with {:?}", code);

    lock.release()?;
    Ok(LaunchOutcome::Closed { code })
}
