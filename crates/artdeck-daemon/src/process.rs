//! Child process management
//!
//! [`ManagedProcess`] runs one child (the web server process or a job) and
//! streams its output as [`ProcessEvent`]s. [`ServerProcess`] is the web
//! server child spawned by the CLI entry point.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot, Notify};

use artdeck_core::prelude::*;

/// Output of a managed child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Stdout(String),
    Stderr(String),
    /// Emitted exactly once, after the child was reaped
    Exited { code: Option<i32> },
}

/// Program, arguments and working directory of a child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Command line for logging
    pub fn display(&self) -> String {
        let mut text = self.program.display().to_string();
        for arg in &self.args {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }
}

/// A running child process.
///
/// The `Child` is owned by a background `wait_for_exit` task. The process
/// keeps a kill channel to request a force-kill, an atomic flag for
/// synchronous `has_exited()` checks and a [`Notify`] to await the exit.
pub struct ManagedProcess {
    pid: Option<u32>,
    kill_tx: Option<oneshot::Sender<()>>,
    exited: Arc<AtomicBool>,
    exit_notify: Arc<Notify>,
}

impl ManagedProcess {
    /// Spawn the child. Must be called within a tokio runtime.
    pub fn spawn(spec: &CommandSpec, event_tx: mpsc::Sender<ProcessEvent>) -> Result<Self> {
        info!("Spawning: {}", spec.display());

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| Error::ProcessSpawn {
            reason: format!("{}: {}", spec.program.display(), e),
        })?;

        let pid = child.id();
        debug!("Process started with PID: {:?}", pid);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process("stdout of child not captured"))?;
        tokio::spawn(Self::line_reader(stdout, event_tx.clone(), ProcessEvent::Stdout));

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process("stderr of child not captured"))?;
        tokio::spawn(Self::line_reader(stderr, event_tx.clone(), ProcessEvent::Stderr));

        let exited = Arc::new(AtomicBool::new(false));
        let exit_notify = Arc::new(Notify::new());
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(Self::wait_for_exit(
            child,
            kill_rx,
            event_tx,
            Arc::clone(&exited),
            Arc::clone(&exit_notify),
        ));

        Ok(Self {
            pid,
            kill_tx: Some(kill_tx),
            exited,
            exit_notify,
        })
    }

    /// Background task: owns `child`, waits for it to exit and emits
    /// [`ProcessEvent::Exited`]. A message on `kill_rx` kills the child first.
    async fn wait_for_exit(
        mut child: Child,
        kill_rx: oneshot::Receiver<()>,
        event_tx: mpsc::Sender<ProcessEvent>,
        exited: Arc<AtomicBool>,
        exit_notify: Arc<Notify>,
    ) {
        let code: Option<i32> = tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(status) => {
                        info!("Process exited with status: {:?}", status);
                        status.code()
                    }
                    Err(e) => {
                        error!("Error waiting for process: {}", e);
                        None
                    }
                }
            }
            _ = kill_rx => {
                info!("Kill requested, terminating process");
                if let Err(e) = child.kill().await {
                    error!("Failed to kill process: {}", e);
                }
                match child.wait().await {
                    Ok(status) => status.code(),
                    Err(e) => {
                        error!("Error waiting after kill: {}", e);
                        None
                    }
                }
            }
        };

        // Flag before event, so has_exited() is true once the event is seen
        exited.store(true, Ordering::Release);
        exit_notify.notify_waiters();

        let _ = event_tx.send(ProcessEvent::Exited { code }).await;
    }

    async fn line_reader<R>(
        stream: R,
        tx: mpsc::Sender<ProcessEvent>,
        wrap: fn(String) -> ProcessEvent,
    ) where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(stream).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            trace!("child: {}", line);
            if tx.send(wrap(line)).await.is_err() {
                debug!("process event channel closed");
                break;
            }
        }
    }

    /// Ask the wait task to kill the child. No-op once requested.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            // The wait task may have finished already
            let _ = tx.send(());
        }
    }

    /// Wait up to `grace` for the child to exit on its own, then kill it
    pub async fn shutdown(&mut self, grace: Duration) {
        let notified = self.exit_notify.notified();
        if self.has_exited() {
            return;
        }
        if tokio::time::timeout(grace, notified).await.is_err() {
            warn!("Process {:?} did not exit within {:?}, killing", self.pid, grace);
            self.kill();
        }
    }

    /// Resolve once the child has exited
    pub async fn wait(&self) {
        let notified = self.exit_notify.notified();
        if self.has_exited() {
            return;
        }
        notified.await;
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        !self.has_exited()
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if !self.has_exited() {
            warn!("ManagedProcess dropped while child may still be running");
            self.kill();
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Web server child
// ─────────────────────────────────────────────────────────────────

/// Hidden subcommand that runs the web process
pub const SERVE_SUBCOMMAND: &str = "serve";

/// Arguments handed to the web server child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerArgs {
    pub workspace: PathBuf,
    pub timeout_secs: u64,
    pub no_ssl: bool,
    /// Basename of the launch file projects are discovered by
    pub launch_file: Option<String>,
}

impl ServerArgs {
    /// Command running
    /// `program serve --path .. --timeout .. [--launch ..] [--no-ssl]`
    pub fn command(&self, program: &Path) -> CommandSpec {
        let mut spec = CommandSpec::new(program)
            .arg(SERVE_SUBCOMMAND)
            .arg("--path")
            .arg(self.workspace.display().to_string())
            .arg("--timeout")
            .arg(self.timeout_secs.to_string());
        if let Some(launch) = &self.launch_file {
            spec = spec.arg("--launch").arg(launch);
        }
        if self.no_ssl {
            spec = spec.arg("--no-ssl");
        }
        spec.current_dir(&self.workspace)
    }
}

/// The web server child of the CLI entry point.
///
/// Output lines of the child are forwarded to the log; callers wait for the
/// exit with [`ServerProcess::wait`].
pub struct ServerProcess {
    process: ManagedProcess,
    events: mpsc::Receiver<ProcessEvent>,
}

impl ServerProcess {
    /// Spawn the current executable in server mode
    pub fn spawn(args: &ServerArgs) -> Result<Self> {
        let program = std::env::current_exe().map_err(|e| Error::ProcessSpawn {
            reason: format!("cannot resolve current executable: {}", e),
        })?;
        Self::spawn_program(&program, args)
    }

    pub fn spawn_program(program: &Path, args: &ServerArgs) -> Result<Self> {
        let (tx, events) = mpsc::channel(256);
        let process = ManagedProcess::spawn(&args.command(program), tx)?;
        Ok(Self { process, events })
    }

    /// Drain output until the child exits. Returns the exit code.
    pub async fn wait(&mut self) -> Option<i32> {
        while let Some(event) = self.events.recv().await {
            match event {
                ProcessEvent::Stdout(line) => info!("[web] {}", line),
                ProcessEvent::Stderr(line) => warn!("[web] {}", line),
                ProcessEvent::Exited { code } => return code,
            }
        }
        None
    }

    pub fn kill(&mut self) {
        self.process.kill();
    }

    pub fn has_exited(&self) -> bool {
        self.process.has_exited()
    }

    pub fn id(&self) -> Option<u32> {
        self.process.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    async fn collect_until_exit(rx: &mut mpsc::Receiver<ProcessEvent>) -> Vec<ProcessEvent> {
        let mut events = Vec::new();
        for _ in 0..50 {
            match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
                Ok(Some(event)) => {
                    let done = matches!(event, ProcessEvent::Exited { .. });
                    events.push(event);
                    if done {
                        break;
                    }
                }
                Ok(None) => break,
                Err(_) => continue,
            }
        }
        events
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let (tx, _rx) = mpsc::channel(4);
        let result = ManagedProcess::spawn(&CommandSpec::new("/nonexistent/artdeck-bin"), tx);
        assert!(matches!(result, Err(Error::ProcessSpawn { .. })));
    }

    #[tokio::test]
    async fn test_exit_code_and_output_captured() {
        let (tx, mut rx) = mpsc::channel(16);
        let _process = ManagedProcess::spawn(&sh("echo out; echo err 1>&2; exit 3"), tx).unwrap();

        let events = collect_until_exit(&mut rx).await;
        assert!(events.contains(&ProcessEvent::Stdout("out".into())));
        assert!(events.contains(&ProcessEvent::Stderr("err".into())));
        assert_eq!(events.last(), Some(&ProcessEvent::Exited { code: Some(3) }));
    }

    #[tokio::test]
    async fn test_has_exited_after_wait() {
        let (tx, _rx) = mpsc::channel(16);
        let process = ManagedProcess::spawn(&sh("exit 0"), tx).unwrap();
        tokio::time::timeout(Duration::from_secs(5), process.wait())
            .await
            .expect("process should exit");
        assert!(process.has_exited());
        assert!(!process.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_kills_long_running_process() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut process = ManagedProcess::spawn(&sh("sleep 60"), tx).unwrap();
        assert!(process.is_running());

        process.shutdown(Duration::from_millis(100)).await;

        let events = collect_until_exit(&mut rx).await;
        assert!(matches!(events.last(), Some(ProcessEvent::Exited { .. })));
    }

    #[test]
    fn test_server_args_command() {
        let args = ServerArgs {
            workspace: PathBuf::from("/ws"),
            timeout_secs: 10,
            no_ssl: true,
            launch_file: None,
        };
        let spec = args.command(Path::new("/bin/gui_workspace"));
        assert_eq!(
            spec.args,
            vec!["serve", "--path", "/ws", "--timeout", "10", "--no-ssl"]
        );
        assert_eq!(spec.cwd, Some(PathBuf::from("/ws")));
        assert_eq!(
            spec.display(),
            "/bin/gui_workspace serve --path /ws --timeout 10 --no-ssl"
        );
    }

    #[test]
    fn test_server_args_forward_launch_file() {
        let args = ServerArgs {
            workspace: PathBuf::from("/ws"),
            timeout_secs: 10,
            no_ssl: false,
            launch_file: Some("launch-dev".into()),
        };
        let spec = args.command(Path::new("/bin/gui_workspace"));
        assert_eq!(
            spec.args,
            vec!["serve", "--path", "/ws", "--timeout", "10", "--launch", "launch-dev"]
        );
    }
}
