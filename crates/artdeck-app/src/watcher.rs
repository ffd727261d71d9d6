//! Production definition watcher
//!
//! Watches the directory of a variant group's `production.json` and reports
//! debounced changes of that one file as [`Message::ProductionChanged`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::message::Message;

pub struct ProductionWatcher {
    path: PathBuf,
    debounce: Duration,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl ProductionWatcher {
    pub fn new(path: impl Into<PathBuf>, debounce: Duration) -> Self {
        Self {
            path: path.into(),
            debounce,
            stop_tx: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching on the blocking pool
    pub fn start(&mut self, message_tx: mpsc::Sender<Message>) -> Result<(), String> {
        if self.is_running() {
            return Err("Watcher is already running".to_string());
        }
        let Some(dir) = self.path.parent().map(Path::to_path_buf) else {
            return Err(format!("{} has no parent directory", self.path.display()));
        };

        let path = self.path.clone();
        let debounce = self.debounce;
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_tx = Some(stop_tx);

        tokio::task::spawn_blocking(move || {
            Self::run_watcher(path, dir, debounce, message_tx, stop_rx);
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.is_some()
    }

    fn run_watcher(
        path: PathBuf,
        dir: PathBuf,
        debounce: Duration,
        message_tx: mpsc::Sender<Message>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        let tx_clone = message_tx.clone();
        let file = path.clone();

        let debouncer_result = new_debouncer(debounce, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let changed = events
                        .iter()
                        .any(|event| event.paths.iter().any(|p| is_same_file(p, &file)));
                    if changed {
                        debug!("Production definition changed: {}", file.display());
                        let _ = tx_clone.blocking_send(Message::ProductionChanged);
                    }
                }
                Err(errors) => {
                    for error in errors {
                        warn!("Production watcher error: {:?}", error);
                        let _ = tx_clone.blocking_send(Message::WatcherError {
                            message: error.to_string(),
                        });
                    }
                }
            }
        });

        let mut debouncer = match debouncer_result {
            Ok(d) => d,
            Err(e) => {
                error!("Failed to create production watcher: {}", e);
                let _ = message_tx.blocking_send(Message::WatcherError {
                    message: format!("Failed to create watcher: {}", e),
                });
                return;
            }
        };

        if let Err(e) = debouncer.watch(&dir, RecursiveMode::NonRecursive) {
            warn!("Failed to watch {}: {}", dir.display(), e);
            let _ = message_tx.blocking_send(Message::WatcherError {
                message: format!("Failed to watch {}: {}", dir.display(), e),
            });
            return;
        }
        info!("Watching: {}", path.display());

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                    info!("Production watcher stopping");
                    break;
                }
                Err(oneshot::error::TryRecvError::Empty) => {
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }
}

impl Drop for ProductionWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Event paths may come back canonicalized
fn is_same_file(event_path: &Path, watched: &Path) -> bool {
    if event_path == watched {
        return true;
    }
    if event_path.file_name() != watched.file_name() {
        return false;
    }
    match (dunce::canonicalize(event_path), watched.parent().map(dunce::canonicalize)) {
        (Ok(event), Some(Ok(dir))) => event.parent() == Some(dir.as_path()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_watcher_creation() {
        let watcher = ProductionWatcher::new("/vg/production.json", Duration::from_millis(50));
        assert!(!watcher.is_running());
        assert_eq!(watcher.path(), Path::new("/vg/production.json"));
    }

    #[test]
    fn test_stop_when_not_started() {
        let mut watcher = ProductionWatcher::new("/vg/production.json", Duration::from_millis(50));
        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_same_file_matching() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("production.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(is_same_file(&file, &file));
        assert!(!is_same_file(&temp.path().join("other.json"), &file));
    }

    #[tokio::test]
    async fn test_double_start_fails() {
        let temp = TempDir::new().unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let mut watcher =
            ProductionWatcher::new(temp.path().join("production.json"), Duration::from_millis(50));
        assert!(watcher.start(tx.clone()).is_ok());
        assert!(watcher.is_running());
        assert!(watcher.start(tx).is_err());
        watcher.stop();
    }

    #[tokio::test]
    async fn test_change_is_reported() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("production.json");
        std::fs::write(&file, "{}").unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let mut watcher = ProductionWatcher::new(&file, Duration::from_millis(50));
        watcher.start(tx).unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        std::fs::write(&file, "{\"changed\": true}").unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no change reported");
        assert!(matches!(msg, Some(Message::ProductionChanged)));
        watcher.stop();
    }
}
