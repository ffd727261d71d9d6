//! Action handlers: UpdateAction dispatch and background task spawning

use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use artdeck_core::range::DEFERRED_RESET_MS;

use crate::handler::VIEW_UPDATE_DELAY_MS;
use crate::message::Message;
use crate::product_view::ScanSource;
use crate::watcher::ProductionWatcher;
use crate::UpdateAction;

/// Background services the actions run on
pub struct Services<S> {
    scan_source: S,
    watcher: Option<ProductionWatcher>,
    watch_debounce: Duration,
}

impl<S> Services<S>
where
    S: ScanSource + Clone + Send + Sync + 'static,
{
    pub fn new(scan_source: S, watch_debounce: Duration) -> Self {
        Self {
            scan_source,
            watcher: None,
            watch_debounce,
        }
    }

    /// Production definition currently watched
    pub fn watching(&self) -> Option<&Path> {
        self.watcher
            .as_ref()
            .filter(|w| w.is_running())
            .map(ProductionWatcher::path)
    }

    /// Execute an action by spawning a background task
    pub fn handle_action(&mut self, action: UpdateAction, msg_tx: mpsc::Sender<Message>) {
        match action {
            UpdateAction::ScanProduction { project, request } => {
                let source = self.scan_source.clone();
                tokio::spawn(async move {
                    let variant_group = request.variant_group.clone();
                    let production_path = request.production_path.clone();
                    let result = source.load(request).await.map_err(|e| e.to_string());
                    let _ = msg_tx
                        .send(Message::ScanCompleted {
                            project,
                            variant_group,
                            production_path,
                            result,
                        })
                        .await;
                });
            }

            UpdateAction::WatchProduction { path } => {
                if self.watching() == Some(path.as_path()) {
                    return;
                }
                self.stop_watching();
                let mut watcher = ProductionWatcher::new(path, self.watch_debounce);
                if let Err(e) = watcher.start(msg_tx.clone()) {
                    warn!("Production watcher not started: {}", e);
                    let _ = msg_tx.try_send(Message::WatcherError { message: e });
                    return;
                }
                self.watcher = Some(watcher);
            }

            UpdateAction::StopWatching => self.stop_watching(),

            UpdateAction::ScheduleViewUpdate { project } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(VIEW_UPDATE_DELAY_MS)).await;
                    let _ = msg_tx.send(Message::UpdateProductView { project }).await;
                });
            }

            UpdateAction::ScheduleRangeReset { project } => {
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(DEFERRED_RESET_MS)).await;
                    let _ = msg_tx.send(Message::ResetRangePreview { project }).await;
                });
            }
        }
    }

    fn stop_watching(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            debug!("Stop watching {}", watcher.path().display());
            watcher.stop();
        }
    }

    pub fn shutdown(&mut self) {
        self.stop_watching();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product_view::{ScanRequest, ScanResult};
    use artdeck_core::{Error, Result};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Records requests and fails every load
    #[derive(Clone, Default)]
    struct OfflineScan {
        requests: Arc<Mutex<Vec<ScanRequest>>>,
    }

    impl ScanSource for OfflineScan {
        async fn load(&self, request: ScanRequest) -> Result<ScanResult> {
            self.requests.lock().unwrap().push(request);
            Err(Error::scan("offline"))
        }
    }

    fn services() -> Services<OfflineScan> {
        Services::new(OfflineScan::default(), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_scan_reports_completion() {
        let mut services = services();
        let (tx, mut rx) = mpsc::channel(8);
        let request = ScanRequest {
            production_path: PathBuf::from("/vg/production.json"),
            variant_group: PathBuf::from("/vg"),
            group_id: None,
            rescan: false,
        };
        services.handle_action(
            UpdateAction::ScanProduction {
                project: "demo".into(),
                request: request.clone(),
            },
            tx,
        );

        match rx.recv().await {
            Some(Message::ScanCompleted {
                project,
                variant_group,
                result,
                ..
            }) => {
                assert_eq!(project, "demo");
                assert_eq!(variant_group, PathBuf::from("/vg"));
                assert!(result.unwrap_err().contains("offline"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(services.scan_source.requests.lock().unwrap()[0], request);
    }

    #[tokio::test]
    async fn test_view_update_is_deferred() {
        let mut services = services();
        let (tx, mut rx) = mpsc::channel(8);
        services.handle_action(
            UpdateAction::ScheduleViewUpdate {
                project: "demo".into(),
            },
            tx,
        );
        assert!(rx.try_recv().is_err());

        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap();
        assert!(matches!(msg, Some(Message::UpdateProductView { project }) if project == "demo"));
    }

    #[tokio::test]
    async fn test_watch_replaces_and_stops() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("a/production.json");
        let second = temp.path().join("b/production.json");
        std::fs::create_dir_all(first.parent().unwrap()).unwrap();
        std::fs::create_dir_all(second.parent().unwrap()).unwrap();

        let mut services = services();
        let (tx, _rx) = mpsc::channel(8);
        services.handle_action(UpdateAction::WatchProduction { path: first.clone() }, tx.clone());
        assert_eq!(services.watching(), Some(first.as_path()));

        services.handle_action(UpdateAction::WatchProduction { path: second.clone() }, tx.clone());
        assert_eq!(services.watching(), Some(second.as_path()));

        services.handle_action(UpdateAction::StopWatching, tx);
        assert!(services.watching().is_none());
    }
}
