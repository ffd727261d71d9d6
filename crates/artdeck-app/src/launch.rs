//! Launch instances
//!
//! A launch instance binds a prepared variant launch to its job monitor.
//! The action handler behind the monitor is created lazily, the first time
//! the instance's tab is shown.

use artdeck_core::prelude::*;
use artdeck_daemon::{
    ActionHandler, LaunchRequest, PreparedLaunch, ProcessActionHandler, WorkspaceApi,
    META_ACTION_PATH, META_LAUNCH_FILE_ID,
};

use crate::job_monitor::JobMonitor;

/// Tab id prefix of launch instances
pub const LAUNCH_TAB_PREFIX: &str = "launch:";

/// Tab icons of a launch instance
pub const ICON_IDLE: &str = "rocket_launch";
pub const ICON_RUNNING: &str = "play_arrow";
pub const ICON_FINISHED: &str = "stop";

/// Creates the action handler of a prepared launch
pub type HandlerFactory = dyn Fn(&PreparedLaunch) -> Box<dyn ActionHandler> + Send + Sync;

/// Child-process handler for the jobs of a launch
pub fn process_handler(prepared: &PreparedLaunch) -> Box<dyn ActionHandler> {
    Box::new(ProcessActionHandler::new(prepared.jobs.clone()))
}

#[derive(Debug)]
pub struct LaunchInstance {
    request: LaunchRequest,
    prepared: PreparedLaunch,
    launch_file: String,
    action: String,
    monitor: Option<JobMonitor>,
    max_lines: usize,
    finished_once: bool,
}

impl LaunchInstance {
    /// Prepare a launch through the workspace
    pub fn prepare(workspace: &dyn WorkspaceApi, request: LaunchRequest) -> Result<Self> {
        let prepared = workspace.prepare_launch(&request)?;
        Self::from_prepared(request, prepared)
    }

    /// Wrap a prepared launch; its metadata must name the launch file and action
    pub fn from_prepared(request: LaunchRequest, prepared: PreparedLaunch) -> Result<Self> {
        let action = prepared.metadata.get(META_ACTION_PATH).cloned().ok_or_else(|| {
            Error::action(format!(
                "Action path not specified in variant instance '{}'",
                prepared.instance_id
            ))
        })?;
        let launch_file = prepared
            .metadata
            .get(META_LAUNCH_FILE_ID)
            .cloned()
            .ok_or_else(|| {
                Error::action(format!(
                    "Launch file id not specified in variant instance '{}'",
                    prepared.instance_id
                ))
            })?;
        Ok(Self {
            request,
            prepared,
            launch_file,
            action,
            monitor: None,
            max_lines: usize::MAX,
            finished_once: false,
        })
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn id(&self) -> &str {
        &self.prepared.instance_id
    }

    pub fn project(&self) -> &str {
        &self.request.project
    }

    pub fn tab_id(&self) -> String {
        format!("{}{}", LAUNCH_TAB_PREFIX, self.prepared.instance_id)
    }

    pub fn label(&self) -> String {
        format!(
            "{}[{}:{}]-{}-{}",
            self.request.project,
            self.request.variant_group,
            self.request.trial,
            self.launch_file,
            self.action
        )
    }

    pub fn prepared(&self) -> &PreparedLaunch {
        &self.prepared
    }

    pub fn has_monitor(&self) -> bool {
        self.monitor.is_some()
    }

    /// The job monitor, creating the action handler on first use
    pub fn monitor_mut(&mut self, factory: &HandlerFactory) -> &mut JobMonitor {
        let prepared = &self.prepared;
        let max_lines = self.max_lines;
        self.monitor.get_or_insert_with(|| {
            debug!("Creating action handler for instance {}", prepared.instance_id);
            JobMonitor::new(factory(prepared)).with_max_lines(max_lines)
        })
    }

    pub fn monitor(&self) -> Option<&JobMonitor> {
        self.monitor.as_ref()
    }

    /// Poll the monitor if it exists; `true` if anything changed
    pub fn poll(&mut self) -> bool {
        let Some(monitor) = self.monitor.as_mut() else {
            return false;
        };
        let was_running = monitor.is_running();
        let changed = !monitor.poll().is_empty();
        if was_running && !monitor.is_running() {
            self.finished_once = true;
        }
        changed
    }

    pub fn is_running(&self) -> bool {
        self.monitor.as_ref().is_some_and(JobMonitor::is_running)
    }

    /// Start marker while jobs run, end marker afterwards
    pub fn tab_icon(&self) -> &'static str {
        if self.is_running() {
            ICON_RUNNING
        } else if self.finished_once {
            ICON_FINISHED
        } else {
            ICON_IDLE
        }
    }

    /// Terminate running jobs and delete the variant instance
    pub fn remove(mut self, workspace: &dyn WorkspaceApi) -> Result<()> {
        if let Some(monitor) = self.monitor.as_mut() {
            if monitor.is_running() {
                monitor.terminate_all();
            }
        }
        info!("Removing launch instance {}", self.label());
        workspace.remove_instance(&self.prepared.instance_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::path::PathBuf;

    use artdeck_daemon::{JobStatus, LaunchEvent, MockActionHandler, MockWorkspaceApi};

    fn request() -> LaunchRequest {
        LaunchRequest {
            project: "demo/p1".into(),
            variant_group: "vg1".into(),
            trial: "trial-a".into(),
            launch_id: "launch".into(),
            action: "render/std".into(),
        }
    }

    fn prepared(metadata: &[(&str, &str)]) -> PreparedLaunch {
        PreparedLaunch {
            instance_id: "abc123".into(),
            instance_dir: PathBuf::from("/ws/_instances/abc123"),
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            jobs: Vec::new(),
        }
    }

    fn full_metadata() -> Vec<(&'static str, &'static str)> {
        vec![(META_ACTION_PATH, "render/std"), (META_LAUNCH_FILE_ID, "launch")]
    }

    #[test]
    fn test_label_and_tab_id() {
        let instance = LaunchInstance::from_prepared(request(), prepared(&full_metadata())).unwrap();
        assert_eq!(instance.label(), "demo/p1[vg1:trial-a]-launch-render/std");
        assert_eq!(instance.tab_id(), "launch:abc123");
        assert_eq!(instance.tab_icon(), ICON_IDLE);
    }

    #[test]
    fn test_missing_metadata_is_error() {
        let err = LaunchInstance::from_prepared(
            request(),
            prepared(&[(META_LAUNCH_FILE_ID, "launch")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Action path"));

        let err = LaunchInstance::from_prepared(
            request(),
            prepared(&[(META_ACTION_PATH, "render/std")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Launch file id"));
    }

    #[test]
    fn test_prepare_through_workspace() {
        let mut ws = MockWorkspaceApi::new();
        ws.expect_prepare_launch()
            .times(1)
            .returning(|_| Ok(prepared(&full_metadata())));
        let instance = LaunchInstance::prepare(&ws, request()).unwrap();
        assert_eq!(instance.id(), "abc123");
    }

    fn idle_handler() -> MockActionHandler {
        let mut handler = MockActionHandler::new();
        handler.expect_job_count().return_const(0usize);
        handler.expect_output_types().returning(Vec::new);
        handler
    }

    #[test]
    fn test_handler_created_lazily_once() {
        let mut instance = LaunchInstance::from_prepared(request(), prepared(&full_metadata())).unwrap();
        let created = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&created);
        let factory = move |_: &PreparedLaunch| -> Box<dyn ActionHandler> {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Box::new(idle_handler())
        };
        assert!(!instance.has_monitor());
        instance.monitor_mut(&factory);
        instance.monitor_mut(&factory);
        assert_eq!(created.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tab_icon_follows_launch() {
        let mut instance = LaunchInstance::from_prepared(request(), prepared(&full_metadata())).unwrap();
        let factory = |_: &PreparedLaunch| -> Box<dyn ActionHandler> {
            let mut handler = idle_handler();
            handler.expect_launch().returning(|tx| {
                tx.send(LaunchEvent::ExecStart).unwrap();
                tx.send(LaunchEvent::ExecEnd).unwrap();
                Ok(())
            });
            handler.expect_update_job_output().return_const(());
            handler.expect_take_status_changed().returning(BTreeSet::new);
            handler.expect_take_output_changed().returning(BTreeSet::new);
            handler.expect_job_status().returning(|_| JobStatus::Ended);
            Box::new(handler)
        };
        instance.monitor_mut(&factory).launch().unwrap();
        assert_eq!(instance.tab_icon(), ICON_RUNNING);
        assert!(instance.poll());
        assert_eq!(instance.tab_icon(), ICON_FINISHED);
    }

    #[test]
    fn test_remove_deletes_instance() {
        let mut ws = MockWorkspaceApi::new();
        ws.expect_remove_instance()
            .withf(|dir| dir == std::path::Path::new("/ws/_instances/abc123"))
            .times(1)
            .returning(|_| Ok(()));
        let instance = LaunchInstance::from_prepared(request(), prepared(&full_metadata())).unwrap();
        instance.remove(&ws).unwrap();
    }
}
