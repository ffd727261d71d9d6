//! Action handler collaborator
//!
//! An action handler launches the jobs of one prepared launch and reports
//! their state. The console only polls it; job execution and termination are
//! entirely its business.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use artdeck_core::prelude::*;

/// Output stream names of a job
pub const OUTPUT_STDOUT: &str = "stdout";
pub const OUTPUT_STDERR: &str = "stderr";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    NotStarted,
    Starting,
    Running,
    Ended,
    Terminated,
}

impl JobStatus {
    /// Icon name shown per job
    pub fn icon(&self) -> &'static str {
        match self {
            JobStatus::NotStarted => "schedule",
            JobStatus::Starting => "trending_up",
            JobStatus::Running => "mediation",
            JobStatus::Ended => "done",
            JobStatus::Terminated => "close",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Ended | JobStatus::Terminated)
    }
}

/// Static description of one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub idx: usize,
    pub name: String,
    pub label: String,
}

/// Progress of a launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    /// Job configurations `index..index + 10` of `count` are being created
    CreatingJobs { index: usize, count: usize },
    /// All jobs were created, execution starts
    ExecStart,
    /// Every job has ended or was terminated
    ExecEnd,
}

/// Launches and tracks the jobs of one launch instance
#[cfg_attr(any(test, feature = "test-helpers"), mockall::automock)]
pub trait ActionHandler: Send {
    /// Start the jobs. Progress is reported on `events`; must be called
    /// within a tokio runtime.
    fn launch(&mut self, events: mpsc::UnboundedSender<LaunchEvent>) -> Result<()>;

    fn job_count(&self) -> usize;

    /// Names of the output streams every job has
    fn output_types(&self) -> Vec<String>;

    fn job_config(&self, idx: usize) -> Option<JobConfig>;

    /// Title/value pairs describing a job
    fn job_info(&self, idx: usize) -> Vec<(String, String)>;

    fn job_status(&self, idx: usize) -> JobStatus;

    fn job_end_message(&self, idx: usize) -> String;

    /// Collect pending output of the running jobs, bounded by `max_time`
    fn update_job_output(&mut self, max_time: Duration);

    /// Jobs whose status changed since the last call
    fn take_status_changed(&mut self) -> BTreeSet<usize>;

    /// Jobs with new output since the last call
    fn take_output_changed(&mut self) -> BTreeSet<usize>;

    /// New output lines of one stream of a job since the last call
    fn take_job_output(&mut self, idx: usize, output_type: &str) -> Vec<String>;

    fn terminate_job(&mut self, idx: usize);

    fn terminate_all(&mut self);
}
