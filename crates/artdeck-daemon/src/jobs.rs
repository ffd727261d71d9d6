//! Child-process action handler
//!
//! Runs every job of a prepared launch as a child process, at most
//! `max_parallel` at a time. Output is buffered per job and stream until
//! the console takes it.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tokio::sync::mpsc;

use artdeck_core::prelude::*;

use crate::action::{
    ActionHandler, JobConfig, JobStatus, LaunchEvent, OUTPUT_STDERR, OUTPUT_STDOUT,
};
use crate::process::{ManagedProcess, ProcessEvent};
use crate::workspace::JobSpec;

pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Job configurations are reported in batches of this size
const CREATE_BATCH: usize = 10;

struct JobSlot {
    spec: JobSpec,
    status: JobStatus,
    process: Option<ManagedProcess>,
    events: Option<mpsc::Receiver<ProcessEvent>>,
    pending: BTreeMap<&'static str, Vec<String>>,
    end_message: String,
    terminate_requested: bool,
    /// Set by the exit event; output may still follow until the channel closes
    exit: Option<Option<i32>>,
    exit_code: Option<i32>,
    started: Option<DateTime<Local>>,
}

impl JobSlot {
    fn new(spec: JobSpec) -> Self {
        Self {
            spec,
            status: JobStatus::NotStarted,
            process: None,
            events: None,
            pending: BTreeMap::new(),
            end_message: String::new(),
            terminate_requested: false,
            exit: None,
            exit_code: None,
            started: None,
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Starting | JobStatus::Running)
    }
}

/// [`ActionHandler`] running jobs as local child processes
pub struct ProcessActionHandler {
    jobs: Vec<JobSlot>,
    max_parallel: usize,
    events: Option<mpsc::UnboundedSender<LaunchEvent>>,
    end_sent: bool,
    status_changed: BTreeSet<usize>,
    output_changed: BTreeSet<usize>,
}

impl ProcessActionHandler {
    pub fn new(jobs: Vec<JobSpec>) -> Self {
        Self {
            jobs: jobs.into_iter().map(JobSlot::new).collect(),
            max_parallel: DEFAULT_MAX_PARALLEL,
            events: None,
            end_sent: false,
            status_changed: BTreeSet::new(),
            output_changed: BTreeSet::new(),
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    fn send(&self, event: LaunchEvent) {
        if let Some(tx) = &self.events {
            if tx.send(event).is_err() {
                debug!("launch event receiver dropped");
            }
        }
    }

    fn start_pending(&mut self) {
        let mut active = self.jobs.iter().filter(|j| j.is_active()).count();
        for (idx, slot) in self.jobs.iter_mut().enumerate() {
            if active >= self.max_parallel {
                break;
            }
            if slot.status != JobStatus::NotStarted {
                continue;
            }

            let (tx, rx) = mpsc::channel(1024);
            match ManagedProcess::spawn(&slot.spec.command, tx) {
                Ok(process) => {
                    slot.process = Some(process);
                    slot.events = Some(rx);
                    slot.status = JobStatus::Starting;
                    slot.started = Some(Local::now());
                    active += 1;
                }
                Err(e) => {
                    warn!("Job {} failed to start: {}", idx, e);
                    slot.status = JobStatus::Terminated;
                    slot.end_message = e.to_string();
                }
            }
            self.status_changed.insert(idx);
        }
    }

    fn finish(slot: &mut JobSlot, code: Option<i32>) {
        slot.exit_code = code;
        slot.process = None;
        slot.events = None;
        if slot.terminate_requested {
            slot.status = JobStatus::Terminated;
            slot.end_message = "Job terminated by user".to_string();
        } else if code == Some(0) {
            slot.status = JobStatus::Ended;
        } else {
            slot.status = JobStatus::Terminated;
            slot.end_message = match code {
                Some(code) => format!("Process exited with code {}", code),
                None => "Process was killed".to_string(),
            };
        }
    }

    fn all_finished(&self) -> bool {
        self.jobs.iter().all(|j| j.status.is_finished())
    }
}

impl ActionHandler for ProcessActionHandler {
    fn launch(&mut self, events: mpsc::UnboundedSender<LaunchEvent>) -> Result<()> {
        if self.events.is_some() {
            return Err(Error::action("jobs were already launched"));
        }
        self.events = Some(events);

        let count = self.jobs.len();
        for index in (0..count).step_by(CREATE_BATCH) {
            self.send(LaunchEvent::CreatingJobs { index, count });
        }
        self.send(LaunchEvent::ExecStart);
        info!("Launching {} jobs", count);

        self.start_pending();
        if self.all_finished() {
            self.end_sent = true;
            self.send(LaunchEvent::ExecEnd);
        }
        Ok(())
    }

    fn job_count(&self) -> usize {
        self.jobs.len()
    }

    fn output_types(&self) -> Vec<String> {
        vec![OUTPUT_STDOUT.to_string(), OUTPUT_STDERR.to_string()]
    }

    fn job_config(&self, idx: usize) -> Option<JobConfig> {
        self.jobs.get(idx).map(|slot| JobConfig {
            idx: slot.spec.idx,
            name: slot.spec.name.clone(),
            label: slot.spec.label.clone(),
        })
    }

    fn job_info(&self, idx: usize) -> Vec<(String, String)> {
        let Some(slot) = self.jobs.get(idx) else {
            return Vec::new();
        };
        let mut info = vec![
            ("Status".to_string(), format!("{:?}", slot.status)),
            ("Command".to_string(), slot.spec.command.display()),
        ];
        if let Some(started) = slot.started {
            info.push(("Started".to_string(), started.format("%H:%M:%S").to_string()));
        }
        if let Some(pid) = slot.process.as_ref().and_then(ManagedProcess::id) {
            info.push(("PID".to_string(), pid.to_string()));
        }
        if let Some(code) = slot.exit_code {
            info.push(("Exit code".to_string(), code.to_string()));
        }
        info
    }

    fn job_status(&self, idx: usize) -> JobStatus {
        self.jobs
            .get(idx)
            .map(|slot| slot.status)
            .unwrap_or(JobStatus::NotStarted)
    }

    fn job_end_message(&self, idx: usize) -> String {
        self.jobs
            .get(idx)
            .map(|slot| slot.end_message.clone())
            .unwrap_or_default()
    }

    fn update_job_output(&mut self, max_time: Duration) {
        let deadline = Instant::now() + max_time;

        'jobs: for (idx, slot) in self.jobs.iter_mut().enumerate() {
            if slot.status == JobStatus::Starting {
                slot.status = JobStatus::Running;
                self.status_changed.insert(idx);
            }
            loop {
                let Some(rx) = slot.events.as_mut() else {
                    break;
                };
                let event = match rx.try_recv() {
                    Ok(event) => event,
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        let code = slot.exit.flatten();
                        Self::finish(slot, code);
                        self.status_changed.insert(idx);
                        break;
                    }
                };
                match event {
                    ProcessEvent::Stdout(line) => {
                        slot.pending.entry(OUTPUT_STDOUT).or_default().push(line);
                        self.output_changed.insert(idx);
                    }
                    ProcessEvent::Stderr(line) => {
                        slot.pending.entry(OUTPUT_STDERR).or_default().push(line);
                        self.output_changed.insert(idx);
                    }
                    ProcessEvent::Exited { code } => slot.exit = Some(code),
                }
                if Instant::now() >= deadline {
                    break 'jobs;
                }
            }
        }

        self.start_pending();

        if self.events.is_some() && !self.end_sent && self.all_finished() {
            self.end_sent = true;
            self.send(LaunchEvent::ExecEnd);
        }
    }

    fn take_status_changed(&mut self) -> BTreeSet<usize> {
        std::mem::take(&mut self.status_changed)
    }

    fn take_output_changed(&mut self) -> BTreeSet<usize> {
        std::mem::take(&mut self.output_changed)
    }

    fn take_job_output(&mut self, idx: usize, output_type: &str) -> Vec<String> {
        self.jobs
            .get_mut(idx)
            .and_then(|slot| slot.pending.get_mut(output_type))
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn terminate_job(&mut self, idx: usize) {
        let Some(slot) = self.jobs.get_mut(idx) else {
            return;
        };
        match slot.status {
            JobStatus::NotStarted => {
                slot.status = JobStatus::Terminated;
                slot.end_message = "Job terminated before start".to_string();
                self.status_changed.insert(idx);
            }
            JobStatus::Starting | JobStatus::Running => {
                slot.terminate_requested = true;
                if let Some(process) = slot.process.as_mut() {
                    process.kill();
                }
            }
            JobStatus::Ended | JobStatus::Terminated => {}
        }
    }

    fn terminate_all(&mut self) {
        // Pending jobs first, so none is started while others are killed
        for idx in 0..self.jobs.len() {
            if self.jobs[idx].status == JobStatus::NotStarted {
                self.terminate_job(idx);
            }
        }
        for idx in 0..self.jobs.len() {
            self.terminate_job(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::shell_job;

    /// Poll the handler until ExecEnd or timeout; returns collected stdout per job
    async fn run_to_end(
        handler: &mut ProcessActionHandler,
        rx: &mut mpsc::UnboundedReceiver<LaunchEvent>,
    ) -> Vec<Vec<String>> {
        let mut out = vec![Vec::new(); handler.job_count()];
        for _ in 0..100 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handler.update_job_output(Duration::from_millis(100));
            for idx in handler.take_output_changed() {
                out[idx].extend(handler.take_job_output(idx, OUTPUT_STDOUT));
            }
            while let Ok(event) = rx.try_recv() {
                if event == LaunchEvent::ExecEnd {
                    return out;
                }
            }
        }
        panic!("jobs did not finish in time");
    }

    #[tokio::test]
    async fn test_launch_reports_progress_and_output() {
        let jobs = (0..12).map(|i| shell_job(i, &format!("echo job{}", i))).collect();
        let mut handler = ProcessActionHandler::new(jobs);
        let (tx, mut rx) = mpsc::unbounded_channel();
        handler.launch(tx).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            LaunchEvent::CreatingJobs { index: 0, count: 12 }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            LaunchEvent::CreatingJobs { index: 10, count: 12 }
        );
        assert_eq!(rx.try_recv().unwrap(), LaunchEvent::ExecStart);

        let out = run_to_end(&mut handler, &mut rx).await;
        assert_eq!(out[3], vec!["job3"]);
        assert!((0..12).all(|i| handler.job_status(i) == JobStatus::Ended));
    }

    #[tokio::test]
    async fn test_parallel_limit() {
        let jobs = (0..3).map(|i| shell_job(i, "sleep 0.2")).collect();
        let mut handler = ProcessActionHandler::new(jobs).with_max_parallel(1);
        let (tx, _rx) = mpsc::unbounded_channel();
        handler.launch(tx).unwrap();

        assert_eq!(handler.job_status(0), JobStatus::Starting);
        assert_eq!(handler.job_status(1), JobStatus::NotStarted);
        assert_eq!(handler.take_status_changed(), BTreeSet::from([0]));
        handler.terminate_all();
    }

    #[tokio::test]
    async fn test_failing_job_is_terminated_with_message() {
        let mut handler = ProcessActionHandler::new(vec![shell_job(0, "exit 2")]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        handler.launch(tx).unwrap();
        run_to_end(&mut handler, &mut rx).await;

        assert_eq!(handler.job_status(0), JobStatus::Terminated);
        assert_eq!(handler.job_end_message(0), "Process exited with code 2");
    }

    #[tokio::test]
    async fn test_terminate_running_job() {
        let mut handler = ProcessActionHandler::new(vec![shell_job(0, "sleep 30")]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        handler.launch(tx).unwrap();
        handler.terminate_job(0);
        run_to_end(&mut handler, &mut rx).await;

        assert_eq!(handler.job_status(0), JobStatus::Terminated);
        assert_eq!(handler.job_end_message(0), "Job terminated by user");
    }

    #[tokio::test]
    async fn test_double_launch_fails() {
        let mut handler = ProcessActionHandler::new(vec![]);
        let (tx, mut rx) = mpsc::unbounded_channel();
        handler.launch(tx.clone()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), LaunchEvent::ExecStart);
        assert_eq!(rx.try_recv().unwrap(), LaunchEvent::ExecEnd);
        assert!(handler.launch(tx).is_err());
    }

    #[test]
    fn test_job_config_and_info() {
        let handler = ProcessActionHandler::new(vec![shell_job(0, "true")]);
        let cfg = handler.job_config(0).unwrap();
        assert_eq!(cfg.name, "job-0");
        assert_eq!(cfg.label, "label 0");
        assert!(handler.job_config(1).is_none());

        let info = handler.job_info(0);
        assert_eq!(info[0], ("Status".to_string(), "NotStarted".to_string()));
        assert_eq!(info[1].1, "sh -c true");
    }
}
