//! Job monitor of one launch instance
//!
//! Polls an [`ActionHandler`] once per second: collects output, refreshes
//! status icons and appends new output per stream. The monitor never
//! executes or kills anything itself, it only asks the handler.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;

use artdeck_core::prelude::*;
use artdeck_daemon::{ActionHandler, JobConfig, JobStatus, LaunchEvent};

/// Interval between two polls of the handler
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Time the handler may spend collecting output per poll
pub const OUTPUT_BUDGET: Duration = Duration::from_millis(100);

/// Shown for a stream without output
pub const NO_OUTPUT: &str = "--- no output ---";

/// Scroll fraction from which new output keeps the pane at the bottom
pub const AUTO_SCROLL_THRESHOLD: f64 = 0.9;

const DEFAULT_MAX_LINES: usize = 10_000;

/// Where the launch is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchPhase {
    Idle,
    Creating { index: usize, count: usize },
    Running,
    Finished,
}

/// Scroll position of the output pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollState {
    pub offset: usize,
    pub viewport: usize,
}

impl ScrollState {
    fn max_offset(&self, lines: usize) -> usize {
        lines.saturating_sub(self.viewport)
    }

    /// Whether the pane shows the last 10% of its scroll range
    pub fn is_near_bottom(&self, lines: usize) -> bool {
        let max = self.max_offset(lines);
        max == 0 || self.offset as f64 / max as f64 >= AUTO_SCROLL_THRESHOLD
    }
}

#[derive(Debug, Clone)]
struct JobEntry {
    config: JobConfig,
    status: JobStatus,
    output: BTreeMap<String, Vec<String>>,
}

/// What changed during a poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollChanges {
    pub status: Vec<usize>,
    pub output: Vec<usize>,
    pub phase_changed: bool,
}

impl PollChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_empty() && self.output.is_empty() && !self.phase_changed
    }
}

pub struct JobMonitor {
    handler: Box<dyn ActionHandler>,
    events: Option<mpsc::UnboundedReceiver<LaunchEvent>>,
    jobs: Vec<JobEntry>,
    output_types: Vec<String>,
    selected: Option<usize>,
    output_type: usize,
    phase: LaunchPhase,
    launching: bool,
    alive: bool,
    scroll: ScrollState,
    max_lines: usize,
}

impl std::fmt::Debug for JobMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobMonitor")
            .field("jobs", &self.jobs.len())
            .field("phase", &self.phase)
            .field("selected", &self.selected)
            .finish()
    }
}

impl JobMonitor {
    pub fn new(handler: Box<dyn ActionHandler>) -> Self {
        let output_types = handler.output_types();
        let jobs = (0..handler.job_count())
            .map(|idx| JobEntry {
                config: handler.job_config(idx).unwrap_or_else(|| JobConfig {
                    idx,
                    name: format!("job-{}", idx),
                    label: String::new(),
                }),
                status: handler.job_status(idx),
                output: output_types.iter().map(|t| (t.clone(), Vec::new())).collect(),
            })
            .collect();
        Self {
            handler,
            events: None,
            jobs,
            output_types,
            selected: None,
            output_type: 0,
            phase: LaunchPhase::Idle,
            launching: false,
            alive: false,
            scroll: ScrollState::default(),
            max_lines: DEFAULT_MAX_LINES,
        }
    }

    /// Cap the number of lines kept per stream
    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines = max_lines.max(1);
        self
    }

    // ─────────────────────────────────────────────────────────
    // Launch
    // ─────────────────────────────────────────────────────────

    /// Start the jobs. On failure the controls are restored.
    pub fn launch(&mut self) -> Result<()> {
        if self.launching {
            return Err(Error::action("jobs are already running"));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.launching = true;
        self.phase = LaunchPhase::Idle;
        if let Err(e) = self.handler.launch(tx) {
            self.launching = false;
            error!("Launch failed: {}", e);
            return Err(e);
        }
        self.events = Some(rx);
        Ok(())
    }

    fn drain_events(&mut self) -> bool {
        let Some(events) = self.events.as_mut() else {
            return false;
        };
        let mut received = Vec::new();
        while let Ok(event) = events.try_recv() {
            received.push(event);
        }
        let changed = !received.is_empty();
        for event in received {
            self.apply_event(event);
        }
        changed
    }

    fn apply_event(&mut self, event: LaunchEvent) {
        match event {
            LaunchEvent::CreatingJobs { index, count } => {
                self.phase = LaunchPhase::Creating { index, count };
            }
            LaunchEvent::ExecStart => self.phase = LaunchPhase::Running,
            LaunchEvent::ExecEnd => {
                self.phase = LaunchPhase::Finished;
                self.launching = false;
                self.events = None;
                info!("Finished processing {} jobs", self.jobs.len());
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────

    /// One poll of the handler
    pub fn poll(&mut self) -> PollChanges {
        let phase_changed = self.drain_events();
        self.handler.update_job_output(OUTPUT_BUDGET);

        let status_changed = self.handler.take_status_changed();
        let output_changed = self.handler.take_output_changed();
        let follow = self.follows_output();

        let mut changes = PollChanges {
            phase_changed,
            ..Default::default()
        };

        for &idx in &status_changed {
            let status = self.handler.job_status(idx);
            let Some(job) = self.jobs.get_mut(idx) else {
                continue;
            };
            job.status = status;
            changes.status.push(idx);
            if status == JobStatus::Terminated {
                let marker = format!(
                    "\n--- Job TERMINATED ---\n\n{}",
                    self.handler.job_end_message(idx)
                );
                for output in job.output.values_mut() {
                    append_text(output, &marker, self.max_lines);
                }
                changes.output.push(idx);
            }
        }

        for &idx in &output_changed {
            if idx >= self.jobs.len() {
                continue;
            }
            for output_type in &self.output_types {
                let lines = self.handler.take_job_output(idx, output_type);
                if lines.is_empty() {
                    continue;
                }
                if let Some(output) = self.jobs[idx].output.get_mut(output_type) {
                    append_lines(output, lines, self.max_lines);
                }
            }
            if !changes.output.contains(&idx) {
                changes.output.push(idx);
            }
        }

        if follow && self.selected.is_some_and(|s| changes.output.contains(&s)) {
            self.scroll_to_bottom();
        }

        self.alive = !self.alive;
        changes
    }

    /// Alive indicator, toggled on every poll
    pub fn alive(&self) -> bool {
        self.alive
    }

    // ─────────────────────────────────────────────────────────
    // Status
    // ─────────────────────────────────────────────────────────

    pub fn phase(&self) -> LaunchPhase {
        self.phase
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_running(&self) -> bool {
        self.launching
    }

    pub fn status_text(&self) -> String {
        match self.phase {
            LaunchPhase::Idle => String::new(),
            LaunchPhase::Creating { index, count } => format!(
                "Status: creating configurations {}-{} of {}",
                index,
                index + 9,
                count
            ),
            LaunchPhase::Running => format!("processing {} jobs", self.jobs.len()),
            LaunchPhase::Finished => format!("finished processing {} jobs", self.jobs.len()),
        }
    }

    pub fn status(&self, idx: usize) -> Option<JobStatus> {
        self.jobs.get(idx).map(|j| j.status)
    }

    pub fn status_icon(&self, idx: usize) -> &'static str {
        self.status(idx).unwrap_or(JobStatus::NotStarted).icon()
    }

    pub fn job_label(&self, idx: usize) -> Option<String> {
        self.jobs.get(idx).map(|j| {
            format!("Job {}: {} [{}]", j.config.idx, j.config.name, j.config.label)
        })
    }

    pub fn job_info(&self, idx: usize) -> Vec<(String, String)> {
        self.handler.job_info(idx)
    }

    // ─────────────────────────────────────────────────────────
    // Controls
    // ─────────────────────────────────────────────────────────

    pub fn can_launch(&self) -> bool {
        !self.launching
    }

    pub fn can_close(&self) -> bool {
        !self.launching
    }

    pub fn can_terminate_all(&self) -> bool {
        self.launching
    }

    /// Terminate-one is unavailable for finished jobs
    pub fn can_terminate_selected(&self) -> bool {
        self.selected
            .and_then(|idx| self.status(idx))
            .is_some_and(|s| !s.is_finished())
    }

    pub fn terminate_selected(&mut self) -> Result<()> {
        if !self.can_terminate_selected() {
            return Err(Error::action("selected job cannot be terminated"));
        }
        if let Some(idx) = self.selected {
            info!("Terminating job {}", idx);
            self.handler.terminate_job(idx);
        }
        Ok(())
    }

    pub fn terminate_all(&mut self) {
        info!("Terminating all jobs");
        self.handler.terminate_all();
    }

    // ─────────────────────────────────────────────────────────
    // Output pane
    // ─────────────────────────────────────────────────────────

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Switch the displayed job; auto-scroll starts over
    pub fn select_job(&mut self, idx: usize) -> Result<()> {
        if idx >= self.jobs.len() {
            return Err(Error::action(format!("no job {}", idx)));
        }
        self.selected = Some(idx);
        self.scroll.offset = 0;
        self.scroll_to_bottom();
        Ok(())
    }

    pub fn selected_label(&self) -> String {
        match self.selected.and_then(|idx| self.jobs.get(idx)) {
            Some(job) => format!("Selected Job: {}: {}", job.config.idx, job.config.name),
            None => "Selected Job: none".to_string(),
        }
    }

    pub fn output_types(&self) -> &[String] {
        &self.output_types
    }

    pub fn output_type(&self) -> Option<&str> {
        self.output_types.get(self.output_type).map(String::as_str)
    }

    pub fn next_output_type(&mut self) {
        if !self.output_types.is_empty() {
            self.output_type = (self.output_type + 1) % self.output_types.len();
            self.scroll_to_bottom();
        }
    }

    /// Output lines of a job stream, [`NO_OUTPUT`] when there are none
    pub fn output(&self, idx: usize, output_type: &str) -> Vec<&str> {
        let lines = self
            .jobs
            .get(idx)
            .and_then(|j| j.output.get(output_type))
            .filter(|lines| !lines.is_empty());
        match lines {
            Some(lines) => lines.iter().map(String::as_str).collect(),
            None => vec![NO_OUTPUT],
        }
    }

    /// Lines of the displayed pane
    pub fn displayed_output(&self) -> Vec<&str> {
        match (self.selected, self.output_type()) {
            (Some(idx), Some(output_type)) => self.output(idx, output_type),
            _ => vec![NO_OUTPUT],
        }
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    pub fn set_viewport(&mut self, viewport: usize) {
        self.scroll.viewport = viewport;
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.scroll.max_offset(self.displayed_output().len());
        let offset = self.scroll.offset as isize + delta;
        self.scroll.offset = offset.clamp(0, max as isize) as usize;
    }

    fn follows_output(&self) -> bool {
        self.scroll.is_near_bottom(self.displayed_output().len())
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll.offset = self.scroll.max_offset(self.displayed_output().len());
    }
}

fn append_lines(output: &mut Vec<String>, lines: Vec<String>, max_lines: usize) {
    output.extend(lines);
    if output.len() > max_lines {
        let excess = output.len() - max_lines;
        output.drain(..excess);
    }
}

fn append_text(output: &mut Vec<String>, text: &str, max_lines: usize) {
    append_lines(output, text.lines().map(str::to_string).collect(), max_lines);
}
