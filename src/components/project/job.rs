//! Status of the project's current generation job.

use crate::components;
use crate::models::{JobStatus, NO_SOLUTION};
use crate::poller::{PollHandle, PollUpdate};
use crate::tui::Frame;
use ratatui::{prelude::*, widgets::*};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Status shown when a status request fails.
const ERROR_STATUS: &str = "ERROR";

/// How a finished job ended, for the screen's notice line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    ScheduleReady(i64),
    NoSolution,
    Ended(String),
    Failed(String),
}

/// Panel tracking the latest generation job.
#[derive(Debug, Default)]
pub struct JobPanel {
    /// ID of the tracked job, if one was started.
    job_id: Option<String>,
    /// Last status reported by the backend.
    status: Option<String>,
    /// Last result object reported by the backend.
    result: Option<serde_json::Value>,
    /// Schedule produced by the job, once finished.
    schedule_id: Option<i64>,
    /// Running poll task; `None` once the job has ended.
    poll: Option<PollHandle>,
    /// Current spinner frame.
    spinner: usize,
}

impl JobPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a newly queued job, replacing (and cancelling) any earlier one.
    pub fn start(&mut self, job_id: String, poll: Option<PollHandle>) {
        if let Some(previous) = self.poll.take() {
            previous.cancel();
        }
        self.job_id = Some(job_id);
        self.status = Some("PENDING".to_string());
        self.result = None;
        self.schedule_id = None;
        self.poll = poll;
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_some()
    }

    pub fn schedule_id(&self) -> Option<i64> {
        self.schedule_id
    }

    /// Drains pending poll updates; returns how the job ended, once it has.
    pub fn on_tick(&mut self) -> Option<JobOutcome> {
        self.spinner = (self.spinner + 1) % SPINNER.len();

        let mut outcome = None;
        loop {
            let Some(update) = self.poll.as_mut().and_then(PollHandle::try_next) else {
                break;
            };
            outcome = self.apply(update);
        }
        outcome
    }

    /// Applies one poll update to the panel.
    pub fn apply(&mut self, update: PollUpdate) -> Option<JobOutcome> {
        match update {
            PollUpdate::Status(status) => {
                self.show(status);
                None
            }
            PollUpdate::Finished(status) => {
                self.poll = None;
                self.schedule_id = status.schedule_id();
                let outcome = match (status.schedule_id(), status.result_status()) {
                    (Some(id), _) => JobOutcome::ScheduleReady(id),
                    (None, Some(NO_SOLUTION)) => JobOutcome::NoSolution,
                    _ => JobOutcome::Ended(status.status.clone()),
                };
                self.show(status);
                Some(outcome)
            }
            PollUpdate::Failed(message) => {
                self.poll = None;
                self.status = Some(ERROR_STATUS.to_string());
                Some(JobOutcome::Failed(message))
            }
        }
    }

    fn show(&mut self, status: JobStatus) {
        self.status = Some(status.status);
        self.result = status.result;
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = components::panel("Job status", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(job_id) = &self.job_id else {
            frame.render_widget(
                Paragraph::new("No active job")
                    .style(Style::default().fg(components::MUTED)),
                inner,
            );
            return;
        };

        let status = self.status.as_deref().unwrap_or("-");
        let status_color = match status {
            "SUCCESS" => components::SUCCESS,
            "FAILURE" | "REVOKED" | ERROR_STATUS => components::DANGER,
            _ => components::WARNING,
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Job ID: ", Style::default().fg(components::MUTED)),
                Span::styled(job_id.clone(), Style::default().fg(components::TEXT)),
            ]),
            Line::from(vec![
                Span::styled("Status: ", Style::default().fg(components::MUTED)),
                Span::styled(
                    status.to_string(),
                    Style::default().fg(status_color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(if self.is_polling() {
                    format!("  {}", SPINNER[self.spinner])
                } else {
                    String::new()
                }),
            ]),
        ];

        match self.schedule_id {
            Some(id) => lines.push(Line::styled(
                format!("Schedule {id} ready. Enter: open calendar"),
                Style::default().fg(components::SUCCESS),
            )),
            None if !self.is_polling() => lines.push(Line::styled(
                "No schedule selected. Start generation to create one.",
                Style::default().fg(components::MUTED),
            )),
            None => {}
        }

        if let Some(result) = &self.result {
            lines.push(Line::raw(""));
            let pretty = serde_json::to_string_pretty(result).unwrap_or_else(|_| result.to_string());
            lines.extend(pretty.lines().map(|line| {
                Line::styled(line.to_string(), Style::default().fg(Color::Rgb(200, 200, 220)))
            }));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }
}
