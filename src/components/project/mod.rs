//! A single project: roster upload, schedule generation and job status.

pub mod generate;
pub mod job;
pub mod upload;

use self::generate::GenerateForm;
use self::job::{JobOutcome, JobPanel};
use self::upload::UploadPanel;
use crate::app::{Action, Backend};
use crate::components::{self, Component, Notice};
use crate::models::Project;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Upload,
    Generate,
    Job,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Upload => Focus::Generate,
            Focus::Generate => Focus::Job,
            Focus::Job => Focus::Upload,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Upload => Focus::Job,
            Focus::Generate => Focus::Upload,
            Focus::Job => Focus::Generate,
        }
    }
}

/// Screen for one project: roster upload, generation form and job status.
pub struct ProjectView {
    /// Runtime and client used for backend calls and job polling.
    backend: Backend,
    /// The project being managed.
    project: Project,
    /// Number of agents on the roster, once fetched.
    agent_count: Option<usize>,
    /// Panel receiving key input.
    focus: Focus,
    /// Roster file path and preview.
    upload: UploadPanel,
    /// Per-shift targets and start date.
    form: GenerateForm,
    /// Status of the latest generation job.
    job: JobPanel,
    /// Error or success message with its display timer.
    notice: Option<Notice>,
}

impl ProjectView {
    pub fn new(backend: Backend, project: Project) -> Self {
        Self {
            backend,
            project,
            agent_count: None,
            focus: Focus::Generate,
            upload: UploadPanel::new(),
            form: GenerateForm::new(),
            job: JobPanel::new(),
            notice: None,
        }
    }

    /// Fetches the project's shifts and roster size.
    pub fn load(&mut self) {
        let client = self.backend.client.clone();
        match self.backend.block_on(client.list_shifts(self.project.id)) {
            Ok(shifts) => {
                info!(project = self.project.id, shifts = shifts.len(), "loaded shifts");
                self.form.set_shifts(shifts);
            }
            Err(err) => {
                warn!(project = self.project.id, error = %err, "cannot load shifts");
                self.notice = Some(Notice::error(format!(
                    "Failed to load shifts: {}",
                    err.detail()
                )));
            }
        }
        self.load_agents();
    }

    fn load_agents(&mut self) {
        let client = self.backend.client.clone();
        match self.backend.block_on(client.list_agents(self.project.id)) {
            Ok(agents) => self.agent_count = Some(agents.len()),
            Err(err) => warn!(project = self.project.id, error = %err, "cannot load agents"),
        }
    }

    fn upload_roster(&mut self) {
        let Some(path) = self.upload.path() else {
            self.notice = Some(Notice::error("Choose a CSV file first"));
            return;
        };
        if let Err(err) = self.upload.load_preview() {
            self.notice = Some(Notice::error(format!("Upload failed: {err:#}")));
            return;
        }

        let client = self.backend.client.clone();
        match self
            .backend
            .block_on(client.upload_roster(self.project.id, &path))
        {
            Ok(summary) => {
                info!(project = self.project.id, count = summary.count, "roster uploaded");
                self.notice = Some(Notice::success(format!(
                    "Uploaded {} agents",
                    summary.count
                )));
                self.load_agents();
            }
            Err(err) => {
                warn!(project = self.project.id, error = %err, "roster upload failed");
                self.notice = Some(Notice::error(format!("Upload failed: {}", err.detail())));
            }
        }
    }

    fn start_generation(&mut self) {
        let request = match self.form.build_request() {
            Ok(request) => request,
            Err(message) => {
                self.notice = Some(Notice::error(message));
                return;
            }
        };

        let client = self.backend.client.clone();
        match self
            .backend
            .block_on(client.generate_schedule(self.project.id, &request))
        {
            Ok(handle) => {
                info!(project = self.project.id, job_id = %handle.job_id, "generation queued");
                let poll = self.backend.poll_job(handle.job_id.clone());
                self.job.start(handle.job_id, Some(poll));
                self.focus = Focus::Job;
            }
            Err(err) => {
                warn!(project = self.project.id, error = %err, "cannot start generation");
                self.notice = Some(Notice::error(format!(
                    "Failed to start job: {}",
                    err.detail()
                )));
            }
        }
    }

    fn open_schedule(&self) -> Option<Action> {
        let schedule_id = self.job.schedule_id()?;
        Some(Action::OpenSchedule {
            schedule_id,
            project_name: self.project.name.clone(),
            requirements: self.form.requirements(),
        })
    }
}

impl Component for ProjectView {
    fn handle_input(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Esc => return Ok(Some(Action::Back)),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            _ => match self.focus {
                Focus::Upload => {
                    if self.upload.handle_key(key) {
                        self.upload_roster();
                    }
                }
                Focus::Generate => {
                    if self.form.handle_key(key) {
                        self.start_generation();
                    }
                }
                Focus::Job => match key.code {
                    KeyCode::Enter => return Ok(self.open_schedule()),
                    KeyCode::Char('r') | KeyCode::Char('R') => self.load(),
                    _ => {}
                },
            },
        }
        Ok(None)
    }

    fn on_tick(&mut self) {
        components::expire(&mut self.notice);

        let notice = match self.job.on_tick() {
            Some(JobOutcome::ScheduleReady(id)) => {
                Notice::success(format!("Schedule {id} generated"))
            }
            Some(JobOutcome::NoSolution) => {
                Notice::error("No feasible schedule for these targets")
            }
            Some(JobOutcome::Ended(status)) => Notice::error(format!("Job ended: {status}")),
            Some(JobOutcome::Failed(message)) => {
                Notice::error(format!("Job status unavailable: {message}"))
            }
            None => return,
        };
        self.notice = Some(notice);
    }

    fn render(&self, frame: &mut Frame) {
        components::clear_screen(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(12),   // Panels
                Constraint::Length(1), // Help
                Constraint::Length(1), // Notice
            ])
            .margin(1)
            .split(frame.area());

        let agents = match self.agent_count {
            Some(n) => format!("{n} agents"),
            None => "agents unknown".to_string(),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                format!("{} (ID: {})", self.project.name, self.project.id),
                Style::default()
                    .fg(components::TEXT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  ·  {agents}"), Style::default().fg(components::MUTED)),
        ]))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(components::BORDER)),
        );
        frame.render_widget(header, layout[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .spacing(1)
            .split(layout[1]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(11), Constraint::Min(8)])
            .split(columns[0]);

        self.upload
            .render(frame, left[0], self.focus == Focus::Upload);
        self.form
            .render(frame, left[1], self.focus == Focus::Generate);
        self.job.render(frame, columns[1], self.focus == Focus::Job);

        let help = Paragraph::new("Tab: Switch panel | Enter: Submit / Open schedule | Esc: Back to projects")
            .style(Style::default().fg(components::MUTED))
            .alignment(Alignment::Center);
        frame.render_widget(help, layout[2]);

        components::render_notice(frame, layout[3], self.notice.as_ref());
    }
}
