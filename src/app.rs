//! Top-level application state and screen routing.
//!
//! The console has three screens: the project list, a single project (roster
//! upload, schedule generation, job status) and a generated schedule. Screens
//! report what the user asked for as an [`Action`]; the [`App`] performs the
//! transition.

use crate::api::ApiClient;
use crate::components::project::ProjectView;
use crate::components::projects::ProjectsView;
use crate::components::schedule::ScheduleView;
use crate::components::{self, Component};
use crate::config::Config;
use crate::models::{PerShiftRequirement, Project};
use crate::poller::{JobPoller, PollHandle};
use crate::tui::{self, Tui};
use anyhow::{Context, Result};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

/// What a screen asks the application to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenProject(Project),
    OpenSchedule {
        schedule_id: i64,
        project_name: String,
        /// Targets from the generation form, used when the schedule itself
        /// carries none.
        requirements: Vec<PerShiftRequirement>,
    },
    /// Leave the current screen.
    Back,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Projects,
    Project,
    Schedule,
}

/// Shared handles the screens use to reach the backend.
#[derive(Clone)]
pub struct Backend {
    runtime: Arc<Runtime>,
    pub client: Arc<ApiClient>,
    pub config: Config,
}

impl Backend {
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("shiftdesk-worker")
            .enable_all()
            .build()
            .context("cannot start async runtime")?;
        let client = ApiClient::new(&config).context("cannot build HTTP client")?;

        Ok(Self {
            runtime: Arc::new(runtime),
            client: Arc::new(client),
            config,
        })
    }

    /// Runs one backend call to completion on the UI thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Starts polling a generation job in the background.
    pub fn poll_job(&self, job_id: String) -> PollHandle {
        JobPoller::spawn(
            self.runtime.handle(),
            Arc::clone(&self.client),
            job_id,
            self.config.poll_interval,
        )
    }
}

pub struct App {
    pub state: AppState,
    pub should_quit: bool,
    backend: Backend,
    projects: ProjectsView,
    /// Kept while a schedule is open so its job panel survives the round trip.
    project: Option<ProjectView>,
    schedule: Option<ScheduleView>,
}

impl App {
    pub fn new(backend: Backend) -> Self {
        Self {
            state: AppState::Projects,
            should_quit: false,
            projects: ProjectsView::new(backend.clone()),
            project: None,
            schedule: None,
            backend,
        }
    }

    pub fn run(&mut self, tui: &mut Tui) -> Result<()> {
        info!(api_base = %self.backend.client.base_url(), "console started");
        self.projects.refresh();

        while !self.should_quit {
            tui.draw(|frame| self.render_ui(frame))?;
            self.handle_event(tui.next_event()?)?;
        }

        info!("console closed");
        Ok(())
    }

    fn handle_event(&mut self, event: tui::Event) -> Result<()> {
        match event {
            tui::Event::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    self.should_quit = true;
                    return Ok(());
                }
                if let Some(action) = self.active().handle_input(key)? {
                    self.apply(action);
                }
            }
            tui::Event::Input(_) => {}
            tui::Event::Tick => {
                self.active().on_tick();
                // A job keeps polling while its schedule is being viewed.
                if self.state == AppState::Schedule {
                    if let Some(project) = self.project.as_mut() {
                        project.on_tick();
                    }
                }
            }
        }
        Ok(())
    }

    fn active(&mut self) -> &mut dyn Component {
        match (self.state, self.schedule.as_mut(), self.project.as_mut()) {
            (AppState::Schedule, Some(schedule), _) => schedule,
            (AppState::Project, _, Some(project)) => project,
            _ => &mut self.projects,
        }
    }

    fn apply(&mut self, action: Action) {
        debug!(?action, state = ?self.state, "screen action");
        match action {
            Action::OpenProject(project) => {
                let mut view = ProjectView::new(self.backend.clone(), project);
                view.load();
                self.project = Some(view);
                self.state = AppState::Project;
            }
            Action::OpenSchedule {
                schedule_id,
                project_name,
                requirements,
            } => {
                let mut view =
                    ScheduleView::new(self.backend.clone(), schedule_id, project_name, requirements);
                view.load();
                self.schedule = Some(view);
                self.state = AppState::Schedule;
            }
            Action::Back => match self.state {
                AppState::Schedule => {
                    self.schedule = None;
                    self.state = if self.project.is_some() {
                        AppState::Project
                    } else {
                        AppState::Projects
                    };
                }
                AppState::Project => {
                    // Dropping the view cancels any poller it owns.
                    self.project = None;
                    self.state = AppState::Projects;
                }
                AppState::Projects => {}
            },
            Action::Quit => self.should_quit = true,
        }
    }

    fn render_ui(&mut self, frame: &mut tui::Frame<'_>) {
        let area = frame.area();
        if area.width < tui::MIN_WIDTH || area.height < tui::MIN_HEIGHT {
            render_too_small(frame, area);
            return;
        }
        self.active().render(frame);
    }
}

fn render_too_small(frame: &mut tui::Frame<'_>, area: Rect) {
    components::clear_screen(frame);
    let text = format!(
        "Terminal is {}x{}; Shiftdesk needs at least {}x{}.\nResize the window or press Ctrl+Q to quit.",
        area.width,
        area.height,
        tui::MIN_WIDTH,
        tui::MIN_HEIGHT
    );
    let message = Paragraph::new(text)
        .style(Style::default().fg(components::WARNING))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(message, components::centered_rect(60, 3, area));
}
