//! A generated schedule: calendar, day agenda, coverage and conflicts.

pub mod calendar;
pub mod coverage;

use crate::analysis::{CoverageBucket, ScheduleAnalysis};
use crate::app::{Action, Backend};
use crate::components::{self, Component, Notice};
use crate::export::{self, ExportFormat};
use crate::models::{Assignment, PerShiftRequirement, Schedule};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use time::{Date, Duration, OffsetDateTime};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Calendar,
    Agenda,
    Coverage,
    Conflicts,
}

impl Pane {
    const ORDER: [Pane; 4] = [Pane::Calendar, Pane::Agenda, Pane::Coverage, Pane::Conflicts];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    fn previous(self) -> Self {
        Self::ORDER[(self.position() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Text of the warning shown above the calendar when conflicts exist.
pub fn conflict_banner(analysis: &ScheduleAnalysis) -> Option<String> {
    let count = analysis.conflicts.len();
    (count > 0).then(|| format!("{count} conflict(s) detected. See details to resolve."))
}

/// Lines of the assignment details dialog.
pub fn detail_lines(
    assignment: &Assignment,
    coverage: Option<&CoverageBucket>,
    conflicted: bool,
) -> Vec<String> {
    let midnight = if assignment.crosses_midnight {
        " (crosses midnight)"
    } else {
        ""
    };
    let mut lines = vec![
        format!(
            "Agent: {} (#{})",
            assignment.agent_name, assignment.agent_id
        ),
        format!("Skill: {}", assignment.agent_skill.label()),
        format!("Role: {}", assignment.role),
        format!(
            "Shift: {} {} -> {}{midnight}",
            assignment.shift_name, assignment.shift_start, assignment.shift_end
        ),
        format!("Date: {}", assignment.date),
    ];
    if let Some(bucket) = coverage {
        lines.push(format!(
            "Coverage: {} assigned (chat {}, email {}, both {})",
            bucket.assigned.total, bucket.assigned.chat, bucket.assigned.email, bucket.assigned.both
        ));
    }
    if conflicted {
        lines.push("Overlaps another shift of this agent".to_string());
    }
    lines
}

/// Screen for one generated schedule.
pub struct ScheduleView {
    /// Runtime and client used to fetch the schedule.
    backend: Backend,
    /// Backend ID of the schedule shown.
    schedule_id: i64,
    /// Project name, used in the header and export file names.
    project_name: String,
    /// Targets used when the schedule does not record its own.
    fallback_requirements: Vec<PerShiftRequirement>,
    /// The loaded schedule, if the fetch succeeded.
    schedule: Option<Schedule>,
    /// Conflicts and coverage of the loaded schedule.
    analysis: ScheduleAnalysis,
    /// Day highlighted on the calendar and listed in the agenda.
    selected_day: Option<Date>,
    /// Pane receiving navigation keys.
    focus: Pane,
    /// Selection within the day agenda.
    agenda_state: ListState,
    /// Selection within the coverage table.
    coverage_state: TableState,
    /// Selection within the conflict list.
    conflicts_state: ListState,
    /// Whether the assignment details dialog is open.
    show_details: bool,
    /// Error or success message with its display timer.
    notice: Option<Notice>,
}

impl ScheduleView {
    pub fn new(
        backend: Backend,
        schedule_id: i64,
        project_name: String,
        fallback_requirements: Vec<PerShiftRequirement>,
    ) -> Self {
        Self {
            backend,
            schedule_id,
            project_name,
            fallback_requirements,
            schedule: None,
            analysis: ScheduleAnalysis::default(),
            selected_day: None,
            focus: Pane::Calendar,
            agenda_state: ListState::default(),
            coverage_state: TableState::default(),
            conflicts_state: ListState::default(),
            show_details: false,
            notice: None,
        }
    }

    /// Fetches the schedule and reruns the analysis.
    pub fn load(&mut self) {
        let client = self.backend.client.clone();
        match self.backend.block_on(client.schedule(self.schedule_id)) {
            Ok(schedule) => {
                info!(
                    schedule = schedule.id,
                    assignments = schedule.assignments.len(),
                    "loaded schedule"
                );
                self.show(schedule);
            }
            Err(err) => {
                warn!(schedule = self.schedule_id, error = %err, "cannot load schedule");
                self.notice = Some(Notice::error(format!(
                    "Failed to load schedule: {}",
                    err.detail()
                )));
            }
        }
    }

    fn show(&mut self, schedule: Schedule) {
        let mut requirements = schedule.requirements();
        if requirements.is_empty() {
            requirements = self.fallback_requirements.clone();
        }
        self.analysis = ScheduleAnalysis::analyze_with_targets(&schedule.assignments, &requirements);
        self.selected_day = Some(
            schedule
                .assignments
                .iter()
                .map(|a| a.date)
                .min()
                .unwrap_or(schedule.start_date),
        );
        self.coverage_state
            .select((!self.analysis.coverage.is_empty()).then_some(0));
        self.conflicts_state
            .select((!self.analysis.conflicts.is_empty()).then_some(0));
        self.schedule = Some(schedule);
        self.reset_agenda();
    }

    fn assignments(&self) -> &[Assignment] {
        self.schedule
            .as_ref()
            .map(|s| s.assignments.as_slice())
            .unwrap_or_default()
    }

    fn agenda(&self) -> Vec<usize> {
        match self.selected_day {
            Some(day) => calendar::agenda_for(self.assignments(), day),
            None => Vec::new(),
        }
    }

    fn reset_agenda(&mut self) {
        let empty = self.agenda().is_empty();
        self.agenda_state.select(if empty { None } else { Some(0) });
        self.show_details = false;
    }

    /// Moves the selected day, staying within the schedule's date range.
    fn move_day(&mut self, days: i64) {
        let (Some(schedule), Some(day)) = (&self.schedule, self.selected_day) else {
            return;
        };
        let first = schedule.start_date;
        let last = schedule.end_date.max(first);
        let Some(moved) = day.checked_add(Duration::days(days)) else {
            return;
        };
        self.selected_day = Some(moved.clamp(first, last));
        self.reset_agenda();
    }

    /// Index into the assignments of the agenda entry under the cursor.
    fn selected_assignment(&self) -> Option<usize> {
        self.agenda_state
            .selected()
            .and_then(|i| self.agenda().get(i).copied())
    }

    fn bucket_for(&self, assignment: &Assignment) -> Option<&CoverageBucket> {
        self.analysis
            .coverage
            .iter()
            .find(|b| b.key.date == assignment.date && b.key.shift_id == assignment.shift_id)
    }

    fn export(&mut self, format: ExportFormat) {
        let Some(schedule) = &self.schedule else {
            self.notice = Some(Notice::error("Nothing to export"));
            return;
        };
        let today = OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date();
        let project = Some(self.project_name.as_str()).filter(|name| !name.is_empty());

        self.notice = Some(
            match export::export(
                format,
                &self.backend.config.export_dir,
                project,
                &schedule.assignments,
                today,
            ) {
                Ok(path) => Notice::success(format!("Exported {}", path.display())),
                Err(err) => {
                    warn!(error = %err, "export failed");
                    Notice::error(format!("Export failed: {err:#}"))
                }
            },
        );
    }

    fn handle_navigation(&mut self, key: KeyEvent) {
        let agenda_len = self.agenda().len();
        match (self.focus, key.code) {
            (Pane::Calendar, KeyCode::Left) => self.move_day(-1),
            (Pane::Calendar, KeyCode::Right) => self.move_day(1),
            (Pane::Calendar, KeyCode::Up) => self.move_day(-7),
            (Pane::Calendar, KeyCode::Down) => self.move_day(7),
            (Pane::Calendar, KeyCode::Enter) => self.focus = Pane::Agenda,
            (Pane::Agenda, KeyCode::Up) => step(&mut self.agenda_state, agenda_len, -1),
            (Pane::Agenda, KeyCode::Down) => step(&mut self.agenda_state, agenda_len, 1),
            (Pane::Agenda, KeyCode::Enter) => {
                self.show_details = self.selected_assignment().is_some();
            }
            (Pane::Coverage, KeyCode::Up | KeyCode::Down) => {
                let delta = if key.code == KeyCode::Up { -1 } else { 1 };
                let mut selected = self.coverage_state.selected();
                step_index(&mut selected, self.analysis.coverage.len(), delta);
                self.coverage_state.select(selected);
            }
            (Pane::Conflicts, KeyCode::Up) => {
                step(&mut self.conflicts_state, self.analysis.conflicts.len(), -1)
            }
            (Pane::Conflicts, KeyCode::Down) => {
                step(&mut self.conflicts_state, self.analysis.conflicts.len(), 1)
            }
            _ => {}
        }
    }
}

fn step(state: &mut ListState, len: usize, delta: i64) {
    let mut selected = state.selected();
    step_index(&mut selected, len, delta);
    state.select(selected);
}

/// Moves a selection by `delta`, stopping at either end.
fn step_index(selected: &mut Option<usize>, len: usize, delta: i64) {
    if len == 0 {
        *selected = None;
        return;
    }
    let current = selected.unwrap_or(0) as i64;
    *selected = Some((current + delta).clamp(0, len as i64 - 1) as usize);
}

impl Component for ScheduleView {
    fn handle_input(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.show_details {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace) {
                self.show_details = false;
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Esc => return Ok(Some(Action::Back)),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.export(ExportFormat::Csv),
            KeyCode::Char('p') | KeyCode::Char('P') => self.export(ExportFormat::Pdf),
            KeyCode::Char('r') | KeyCode::Char('R') => self.load(),
            _ => self.handle_navigation(key),
        }
        Ok(None)
    }

    fn on_tick(&mut self) {
        components::expire(&mut self.notice);
    }

    fn render(&self, frame: &mut Frame) {
        components::clear_screen(frame);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(1), // Conflict banner
                Constraint::Min(16),   // Panels
                Constraint::Length(1), // Help
                Constraint::Length(1), // Notice
            ])
            .margin(1)
            .split(frame.area());

        let title = match &self.schedule {
            Some(schedule) => format!(
                "Schedule {} · {} · {} to {}",
                schedule.id, self.project_name, schedule.start_date, schedule.end_date
            ),
            None => format!("Schedule {} · {}", self.schedule_id, self.project_name),
        };
        frame.render_widget(
            Paragraph::new(title)
                .style(
                    Style::default()
                        .fg(components::TEXT)
                        .add_modifier(Modifier::BOLD),
                )
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::BOTTOM)
                        .border_style(Style::default().fg(components::BORDER)),
                ),
            layout[0],
        );

        let banner = match conflict_banner(&self.analysis) {
            Some(text) => Paragraph::new(format!("⚠ {text}")).style(
                Style::default()
                    .fg(components::WARNING)
                    .add_modifier(Modifier::BOLD),
            ),
            None => Paragraph::new("No conflicts").style(Style::default().fg(components::SUCCESS)),
        };
        frame.render_widget(banner.alignment(Alignment::Center), layout[1]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .spacing(1)
            .split(layout[2]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(5)])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(8)])
            .split(columns[1]);

        match (&self.schedule, self.selected_day) {
            (Some(schedule), Some(day)) => calendar::render(
                frame,
                left[0],
                schedule,
                &self.analysis,
                day,
                self.focus == Pane::Calendar,
            ),
            _ => frame.render_widget(
                Paragraph::new("Schedule not loaded. Press r to retry.")
                    .style(Style::default().fg(components::MUTED))
                    .block(components::panel("Calendar", self.focus == Pane::Calendar)),
                left[0],
            ),
        }

        self.render_agenda(frame, left[1]);
        coverage::render(
            frame,
            right[0],
            &self.analysis.coverage,
            &self.coverage_state,
            self.focus == Pane::Coverage,
        );
        self.render_conflicts(frame, right[1]);

        frame.render_widget(
            Paragraph::new(
                "Tab: Panel | ←→↑↓: Day | Enter: Details | c: Export CSV | p: Export PDF | r: Reload | Esc: Back",
            )
            .style(Style::default().fg(components::MUTED))
            .alignment(Alignment::Center),
            layout[3],
        );
        components::render_notice(frame, layout[4], self.notice.as_ref());

        if self.show_details {
            self.render_details(frame);
        }
    }
}

impl ScheduleView {
    fn render_agenda(&self, frame: &mut Frame, area: Rect) {
        let title = match self.selected_day {
            Some(day) => format!("Agenda {day}"),
            None => "Agenda".to_string(),
        };
        let block = components::panel(&title, self.focus == Pane::Agenda);

        let assignments = self.assignments();
        let items: Vec<ListItem> = self
            .agenda()
            .into_iter()
            .map(|index| {
                let a = &assignments[index];
                let mut spans = vec![
                    Span::styled("● ", Style::default().fg(components::skill_color(a.agent_skill))),
                    Span::styled(
                        format!("{}-{} ", a.shift_start, a.shift_end),
                        Style::default().fg(components::MUTED),
                    ),
                    Span::styled(
                        format!("{} • {}", a.agent_name, a.role),
                        Style::default().fg(components::TEXT),
                    ),
                ];
                if self.analysis.is_conflicted(index) {
                    spans.push(Span::styled(
                        "  CONFLICT",
                        Style::default()
                            .fg(components::DANGER)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        if items.is_empty() {
            frame.render_widget(
                Paragraph::new("No assignments on this day.")
                    .style(Style::default().fg(components::MUTED))
                    .block(block),
                area,
            );
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(40, 40, 65))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("► ");
        frame.render_stateful_widget(list, area, &mut self.agenda_state.clone());
    }

    fn render_conflicts(&self, frame: &mut Frame, area: Rect) {
        let block = components::panel(
            &format!("Conflicts ({})", self.analysis.conflicts.len()),
            self.focus == Pane::Conflicts,
        );
        let items: Vec<ListItem> = self
            .analysis
            .warnings()
            .into_iter()
            .map(|warning| ListItem::new(warning).style(Style::default().fg(components::DANGER)))
            .collect();

        if items.is_empty() {
            frame.render_widget(
                Paragraph::new("No overlapping shifts.")
                    .style(Style::default().fg(components::MUTED))
                    .block(block),
                area,
            );
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Rgb(40, 40, 65)));
        frame.render_stateful_widget(list, area, &mut self.conflicts_state.clone());
    }

    fn render_details(&self, frame: &mut Frame) {
        let Some(index) = self.selected_assignment() else {
            return;
        };
        let assignment = &self.assignments()[index];
        let lines: Vec<Line> = detail_lines(
            assignment,
            self.bucket_for(assignment),
            self.analysis.is_conflicted(index),
        )
        .into_iter()
        .map(|line| Line::styled(line, Style::default().fg(components::TEXT)))
        .collect();

        let area = components::centered_rect(64, lines.len() as u16 + 4, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines)
                .block(components::panel("Assignment details", true).padding(Padding::new(1, 1, 1, 0)))
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::Skill;
    use crossterm::event::KeyModifiers;
    use time::macros::date;

    const SCHEDULE: &str = r#"{"schedule": {
        "id": 5, "project_id": 7,
        "start_date": "2024-01-01", "end_date": "2024-01-07",
        "generation_metadata": null,
        "assignments": [
            {"date": "2024-01-01", "shift_id": 1, "shift_name": "Day", "shift_start": "08:00",
             "shift_end": "16:00", "shift_crosses_midnight": false, "agent_id": 1,
             "agent_name": "Ana", "agent_skill": "chat", "role": "chat"},
            {"date": "2024-01-01", "shift_id": 2, "shift_name": "Late", "shift_start": "12:00",
             "shift_end": "20:00", "shift_crosses_midnight": false, "agent_id": 1,
             "agent_name": "Ana", "agent_skill": "chat", "role": "chat"},
            {"date": "2024-01-02", "shift_id": 3, "shift_name": "Night", "shift_start": "22:00",
             "shift_end": "06:00", "shift_crosses_midnight": true, "agent_id": 2,
             "agent_name": "Bo", "agent_skill": null, "role": "email"}
        ]}}"#;

    fn press(view: &mut ScheduleView, code: KeyCode) -> Option<Action> {
        view.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn loaded_view(server: &mut mockito::Server, export_dir: &std::path::Path) -> ScheduleView {
        let backend = Backend::new(Config {
            api_base: server.url(),
            export_dir: export_dir.to_path_buf(),
            ..Config::default()
        })
        .unwrap();
        let mut view = ScheduleView::new(
            backend,
            5,
            "Support".to_string(),
            vec![PerShiftRequirement {
                shift_id: 1,
                chat_min: 2,
                email_min: 0,
                total: None,
            }],
        );
        view.load();
        view
    }

    #[test]
    fn load_runs_analysis_with_fallback_targets() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/schedules/5").with_body(SCHEDULE).create();
        let dir = tempfile::tempdir().unwrap();

        let view = loaded_view(&mut server, dir.path());

        assert_eq!(view.analysis.conflicts.len(), 1);
        assert_eq!(
            conflict_banner(&view.analysis).as_deref(),
            Some("1 conflict(s) detected. See details to resolve.")
        );
        assert_eq!(view.analysis.coverage.len(), 3);
        assert_eq!(
            view.analysis.coverage[0].required.and_then(|r| r.chat),
            Some(2)
        );
        assert_eq!(view.analysis.coverage[1].required, None);
        assert_eq!(view.selected_day, Some(date!(2024 - 01 - 01)));
        assert_eq!(view.agenda(), vec![0, 1]);
    }

    #[test]
    fn day_navigation_stays_in_range() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/schedules/5").with_body(SCHEDULE).create();
        let dir = tempfile::tempdir().unwrap();
        let mut view = loaded_view(&mut server, dir.path());

        press(&mut view, KeyCode::Left);
        assert_eq!(view.selected_day, Some(date!(2024 - 01 - 01)));
        press(&mut view, KeyCode::Right);
        assert_eq!(view.selected_day, Some(date!(2024 - 01 - 02)));
        assert_eq!(view.agenda(), vec![2]);
        press(&mut view, KeyCode::Down);
        assert_eq!(view.selected_day, Some(date!(2024 - 01 - 07)));
    }

    #[test]
    fn details_dialog_opens_from_agenda() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/schedules/5").with_body(SCHEDULE).create();
        let dir = tempfile::tempdir().unwrap();
        let mut view = loaded_view(&mut server, dir.path());

        press(&mut view, KeyCode::Right);
        press(&mut view, KeyCode::Enter);
        assert_eq!(view.focus, Pane::Agenda);
        press(&mut view, KeyCode::Enter);
        assert!(view.show_details);
        assert_eq!(view.selected_assignment(), Some(2));

        assert_eq!(press(&mut view, KeyCode::Esc), None);
        assert!(!view.show_details);
        assert_eq!(press(&mut view, KeyCode::Esc), Some(Action::Back));
    }

    #[test]
    fn exports_csv_into_export_dir() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/schedules/5").with_body(SCHEDULE).create();
        let dir = tempfile::tempdir().unwrap();
        let mut view = loaded_view(&mut server, dir.path());

        press(&mut view, KeyCode::Char('c'));

        let notice = view.notice.as_ref().map(|n| n.text.clone()).unwrap_or_default();
        assert!(notice.starts_with("Exported "), "{notice}");
        let written: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn failed_load_leaves_nothing_to_export() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/schedules/5")
            .with_status(404)
            .with_body(r#"{"detail": "Schedule not found"}"#)
            .create();
        let dir = tempfile::tempdir().unwrap();
        let mut view = loaded_view(&mut server, dir.path());

        assert_eq!(
            view.notice.as_ref().map(|n| n.text.as_str()),
            Some("Failed to load schedule: Schedule not found")
        );
        press(&mut view, KeyCode::Char('p'));
        assert_eq!(
            view.notice.as_ref().map(|n| n.text.as_str()),
            Some("Nothing to export")
        );
    }

    #[test]
    fn detail_lines_mark_overnight_shifts() {
        let assignment = Assignment {
            date: date!(2024 - 01 - 02),
            shift_id: 3,
            shift_name: "Night".to_string(),
            shift_start: "22:00".to_string(),
            shift_end: "06:00".to_string(),
            crosses_midnight: true,
            agent_id: 2,
            agent_name: "Bo".to_string(),
            agent_skill: Skill::Unknown,
            role: "email".to_string(),
        };

        let lines = detail_lines(&assignment, None, true);
        assert_eq!(lines[0], "Agent: Bo (#2)");
        assert_eq!(lines[1], "Skill: unknown");
        assert_eq!(lines[3], "Shift: Night 22:00 -> 06:00 (crosses midnight)");
        assert_eq!(lines.last().map(String::as_str), Some("Overlaps another shift of this agent"));
    }
}
