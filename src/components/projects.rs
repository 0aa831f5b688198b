//! Project list: the console's entry screen.
//!
//! Lists the projects the backend knows about, with a search filter, and lets
//! the user open a project either from the table or by typing its ID.

use crate::app::{Action, Backend};
use crate::components::{self, Component, Notice};
use crate::models::Project;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use tracing::{info, warn};

pub struct ProjectsView {
    backend: Backend,
    projects: Vec<Project>,
    /// Projects matching the current search text.
    filtered: Vec<Project>,
    search_input: String,
    is_searching: bool,
    state: TableState,
    /// Text typed into the "open by ID" dialog, while it is open.
    id_input: Option<String>,
    show_quit_dialog: bool,
    quit_dialog_selected: usize,
    notice: Option<Notice>,
    loaded: bool,
}

impl ProjectsView {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            projects: Vec::new(),
            filtered: Vec::new(),
            search_input: String::new(),
            is_searching: false,
            state: TableState::default(),
            id_input: None,
            show_quit_dialog: false,
            quit_dialog_selected: 1,
            notice: None,
            loaded: false,
        }
    }

    /// Reloads the project list from the backend.
    pub fn refresh(&mut self) {
        let client = self.backend.client.clone();
        match self.backend.block_on(client.list_projects()) {
            Ok(projects) => {
                info!(count = projects.len(), "loaded projects");
                self.projects = projects;
                self.loaded = true;
                self.apply_filter();
            }
            Err(err) => {
                warn!(error = %err, "cannot load projects");
                self.notice = Some(Notice::error(format!(
                    "Failed to load projects: {}",
                    err.detail()
                )));
            }
        }
    }

    fn apply_filter(&mut self) {
        let needle = self.search_input.trim().to_lowercase();
        self.filtered = self
            .projects
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.id.to_string().contains(&needle)
            })
            .cloned()
            .collect();

        if self.filtered.is_empty() {
            self.state.select(None);
        } else {
            let selected = self.state.selected().unwrap_or(0);
            self.state.select(Some(selected.min(self.filtered.len() - 1)));
        }
    }

    fn select_next(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        let next = match self.state.selected() {
            Some(i) if i + 1 < self.filtered.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(next));
    }

    fn select_previous(&mut self) {
        if self.filtered.is_empty() {
            return;
        }
        let previous = match self.state.selected() {
            Some(0) | None => self.filtered.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(previous));
    }

    fn selected_project(&self) -> Option<&Project> {
        self.state.selected().and_then(|i| self.filtered.get(i))
    }

    fn handle_id_input(&mut self, key: KeyEvent) -> Option<Action> {
        let input = self.id_input.as_mut()?;
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => input.push(c),
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Enter => match input.trim().parse::<i64>() {
                Ok(id) => {
                    self.id_input = None;
                    let project = self
                        .projects
                        .iter()
                        .find(|p| p.id == id)
                        .cloned()
                        .unwrap_or_else(|| Project::placeholder(id));
                    return Some(Action::OpenProject(project));
                }
                Err(_) => {
                    self.notice = Some(Notice::error("Enter a numeric project ID"));
                }
            },
            KeyCode::Esc => self.id_input = None,
            _ => {}
        }
        None
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => {
                self.search_input.push(c);
                self.apply_filter();
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                self.apply_filter();
            }
            KeyCode::Enter | KeyCode::Down | KeyCode::Tab => self.is_searching = false,
            KeyCode::Esc => {
                self.is_searching = false;
                self.search_input.clear();
                self.apply_filter();
            }
            _ => {}
        }
    }

    fn handle_quit_dialog_input(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Left | KeyCode::Right => {
                self.quit_dialog_selected = 1 - self.quit_dialog_selected;
            }
            KeyCode::Enter => {
                self.show_quit_dialog = false;
                if self.quit_dialog_selected == 0 {
                    return Some(Action::Quit);
                }
            }
            KeyCode::Esc => self.show_quit_dialog = false,
            _ => {}
        }
        None
    }
}

impl Component for ProjectsView {
    fn handle_input(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.show_quit_dialog {
            return Ok(self.handle_quit_dialog_input(key));
        }
        if self.id_input.is_some() {
            return Ok(self.handle_id_input(key));
        }
        if self.is_searching {
            self.handle_search_input(key);
            return Ok(None);
        }

        match key.code {
            KeyCode::Down => self.select_next(),
            KeyCode::Up => self.select_previous(),
            KeyCode::Enter => {
                if let Some(project) = self.selected_project() {
                    return Ok(Some(Action::OpenProject(project.clone())));
                }
            }
            KeyCode::Char('/') => self.is_searching = true,
            KeyCode::Char('o') | KeyCode::Char('O') => self.id_input = Some(String::new()),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh(),
            KeyCode::Char('q') | KeyCode::Esc => {
                self.show_quit_dialog = true;
                self.quit_dialog_selected = 1;
            }
            _ => {}
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
                Constraint::Length(3), // Search
                Constraint::Min(8),    // Table
                Constraint::Length(1), // Help
                Constraint::Length(1), // Notice
            ])
            .margin(1)
            .split(frame.area());

        let header = Paragraph::new(format!(
            "SHIFTDESK  ·  {}",
            self.backend.client.base_url()
        ))
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
        );
        frame.render_widget(header, layout[0]);

        let search_text = if self.search_input.is_empty() && !self.is_searching {
            "Press / to search by name or ID".to_string()
        } else {
            self.search_input.clone()
        };
        let search = Paragraph::new(search_text)
            .style(Style::default().fg(if self.is_searching {
                components::TEXT
            } else {
                components::MUTED
            }))
            .block(components::panel("Search", self.is_searching));
        frame.render_widget(search, layout[1]);

        let block = components::panel("Projects", !self.is_searching);
        if self.filtered.is_empty() {
            let empty = if self.loaded && self.projects.is_empty() {
                "No projects returned by backend."
            } else if self.loaded {
                "No projects match the search."
            } else {
                "Projects not loaded. Press r to retry."
            };
            frame.render_widget(
                Paragraph::new(empty)
                    .style(Style::default().fg(components::MUTED))
                    .alignment(Alignment::Center)
                    .block(block),
                layout[2],
            );
        } else {
            let header = Row::new(["ID", "Name"].map(|h| {
                Cell::from(h).style(Style::default().fg(components::TEXT))
            }))
            .style(Style::default().bg(Color::Rgb(26, 26, 36)))
            .bottom_margin(1);

            let rows = self.filtered.iter().map(|project| {
                Row::new(vec![
                    Cell::from(project.id.to_string()),
                    Cell::from(project.name.clone()),
                ])
            });

            let table = Table::new(rows, [Constraint::Length(8), Constraint::Min(20)])
                .header(header)
                .block(block)
                .row_highlight_style(
                    Style::default()
                        .bg(Color::Rgb(40, 40, 65))
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("► ");
            frame.render_stateful_widget(table, layout[2], &mut self.state.clone());
        }

        let help = Paragraph::new(
            "↑↓: Navigate | Enter: Open | /: Search | o: Open by ID | r: Refresh | q: Quit",
        )
        .style(Style::default().fg(components::MUTED))
        .alignment(Alignment::Center);
        frame.render_widget(help, layout[3]);

        components::render_notice(frame, layout[4], self.notice.as_ref());

        if let Some(input) = &self.id_input {
            let area = components::centered_rect(40, 5, frame.area());
            frame.render_widget(Clear, area);
            let dialog = Paragraph::new(format!("{input}█"))
                .style(Style::default().fg(components::TEXT))
                .block(components::panel("Open project by ID", true));
            frame.render_widget(dialog, area);
        }

        if self.show_quit_dialog {
            components::render_confirm_dialog(
                frame,
                "Quit",
                "Are you sure you want to quit?",
                self.quit_dialog_selected,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crossterm::event::KeyModifiers;

    fn press(view: &mut ProjectsView, code: KeyCode) -> Option<Action> {
        view.handle_input(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    fn type_text(view: &mut ProjectsView, text: &str) {
        for c in text.chars() {
            press(view, KeyCode::Char(c));
        }
    }

    fn view_for(server: &mockito::Server) -> ProjectsView {
        let backend = Backend::new(Config {
            api_base: server.url(),
            ..Config::default()
        })
        .unwrap();
        ProjectsView::new(backend)
    }

    #[test]
    fn search_filters_by_name_and_opens_selection() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/projects")
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "name": "Support EU"}, {"id": 2, "name": "Sales"}]"#)
            .create();

        let mut view = view_for(&server);
        view.refresh();
        assert_eq!(view.filtered.len(), 2);

        press(&mut view, KeyCode::Char('/'));
        type_text(&mut view, "sal");
        press(&mut view, KeyCode::Enter);

        assert_eq!(
            press(&mut view, KeyCode::Enter),
            Some(Action::OpenProject(Project {
                id: 2,
                name: "Sales".into()
            }))
        );
    }

    #[test]
    fn opens_unknown_project_by_id() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/projects")
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create();

        let mut view = view_for(&server);
        view.refresh();
        assert!(view.loaded);
        assert!(view.projects.is_empty());

        press(&mut view, KeyCode::Char('o'));
        type_text(&mut view, "4x2");
        assert_eq!(
            press(&mut view, KeyCode::Enter),
            Some(Action::OpenProject(Project::placeholder(42)))
        );
        assert!(view.id_input.is_none());
    }

    #[test]
    fn failed_load_shows_notice() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/projects")
            .with_status(503)
            .with_body(r#"{"detail": "database unavailable"}"#)
            .create();

        let mut view = view_for(&server);
        view.refresh();

        assert!(!view.loaded);
        let notice = view.notice.as_ref().map(|n| n.text.as_str());
        assert_eq!(notice, Some("Failed to load projects: database unavailable"));
    }

    #[test]
    fn quit_requires_confirmation() {
        let server = mockito::Server::new();
        let mut view = view_for(&server);

        assert_eq!(press(&mut view, KeyCode::Char('q')), None);
        assert!(view.show_quit_dialog);
        press(&mut view, KeyCode::Left);
        assert_eq!(press(&mut view, KeyCode::Enter), Some(Action::Quit));
    }
}
