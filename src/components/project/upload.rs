//! Roster upload panel: a CSV path input with a local preview.

use crate::components;
use crate::models::Skill;
use crate::roster::{self, RosterPreview, ROSTER_COLUMNS};
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct UploadPanel {
    path: String,
    preview: Option<RosterPreview>,
}

impl UploadPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edits the path. Returns `true` when the user asked to upload.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => return true,
            KeyCode::Char(c) => {
                self.path.push(c);
                self.preview = None;
            }
            KeyCode::Backspace => {
                self.path.pop();
                self.preview = None;
            }
            KeyCode::Delete => {
                self.path.clear();
                self.preview = None;
            }
            _ => {}
        }
        false
    }

    /// The chosen file, if any path has been typed.
    pub fn path(&self) -> Option<PathBuf> {
        let path = self.path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Reads the chosen file and keeps its summary for display.
    pub fn load_preview(&mut self) -> Result<&RosterPreview> {
        self.preview = None;
        let path = self
            .path()
            .ok_or_else(|| anyhow::anyhow!("no roster file chosen"))?;
        let preview = roster::preview_file(&path)?;
        Ok(self.preview.insert(preview))
    }

    pub fn preview(&self) -> Option<&RosterPreview> {
        self.preview.as_ref()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = components::panel("Agent CSV Upload", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(inner);

        frame.render_widget(
            Paragraph::new(format!("Columns: {ROSTER_COLUMNS}"))
                .style(Style::default().fg(components::MUTED))
                .wrap(Wrap { trim: true }),
            rows[0],
        );

        let cursor = if focused { "█" } else { "" };
        let input = if self.path.is_empty() && !focused {
            Span::styled("path/to/roster.csv", Style::default().fg(components::MUTED))
        } else {
            Span::styled(
                format!("{}{cursor}", self.path),
                Style::default().fg(components::TEXT),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(input)).block(
                Block::default()
                    .title(" File ")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(components::BORDER)),
            ),
            rows[1],
        );

        let summary = match &self.preview {
            Some(preview) => preview_lines(preview),
            None => vec![Line::styled(
                "Enter: preview and upload",
                Style::default().fg(components::MUTED),
            )],
        };
        frame.render_widget(Paragraph::new(summary), rows[2]);
    }
}

fn preview_lines(preview: &RosterPreview) -> Vec<Line<'static>> {
    let count = |label: &str, n: usize, color: Color| {
        vec![
            Span::styled(format!("{label} "), Style::default().fg(color)),
            Span::styled(n.to_string(), Style::default().fg(components::TEXT)),
            Span::raw("  "),
        ]
    };

    let mut channels = Vec::new();
    for (label, n, skill) in [
        ("chat", preview.chat, Skill::Chat),
        ("email", preview.email, Skill::Email),
        ("both", preview.both, Skill::Both),
    ] {
        channels.extend(count(label, n, components::skill_color(skill)));
    }

    let mut lines = vec![
        Line::styled(
            format!("{} agents in file", preview.rows),
            Style::default().fg(components::TEXT).add_modifier(Modifier::BOLD),
        ),
        Line::from(channels),
        Line::styled(
            format!(
                "{} with fixed days off, {} with fixed shifts",
                preview.fixed_off, preview.fixed_shift
            ),
            Style::default().fg(components::MUTED),
        ),
    ];
    if preview.missing_name > 0 {
        lines.push(Line::styled(
            format!("{} row(s) without a name will be rejected", preview.missing_name),
            Style::default().fg(components::WARNING),
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use std::io::Write;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_builds_path_and_enter_submits() {
        let mut panel = UploadPanel::new();
        assert!(panel.path().is_none());

        for c in " a.csv ".chars() {
            assert!(!panel.handle_key(key(KeyCode::Char(c))));
        }
        assert_eq!(panel.path(), Some(PathBuf::from("a.csv")));
        assert!(panel.handle_key(key(KeyCode::Enter)));

        panel.handle_key(key(KeyCode::Delete));
        assert!(panel.path().is_none());
    }

    #[test]
    fn previews_chosen_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,channel_skill\nAna,chat\n,email").unwrap();

        let mut panel = UploadPanel::new();
        for c in file.path().display().to_string().chars() {
            panel.handle_key(key(KeyCode::Char(c)));
        }

        let preview = panel.load_preview().unwrap();
        assert_eq!(preview.rows, 2);
        assert_eq!(preview.missing_name, 1);
        assert!(panel.preview().is_some());

        panel.handle_key(key(KeyCode::Backspace));
        assert!(panel.preview().is_none());
    }
}
