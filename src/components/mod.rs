use crate::analysis::CoverageStatus;
use crate::app::Action;
use crate::models::Skill;
use crate::tui::Frame;
use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use std::time::{Duration, Instant};

pub mod project;
pub mod projects;
pub mod schedule;

pub trait Component {
    fn handle_input(&mut self, event: KeyEvent) -> Result<Option<Action>>;
    fn render(&self, frame: &mut Frame);
    /// Called once per tick while the component is on screen.
    fn on_tick(&mut self) {}
}

pub const BACKGROUND: Color = Color::Rgb(16, 16, 28);
pub const PANEL: Color = Color::Rgb(22, 22, 35);
pub const BORDER: Color = Color::Rgb(75, 75, 120);
pub const FOCUSED: Color = Color::Rgb(250, 250, 110);
pub const TEXT: Color = Color::Rgb(230, 230, 250);
pub const MUTED: Color = Color::Rgb(140, 140, 170);
pub const SUCCESS: Color = Color::Rgb(140, 219, 140);
pub const DANGER: Color = Color::Rgb(255, 100, 100);
pub const WARNING: Color = Color::Rgb(250, 200, 80);

/// How long a notice stays on screen.
const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Display colour of a channel skill.
pub fn skill_color(skill: Skill) -> Color {
    match skill {
        Skill::Chat => Color::Rgb(99, 102, 241),
        Skill::Email => Color::Rgb(249, 115, 22),
        Skill::Both => Color::Rgb(168, 85, 247),
        Skill::Unknown => Color::Rgb(156, 163, 175),
    }
}

pub fn status_color(status: CoverageStatus) -> Color {
    match status {
        CoverageStatus::Met => SUCCESS,
        CoverageStatus::Near => WARNING,
        CoverageStatus::Short => DANGER,
        CoverageStatus::Unknown => MUTED,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

/// A transient message shown at the bottom of a screen.
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    shown_at: Instant,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Error,
            shown_at: Instant::now(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoticeKind::Success,
            shown_at: Instant::now(),
        }
    }

    pub fn expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTICE_TTL
    }

    pub fn style(&self) -> Style {
        let color = match self.kind {
            NoticeKind::Error => DANGER,
            NoticeKind::Success => SUCCESS,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }
}

/// Drops `notice` once it has been shown long enough.
pub fn expire(notice: &mut Option<Notice>) {
    if notice.as_ref().is_some_and(Notice::expired) {
        *notice = None;
    }
}

pub fn render_notice(frame: &mut Frame, area: Rect, notice: Option<&Notice>) {
    if let Some(notice) = notice {
        let paragraph = Paragraph::new(notice.text.as_str())
            .style(notice.style())
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }
}

/// A rounded panel whose border lights up when it has focus.
pub fn panel(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { FOCUSED } else { BORDER }))
        .style(Style::default().bg(PANEL))
}

/// A `width` x `height` rectangle centered in `area`.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Paints the screen background.
pub fn clear_screen(frame: &mut Frame) {
    frame.render_widget(
        Block::default().style(Style::default().bg(BACKGROUND)),
        frame.area(),
    );
}

/// A Yes/No confirmation dialog. `selected` is 0 for Yes, 1 for No.
pub fn render_confirm_dialog(frame: &mut Frame, title: &str, message: &str, selected: usize) {
    let area = centered_rect(44, 8, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {title} "))
        .title_style(Style::default().fg(TEXT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(140, 140, 200)))
        .style(Style::default().bg(Color::Rgb(30, 30, 46)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(2), Constraint::Length(2)])
        .split(inner);

    frame.render_widget(
        Paragraph::new(message)
            .style(Style::default().fg(Color::Rgb(220, 220, 240)))
            .add_modifier(Modifier::BOLD)
            .alignment(Alignment::Center),
        rows[0],
    );

    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    for (index, (label, color)) in [("Yes", SUCCESS), ("No", DANGER)].into_iter().enumerate() {
        let (text, style) = if selected == index {
            (
                format!("► {label} ◄"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )
        } else {
            (
                format!("  {label}  "),
                Style::default().fg(Color::Rgb(180, 180, 200)),
            )
        };
        frame.render_widget(
            Paragraph::new(text).style(style).alignment(Alignment::Center),
            buttons[index],
        );
    }
}
