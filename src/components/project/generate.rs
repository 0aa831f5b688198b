//! Schedule generation form: per-shift staffing targets and a start date.

use crate::components;
use crate::models::{GenerateScheduleRequest, PerShiftRequirement, Shift};
use crate::tui::Frame;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::*};
use time::macros::format_description;
use time::Date;

/// Largest target the form accepts for a single field.
const MAX_TARGET: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Chat,
    Email,
    Total,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Chat => Field::Email,
            Field::Email => Field::Total,
            Field::Total => Field::Chat,
        }
    }

    fn previous(self) -> Self {
        match self {
            Field::Chat => Field::Total,
            Field::Email => Field::Chat,
            Field::Total => Field::Email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementRow {
    pub shift: Shift,
    pub chat_min: u32,
    pub email_min: u32,
    /// `None` leaves the total to the solver.
    pub total: Option<u32>,
}

impl RequirementRow {
    fn for_shift(shift: Shift) -> Self {
        let defaults = PerShiftRequirement::for_shift(shift.id);
        Self {
            shift,
            chat_min: defaults.chat_min,
            email_min: defaults.email_min,
            total: defaults.total,
        }
    }

    fn requirement(&self) -> PerShiftRequirement {
        PerShiftRequirement {
            shift_id: self.shift.id,
            chat_min: self.chat_min,
            email_min: self.email_min,
            total: self.total,
        }
    }
}

#[derive(Debug)]
pub struct GenerateForm {
    rows: Vec<RequirementRow>,
    /// Row under the cursor; `rows.len()` is the start date line.
    selected: usize,
    field: Field,
    start_date: String,
}

impl GenerateForm {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            selected: 0,
            field: Field::Chat,
            start_date: String::new(),
        }
    }

    /// Replaces the shift list, keeping targets already entered for shifts
    /// that are still present.
    pub fn set_shifts(&mut self, shifts: Vec<Shift>) {
        let previous = std::mem::take(&mut self.rows);
        self.rows = shifts
            .into_iter()
            .map(|shift| {
                match previous.iter().find(|row| row.shift.id == shift.id) {
                    Some(row) => RequirementRow {
                        shift,
                        ..row.clone()
                    },
                    None => RequirementRow::for_shift(shift),
                }
            })
            .collect();
        self.selected = self.selected.min(self.rows.len());
    }

    pub fn rows(&self) -> &[RequirementRow] {
        &self.rows
    }

    fn on_date_line(&self) -> bool {
        self.selected == self.rows.len()
    }

    /// Edits the form. Returns `true` when the user asked to submit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => return true,
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => self.selected = (self.selected + 1).min(self.rows.len()),
            KeyCode::Left => self.field = self.field.previous(),
            KeyCode::Right => self.field = self.field.next(),
            KeyCode::Char(c) if self.on_date_line() => {
                if (c.is_ascii_digit() || c == '-') && self.start_date.len() < 10 {
                    self.start_date.push(c);
                }
            }
            KeyCode::Backspace if self.on_date_line() => {
                self.start_date.pop();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust(1),
            KeyCode::Char('-') => self.adjust(-1),
            KeyCode::Char(c) => {
                if let Some(digit) = c.to_digit(10) {
                    self.push_digit(digit);
                }
            }
            KeyCode::Backspace => self.pop_digit(),
            KeyCode::Delete => self.clear_field(),
            _ => {}
        }
        false
    }

    fn selected_row(&mut self) -> Option<&mut RequirementRow> {
        self.rows.get_mut(self.selected)
    }

    fn adjust(&mut self, delta: i64) {
        let field = self.field;
        let Some(row) = self.selected_row() else {
            return;
        };
        let clamp = |value: u32| (i64::from(value) + delta).clamp(0, i64::from(MAX_TARGET)) as u32;
        match field {
            Field::Chat => row.chat_min = clamp(row.chat_min),
            Field::Email => row.email_min = clamp(row.email_min),
            Field::Total => row.total = Some(clamp(row.total.unwrap_or(0))),
        }
    }

    fn push_digit(&mut self, digit: u32) {
        let field = self.field;
        let Some(row) = self.selected_row() else {
            return;
        };
        let append = |value: u32| (value * 10 + digit).min(MAX_TARGET);
        match field {
            Field::Chat => row.chat_min = append(row.chat_min),
            Field::Email => row.email_min = append(row.email_min),
            Field::Total => row.total = Some(append(row.total.unwrap_or(0))),
        }
    }

    fn pop_digit(&mut self) {
        let field = self.field;
        let Some(row) = self.selected_row() else {
            return;
        };
        match field {
            Field::Chat => row.chat_min /= 10,
            Field::Email => row.email_min /= 10,
            Field::Total => row.total = row.total.filter(|v| *v >= 10).map(|v| v / 10),
        }
    }

    fn clear_field(&mut self) {
        let field = self.field;
        let Some(row) = self.selected_row() else {
            return;
        };
        match field {
            Field::Chat => row.chat_min = 0,
            Field::Email => row.email_min = 0,
            Field::Total => row.total = None,
        }
    }

    pub fn requirements(&self) -> Vec<PerShiftRequirement> {
        self.rows.iter().map(RequirementRow::requirement).collect()
    }

    /// Validates the form into a request body, or the message to show.
    pub fn build_request(&self) -> Result<GenerateScheduleRequest, String> {
        let raw = self.start_date.trim();
        if raw.is_empty() {
            return Err("Enter start date in YYYY-MM-DD".to_string());
        }
        let start_date = Date::parse(raw, format_description!("[year]-[month]-[day]"))
            .map_err(|_| format!("Invalid start date {raw}; use YYYY-MM-DD"))?;

        Ok(GenerateScheduleRequest::new(start_date, self.requirements()))
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = components::panel("Generate schedule", focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3), Constraint::Length(1)])
            .split(inner);

        if self.rows.is_empty() {
            frame.render_widget(
                Paragraph::new("This project has no shifts.")
                    .style(Style::default().fg(components::MUTED)),
                rows[0],
            );
        } else {
            let header = Row::new(["Shift", "Chat min", "Email min", "Total"].map(|h| {
                Cell::from(h).style(Style::default().fg(components::TEXT))
            }))
            .style(Style::default().bg(Color::Rgb(26, 26, 36)));

            let body = self.rows.iter().enumerate().map(|(index, row)| {
                let cell = |field: Field, text: String| {
                    let active = focused && index == self.selected && self.field == field;
                    let style = if active {
                        Style::default()
                            .fg(Color::Black)
                            .bg(components::FOCUSED)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Rgb(200, 200, 220))
                    };
                    Cell::from(text).style(style)
                };
                Row::new(vec![
                    Cell::from(row.shift.name.clone()),
                    cell(Field::Chat, row.chat_min.to_string()),
                    cell(Field::Email, row.email_min.to_string()),
                    cell(
                        Field::Total,
                        row.total.map_or_else(|| "auto".to_string(), |t| t.to_string()),
                    ),
                ])
            });

            let table = Table::new(
                body,
                [
                    Constraint::Min(12),
                    Constraint::Length(10),
                    Constraint::Length(10),
                    Constraint::Length(8),
                ],
            )
            .header(header);
            frame.render_widget(table, rows[0]);
        }

        let date_focused = focused && self.on_date_line();
        let date_text = if self.start_date.is_empty() && !date_focused {
            Span::styled("YYYY-MM-DD", Style::default().fg(components::MUTED))
        } else {
            Span::styled(
                format!("{}{}", self.start_date, if date_focused { "█" } else { "" }),
                Style::default().fg(components::TEXT),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(date_text)).block(
                Block::default()
                    .title(format!(
                        " Start date · {} days · solver {}s ",
                        GenerateScheduleRequest::DEFAULT_HORIZON_DAYS,
                        GenerateScheduleRequest::DEFAULT_SOLVER_TIME_LIMIT
                    ))
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(if date_focused {
                        components::FOCUSED
                    } else {
                        components::BORDER
                    })),
            ),
            rows[1],
        );

        frame.render_widget(
            Paragraph::new("←→: Field | 0-9 +/-: Edit | Del: Reset | Enter: Start generation")
                .style(Style::default().fg(components::MUTED)),
            rows[2],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use time::macros::date;

    fn shift(id: i64, name: &str) -> Shift {
        Shift {
            id,
            name: name.to_string(),
            start_time: "08:00".to_string(),
            end_time: "16:00".to_string(),
            crosses_midnight: false,
        }
    }

    fn press(form: &mut GenerateForm, code: KeyCode) -> bool {
        form.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn form() -> GenerateForm {
        let mut form = GenerateForm::new();
        form.set_shifts(vec![shift(1, "Day"), shift(2, "Night")]);
        form
    }

    #[test]
    fn new_rows_start_at_zero() {
        assert_eq!(
            form().requirements(),
            vec![
                PerShiftRequirement::for_shift(1),
                PerShiftRequirement::for_shift(2)
            ]
        );
    }

    #[test]
    fn decrement_clamps_at_zero() {
        let mut form = form();
        press(&mut form, KeyCode::Char('-'));
        press(&mut form, KeyCode::Char('+'));
        press(&mut form, KeyCode::Char('+'));
        press(&mut form, KeyCode::Char('-'));
        press(&mut form, KeyCode::Char('-'));
        press(&mut form, KeyCode::Char('-'));

        assert_eq!(form.rows()[0].chat_min, 0);
    }

    #[test]
    fn digits_edit_the_selected_field() {
        let mut form = form();
        press(&mut form, KeyCode::Down);
        press(&mut form, KeyCode::Right);
        press(&mut form, KeyCode::Char('1'));
        press(&mut form, KeyCode::Char('2'));
        press(&mut form, KeyCode::Right);
        press(&mut form, KeyCode::Char('7'));

        let night = &form.rows()[1];
        assert_eq!((night.chat_min, night.email_min, night.total), (0, 12, Some(7)));

        press(&mut form, KeyCode::Backspace);
        assert_eq!(form.rows()[1].total, None);
        press(&mut form, KeyCode::Left);
        press(&mut form, KeyCode::Backspace);
        assert_eq!(form.rows()[1].email_min, 1);
    }

    #[test]
    fn targets_survive_shift_reload() {
        let mut form = form();
        press(&mut form, KeyCode::Char('3'));
        form.set_shifts(vec![shift(3, "Late"), shift(1, "Day (renamed)")]);

        assert_eq!(form.rows()[0].chat_min, 0);
        assert_eq!(form.rows()[1].chat_min, 3);
        assert_eq!(form.rows()[1].shift.name, "Day (renamed)");
    }

    #[test]
    fn start_date_is_required_and_validated() {
        let mut form = form();
        assert_eq!(
            form.build_request().unwrap_err(),
            "Enter start date in YYYY-MM-DD"
        );

        press(&mut form, KeyCode::Down);
        press(&mut form, KeyCode::Down);
        for c in "2024-13-01".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        assert!(form.build_request().unwrap_err().starts_with("Invalid start date"));

        for _ in 0..5 {
            press(&mut form, KeyCode::Backspace);
        }
        for c in "02-29".chars() {
            press(&mut form, KeyCode::Char(c));
        }
        let request = form.build_request().unwrap();
        assert_eq!(request.start_date, date!(2024 - 02 - 29));
        assert_eq!(request.horizon_days, 14);
        assert_eq!(request.solver_time_limit, 120);
        assert_eq!(request.per_shift_requirements.len(), 2);
    }

    #[test]
    fn enter_submits() {
        let mut form = form();
        assert!(press(&mut form, KeyCode::Enter));
        assert!(!press(&mut form, KeyCode::Up));
    }
}
