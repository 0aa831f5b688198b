//! Month calendar of a schedule, and the agenda of one day.

use crate::analysis::ScheduleAnalysis;
use crate::components;
use crate::models::{Assignment, Schedule, Skill};
use crate::tui::Frame;
use ratatui::prelude::*;
use ratatui::widgets::calendar::{CalendarEventStore, Monthly};
use ratatui::widgets::Paragraph;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use time::Date;

/// The most common skill among a day's assignments.
///
/// Ties go to the skill listed first in [`Skill`].
pub fn dominant_skill(assignments: &[Assignment], day: Date) -> Option<Skill> {
    let mut counts: BTreeMap<Skill, usize> = BTreeMap::new();
    for assignment in assignments.iter().filter(|a| a.date == day) {
        *counts.entry(assignment.agent_skill).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(skill, count)| (*count, Reverse(*skill)))
        .map(|(skill, _)| skill)
}

/// Dates holding at least one assignment involved in a conflict.
pub fn conflicted_days(assignments: &[Assignment], analysis: &ScheduleAnalysis) -> BTreeSet<Date> {
    analysis
        .conflicted
        .iter()
        .filter_map(|&index| assignments.get(index))
        .map(|a| a.date)
        .collect()
}

/// Indices of a day's assignments, by shift start then agent name.
pub fn agenda_for(assignments: &[Assignment], day: Date) -> Vec<usize> {
    let mut indices: Vec<usize> = assignments
        .iter()
        .enumerate()
        .filter(|(_, a)| a.date == day)
        .map(|(index, _)| index)
        .collect();
    indices.sort_by(|&a, &b| {
        let (a, b) = (&assignments[a], &assignments[b]);
        (&a.shift_start, &a.agent_name).cmp(&(&b.shift_start, &b.agent_name))
    });
    indices
}

fn day_styles(schedule: &Schedule, analysis: &ScheduleAnalysis, selected: Date) -> CalendarEventStore {
    let conflicted = conflicted_days(&schedule.assignments, analysis);
    let days: BTreeSet<Date> = schedule.assignments.iter().map(|a| a.date).collect();

    let mut store = CalendarEventStore::default();
    for day in days {
        let style = if conflicted.contains(&day) {
            Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(170, 40, 40))
                .add_modifier(Modifier::BOLD)
        } else {
            let skill = dominant_skill(&schedule.assignments, day).unwrap_or_default();
            Style::default()
                .fg(components::skill_color(skill))
                .add_modifier(Modifier::BOLD)
        };
        store.add(day, style);
    }

    let selected_style = Style::default()
        .fg(Color::Black)
        .bg(components::FOCUSED)
        .add_modifier(Modifier::BOLD);
    store.add(selected, selected_style);
    store
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    schedule: &Schedule,
    analysis: &ScheduleAnalysis,
    selected: Date,
    focused: bool,
) {
    let block = components::panel(
        &format!("Calendar {} to {}", schedule.start_date, schedule.end_date),
        focused,
    );
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .spacing(2)
        .split(inner);

    let calendar = Monthly::new(selected, day_styles(schedule, analysis, selected))
        .show_month_header(
            Style::default()
                .fg(components::TEXT)
                .add_modifier(Modifier::BOLD),
        )
        .show_weekdays_header(Style::default().fg(components::MUTED))
        .default_style(Style::default().fg(Color::Rgb(90, 90, 120)));
    frame.render_widget(calendar, columns[0]);

    let mut legend: Vec<Line> = [Skill::Chat, Skill::Email, Skill::Both, Skill::Unknown]
        .into_iter()
        .map(|skill| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(components::skill_color(skill))),
                Span::styled(skill.label(), Style::default().fg(components::MUTED)),
            ])
        })
        .collect();
    legend.push(Line::from(vec![
        Span::styled("■ ", Style::default().fg(Color::Rgb(170, 40, 40))),
        Span::styled("conflict", Style::default().fg(components::MUTED)),
    ]));
    legend.push(Line::raw(""));
    legend.push(Line::styled(
        format!("{} assignments", schedule.assignments.len()),
        Style::default().fg(components::TEXT),
    ));
    frame.render_widget(Paragraph::new(legend), columns[1]);
}
