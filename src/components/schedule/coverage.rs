//! Coverage summary table.

use crate::analysis::{CoverageBucket, CoverageStatus};
use crate::components;
use crate::tui::Frame;
use ratatui::{prelude::*, widgets::*};

/// Requirement chips for a bucket: label and how the assigned count compares.
///
/// A chip is only shown for targets that were supplied.
pub fn requirement_chips(bucket: &CoverageBucket) -> Vec<(String, CoverageStatus)> {
    let Some(required) = bucket.required else {
        return Vec::new();
    };

    let mut chips = Vec::new();
    if let Some(chat) = required.chat {
        chips.push((format!("Req Chat {chat}"), bucket.chat_status()));
    }
    if let Some(email) = required.email {
        chips.push((format!("Req Email {email}"), bucket.email_status()));
    }
    if let Some(total) = required.total {
        chips.push((format!("Req Total {total}"), bucket.total_status()));
    }
    chips
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    buckets: &[CoverageBucket],
    state: &TableState,
    focused: bool,
) {
    let block = components::panel("Coverage Summary", focused);

    if buckets.is_empty() {
        frame.render_widget(
            Paragraph::new("No assignments.")
                .style(Style::default().fg(components::MUTED))
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(
        ["Date", "Shift", "Assigned", "Chat", "Email", "Both", "Targets"]
            .map(|h| Cell::from(h).style(Style::default().fg(components::TEXT))),
    )
    .style(Style::default().bg(Color::Rgb(26, 26, 36)));

    let rows = buckets.iter().map(|bucket| {
        let chips: Vec<Span> = requirement_chips(bucket)
            .into_iter()
            .flat_map(|(label, status)| {
                [
                    Span::styled(
                        format!(" {label} "),
                        Style::default()
                            .fg(Color::Black)
                            .bg(components::status_color(status)),
                    ),
                    Span::raw(" "),
                ]
            })
            .collect();

        Row::new(vec![
            Cell::from(bucket.key.date.to_string()),
            Cell::from(bucket.shift_name.clone()),
            Cell::from(bucket.assigned.total.to_string()),
            Cell::from(bucket.assigned.chat.to_string()),
            Cell::from(bucket.assigned.email.to_string()),
            Cell::from(bucket.assigned.both.to_string()),
            Cell::from(Line::from(chips)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Min(24),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 65)));

    frame.render_stateful_widget(table, area, &mut state.clone());
}
