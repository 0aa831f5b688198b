//! CSV and PDF export of a schedule's assignments.
//!
//! Exports work from the raw assignment list as fetched from the backend;
//! conflict and coverage results are never written out.

use crate::models::Assignment;
use anyhow::{anyhow, Context, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use time::Date;
use tracing::info;

/// Export formats offered by the schedule screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    project: &'a str,
    date: String,
    shift: &'a str,
    start: &'a str,
    end: &'a str,
    agent_id: i64,
    agent_name: &'a str,
    skill: &'static str,
    role: &'a str,
}

/// `schedule_{project}_{date}.{ext}`, with the project name made safe for a
/// file system.
pub fn export_file_name(project: Option<&str>, day: Date, format: ExportFormat) -> String {
    let project = project
        .map(|name| {
            name.trim()
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() || c == '-' || c == '_' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "project".to_string());

    format!("schedule_{project}_{day}.{}", format.extension())
}

/// Writes assignments as CSV rows to `writer`.
pub fn write_csv<W: Write>(writer: W, project: &str, assignments: &[Assignment]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for assignment in assignments {
        csv.serialize(CsvRow {
            project,
            date: assignment.date.to_string(),
            shift: &assignment.shift_name,
            start: &assignment.shift_start,
            end: &assignment.shift_end,
            agent_id: assignment.agent_id,
            agent_name: &assignment.agent_name,
            skill: assignment.agent_skill.label(),
            role: &assignment.role,
        })?;
    }
    csv.flush()?;
    Ok(())
}

/// Exports assignments into `dir` and returns the path written.
pub fn export(
    format: ExportFormat,
    dir: &Path,
    project: Option<&str>,
    assignments: &[Assignment],
    day: Date,
) -> Result<PathBuf> {
    let path = dir.join(export_file_name(project, day, format));
    let file = File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
    let writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(writer, project.unwrap_or_default(), assignments)?,
        ExportFormat::Pdf => write_pdf(writer, project.unwrap_or_default(), assignments)?,
    }

    info!(path = %path.display(), rows = assignments.len(), "exported schedule");
    Ok(path)
}

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 14.0;
const ROW_HEIGHT: f32 = 5.5;
const FONT_SIZE: f32 = 9.0;

/// Column titles, their x offsets and the most characters that fit.
const PDF_COLUMNS: [(&str, f32, usize); 7] = [
    ("Date", MARGIN, 12),
    ("Shift", 40.0, 26),
    ("Start", 95.0, 8),
    ("End", 115.0, 8),
    ("Agent", 135.0, 32),
    ("Skill", 205.0, 10),
    ("Role", 230.0, 24),
];

/// Writes a landscape A4 table of assignments.
pub fn write_pdf<W: Write>(writer: W, project: &str, assignments: &[Assignment]) -> Result<()> {
    let title = format!("Schedule export - {project}");
    let (doc, page, layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow!("cannot load PDF font: {e:?}"))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| anyhow!("cannot load PDF font: {e:?}"))?;

    let mut layer = doc.get_page(page).get_layer(layer);
    layer.use_text(title.as_str(), 12.0, Mm(MARGIN), Mm(PAGE_HEIGHT - 12.0), &bold);
    let mut y = PAGE_HEIGHT - 20.0;
    table_header(&layer, &bold, y);

    for assignment in assignments {
        y -= ROW_HEIGHT;
        if y < MARGIN {
            let (page, next) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(next);
            y = PAGE_HEIGHT - MARGIN;
            table_header(&layer, &bold, y);
            y -= ROW_HEIGHT;
        }

        let date = assignment.date.to_string();
        let cells = [
            date.as_str(),
            assignment.shift_name.as_str(),
            assignment.shift_start.as_str(),
            assignment.shift_end.as_str(),
            assignment.agent_name.as_str(),
            assignment.agent_skill.label(),
            assignment.role.as_str(),
        ];
        for ((_, x, width), cell) in PDF_COLUMNS.iter().zip(cells) {
            layer.use_text(clip(cell, *width), FONT_SIZE, Mm(*x), Mm(y), &regular);
        }
    }

    let mut writer = BufWriter::new(writer);
    doc.save(&mut writer)
        .map_err(|e| anyhow!("cannot write PDF: {e:?}"))?;
    writer.flush()?;
    Ok(())
}

fn table_header(layer: &PdfLayerReference, font: &IndirectFontRef, y: f32) {
    for (title, x, _) in PDF_COLUMNS {
        layer.use_text(title, FONT_SIZE, Mm(x), Mm(y), font);
    }
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Skill;
    use time::macros::date;

    fn assignment(agent_name: &str, skill: Skill) -> Assignment {
        Assignment {
            date: date!(2024 - 01 - 01),
            shift_id: 1,
            shift_name: "Night".to_string(),
            shift_start: "22:00".to_string(),
            shift_end: "06:00".to_string(),
            crosses_midnight: true,
            agent_id: 3,
            agent_name: agent_name.to_string(),
            agent_skill: skill,
            role: "email".to_string(),
        }
    }

    #[test]
    fn file_names_fall_back_and_sanitize() {
        let day = date!(2024 - 07 - 09);
        assert_eq!(
            export_file_name(None, day, ExportFormat::Csv),
            "schedule_project_2024-07-09.csv"
        );
        assert_eq!(
            export_file_name(Some("EU / Support"), day, ExportFormat::Pdf),
            "schedule_EU___Support_2024-07-09.pdf"
        );
    }

    #[test]
    fn csv_has_header_and_one_row_per_assignment() {
        let mut out = Vec::new();
        write_csv(
            &mut out,
            "Support",
            &[
                assignment("Ana", Skill::Email),
                assignment("Smith, Bo", Skill::Unknown),
            ],
        )
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "project,date,shift,start,end,agent_id,agent_name,skill,role",
                "Support,2024-01-01,Night,22:00,06:00,3,Ana,email,email",
                "Support,2024-01-01,Night,22:00,06:00,3,\"Smith, Bo\",unknown,email",
            ]
        );
    }

    #[test]
    fn exports_csv_and_pdf_files() {
        let dir = tempfile::tempdir().unwrap();
        let rows: Vec<_> = (0..60).map(|i| assignment(&format!("Agent {i}"), Skill::Chat)).collect();
        let day = date!(2024 - 01 - 15);

        let csv_path = export(ExportFormat::Csv, dir.path(), Some("Ops"), &rows, day).unwrap();
        let pdf_path = export(ExportFormat::Pdf, dir.path(), Some("Ops"), &rows, day).unwrap();

        assert_eq!(csv_path, dir.path().join("schedule_Ops_2024-01-15.csv"));
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap().lines().count(), 61);
        let pdf = std::fs::read(&pdf_path).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn clips_long_cells() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("abcdefghij", 6), "abc...");
    }
}
