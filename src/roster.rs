//! Local preview of an agent roster CSV before it is uploaded.

use crate::models::Skill;
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns the backend understands in a roster upload.
pub const ROSTER_COLUMNS: &str = "name,email,channel_skill,fixed_off_start,fixed_off_end,fixed_shift_id,fixed_shift_start,fixed_shift_end";

/// Summary of a roster file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterPreview {
    pub rows: usize,
    pub chat: usize,
    pub email: usize,
    pub both: usize,
    /// Rows without a name; the backend rejects these.
    pub missing_name: usize,
    /// Rows that carry a complete fixed day-off range.
    pub fixed_off: usize,
    /// Rows that pin the agent to a shift for a date range.
    pub fixed_shift: usize,
}

/// Reads and summarizes the roster at `path`.
pub fn preview_file(path: &Path) -> Result<RosterPreview> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    preview_reader(file).with_context(|| format!("cannot read roster {}", path.display()))
}

pub fn preview_reader<R: Read>(reader: R) -> Result<RosterPreview> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers().context("missing header row")?.clone();
    let column = |names: &[&str]| {
        names
            .iter()
            .find_map(|name| headers.iter().position(|header| header == *name))
    };

    let name_col = column(&["name", "Name"])
        .ok_or_else(|| anyhow!("no `name` column; expected {ROSTER_COLUMNS}"))?;
    let skill_col = column(&["channel_skill", "channel"]);
    let off_start_col = column(&["fixed_off_start", "fixed_off"]);
    let off_end_col = column(&["fixed_off_end"]);
    let shift_cols = [
        column(&["fixed_shift_id"]),
        column(&["fixed_shift_start"]),
        column(&["fixed_shift_end"]),
    ];

    let mut preview = RosterPreview::default();
    for (line, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("malformed row {}", line + 2))?;
        let field = |col: Option<usize>| {
            col.and_then(|c| record.get(c))
                .filter(|value| !value.is_empty())
        };

        preview.rows += 1;
        if field(Some(name_col)).is_none() {
            preview.missing_name += 1;
        }

        match Skill::from_raw(field(skill_col)).coverage_bucket() {
            Skill::Chat => preview.chat += 1,
            Skill::Email => preview.email += 1,
            _ => preview.both += 1,
        }

        if field(off_start_col).is_some() && field(off_end_col).is_some() {
            preview.fixed_off += 1;
        }
        if shift_cols.iter().all(|col| field(*col).is_some()) {
            preview.fixed_shift += 1;
        }
    }

    Ok(preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rows_by_channel() {
        let csv = "\
name,email,channel_skill,fixed_off_start,fixed_off_end,fixed_shift_id,fixed_shift_start,fixed_shift_end
Ana,ana@example.com,chat,,,,,
Bo,,Email,2024-01-01,2024-01-03,,,
Cy,,both,,,2,2024-01-01,2024-01-07
Di,,voice,,,,,
,,chat,,,,,
";
        let preview = preview_reader(csv.as_bytes()).unwrap();

        assert_eq!(
            preview,
            RosterPreview {
                rows: 5,
                chat: 2,
                email: 1,
                both: 2,
                missing_name: 1,
                fixed_off: 1,
                fixed_shift: 1,
            }
        );
    }

    #[test]
    fn accepts_alternate_headers_and_short_rows() {
        let csv = "Name,channel\nAna,EMAIL\nBo\n";
        let preview = preview_reader(csv.as_bytes()).unwrap();

        assert_eq!(preview.rows, 2);
        assert_eq!(preview.email, 1);
        assert_eq!(preview.both, 1);
    }

    #[test]
    fn rejects_roster_without_name_column() {
        let err = preview_reader("email,channel_skill\na@b.c,chat\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(preview_file(Path::new("/nope/roster.csv")).is_err());
    }
}
