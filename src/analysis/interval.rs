//! Turns a date plus local clock times into an absolute time window.

use crate::models::Assignment;
use time::macros::format_description;
use time::{Date, Duration, PrimitiveDateTime, Time};

/// A half-open window `[start, end)` of local, timezone-naive time.
///
/// Always satisfies `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl Interval {
    /// Half-open overlap: windows that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_clock(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    Time::parse(raw, format_description!("[hour]:[minute]:[second]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]")))
        .ok()
}

/// Builds the window of a shift worked on `date`.
///
/// The end is pushed to the following day when the shift is flagged as
/// crossing midnight, or when its end clock time is before or equal to its
/// start. Equal times therefore give a 24 hour window, never an empty one.
///
/// Returns `None` when either clock time cannot be parsed.
pub fn normalize(date: Date, start: &str, end: &str, crosses_midnight: bool) -> Option<Interval> {
    let start = date.with_time(parse_clock(start)?);
    let mut end = date.with_time(parse_clock(end)?);

    if crosses_midnight || end <= start {
        end = end.checked_add(Duration::DAY)?;
    }

    Some(Interval { start, end })
}

impl Assignment {
    /// The normalized window of this assignment.
    pub fn interval(&self) -> Option<Interval> {
        normalize(
            self.date,
            &self.shift_start,
            &self.shift_end,
            self.crosses_midnight,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn end_is_always_after_start() {
        let day = date!(2024 - 02 - 28);
        let clocks: Vec<String> = (0..24)
            .flat_map(|h| [0, 30].map(move |m| format!("{h:02}:{m:02}")))
            .collect();

        for start in &clocks {
            for end in &clocks {
                for crosses in [false, true] {
                    let window = normalize(day, start, end, crosses).unwrap();
                    assert!(
                        window.end > window.start,
                        "{start}-{end} crosses={crosses} gave {window:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn overnight_shift_wraps_without_flag() {
        let window = normalize(date!(2024 - 01 - 01), "22:00", "06:00", false).unwrap();
        assert_eq!(window.start, datetime!(2024-01-01 22:00));
        assert_eq!(window.end, datetime!(2024-01-02 06:00));
    }

    #[test]
    fn equal_times_become_a_full_day() {
        let window = normalize(date!(2024 - 01 - 01), "08:00", "08:00", false).unwrap();
        assert_eq!(window.end, window.start + Duration::DAY);
        assert_eq!(window.end - window.start, Duration::hours(24));
    }

    #[test]
    fn crosses_midnight_flag_always_adds_a_day() {
        let window = normalize(date!(2024 - 01 - 01), "08:00", "16:00", true).unwrap();
        assert_eq!(window.end, datetime!(2024-01-02 16:00));
    }

    #[test]
    fn accepts_seconds_and_rejects_garbage() {
        let window = normalize(date!(2024 - 12 - 31), "23:00:00", "07:00:00", true).unwrap();
        assert_eq!(window.end, datetime!(2025-01-01 07:00));
        assert!(normalize(date!(2024 - 12 - 31), "late", "07:00", false).is_none());
        assert!(normalize(date!(2024 - 12 - 31), "", "", false).is_none());
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let day = date!(2024 - 01 - 01);
        let morning = normalize(day, "08:00", "16:00", false).unwrap();
        let evening = normalize(day, "16:00", "22:00", false).unwrap();
        let split = normalize(day, "12:00", "18:00", false).unwrap();

        assert!(!morning.overlaps(&evening));
        assert!(!evening.overlaps(&morning));
        assert!(morning.overlaps(&split));
        assert!(split.overlaps(&evening));
    }
}
