//! Pairwise overlap scan over each agent's shifts.

use crate::analysis::interval::Interval;
use crate::models::Assignment;
use std::collections::BTreeMap;
use std::fmt;
use time::Date;
use tracing::warn;

/// Two assignments of the same agent whose windows overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub agent_id: i64,
    /// Index of the first assignment in the analyzed slice.
    pub first: usize,
    /// Index of the second assignment in the analyzed slice.
    pub second: usize,
    pub first_shift: String,
    pub first_date: Date,
    pub second_shift: String,
    pub second_date: Date,
}

impl Conflict {
    fn between(agent_id: i64, assignments: &[Assignment], first: usize, second: usize) -> Self {
        let (a, b) = (&assignments[first], &assignments[second]);
        Self {
            agent_id,
            first,
            second,
            first_shift: a.shift_name.clone(),
            first_date: a.date,
            second_shift: b.shift_name.clone(),
            second_date: b.date,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Agent {} has overlapping shifts: {} ({}) and {} ({})",
            self.agent_id, self.first_shift, self.first_date, self.second_shift, self.second_date
        )
    }
}

/// Reports one [`Conflict`] for every overlapping pair of an agent's shifts.
///
/// Assignments whose clock times cannot be parsed have no window and never
/// conflict with anything.
pub fn detect_conflicts(assignments: &[Assignment]) -> Vec<Conflict> {
    let mut windows_by_agent: BTreeMap<i64, Vec<(usize, Interval)>> = BTreeMap::new();

    for (index, assignment) in assignments.iter().enumerate() {
        match assignment.interval() {
            Some(window) => windows_by_agent
                .entry(assignment.agent_id)
                .or_default()
                .push((index, window)),
            None => warn!(
                agent_id = assignment.agent_id,
                shift_id = assignment.shift_id,
                start = %assignment.shift_start,
                end = %assignment.shift_end,
                "skipping assignment with unparseable shift times"
            ),
        }
    }

    let mut conflicts = Vec::new();
    for (&agent_id, windows) in &windows_by_agent {
        for (i, (first, a)) in windows.iter().enumerate() {
            for (second, b) in &windows[i + 1..] {
                if a.overlaps(b) {
                    conflicts.push(Conflict::between(agent_id, assignments, *first, *second));
                }
            }
        }
    }
    conflicts
}
