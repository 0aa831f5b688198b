//! Conflict and coverage analysis of a fetched schedule.
//!
//! Everything here is a pure function of the assignment list and is rerun in
//! full every time a schedule is loaded.

pub mod conflicts;
pub mod coverage;
pub mod interval;

pub use conflicts::{detect_conflicts, Conflict};
pub use coverage::{aggregate_coverage, attach_requirements, CoverageBucket, CoverageStatus};

use crate::models::{Assignment, PerShiftRequirement};
use std::collections::BTreeSet;
use tracing::info;

/// Conflicts and coverage derived from one schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleAnalysis {
    pub conflicts: Vec<Conflict>,
    pub coverage: Vec<CoverageBucket>,
    /// Indices of assignments involved in at least one conflict.
    pub conflicted: BTreeSet<usize>,
}

impl ScheduleAnalysis {
    pub fn analyze(assignments: &[Assignment]) -> Self {
        let conflicts = detect_conflicts(assignments);
        let coverage = aggregate_coverage(assignments);
        let conflicted = conflicts
            .iter()
            .flat_map(|c| [c.first, c.second])
            .collect();

        info!(
            assignments = assignments.len(),
            conflicts = conflicts.len(),
            buckets = coverage.len(),
            "analyzed schedule"
        );

        Self {
            conflicts,
            coverage,
            conflicted,
        }
    }

    /// Same as [`analyze`](Self::analyze), with staffing targets attached to
    /// the coverage buckets.
    pub fn analyze_with_targets(
        assignments: &[Assignment],
        requirements: &[PerShiftRequirement],
    ) -> Self {
        let mut analysis = Self::analyze(assignments);
        attach_requirements(&mut analysis.coverage, requirements);
        analysis
    }

    pub fn is_conflicted(&self, index: usize) -> bool {
        self.conflicted.contains(&index)
    }

    /// The user-facing conflict messages.
    pub fn warnings(&self) -> Vec<String> {
        self.conflicts.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Skill;
    use time::macros::date;

    fn sample() -> Vec<Assignment> {
        let make = |agent_id, shift_id, start: &str, end: &str, skill| Assignment {
            date: date!(2024 - 05 - 06),
            shift_id,
            shift_name: format!("S{shift_id}"),
            shift_start: start.to_string(),
            shift_end: end.to_string(),
            crosses_midnight: false,
            agent_id,
            agent_name: format!("A{agent_id}"),
            agent_skill: skill,
            role: String::new(),
        };
        vec![
            make(1, 1, "08:00", "16:00", Skill::Chat),
            make(1, 2, "12:00", "20:00", Skill::Chat),
            make(2, 1, "08:00", "16:00", Skill::Email),
            make(3, 3, "20:00", "04:00", Skill::Unknown),
        ]
    }

    #[test]
    fn rerunning_gives_identical_results() {
        let assignments = sample();
        let before = assignments.clone();

        let first = ScheduleAnalysis::analyze(&assignments);
        let second = ScheduleAnalysis::analyze(&assignments);

        assert_eq!(first, second);
        assert_eq!(assignments, before);
        assert_eq!(first.conflicts.len(), 1);
        assert_eq!(first.coverage.len(), 3);
    }

    #[test]
    fn marks_conflicted_assignments() {
        let analysis = ScheduleAnalysis::analyze(&sample());

        assert!(analysis.is_conflicted(0));
        assert!(analysis.is_conflicted(1));
        assert!(!analysis.is_conflicted(2));
        assert_eq!(
            analysis.warnings(),
            vec!["Agent 1 has overlapping shifts: S1 (2024-05-06) and S2 (2024-05-06)"]
        );
    }

    #[test]
    fn empty_schedule_is_empty_analysis() {
        let analysis = ScheduleAnalysis::analyze(&[]);
        assert!(analysis.conflicts.is_empty());
        assert!(analysis.coverage.is_empty());
        assert!(analysis.conflicted.is_empty());
    }

    #[test]
    fn targets_attach_to_matching_shift() {
        let analysis = ScheduleAnalysis::analyze_with_targets(
            &sample(),
            &[PerShiftRequirement {
                shift_id: 1,
                chat_min: 1,
                email_min: 2,
                total: Some(2),
            }],
        );

        let bucket = &analysis.coverage[0];
        assert_eq!(bucket.chat_status(), CoverageStatus::Met);
        assert_eq!(bucket.email_status(), CoverageStatus::Near);
        assert_eq!(bucket.total_status(), CoverageStatus::Met);
    }
}
