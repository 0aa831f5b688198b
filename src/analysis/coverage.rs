//! Per-(date, shift) head counts by skill, and the status of those counts
//! against staffing targets.

use crate::models::{Assignment, PerShiftRequirement, Skill};
use std::collections::BTreeMap;
use time::Date;

/// Identifies one shift on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoverageKey {
    pub date: Date,
    pub shift_id: i64,
}

/// Assigned head counts, split by coverage bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkillCounts {
    pub chat: u32,
    pub email: u32,
    pub both: u32,
    pub total: u32,
}

impl SkillCounts {
    fn record(&mut self, skill: Skill) {
        match skill.coverage_bucket() {
            Skill::Chat => self.chat += 1,
            Skill::Email => self.email += 1,
            _ => self.both += 1,
        }
        self.total += 1;
    }
}

/// Staffing targets attached to a bucket by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requirement {
    pub chat: Option<u32>,
    pub email: Option<u32>,
    pub total: Option<u32>,
}

impl From<&PerShiftRequirement> for Requirement {
    fn from(req: &PerShiftRequirement) -> Self {
        Self {
            chat: Some(req.chat_min),
            email: Some(req.email_min),
            total: req.total,
        }
    }
}

/// How an assigned count compares to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    Met,
    /// Short by at most two.
    Near,
    Short,
    /// No target was supplied.
    Unknown,
}

impl CoverageStatus {
    pub fn classify(required: Option<u32>, assigned: u32) -> Self {
        match required {
            None => CoverageStatus::Unknown,
            Some(required) if assigned >= required => CoverageStatus::Met,
            Some(required) if required - assigned <= 2 => CoverageStatus::Near,
            Some(_) => CoverageStatus::Short,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CoverageStatus::Met => "met",
            CoverageStatus::Near => "near",
            CoverageStatus::Short => "short",
            CoverageStatus::Unknown => "unknown",
        }
    }
}

/// Coverage of one shift on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageBucket {
    pub key: CoverageKey,
    pub shift_name: String,
    pub assigned: SkillCounts,
    pub required: Option<Requirement>,
}

impl CoverageBucket {
    pub fn chat_status(&self) -> CoverageStatus {
        CoverageStatus::classify(self.required.and_then(|r| r.chat), self.assigned.chat)
    }

    pub fn email_status(&self) -> CoverageStatus {
        CoverageStatus::classify(self.required.and_then(|r| r.email), self.assigned.email)
    }

    pub fn total_status(&self) -> CoverageStatus {
        CoverageStatus::classify(self.required.and_then(|r| r.total), self.assigned.total)
    }
}

/// Counts assignments per `(date, shift)`, ordered by date then shift id.
///
/// The shift name of a bucket is taken from the first assignment seen for it.
pub fn aggregate_coverage(assignments: &[Assignment]) -> Vec<CoverageBucket> {
    let mut buckets: BTreeMap<CoverageKey, CoverageBucket> = BTreeMap::new();

    for assignment in assignments {
        let key = CoverageKey {
            date: assignment.date,
            shift_id: assignment.shift_id,
        };
        buckets
            .entry(key)
            .or_insert_with(|| CoverageBucket {
                key,
                shift_name: assignment.shift_name.clone(),
                assigned: SkillCounts::default(),
                required: None,
            })
            .assigned
            .record(assignment.agent_skill);
    }

    buckets.into_values().collect()
}

/// Attaches targets to every bucket of a matching shift.
///
/// Buckets of shifts without an entry keep `required: None`.
pub fn attach_requirements(buckets: &mut [CoverageBucket], requirements: &[PerShiftRequirement]) {
    for bucket in buckets.iter_mut() {
        if let Some(req) = requirements
            .iter()
            .find(|req| req.shift_id == bucket.key.shift_id)
        {
            bucket.required = Some(Requirement::from(req));
        }
    }
}
