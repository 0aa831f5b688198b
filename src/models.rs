//! Data models for Shiftdesk.
//!
//! These mirror the JSON shapes served by the scheduling backend. Loose
//! strings coming off the wire (skills, nullable names) are normalized here,
//! once, so the rest of the console works with closed types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Job states after which the backend will not change the job again.
pub const TERMINAL_JOB_STATUSES: [&str; 3] = ["SUCCESS", "FAILURE", "REVOKED"];

/// Result marker the solver reports when no feasible schedule exists.
pub const NO_SOLUTION: &str = "no_solution";

/// Channel skill of an agent.
///
/// Decided once from the backend's free-form string; anything that is not
/// `chat`, `email` or `both` (case-insensitive) becomes [`Skill::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Skill {
    Chat,
    Email,
    Both,
    #[default]
    Unknown,
}

impl Skill {
    /// Normalizes a raw skill value.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("chat") => Skill::Chat,
            Some("email") => Skill::Email,
            Some("both") => Skill::Both,
            _ => Skill::Unknown,
        }
    }

    /// Lowercase label used for display and export.
    pub fn label(self) -> &'static str {
        match self {
            Skill::Chat => "chat",
            Skill::Email => "email",
            Skill::Both => "both",
            Skill::Unknown => "unknown",
        }
    }

    /// The bucket this skill is counted under in coverage summaries.
    ///
    /// Unrecognized or missing skills count as `both`.
    pub fn coverage_bucket(self) -> Skill {
        match self {
            Skill::Unknown => Skill::Both,
            other => other,
        }
    }
}

impl Serialize for Skill {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Skill {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Skill::from_raw(raw.as_deref()))
    }
}

/// Treats an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A project (one scheduling tenant) on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

impl Project {
    /// A project opened by id only, before its name is known.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            name: format!("Project {id}"),
        }
    }
}

/// A shift template belonging to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crosses_midnight: bool,
}

/// An agent on a project roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub channel_skill: Skill,
}

/// Agent created by a roster upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedAgent {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Response of the bulk roster upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub created: Vec<CreatedAgent>,
    pub count: usize,
}

/// Minimum staffing targets for one shift, sent with a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerShiftRequirement {
    pub shift_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chat_min: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

impl PerShiftRequirement {
    /// Zeroed targets for a shift.
    pub fn for_shift(shift_id: i64) -> Self {
        Self {
            shift_id,
            chat_min: 0,
            email_min: 0,
            total: Some(0),
        }
    }
}

/// Body of `POST /projects/{id}/generate_schedule_async`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateScheduleRequest {
    #[serde(with = "iso_date")]
    pub start_date: Date,
    pub horizon_days: u32,
    pub per_shift_requirements: Vec<PerShiftRequirement>,
    pub solver_time_limit: u32,
}

impl GenerateScheduleRequest {
    pub const DEFAULT_HORIZON_DAYS: u32 = 14;
    pub const DEFAULT_SOLVER_TIME_LIMIT: u32 = 120;

    pub fn new(start_date: Date, per_shift_requirements: Vec<PerShiftRequirement>) -> Self {
        Self {
            start_date,
            horizon_days: Self::DEFAULT_HORIZON_DAYS,
            per_shift_requirements,
            solver_time_limit: Self::DEFAULT_SOLVER_TIME_LIMIT,
        }
    }
}

/// Handle returned when a generation job is queued.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobHandle {
    pub job_id: String,
}

/// Snapshot of an asynchronous generation job.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobStatus {
    pub job_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
}

impl JobStatus {
    /// Schedule produced by the job, once it exists.
    pub fn schedule_id(&self) -> Option<i64> {
        self.result.as_ref()?.get("schedule_id")?.as_i64()
    }

    /// The `status` field inside the job's result payload.
    pub fn result_status(&self) -> Option<&str> {
        self.result.as_ref()?.get("status")?.as_str()
    }

    /// Whether the job has reached a state it will not leave.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_JOB_STATUSES.contains(&self.status.as_str())
            || self.schedule_id().is_some()
            || self.result_status() == Some(NO_SOLUTION)
    }
}

/// One agent-to-shift-on-date binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub shift_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shift_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shift_start: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub shift_end: String,
    #[serde(
        rename = "shift_crosses_midnight",
        default,
        deserialize_with = "null_as_default"
    )]
    pub crosses_midnight: bool,
    pub agent_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub agent_name: String,
    #[serde(default)]
    pub agent_skill: Skill,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
}

/// A generated schedule with its assignments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub project_id: i64,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    #[serde(default)]
    pub generation_metadata: Option<Value>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl Schedule {
    /// Per-shift targets the schedule was generated with.
    ///
    /// The backend keeps them in `generation_metadata.per_shift_requirements`
    /// as an object keyed by shift id.
    pub fn requirements(&self) -> Vec<PerShiftRequirement> {
        let Some(Value::Object(map)) = self
            .generation_metadata
            .as_ref()
            .and_then(|meta| meta.get("per_shift_requirements"))
        else {
            return Vec::new();
        };

        map.iter()
            .filter_map(|(shift_id, targets)| {
                let shift_id = shift_id.parse().ok()?;
                let count = |field: &str| {
                    targets
                        .get(field)
                        .and_then(Value::as_u64)
                        .and_then(|n| u32::try_from(n).ok())
                };
                Some(PerShiftRequirement {
                    shift_id,
                    chat_min: count("chat_min").unwrap_or(0),
                    email_min: count("email_min").unwrap_or(0),
                    total: count("total"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn skill_normalizes_case_and_unknowns() {
        assert_eq!(Skill::from_raw(Some("Chat")), Skill::Chat);
        assert_eq!(Skill::from_raw(Some(" EMAIL ")), Skill::Email);
        assert_eq!(Skill::from_raw(Some("both")), Skill::Both);
        assert_eq!(Skill::from_raw(Some("voice")), Skill::Unknown);
        assert_eq!(Skill::from_raw(None), Skill::Unknown);
        assert_eq!(Skill::Unknown.coverage_bucket(), Skill::Both);
        assert_eq!(Skill::Chat.coverage_bucket(), Skill::Chat);
    }

    #[test]
    fn assignment_tolerates_nulls_from_deleted_references() {
        let assignment: Assignment = serde_json::from_value(json!({
            "date": "2024-01-01",
            "shift_id": 3,
            "shift_name": null,
            "shift_start": null,
            "shift_end": null,
            "shift_crosses_midnight": false,
            "agent_id": 9,
            "agent_name": null,
            "agent_skill": null,
            "role": "chat"
        }))
        .unwrap();

        assert_eq!(assignment.date, date!(2024 - 01 - 01));
        assert_eq!(assignment.shift_name, "");
        assert_eq!(assignment.agent_skill, Skill::Unknown);
        assert!(!assignment.crosses_midnight);
    }

    #[test]
    fn job_status_terminal_detection() {
        let status = |status: &str, result: Value| JobStatus {
            job_id: "j".into(),
            status: status.into(),
            result: Some(result),
        };

        assert!(!status("PENDING", Value::Null).is_terminal());
        assert!(!status("STARTED", json!({"progress": 3})).is_terminal());
        assert!(status("SUCCESS", Value::Null).is_terminal());
        assert!(status("FAILURE", Value::Null).is_terminal());
        assert!(status("REVOKED", Value::Null).is_terminal());
        assert!(status("PENDING", json!({"schedule_id": 4})).is_terminal());
        assert!(status("STARTED", json!({"status": "no_solution"})).is_terminal());
        assert_eq!(
            status("SUCCESS", json!({"schedule_id": 4})).schedule_id(),
            Some(4)
        );
    }

    #[test]
    fn generate_request_serializes_iso_date_and_defaults() {
        let request = GenerateScheduleRequest::new(
            date!(2024 - 03 - 04),
            vec![PerShiftRequirement {
                shift_id: 1,
                chat_min: 2,
                email_min: 1,
                total: None,
            }],
        );
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["start_date"], "2024-03-04");
        assert_eq!(body["horizon_days"], 14);
        assert_eq!(body["solver_time_limit"], 120);
        assert!(body["per_shift_requirements"][0].get("total").is_none());
    }

    #[test]
    fn schedule_reads_requirements_from_metadata() {
        let schedule: Schedule = serde_json::from_value(json!({
            "id": 1,
            "project_id": 2,
            "start_date": "2024-01-01",
            "end_date": "2024-01-14",
            "generation_metadata": {
                "per_shift_requirements": {
                    "7": {"chat_min": 3, "email_min": 1, "total": null}
                }
            },
            "assignments": []
        }))
        .unwrap();

        assert_eq!(
            schedule.requirements(),
            vec![PerShiftRequirement {
                shift_id: 7,
                chat_min: 3,
                email_min: 1,
                total: None,
            }]
        );
    }
}
