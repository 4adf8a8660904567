/// Types for the scrape job and its API payloads
use crate::catalog::Region;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Lifecycle of the scrape job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }

    /// Returns true once the job has left `running` for good.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Which districts of the state to scrape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawSelection")]
pub enum DistrictSelection {
    All,
    /// District ids or names
    Only(Vec<String>),
}

/// Accepts `"all"`, a single district, or a list (a list containing `"all"`
/// selects every district).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSelection {
    One(String),
    Many(Vec<String>),
}

fn is_all(key: &str) -> bool {
    key.trim().eq_ignore_ascii_case("all")
}

impl From<RawSelection> for DistrictSelection {
    fn from(raw: RawSelection) -> Self {
        match raw {
            RawSelection::One(key) if is_all(&key) => DistrictSelection::All,
            RawSelection::One(key) => DistrictSelection::Only(vec![key]),
            RawSelection::Many(keys) if keys.iter().any(|k| is_all(k)) => DistrictSelection::All,
            RawSelection::Many(keys) => DistrictSelection::Only(keys),
        }
    }
}

/// Body of `POST /api/start`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartRequest {
    /// State id or name
    #[serde(alias = "state")]
    pub state_id: String,
    #[serde(default, alias = "districts")]
    pub district_ids: Option<DistrictSelection>,
}

/// Returned when a start request is accepted.
#[derive(Debug, Clone, Serialize)]
pub struct StartAccepted {
    pub accepted: bool,
    pub run_id: String,
    pub state: String,
    pub districts: usize,
}

/// A district that could not be scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistrictFailure {
    pub district: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// What `GET /api/status` reports.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub state: Option<String>,
    pub current_district: Option<String>,
    pub current_school: Option<String>,
    /// Districts processed (failed ones included) out of targeted
    pub progress: Progress,
    /// Schools processed within the current district
    pub school_progress: Progress,
    pub records_written: u64,
    pub failed_districts: Vec<DistrictFailure>,
    pub failed_schools: u64,
    pub files: Vec<String>,
    pub error: Option<String>,
    pub message: String,
    pub cancel_requested: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// The single live job. Written by the run task, read by status requests.
#[derive(Debug)]
pub(crate) struct Job {
    pub status: JobStatus,
    pub state: Option<Region>,
    pub districts: Vec<Region>,
    pub current_district: Option<String>,
    pub current_school: Option<String>,
    pub districts_done: usize,
    pub schools_done: usize,
    pub schools_total: usize,
    pub records_written: u64,
    pub failed_districts: Vec<DistrictFailure>,
    pub failed_schools: u64,
    pub files: Vec<PathBuf>,
    pub error: Option<String>,
    pub message: String,
    pub cancel_requested: bool,
    pub cancel: CancellationToken,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    /// A fresh running job for `state` and `districts`.
    pub fn begin(state: Region, districts: Vec<Region>, cancel: CancellationToken) -> Self {
        Self {
            status: JobStatus::Running,
            state: Some(state),
            districts,
            message: "Starting scraper...".to_string(),
            cancel,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Moves the job to a terminal status.
    pub fn finish(&mut self, status: JobStatus, message: String, error: Option<String>) {
        self.status = status;
        self.message = message;
        self.error = error;
        self.current_school = None;
        self.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            status: self.status,
            state: self.state.as_ref().map(|s| s.name.clone()),
            current_district: self.current_district.clone(),
            current_school: self.current_school.clone(),
            progress: Progress {
                done: self.districts_done,
                total: self.districts.len(),
            },
            school_progress: Progress {
                done: self.schools_done,
                total: self.schools_total,
            },
            records_written: self.records_written,
            failed_districts: self.failed_districts.clone(),
            failed_schools: self.failed_schools,
            files: self
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            error: self.error.clone(),
            message: self.message.clone(),
            cancel_requested: self.cancel_requested,
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self {
            status: JobStatus::Idle,
            state: None,
            districts: Vec::new(),
            current_district: None,
            current_school: None,
            districts_done: 0,
            schools_done: 0,
            schools_total: 0,
            records_written: 0,
            failed_districts: Vec::new(),
            failed_schools: 0,
            files: Vec::new(),
            error: None,
            message: "Ready to scrape".to_string(),
            cancel_requested: false,
            cancel: CancellationToken::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> StartRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_district_selection_forms() {
        assert_eq!(
            parse(r#"{"state_id": "39", "district_ids": "all"}"#).district_ids,
            Some(DistrictSelection::All)
        );
        assert_eq!(
            parse(r#"{"state_id": "39", "districts": ["612", "all"]}"#).district_ids,
            Some(DistrictSelection::All)
        );
        assert_eq!(
            parse(r#"{"state": "Telangana", "district_ids": ["Hyderabad"]}"#).district_ids,
            Some(DistrictSelection::Only(vec!["Hyderabad".to_string()]))
        );
        assert_eq!(parse(r#"{"state_id": "39"}"#).district_ids, None);
    }

    #[test]
    fn test_idle_snapshot() {
        let snapshot = Job::default().snapshot();
        assert_eq!(snapshot.status, JobStatus::Idle);
        assert_eq!(snapshot.progress, Progress::default());
        assert!(snapshot.error.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["progress"]["total"], 0);
    }
}
