//! HTTP client for the scheduling backend.
//!
//! Every backend endpoint the console uses goes through [`ApiClient`]. Each
//! method performs one request, maps non-2xx answers to [`ApiError::Status`]
//! and decodes the JSON body into the models in [`crate::models`].

pub mod error;

pub use error::ApiError;

use crate::config::Config;
use crate::models::{
    Agent, GenerateScheduleRequest, JobHandle, JobStatus, Project, Schedule, Shift, UploadSummary,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Async client bound to one backend base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    upload_timeout: Duration,
}

#[derive(Deserialize)]
struct ScheduleEnvelope {
    schedule: Schedule,
}

impl ApiClient {
    /// Creates a client from the application configuration.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_base_url(
            &config.api_base,
            config.request_timeout,
            config.upload_timeout,
        )
    }

    pub fn with_base_url(
        base_url: &str,
        request_timeout: Duration,
        upload_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        decode(response).await
    }

    /// `GET /projects`. A body that is not a list is treated as no projects.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        match self.get::<Value>("/projects").await? {
            value @ Value::Array(_) => serde_json::from_value(value).map_err(ApiError::Decode),
            _ => Ok(Vec::new()),
        }
    }

    /// `GET /projects/{id}/shifts`.
    pub async fn list_shifts(&self, project_id: i64) -> Result<Vec<Shift>, ApiError> {
        self.get(&format!("/projects/{project_id}/shifts")).await
    }

    /// `GET /projects/{id}/agents`.
    pub async fn list_agents(&self, project_id: i64) -> Result<Vec<Agent>, ApiError> {
        self.get(&format!("/projects/{project_id}/agents")).await
    }

    /// Uploads a roster CSV as the multipart field `file`.
    pub async fn upload_roster(
        &self,
        project_id: i64,
        path: &Path,
    ) -> Result<UploadSummary, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "roster.csv".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        let url = self.url(&format!("/projects/{project_id}/agents/bulk_upload"));
        info!(%url, path = %path.display(), "uploading roster");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;
        decode(response).await
    }

    /// Queues an asynchronous schedule generation job.
    pub async fn generate_schedule(
        &self,
        project_id: i64,
        request: &GenerateScheduleRequest,
    ) -> Result<JobHandle, ApiError> {
        let url = self.url(&format!("/projects/{project_id}/generate_schedule_async"));
        info!(%url, start = %request.start_date, horizon = request.horizon_days, "starting generation");
        let response = self.http.post(&url).json(request).send().await?;
        decode(response).await
    }

    /// `GET /jobs/{id}`.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus, ApiError> {
        self.get(&format!("/jobs/{job_id}")).await
    }

    /// `GET /schedules/{id}`, unwrapped from its `schedule` envelope.
    pub async fn schedule(&self, schedule_id: i64) -> Result<Schedule, ApiError> {
        let envelope: ScheduleEnvelope = self.get(&format!("/schedules/{schedule_id}")).await?;
        Ok(envelope.schedule)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    debug!(status = status.as_u16(), bytes = body.len(), "response");

    if !status.is_success() {
        return Err(ApiError::from_response(status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(ApiError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PerShiftRequirement, Skill};
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;
    use time::macros::date;

    fn client(server: &mockito::ServerGuard) -> ApiClient {
        ApiClient::with_base_url(
            &format!("{}/", server.url()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_projects() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/projects")
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 1, "name": "Support"}, {"id": 2, "name": "Sales"}]"#)
            .create_async()
            .await;

        let projects = client(&server).list_projects().await.unwrap();

        mock.assert_async().await;
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].name, "Sales");
    }

    #[tokio::test]
    async fn non_list_project_body_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/projects")
            .with_body(r#"{"projects": []}"#)
            .create_async()
            .await;

        assert!(client(&server).list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn maps_error_status_to_detail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/projects/9/shifts")
            .with_status(404)
            .with_body(r#"{"detail": "project not found"}"#)
            .create_async()
            .await;

        let err = client(&server).list_shifts(9).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));
        assert_eq!(err.detail(), "project not found");
    }

    #[tokio::test]
    async fn posts_generation_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/projects/3/generate_schedule_async")
            .match_body(Matcher::PartialJson(json!({
                "start_date": "2024-06-03",
                "horizon_days": 14,
                "per_shift_requirements": [{"shift_id": 1, "chat_min": 2, "email_min": 0}]
            })))
            .with_body(r#"{"job_id": "abc-123"}"#)
            .create_async()
            .await;

        let request = GenerateScheduleRequest::new(
            date!(2024 - 06 - 03),
            vec![PerShiftRequirement {
                shift_id: 1,
                chat_min: 2,
                email_min: 0,
                total: None,
            }],
        );
        let handle = client(&server).generate_schedule(3, &request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(handle.job_id, "abc-123");
    }

    #[tokio::test]
    async fn unwraps_schedule_envelope() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/schedules/5")
            .with_body(
                json!({
                    "schedule": {
                        "id": 5,
                        "project_id": 1,
                        "start_date": "2024-01-01",
                        "end_date": "2024-01-14",
                        "generation_metadata": null,
                        "assignments": [{
                            "date": "2024-01-01",
                            "shift_id": 2,
                            "shift_name": "Night",
                            "shift_start": "22:00",
                            "shift_end": "06:00",
                            "shift_crosses_midnight": true,
                            "agent_id": 7,
                            "agent_name": "Bo",
                            "agent_skill": "Email",
                            "role": "email"
                        }]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let schedule = client(&server).schedule(5).await.unwrap();
        assert_eq!(schedule.assignments.len(), 1);
        assert_eq!(schedule.assignments[0].agent_skill, Skill::Email);
        assert!(schedule.assignments[0].crosses_midnight);
    }

    #[tokio::test]
    async fn reads_job_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jobs/abc")
            .with_body(r#"{"job_id": "abc", "status": "SUCCESS", "result": {"schedule_id": 11}}"#)
            .create_async()
            .await;

        let status = client(&server).job_status("abc").await.unwrap();
        assert!(status.is_terminal());
        assert_eq!(status.schedule_id(), Some(11));
    }

    #[tokio::test]
    async fn uploads_roster_as_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/projects/4/agents/bulk_upload")
            .match_header(
                "content-type",
                Matcher::Regex("multipart/form-data".to_string()),
            )
            .match_body(Matcher::Regex("name,channel_skill".to_string()))
            .with_body(r#"{"created": [{"id": 1, "name": "Ana"}], "count": 1}"#)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,channel_skill").unwrap();
        writeln!(file, "Ana,chat").unwrap();

        let summary = client(&server).upload_roster(4, file.path()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(summary.count, 1);
        assert_eq!(summary.created[0].name, "Ana");
    }

    #[tokio::test]
    async fn missing_roster_file_is_io_error() {
        let server = mockito::Server::new_async().await;
        let err = client(&server)
            .upload_roster(4, Path::new("/definitely/not/here.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io { .. }));
    }
}
