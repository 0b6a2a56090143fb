//! Client for the upstream submission service.
//!
//! The service exposes a single listing endpoint, `GET /api/projects`, and
//! authorizes it with the end user's own bearer token. Single-project
//! lookups filter that listing (see [`ProjectSource::get_project`]).

use std::time::Duration;

use async_trait::async_trait;
use companion_config::SubmissionsConfig;
use companion_core::error::UpstreamError;
use companion_core::project::Project;
use companion_core::source::ProjectSource;
use tracing::{debug, warn};

/// HTTP client for the submission service.
pub struct SubmissionClient {
    base_url: String,
    client: reqwest::Client,
}

impl SubmissionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Unreachable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build from the `[submissions]` config section.
    pub fn from_config(config: &SubmissionsConfig) -> Result<Self, UpstreamError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| UpstreamError::Unreachable("submissions.url is not configured".into()))?;
        Self::new(url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ProjectSource for SubmissionClient {
    async fn list_projects(&self, token: &str) -> Result<Vec<Project>, UpstreamError> {
        let url = format!("{}/api/projects", self.base_url);
        debug!(url = %url, "Fetching projects from submission service");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Submission service request failed");
                UpstreamError::Unreachable(e.to_string())
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, "Submission service returned error");
            return Err(UpstreamError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SubmissionClient {
        SubmissionClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn listing() -> serde_json::Value {
        serde_json::json!([
            { "id": "p1", "title": "Crop Yield Prediction", "guideName": "Dr. Rao", "students": ["Asha"] },
            { "id": "p2", "title": "Campus Navigation", "students": [] }
        ])
    }

    #[tokio::test]
    async fn forwards_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .and(header("Authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .expect(1)
            .mount(&server)
            .await;

        let projects = client(&server).list_projects("user-jwt").await.unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].title.as_deref(), Some("Crop Yield Prediction"));
    }

    #[tokio::test]
    async fn get_project_filters_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing()))
            .mount(&server)
            .await;

        let c = client(&server);
        assert_eq!(c.get_project("p2", "t").await.unwrap().title.as_deref(), Some("Campus Navigation"));

        let err = c.get_project("p9", "t").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn non_200_keeps_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        match client(&server).list_projects("t").await.unwrap_err() {
            UpstreamError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_service_is_503() {
        let c = SubmissionClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
        let err = c.list_projects("t").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unreachable(_)));
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client(&server).list_projects("t").await.unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidResponse(_)));
    }

    #[test]
    fn from_config_requires_url() {
        assert!(SubmissionClient::from_config(&SubmissionsConfig::default()).is_err());

        let cfg = SubmissionsConfig {
            url: Some("http://submissions.local/".into()),
            ..SubmissionsConfig::default()
        };
        assert_eq!(SubmissionClient::from_config(&cfg).unwrap().base_url(), "http://submissions.local");
    }
}
