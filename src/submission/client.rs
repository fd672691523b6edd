//! HTTP transport to the intake server

use super::{Payload, SubmitError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const HEALTH_PATH: &str = "/api/health";
pub const SUBMIT_PATH: &str = "/api/submit-form";

/// Server reply to a submission
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub clear_local_storage: bool,
}

/// Transport used by the submitter, mockable in tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// True if the server answered the health check with a success status
    async fn health(&self) -> bool;

    /// Post answers. Transport failures and unreadable replies are errors;
    /// a readable reply is returned whatever its `success` flag says.
    async fn submit(&self, payload: &Payload) -> Result<SubmitResponse, SubmitError>;
}

/// `reqwest`-backed client
#[derive(Debug, Clone)]
pub struct HttpSubmissionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSubmissionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn health(&self) -> bool {
        match self.client.get(self.url(HEALTH_PATH)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    async fn submit(&self, payload: &Payload) -> Result<SubmitResponse, SubmitError> {
        let response = self
            .client
            .post(self.url(SUBMIT_PATH))
            .json(payload)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !is_json {
            return Err(SubmitError::InvalidResponse(format!(
                "expected JSON, got status {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| SubmitError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> HttpSubmissionClient {
        HttpSubmissionClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn payload() -> Payload {
        Payload::from_entries(vec![("company".to_string(), "Acme".to_string())])
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client =
            HttpSubmissionClient::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url(HEALTH_PATH), "http://localhost:3000/api/health");
    }

    #[test]
    fn test_response_defaults() {
        let response: SubmitResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(
            response,
            SubmitResponse {
                success: true,
                ..Default::default()
            }
        );
    }

    #[tokio::test]
    async fn test_health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
            .mount(&server)
            .await;

        assert!(client(&server).health().await);
    }

    #[tokio::test]
    async fn test_health_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(!client(&server).health().await);
    }

    #[tokio::test]
    async fn test_health_unreachable() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = HttpSubmissionClient::new(&uri, Duration::from_secs(1)).unwrap();
        assert!(!client.health().await);
    }

    #[tokio::test]
    async fn test_submit_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .and(body_json(json!({"company": "Acme"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "submissionId": "abc-123",
                "clearLocalStorage": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server).submit(&payload()).await.unwrap();
        assert!(response.success);
        assert_eq!(response.submission_id.as_deref(), Some("abc-123"));
        assert!(response.clear_local_storage);
    }

    #[tokio::test]
    async fn test_submit_rejection_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "error": "Missing required fields",
                "missingFields": ["Company Name"]
            })))
            .mount(&server)
            .await;

        let response = client(&server).submit(&payload()).await.unwrap();
        assert!(!response.success);
        assert_eq!(response.missing_fields, vec!["Company Name".to_string()]);
    }

    #[tokio::test]
    async fn test_submit_non_json_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SUBMIT_PATH))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let result = client(&server).submit(&payload()).await;
        assert!(matches!(result, Err(SubmitError::InvalidResponse(_))));
    }
}
