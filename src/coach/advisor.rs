//! Core `FeedbackAdvisor` trait and the `GeminiAdvisor` implementation.
//!
//! `GeminiAdvisor` calls the generative-language `generateContent` endpoint.
//! All connection details come from [`AdvisorConfig`]; nothing is hardcoded.

use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AdvisorConfig;
use crate::track::RunSummary;

use super::feedback::Feedback;
use super::prompt::build_analysis_prompt;
use super::reply::parse_feedback;

// ---------------------------------------------------------------------------
// AdvisorError
// ---------------------------------------------------------------------------

/// Errors that can occur while analysing a run remotely.
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// No API key configured; the remote call was not attempted.
    #[error("no text-generation API key configured")]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("analysis request timed out")]
    Timeout,

    /// The endpoint answered with a non-success status.
    #[error("analysis endpoint returned HTTP {0}")]
    Status(u16),

    /// The response body or the generated text could not be parsed.
    #[error("failed to parse analysis reply: {0}")]
    Parse(String),

    /// The reply parsed but left a feedback field empty.
    #[error("analysis reply is missing feedback fields")]
    Incomplete,
}

impl From<reqwest::Error> for AdvisorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AdvisorError::Timeout
        } else {
            AdvisorError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// FeedbackAdvisor trait
// ---------------------------------------------------------------------------

/// Async trait for turning a run summary into feedback.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn FeedbackAdvisor>` and called from spawned tasks.
#[async_trait]
pub trait FeedbackAdvisor: Send + Sync {
    async fn analyze(&self, run: &RunSummary) -> Result<Feedback, AdvisorError>;

    /// Replace the API key used by later calls. Advisors without one ignore it.
    fn set_api_key(&self, _key: Option<String>) {}
}

// ---------------------------------------------------------------------------
// GeminiAdvisor
// ---------------------------------------------------------------------------

pub struct GeminiAdvisor {
    client: reqwest::Client,
    config: AdvisorConfig,
    api_key: RwLock<Option<String>>,
}

impl GeminiAdvisor {
    /// Build a `GeminiAdvisor` from application config.
    ///
    /// The HTTP client carries the per-request timeout from
    /// `config.timeout_secs`; a default client is used if the builder fails.
    pub fn from_config(config: &AdvisorConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
            api_key: RwLock::new(config.api_key.clone()),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl FeedbackAdvisor for GeminiAdvisor {
    async fn analyze(&self, run: &RunSummary) -> Result<Feedback, AdvisorError> {
        let key = self.api_key.read().unwrap().clone().unwrap_or_default();
        if key.is_empty() {
            return Err(AdvisorError::MissingApiKey);
        }

        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": build_analysis_prompt(run) } ] }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::Status(status.as_u16()));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AdvisorError::Parse(e.to_string()))?;

        let text = json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| AdvisorError::Parse("reply has no candidate text".into()))?;

        parse_feedback(text)
    }

    fn set_api_key(&self, key: Option<String>) {
        *self.api_key.write().unwrap() = key;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-pro:generateContent";

    fn make_config(base_url: &str, api_key: Option<&str>) -> AdvisorConfig {
        AdvisorConfig {
            base_url: base_url.into(),
            api_key: api_key.map(|s| s.to_string()),
            model: "gemini-pro".into(),
            timeout_secs: 5,
        }
    }

    fn run() -> RunSummary {
        RunSummary::new(1_800, 5.0, 13.0, Vec::new(), Utc::now())
    }

    fn candidate(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": text } ] } } ]
        })
    }

    #[test]
    fn advisor_is_object_safe() {
        let advisor: Box<dyn FeedbackAdvisor> =
            Box::new(GeminiAdvisor::from_config(&AdvisorConfig::default()));
        drop(advisor);
    }

    #[tokio::test]
    async fn missing_key_skips_request() {
        let advisor = GeminiAdvisor::from_config(&make_config("http://127.0.0.1:9", None));
        assert!(matches!(
            advisor.analyze(&run()).await,
            Err(AdvisorError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn parses_candidate_text() {
        let server = MockServer::start().await;
        let reply = "Here is your analysis:\n{\"summary\":\"Nice 5k\",\"performance\":\"Even\",\
                     \"suggestions\":[\"Hills\"],\"motivation\":\"Go!\"}";
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate(reply)))
            .expect(1)
            .mount(&server)
            .await;

        let advisor = GeminiAdvisor::from_config(&make_config(&server.uri(), Some("test-key")));
        let fb = advisor.analyze(&run()).await.unwrap();
        assert_eq!(fb.summary, "Nice 5k");
        assert_eq!(fb.suggestions, vec!["Hills"]);
    }

    #[tokio::test]
    async fn key_set_at_runtime_is_used() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("key", "fresh-key"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let advisor = GeminiAdvisor::from_config(&make_config(&server.uri(), None));
        assert!(matches!(
            advisor.analyze(&run()).await,
            Err(AdvisorError::MissingApiKey)
        ));

        advisor.set_api_key(Some("fresh-key".into()));
        assert!(matches!(
            advisor.analyze(&run()).await,
            Err(AdvisorError::Status(403))
        ));

        advisor.set_api_key(None);
        assert!(matches!(
            advisor.analyze(&run()).await,
            Err(AdvisorError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let advisor = GeminiAdvisor::from_config(&make_config(&server.uri(), Some("k")));
        assert!(matches!(
            advisor.analyze(&run()).await,
            Err(AdvisorError::Status(403))
        ));
    }

    #[tokio::test]
    async fn success_without_candidates_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let advisor = GeminiAdvisor::from_config(&make_config(&server.uri(), Some("k")));
        assert!(matches!(
            advisor.analyze(&run()).await,
            Err(AdvisorError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn prompt_carries_run_statistics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidate("garbage")))
            .mount(&server)
            .await;

        let advisor = GeminiAdvisor::from_config(&make_config(&server.uri(), Some("k")));
        let _ = advisor.analyze(&run()).await;

        let requests = server.received_requests().await.expect("recording enabled");
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("Distance: 5.00 km"));
        assert!(text.contains("Duration: 30:00"));
    }
}
