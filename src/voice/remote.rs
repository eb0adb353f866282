//! Remote voice-call client.
//!
//! POSTs `{base_url}/call` with bearer auth. The call is fire-and-forget: only
//! success or failure is reported back, the response body is ignored.

use std::sync::RwLock;

use thiserror::Error;

use crate::config::VoiceConfig;

const COACH_PERSONA: &str =
    "You are an encouraging running coach. Speak in a motivating, energetic tone.";

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("no voice-service API key configured")]
    MissingApiKey,

    #[error("voice request failed: {0}")]
    Request(String),

    #[error("voice endpoint returned HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for VoiceError {
    fn from(e: reqwest::Error) -> Self {
        VoiceError::Request(e.to_string())
    }
}

pub struct VapiClient {
    client: reqwest::Client,
    config: VoiceConfig,
    api_key: RwLock<Option<String>>,
}

impl VapiClient {
    pub fn from_config(config: &VoiceConfig) -> Self {
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

    /// Whether a non-empty API key is configured.
    pub fn has_key(&self) -> bool {
        self.api_key.read().unwrap().as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Replace the bearer key used by later calls.
    pub fn set_api_key(&self, key: Option<String>) {
        *self.api_key.write().unwrap() = key;
    }

    fn endpoint(&self) -> String {
        format!("{}/call", self.config.base_url.trim_end_matches('/'))
    }

    /// JSON body for a call speaking `message`.
    pub fn payload(&self, message: &str) -> serde_json::Value {
        serde_json::json!({
            "assistant": {
                "model": {
                    "provider": "openai",
                    "model": "gpt-3.5-turbo",
                    "messages": [ { "role": "system", "content": COACH_PERSONA } ]
                },
                "voice": {
                    "provider": self.config.voice_provider,
                    "voiceId": self.config.voice_id
                }
            },
            "phoneNumberId": null,
            "customer": { "number": null },
            "message": message
        })
    }

    /// Start a call that speaks `message`.
    pub async fn call(&self, message: &str) -> Result<(), VoiceError> {
        let key = match self.api_key.read().unwrap().clone() {
            Some(k) if !k.is_empty() => k,
            _ => return Err(VoiceError::MissingApiKey),
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(key)
            .json(&self.payload(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(base_url: &str, api_key: Option<&str>) -> VoiceConfig {
        VoiceConfig {
            base_url: base_url.into(),
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
            ..VoiceConfig::default()
        }
    }

    #[test]
    fn payload_shape() {
        let client = VapiClient::from_config(&VoiceConfig::default());
        let body = client.payload("Great run! Keep going!");
        assert_eq!(body["message"], "Great run! Keep going!");
        assert_eq!(body["assistant"]["voice"]["provider"], "elevenlabs");
        assert_eq!(body["assistant"]["voice"]["voiceId"], "pNInz6obpgDQGcFmaJgB");
        let persona = body["assistant"]["model"]["messages"][0]["content"]
            .as_str()
            .unwrap();
        assert!(persona.contains("encouraging running coach"));
    }

    #[tokio::test]
    async fn missing_key_is_rejected_locally() {
        let client = VapiClient::from_config(&make_config("http://127.0.0.1:9", Some("")));
        assert!(!client.has_key());
        assert!(matches!(
            client.call("hi").await,
            Err(VoiceError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn posts_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call"))
            .and(header("authorization", "Bearer vk"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = VapiClient::from_config(&make_config(&server.uri(), Some("vk")));
        client.call("hello").await.unwrap();
    }

    #[tokio::test]
    async fn replaced_key_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer new-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = VapiClient::from_config(&make_config(&server.uri(), None));
        assert!(!client.has_key());
        client.set_api_key(Some("new-key".into()));
        assert!(client.has_key());
        client.call("hello").await.unwrap();
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = VapiClient::from_config(&make_config(&server.uri(), Some("vk")));
        assert!(matches!(
            client.call("hello").await,
            Err(VoiceError::Status(401))
        ));
    }
}
