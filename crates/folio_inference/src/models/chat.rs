use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::config::EnrichConfig;
use folio_core::{CompletionRequest, Error, InferenceModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

/// Any backend speaking the OpenAI `/chat/completions` protocol.
pub struct ChatModel {
    client: Client,
    label: String,
    api_key: String,
    base_url: String,
    model: String,
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("client", &"<reqwest::Client>")
            .field("label", &self.label)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatModel {
    pub fn new(
        label: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            label: label.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    /// Builds a client for one of the named presets (`gemini`, `deepseek`)
    /// or for `openai`, which needs an explicit URL and model name.
    /// `model_url` and `model_name` override the preset values.
    pub fn from_config(config: &EnrichConfig) -> Result<Self> {
        let preset = config.model.to_ascii_lowercase();
        let (label, default_url, default_model) = match preset.as_str() {
            "gemini" => ("Gemini", Some(GEMINI_BASE_URL), Some(GEMINI_MODEL)),
            "deepseek" => ("DeepSeek", Some(DEEPSEEK_BASE_URL), Some(DEEPSEEK_MODEL)),
            "openai" => ("OpenAI-compatible", None, None),
            other => return Err(Error::Config(format!("Unknown model backend: {other}"))),
        };

        let base_url = config
            .model_url
            .as_deref()
            .or(default_url)
            .ok_or_else(|| Error::Config(format!("{label} backend needs a model URL")))?;
        let model = config
            .model_name
            .as_deref()
            .or(default_model)
            .ok_or_else(|| Error::Config(format!("{label} backend needs a model name")))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{label} API key is required")))?;

        Self::new(label, base_url, model, api_key, config.request_timeout)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl InferenceModel for ChatModel {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            response_format: request.json_response.then_some(ResponseFormat {
                kind: "json_object",
            }),
            temperature: 0.7,
        };

        debug!("Sending {} chars to {} ({})", request.user.len(), self.label, self.model);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Backend {
                status: status.as_u16(),
                message: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::Backend {
                status: status.as_u16(),
                message: "response contained no message content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            json_response: true,
        }
    }

    fn model(server: &MockServer) -> ChatModel {
        ChatModel::new("Test", server.uri(), "test-model", "secret", Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"ok\": true}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = model(&server).complete(&request()).await.unwrap();
        assert_eq!(text, "{\"ok\": true}");
    }

    #[tokio::test]
    async fn test_error_status_becomes_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        match model(&server).complete(&request()).await.unwrap_err() {
            Error::Backend { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        assert!(model(&server).complete(&request()).await.is_err());
    }

    #[test]
    fn test_presets() {
        let config = EnrichConfig {
            model: "deepseek".to_string(),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let model = ChatModel::from_config(&config).unwrap();
        assert_eq!(model.base_url(), DEEPSEEK_BASE_URL);
        assert_eq!(model.model(), DEEPSEEK_MODEL);

        let config = EnrichConfig {
            model: "gemini".to_string(),
            api_key: Some("key".to_string()),
            model_name: Some("gemini-2.0-pro".to_string()),
            ..Default::default()
        };
        let model = ChatModel::from_config(&config).unwrap();
        assert_eq!(model.base_url(), GEMINI_BASE_URL);
        assert_eq!(model.model(), "gemini-2.0-pro");
    }

    #[test]
    fn test_missing_key_or_url_is_a_config_error() {
        let config = EnrichConfig {
            model: "gemini".to_string(),
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(ChatModel::from_config(&config), Err(Error::Config(_))));

        let config = EnrichConfig {
            model: "openai".to_string(),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(matches!(ChatModel::from_config(&config), Err(Error::Config(_))));
    }
}
