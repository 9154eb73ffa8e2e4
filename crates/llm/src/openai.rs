//! OpenAI-compatible chat completion backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use leadcall_core::{GenerateRequest, LanguageModel, Turn, TurnRole};

use crate::LlmError;

/// Configuration for the chat completion client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL up to and excluding `/chat/completions`
    pub endpoint: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_tokens: 256,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Chat completion client over the OpenAI wire format
#[derive(Debug)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "oracle API key not set; set it via environment or config".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: system.to_string(),
        });
        for turn in turns {
            messages.push(ChatMessage {
                role: match turn.role {
                    TurnRole::Assistant => "assistant",
                    TurnRole::User => "user",
                },
                content: turn.content.clone(),
            });
        }

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.endpoint))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {status}: {body}")));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".to_string()));
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn generate(&self, request: GenerateRequest) -> leadcall_core::Result<String> {
        let reply = self.complete(&request.system, &request.turns).await?;
        tracing::debug!(model = %self.config.model, chars = reply.len(), "oracle reply");
        Ok(reply)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = OpenAiClient::new(OpenAiConfig::default()).unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
    }

    #[test]
    fn config_builder_applies_fields() {
        let config = OpenAiConfig::new("key")
            .with_endpoint("http://localhost:8080/v1")
            .with_model("gpt-4o-mini")
            .with_max_tokens(128)
            .with_temperature(3.0);

        assert_eq!(config.endpoint, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 128);
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn request_serializes_roles_in_order() {
        let request = ChatRequest {
            model: "gpt-4",
            messages: vec![
                ChatMessage { role: "system", content: "You are Steve".into() },
                ChatMessage { role: "assistant", content: "Hi, this is Steve.".into() },
                ChatMessage { role: "user", content: "Who is this?".into() },
            ],
            max_tokens: 256,
            temperature: 0.7,
        };

        let json = serde_json::to_string(&request).unwrap();
        let system = json.find("\"system\"").unwrap();
        let assistant = json.find("\"assistant\"").unwrap();
        let user = json.find("\"user\"").unwrap();
        assert!(system < assistant && assistant < user);
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let json = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Sounds good."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.choices[0].message.content, "Sounds good.");
    }
}
