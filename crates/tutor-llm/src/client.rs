use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "mistral-medium";
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: PromptRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: PromptRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: PromptRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<PromptMessage>,
    pub temperature: Option<f32>,
}

/// The first choice of a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from LLM provider")]
    EmptyResponse,
}

/// One chat-completion call against the upstream model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;
}

// -- Mistral wire format --

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for Mistral's `POST /v1/chat/completions`.
#[derive(Clone)]
pub struct MistralClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl MistralClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for MistralClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        debug!("Sending {} messages to {}", request.messages.len(), self.model);
        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("LLM provider returned {}", status);
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let parsed: ChatCompletionResponse = resp.json().await?;
        completion_from(parsed)
    }
}

fn completion_from(resp: ChatCompletionResponse) -> Result<Completion, LlmError> {
    let choice = resp.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
    match choice.message.content {
        Some(content) if !content.is_empty() => Ok(Completion {
            content,
            finish_reason: choice.finish_reason,
        }),
        _ => Err(LlmError::EmptyResponse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_provider_format() {
        let messages = vec![PromptMessage::system("be kind"), PromptMessage::user("2+2?")];
        let body = ChatCompletionBody {
            model: DEFAULT_MODEL,
            messages: &messages,
            temperature: Some(0.3),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "mistral-medium");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "2+2?");
        assert!((json["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);

        let body = ChatCompletionBody { model: DEFAULT_MODEL, messages: &messages, temperature: None };
        assert!(serde_json::to_value(&body).unwrap().get("temperature").is_none());
    }

    #[test]
    fn first_choice_becomes_completion() {
        let resp: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"hi"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        let completion = completion_from(resp).unwrap();
        assert_eq!(completion.content, "hi");
        assert_eq!(completion.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn missing_content_is_empty_response() {
        let resp: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).unwrap();
        assert!(matches!(completion_from(resp), Err(LlmError::EmptyResponse)));

        let resp: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(completion_from(resp), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = MistralClient::new("key", DEFAULT_MODEL, "http://localhost:8080/");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
