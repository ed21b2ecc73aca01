use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ReasoningConfig;

/// The only collaborator failure that crosses the pipeline boundary: without
/// a completion there is no decision to degrade into.
#[derive(Debug, thiserror::Error)]
pub enum ReasoningServiceError {
    #[error("reasoning service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("reasoning service returned status {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("reasoning service returned no completion content")]
    EmptyCompletion,
}

/// Single blocking-from-the-caller's-view text completion. No streaming, no
/// retry; timeouts surface as `Transport` like any other failed call.
#[async_trait]
pub trait ReasoningGateway: Send + Sync + std::fmt::Debug {
    async fn complete(&self, prompt: &str, max_tokens: u32)
        -> Result<String, ReasoningServiceError>;
}

/// Reasoning client speaking the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicMessagesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

const ANTHROPIC_VERSION: &str = "2023-06-01";

impl AnthropicMessagesClient {
    pub fn new(config: &ReasoningConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

// Manual impl keeps the API key out of logs.
impl std::fmt::Debug for AnthropicMessagesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicMessagesClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [MessageParam<'a>; 1],
}

#[derive(Debug, Serialize)]
struct MessageParam<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ReasoningGateway for AnthropicMessagesClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ReasoningServiceError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: [MessageParam {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ReasoningServiceError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        let completion: MessagesResponse = response.json().await?;
        completion
            .content
            .into_iter()
            .find_map(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or(ReasoningServiceError::EmptyCompletion)
    }
}
