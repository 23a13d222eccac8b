use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::inference::backend::{BackendError, StructuredTextGenerator};

/// Longest backend error body kept in an error message.
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL up to and including the API version, e.g. `http://localhost:11434/v1`
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    content: Option<String>,
}

/// Talks to any server implementing the OpenAI chat completions API in JSON mode
/// (OpenAI, Ollama, vLLM, llama.cpp server, ...).
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleClient {
    pub fn new(config: OpenAiCompatibleConfig) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    pub fn with_http_client(http: reqwest::Client, config: OpenAiCompatibleConfig) -> Self {
        Self { http, config }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl StructuredTextGenerator for OpenAiCompatibleClient {
    #[tracing::instrument(level = "debug", skip_all)]
    async fn generate_structured_json(&self, prompt: &str) -> Result<String, BackendError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.config.temperature,
        };

        let mut request = self.http.post(self.completions_url()).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(model = %self.config.model, %status, "LLM backend responded");
        if !status.is_success() {
            let body = error_body(response.text().await);
            return Err(BackendError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(BackendError::EmptyReply)
    }
}

/// Body of a failed backend response, cut to `MAX_ERROR_BODY_LEN` bytes.
fn error_body(body: reqwest::Result<String>) -> String {
    let mut body = body.unwrap_or_else(|err| format!("<unreadable body: {err}>"));
    if body.len() > MAX_ERROR_BODY_LEN {
        let cut = (0..=MAX_ERROR_BODY_LEN)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        body.truncate(cut);
    }
    body
}
