// src/generate/openai.rs

//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{GenerationError, PromptdagError, Result};
use crate::generate::{GenerateFuture, GenerationRequest, Generator};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

/// Blocking-per-call client; one HTTP request per [`Generator::generate`].
pub struct OpenAiGenerator {
    api_key: String,
    api_base: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl OpenAiGenerator {
    pub fn new(api_key: impl Into<String>, api_base: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PromptdagError::ConfigError(format!(
                "{API_KEY_ENV} is empty"
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PromptdagError::ConfigError(format!("building HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build a client from `OPENAI_API_KEY`.
    ///
    /// A missing key is a configuration error raised before any task runs.
    pub fn from_env(api_base: &str, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            PromptdagError::ConfigError(format!(
                "{API_KEY_ENV} is not set; export it or add it to a .env file"
            ))
        })?;
        Self::new(api_key, api_base, timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    async fn complete(&self, request: &GenerationRequest) -> std::result::Result<String, GenerationError> {
        let mut body = serde_json::json!({
            "model": &request.options.model,
            "temperature": request.options.temperature,
            "messages": [
                { "role": "system", "content": &request.persona },
                { "role": "user", "content": &request.prompt },
            ],
        });
        if let Some(max_tokens) = request.options.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        debug!(
            task = %request.task,
            model = %request.options.model,
            prompt_chars = request.prompt.len(),
            "sending chat completion request"
        );

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(classify_status(status, text));
        }

        parse_completion(&text)
    }
}

impl Generator for OpenAiGenerator {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> GenerateFuture<'a> {
        Box::pin(self.complete(request))
    }
}

/// Map a non-success HTTP status to a [`GenerationError`].
pub fn classify_status(status: StatusCode, body: String) -> GenerationError {
    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GenerationError::Unauthorized { status: code, body }
        }
        StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => {
            GenerationError::QuotaExceeded { status: code, body }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GenerationError::Timeout,
        _ => GenerationError::Status { status: code, body },
    }
}

/// Extract the generated text from a chat-completions response body.
pub fn parse_completion(body: &str) -> std::result::Result<String, GenerationError> {
    let completion: ChatCompletion =
        serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("response has no choices".to_string()))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(GenerationError::Filtered(refusal));
    }
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(GenerationError::Filtered(
            "finish_reason = content_filter".to_string(),
        ));
    }

    if let Some(usage) = completion.usage {
        info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "chat completion received"
        );
    }

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationError::EmptyOutput),
    }
}
