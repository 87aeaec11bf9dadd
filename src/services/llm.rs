// src/services/llm.rs

#[cfg(any(test, feature = "test-util"))]
use std::collections::VecDeque;
#[cfg(any(test, feature = "test-util"))]
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Output length and temperature for one completion call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Sampling {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// A single request to the language model: ordered messages plus sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub sampling: Sampling,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, sampling: Sampling) -> Self {
        Self { messages, sampling }
    }

    /// Shorthand for the common case of one user prompt.
    pub fn prompt(prompt: impl Into<String>, sampling: Sampling) -> Self {
        Self::new(vec![ChatMessage::user(prompt)], sampling)
    }

    /// Content of the last user message, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

/// The narrow boundary to the text-generation service.
///
/// Implementations return the model's free-form text, trimmed. Nothing is
/// promised about its structure.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn generate(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// OpenAI-compatible `/chat/completions` client.
pub struct OpenAiGateway {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(
            &config.openai_base_url,
            &config.openai_api_key,
            &config.llm_model,
            Duration::from_secs(config.llm_timeout_secs),
        )
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    #[tracing::instrument(skip(self, request), fields(model = %self.model, max_tokens = request.sampling.max_tokens))]
    async fn generate(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "max_tokens": request.sampling.max_tokens,
            "temperature": request.sampling.temperature,
        });

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status, "Language model returned an error status");
            return Err(LlmError::Status { status, body });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in completion".to_string()))?;

        Ok(content.trim().to_string())
    }
}

static RE_CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?").unwrap());

/// Removes every markdown code fence marker and trims the result.
pub fn strip_code_fences(text: &str) -> String {
    RE_CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Deterministic gateway that replays canned replies in order and records
/// every request it receives. Once the script runs out the last reply repeats.
#[cfg(any(test, feature = "test-util"))]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    last: Mutex<Option<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedGateway {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(replies.into_iter().map(|r| Ok(r.into())))
    }

    pub fn with_results<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = Result<String, LlmError>>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A gateway whose every call fails as unreachable.
    pub fn unavailable() -> Self {
        Self::with_results([Err(LlmError::Transport("connection refused".to_string()))])
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn generate(&self, request: CompletionRequest) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let next = self.replies.lock().ok().and_then(|mut q| q.pop_front());
        let mut last = self
            .last
            .lock()
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        match next {
            Some(Ok(reply)) => {
                *last = Some(reply.clone());
                Ok(reply)
            }
            Some(Err(err)) => {
                *last = None;
                Err(err)
            }
            None => match last.as_ref() {
                Some(reply) => Ok(reply.clone()),
                None => Err(LlmError::Transport("connection refused".to_string())),
            },
        }
    }
}
