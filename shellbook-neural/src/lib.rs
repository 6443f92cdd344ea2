use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod privacy;
pub mod prompt;

use privacy::PrivacyGuard;
use prompt::Environment;

/// Errors surfaced by an assist backend. None of them are fatal to a session.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("no API key configured (set {0})")]
    MissingCredential(String),

    #[error("failed to contact the model service: {0}")]
    Transport(String),

    #[error("model service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for AssistError {
    fn from(err: reqwest::Error) -> Self {
        AssistError::Transport(err.to_string())
    }
}

/// The interface for any model backend.
///
/// Both calls return raw markdown; extracting commands from it is the
/// caller's job.
#[async_trait]
pub trait AssistBackend: Send + Sync {
    /// Turn a natural-language request into markdown containing commands.
    async fn translate(&self, request: &str) -> Result<String, AssistError>;

    /// Propose a corrected command for one that failed with `error`.
    async fn suggest_fix(&self, command: &str, error: &str) -> Result<String, AssistError>;
}

/// Direct HTTP client for any OpenAI-compatible chat-completions server.
/// Uses reqwest instead of async-openai to avoid version breakage.
pub struct ChatClient {
    http: Client,
    base_url: String,
    model_name: String,
    api_key: String,
    scrub: bool,
    env: Environment,
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model_name)
            .field("scrub", &self.scrub)
            .finish()
    }
}

impl ChatClient {
    pub fn new(base_url: &str, model: &str, api_key: impl Into<String>) -> Self {
        info!("Assist client targeting {} ({})", base_url, model);
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model_name: model.to_string(),
            api_key: api_key.into(),
            scrub: true,
            env: Environment::detect(),
        }
    }

    /// Toggle credential scrubbing of outgoing prompts (on by default).
    pub fn with_scrubbing(mut self, scrub: bool) -> Self {
        self.scrub = scrub;
        self
    }

    /// Override the environment description sent to the model.
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn model(&self) -> &str {
        &self.model_name
    }

    fn prepare(&self, prompt: String) -> String {
        if !self.scrub {
            return prompt;
        }
        let safe = PrivacyGuard::scrub(&prompt);
        if safe != prompt {
            warn!("Prompt contained sensitive data; scrubbed before sending.");
        }
        safe
    }

    /// Send a chat completion request and return the content string.
    async fn chat(&self, user_prompt: String) -> Result<String, AssistError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model_name,
            "messages": [
                { "role": "system", "content": prompt::SYSTEM_ROLE },
                { "role": "user", "content": self.prepare(user_prompt) },
            ],
            "stream": false
        });

        debug!("POST {}", url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let end = text
                .char_indices()
                .nth(200)
                .map(|(i, _)| i)
                .unwrap_or(text.len());
            return Err(AssistError::Status {
                status,
                body: text[..end].to_string(),
            });
        }

        let parsed: Value = serde_json::from_str(&text)
            .map_err(|e| AssistError::MalformedResponse(e.to_string()))?;

        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AssistError::MalformedResponse("missing message content".into()))?
            .trim()
            .to_string();

        debug!("Model replied with {} bytes", content.len());
        Ok(content)
    }
}

#[async_trait]
impl AssistBackend for ChatClient {
    async fn translate(&self, request: &str) -> Result<String, AssistError> {
        info!("Translating request: {}", request);
        self.chat(prompt::translate_prompt(request, &self.env)).await
    }

    async fn suggest_fix(&self, command: &str, error: &str) -> Result<String, AssistError> {
        info!("Requesting fix for: {}", command);
        self.chat(prompt::fix_prompt(command, error, &self.env)).await
    }
}

/// Backend installed when no credential is available. Every call fails with
/// [`AssistError::MissingCredential`] so manual cells keep working.
#[derive(Debug, Clone)]
pub struct UnavailableAssist {
    key_name: String,
}

impl UnavailableAssist {
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
        }
    }
}

#[async_trait]
impl AssistBackend for UnavailableAssist {
    async fn translate(&self, _request: &str) -> Result<String, AssistError> {
        Err(AssistError::MissingCredential(self.key_name.clone()))
    }

    async fn suggest_fix(&self, _command: &str, _error: &str) -> Result<String, AssistError> {
        Err(AssistError::MissingCredential(self.key_name.clone()))
    }
}
