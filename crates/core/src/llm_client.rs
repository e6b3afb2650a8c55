//! Completion Gateway
//!
//! A stateless relay to an external text-completion service. Callers hand in
//! a prompt and a request kind and get back the raw completion text or a
//! classified error. Nothing is cached, queued or retried.

use crate::config::{Provider, ProviderConfig};
use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc, time::Duration};
use tracing::{debug, error, info};

/// Returned in place of the completion when the provider answers successfully
/// but without any text.
pub const NO_RESPONSE_TEXT: &str = "No response generated.";

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const GOOG_API_KEY_HEADER: &str = "x-goog-api-key";

/// The kind of request being made; selects the sampling parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    /// Opening dialogue for a scenario.
    Dialog,
    /// Rubric evaluation of a teacher response.
    #[default]
    Feedback,
    /// In-character student replies.
    Student,
    /// A short de-escalation tip.
    Hint,
}

impl fmt::Display for CompletionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionKind::Dialog => write!(f, "dialog"),
            CompletionKind::Feedback => write!(f, "feedback"),
            CompletionKind::Student => write!(f, "student"),
            CompletionKind::Hint => write!(f, "hint"),
        }
    }
}

impl FromStr for CompletionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dialog" => Ok(CompletionKind::Dialog),
            "feedback" => Ok(CompletionKind::Feedback),
            "student" => Ok(CompletionKind::Student),
            "hint" => Ok(CompletionKind::Hint),
            other => Err(format!("Unknown completion type: '{}'", other)),
        }
    }
}

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl SamplingParams {
    /// Hints are sampled cooler than everything else; the rest is fixed.
    pub fn for_kind(kind: CompletionKind) -> Self {
        let temperature = match kind {
            CompletionKind::Hint => 0.5,
            _ => 0.7,
        };
        Self {
            temperature,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Failures reported by a completion client. None are retried.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Completion client is misconfigured: {0}")]
    Configuration(String),
    #[error("Invalid API key. Please check your completion provider API key configuration.")]
    InvalidCredentials,
    #[error("API request failed: {status}")]
    Upstream { status: u16, message: String },
    #[error("Failed to reach the completion service: {0}")]
    Transport(String),
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::InvalidCredentials => 401,
            GatewayError::Upstream { status, .. } => *status,
            _ => 500,
        }
    }

    /// Classifies a non-success answer from an upstream provider.
    pub fn from_upstream(status: u16, body: &str) -> Self {
        let bad_key = status == 400 && body.contains("API_KEY_INVALID");
        if bad_key || status == 401 || status == 403 {
            GatewayError::InvalidCredentials
        } else {
            GatewayError::Upstream {
                status,
                message: body.to_string(),
            }
        }
    }
}

/// A text-completion service: one prompt in, one completion out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str, kind: CompletionKind) -> Result<String, GatewayError>;
}

/// Builds the client for the configured provider.
pub fn client_from_config(
    config: &ProviderConfig,
) -> Result<Arc<dyn CompletionClient>, GatewayError> {
    match config.provider {
        Provider::Gemini => {
            info!(model = %config.chat_model, "Using Gemini provider.");
            let api_base = config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string());
            Ok(Arc::new(GeminiClient::new(
                config.api_key.clone(),
                config.chat_model.clone(),
                api_base,
                config.request_timeout,
            )?))
        }
        Provider::OpenAI => {
            info!(model = %config.chat_model, "Using OpenAI provider.");
            let api_base = config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_API_BASE.to_string());
            Ok(Arc::new(OpenAICompatibleClient::new(
                config.api_key.clone(),
                config.chat_model.clone(),
                api_base,
                config.request_timeout,
            )?))
        }
    }
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GatewayError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

// --- Gemini generateContent wire types ---
mod gemini_types {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerateContentRequest {
        pub contents: Vec<Content>,
        pub generation_config: GenerationConfig,
    }
    #[derive(Serialize)]
    pub(super) struct Content {
        pub parts: Vec<Part>,
    }
    #[derive(Serialize)]
    pub(super) struct Part {
        pub text: String,
    }
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub(super) struct GenerationConfig {
        pub temperature: f32,
        pub top_k: u32,
        pub top_p: f32,
        pub max_output_tokens: u32,
    }
    #[derive(Deserialize, Debug, Default)]
    pub(super) struct GenerateContentResponse {
        #[serde(default)]
        pub candidates: Vec<Candidate>,
    }
    #[derive(Deserialize, Debug)]
    pub(super) struct Candidate {
        pub content: Option<CandidateContent>,
    }
    #[derive(Deserialize, Debug)]
    pub(super) struct CandidateContent {
        #[serde(default)]
        pub parts: Vec<CandidatePart>,
    }
    #[derive(Deserialize, Debug)]
    pub(super) struct CandidatePart {
        pub text: Option<String>,
    }

    impl GenerateContentResponse {
        /// Text of the first part of the first candidate, if any.
        pub(super) fn first_text(self) -> Option<String> {
            self.candidates
                .into_iter()
                .next()?
                .content?
                .parts
                .into_iter()
                .next()?
                .text
        }
    }
}

/// Calls Gemini's `generateContent` endpoint directly.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: String,
        api_base: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        if api_key.trim().is_empty() {
            return Err(GatewayError::Configuration("Gemini API key is empty".into()));
        }
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model,
            api_base,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str, kind: CompletionKind) -> Result<String, GatewayError> {
        let params = SamplingParams::for_kind(kind);
        let request = gemini_types::GenerateContentRequest {
            contents: vec![gemini_types::Content {
                parts: vec![gemini_types::Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: gemini_types::GenerationConfig {
                temperature: params.temperature,
                top_k: params.top_k,
                top_p: params.top_p,
                max_output_tokens: params.max_output_tokens,
            },
        };

        debug!(%kind, model = %self.model, "Sending generateContent request");
        let response = self
            .http
            .post(self.endpoint())
            .header(GOOG_API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini API error");
            return Err(GatewayError::from_upstream(status.as_u16(), &body));
        }

        let data: gemini_types::GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(data
            .first_text()
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string()))
    }
}

/// Calls the `chat/completions` endpoint of any OpenAI-compatible API.
///
/// Requests go out through the same single-shot HTTP client as
/// [`GeminiClient`]; the async-openai types only describe the wire format.
pub struct OpenAICompatibleClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl fmt::Debug for OpenAICompatibleClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAICompatibleClient")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer token sent with every request.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    /// * `api_base` - Root of the API, e.g. `https://api.openai.com/v1`.
    /// * `timeout` - Per-request timeout applied to the underlying HTTP client.
    pub fn new(
        api_key: String,
        model: String,
        api_base: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        if api_key.trim().is_empty() {
            return Err(GatewayError::Configuration("OpenAI API key is empty".into()));
        }
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            model,
            api_base,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

fn invalid_request(err: OpenAIError) -> GatewayError {
    GatewayError::Configuration(format!("Invalid chat completion request: {}", err))
}

#[async_trait]
impl CompletionClient for OpenAICompatibleClient {
    async fn complete(&self, prompt: &str, kind: CompletionKind) -> Result<String, GatewayError> {
        let params = SamplingParams::for_kind(kind);
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.to_string())
                    .build()
                    .map_err(invalid_request)?
                    .into(),
            ])
            .temperature(params.temperature)
            .top_p(params.top_p)
            .max_completion_tokens(params.max_output_tokens)
            .build()
            .map_err(invalid_request)?;

        debug!(%kind, model = %self.model, "Sending chat completion request");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "OpenAI-compatible API error");
            return Err(GatewayError::from_upstream(status.as_u16(), &body));
        }

        let data: CreateChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

        Ok(data
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string()))
    }
}
