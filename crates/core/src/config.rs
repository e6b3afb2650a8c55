use std::{fmt, time::Duration};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported completion providers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
}

/// Everything needed to talk to the completion provider, read once at startup.
#[derive(Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: String,
    pub chat_model: String,
    pub api_base: Option<String>,
    pub request_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("chat_model", &self.chat_model)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl ProviderConfig {
    /// Loads provider configuration from environment variables.
    ///
    /// The API key of the selected provider is required; without it the
    /// service must not start.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider_str =
            std::env::var("COMPLETION_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "COMPLETION_PROVIDER".to_string(),
                    format!("'{}' is not a supported provider", other),
                ));
            }
        };

        let (key_var, base_var, default_model) = match provider {
            Provider::Gemini => ("GEMINI_API_KEY", "GEMINI_API_BASE", "gemini-2.5-flash-lite"),
            Provider::OpenAI => ("OPENAI_API_KEY", "OPENAI_API_BASE", "gpt-4o"),
        };

        let api_key = std::env::var(key_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::MissingVar(format!(
                    "{} must be set for '{}' provider",
                    key_var,
                    provider_str.to_lowercase()
                ))
            })?;

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| default_model.to_string());
        let api_base = std::env::var(base_var).ok();

        let timeout_str =
            std::env::var("REQUEST_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "REQUEST_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a number of seconds", timeout_str),
            )
        })?;

        Ok(Self {
            provider,
            api_key,
            chat_model,
            api_base,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
