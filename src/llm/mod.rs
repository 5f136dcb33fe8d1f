//! Hosted text-generation backends.
//!
//! Every backend implements [`TextGenerator`]; the one to use is picked once at
//! startup from `LLM_CHOICE` and shared as an `Arc<dyn TextGenerator>`.

mod claude;
mod gemini;
mod openrouter;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::config::{LlmChoice, LlmSettings};
use crate::error::{AppError, Result};

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;

/// Failure reported by a generation backend.
///
/// `status` carries the HTTP status when the provider answered with one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmError {
    pub status: Option<u16>,
    pub message: String,
}

impl LlmError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => LlmError::with_status(status.as_u16(), err.to_string()),
            None => LlmError::new(err.to_string()),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends one prompt and returns the model's raw text answer.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, LlmError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}

/// Builds the configured provider.
pub fn provider_from_settings(settings: &LlmSettings) -> Result<Arc<dyn TextGenerator>> {
    let client = http_client().map_err(|e| AppError::ConfigError(e.to_string()))?;

    let provider: Arc<dyn TextGenerator> = match settings.choice {
        LlmChoice::Gemini => Arc::new(GeminiProvider::new(client, &settings.api_key, &settings.model)),
        LlmChoice::Claude => Arc::new(ClaudeProvider::new(
            client,
            &settings.api_key,
            &settings.model,
            settings.max_tokens,
        )),
        LlmChoice::OpenRouter => Arc::new(OpenRouterProvider::new(client, &settings.api_key, &settings.model)),
    };

    tracing::info!("Using {} provider with model {}", provider.name(), settings.model);
    Ok(provider)
}

fn http_client() -> std::result::Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(LlmError::from)
}

/// Turns a non-success response into an `LlmError` carrying the provider's body.
async fn json_body(response: Response) -> std::result::Result<serde_json::Value, LlmError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::with_status(status.as_u16(), body));
    }
    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(choice: LlmChoice) -> LlmSettings {
        LlmSettings {
            choice,
            api_key: "test-key".into(),
            model: "test-model".into(),
            max_tokens: 100,
        }
    }

    #[test]
    fn test_provider_selection() {
        assert_eq!(provider_from_settings(&settings(LlmChoice::Gemini)).unwrap().name(), "gemini");
        assert_eq!(provider_from_settings(&settings(LlmChoice::Claude)).unwrap().name(), "claude");
        assert_eq!(
            provider_from_settings(&settings(LlmChoice::OpenRouter)).unwrap().name(),
            "openrouter"
        );
    }

    #[test]
    fn test_error_display_includes_status() {
        assert_eq!(LlmError::with_status(429, "slow down").to_string(), "HTTP 429: slow down");
        assert_eq!(LlmError::new("boom").to_string(), "boom");
    }
}
