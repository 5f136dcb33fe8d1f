use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::llm::{LlmError, TextGenerator};
use crate::prompt::{build_prompt, DEFAULT_FIELD_CHARS, PROMPT_VERSION};
use crate::sanitizer::{clean_html, extract_html};
use crate::scraper::ScrapedPage;

/// Sanitized HTML from one successful generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneResult {
    pub html: String,
}

/// Provider failures worth one more try with a smaller prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryableFailureKind {
    Quota,
    TokenLimit,
    RateLimited,
}

/// Maps a provider error onto a retryable kind.
///
/// All message sniffing lives here. Provider error shapes are not standardised,
/// so new providers will likely need additional patterns.
pub fn classify(err: &LlmError) -> Option<RetryableFailureKind> {
    if err.status == Some(429) {
        return Some(RetryableFailureKind::RateLimited);
    }

    let message = err.message.to_lowercase();
    if message.contains("quota") {
        Some(RetryableFailureKind::Quota)
    } else if message.contains("token") {
        Some(RetryableFailureKind::TokenLimit)
    } else if message.contains("429") {
        Some(RetryableFailureKind::RateLimited)
    } else {
        None
    }
}

/// Calls the generation capability and degrades the prompt once on resource exhaustion.
pub struct CloneGenerator {
    provider: Arc<dyn TextGenerator>,
    max_field_chars: usize,
}

impl CloneGenerator {
    pub fn new(provider: Arc<dyn TextGenerator>) -> Self {
        Self {
            provider,
            max_field_chars: DEFAULT_FIELD_CHARS,
        }
    }

    pub fn with_field_limit(mut self, max_field_chars: usize) -> Self {
        self.max_field_chars = max_field_chars;
        self
    }

    /// At most two provider calls: the requested flags, then both flags forced on.
    pub async fn generate(
        &self,
        page: &ScrapedPage,
        truncate_css: bool,
        truncate_content: bool,
    ) -> Result<CloneResult> {
        let err = match self.attempt(page, truncate_css, truncate_content).await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        let already_degraded = truncate_css && truncate_content;
        match classify(&err) {
            Some(kind) if !already_degraded => {
                warn!(
                    "{} generation hit {:?} ({}), retrying with truncated input",
                    self.provider.name(),
                    kind,
                    err
                );
                self.attempt(page, true, true)
                    .await
                    .map_err(|e| AppError::GenerationError(e.to_string()))
            }
            _ => Err(AppError::GenerationError(err.to_string())),
        }
    }

    async fn attempt(
        &self,
        page: &ScrapedPage,
        truncate_css: bool,
        truncate_content: bool,
    ) -> std::result::Result<CloneResult, LlmError> {
        let prompt = build_prompt(page, truncate_css, truncate_content, self.max_field_chars);
        info!(
            "Calling {} with {} char prompt {} (truncate_css={}, truncate_content={})",
            self.provider.name(),
            prompt.len(),
            PROMPT_VERSION,
            truncate_css,
            truncate_content
        );

        let raw = self.provider.generate(&prompt).await?;
        Ok(CloneResult {
            html: clean_html(&extract_html(&raw)),
        })
    }
}
