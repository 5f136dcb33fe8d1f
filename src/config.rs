use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Which hosted model answers generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmChoice {
    Gemini,
    Claude,
    OpenRouter,
}

impl FromStr for LlmChoice {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(LlmChoice::Gemini),
            "claude" => Ok(LlmChoice::Claude),
            "openrouter" => Ok(LlmChoice::OpenRouter),
            other => Err(AppError::ConfigError(format!("Unsupported LLM provider: {}", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub choice: LlmChoice,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Limits and timings for the content extractor.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    /// Budget for each linked stylesheet. Capped at half the attempt timeout.
    pub stylesheet_timeout: Duration,
    pub backoff: Duration,
    /// Top-level body children kept as "above the fold".
    pub max_sections: usize,
    pub max_css_chars: usize,
    pub error_log: PathBuf,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            attempt_timeout: Duration::from_secs(20),
            stylesheet_timeout: Duration::from_secs(5),
            backoff: Duration::from_secs(1),
            max_sections: 5,
            max_css_chars: 10_000,
            error_log: PathBuf::from("scrape_errors.log"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub llm: LlmSettings,
    pub scrape: ScrapeConfig,
    pub clones_dir: PathBuf,
    pub max_content_chars: usize,
    pub max_output_bytes: usize,
    pub request_timeout: Duration,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = parse_var("PORT", 8000)?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let choice: LlmChoice = env::var("LLM_CHOICE")
            .unwrap_or_else(|_| "gemini".to_string())
            .parse()?;
        let llm = load_llm_settings(choice)?;

        let scrape = ScrapeConfig {
            max_retries: parse_var("SCRAPE_MAX_RETRIES", 3)?,
            attempt_timeout: Duration::from_secs(parse_var("SCRAPE_TIMEOUT_SECS", 20)?),
            stylesheet_timeout: Duration::from_secs(parse_var("SCRAPE_STYLESHEET_TIMEOUT_SECS", 5)?),
            backoff: Duration::from_millis(parse_var("SCRAPE_BACKOFF_MS", 1000)?),
            max_sections: parse_var("SCRAPE_MAX_SECTIONS", 5)?,
            max_css_chars: parse_var("MAX_CSS_CHARS", 10_000)?,
            error_log: env::var("ERROR_LOG_PATH")
                .unwrap_or_else(|_| "scrape_errors.log".to_string())
                .into(),
        };
        if scrape.max_retries == 0 {
            return Err(AppError::ConfigError("SCRAPE_MAX_RETRIES must be at least 1".to_string()));
        }

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            llm,
            scrape,
            clones_dir: env::var("CLONES_DIR").unwrap_or_else(|_| "clones".to_string()).into(),
            max_content_chars: parse_var("MAX_CONTENT_CHARS", 10_000)?,
            max_output_bytes: parse_var("MAX_OUTPUT_BYTES", 1_000_000)?,
            request_timeout: Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", 180)?),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|v| !v.trim().is_empty()),
        })
    }
}

fn load_llm_settings(choice: LlmChoice) -> Result<LlmSettings> {
    let (key_var, model_var, default_model) = match choice {
        LlmChoice::Gemini => ("GEMINI_API_KEY", "GEMINI_MODEL", "gemini-1.5-flash-latest"),
        LlmChoice::Claude => ("CLAUDE_API_KEY", "CLAUDE_MODEL", "claude-3-5-sonnet-latest"),
        LlmChoice::OpenRouter => ("OPENROUTER_API_KEY", "OPENROUTER_MODEL", "deepseek/deepseek-chat-v3-0324"),
    };

    let api_key = env::var(key_var)
        .map_err(|_| AppError::ConfigError(format!("{} environment variable is not set", key_var)))?;

    Ok(LlmSettings {
        choice,
        api_key,
        model: env::var(model_var).unwrap_or_else(|_| default_model.to_string()),
        max_tokens: parse_var("LLM_MAX_TOKENS", 4000)?,
    })
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
