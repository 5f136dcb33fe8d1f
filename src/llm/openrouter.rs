use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{json_body, LlmError, TextGenerator};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

/// OpenAI-style chat completions through OpenRouter.
pub struct OpenRouterProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenRouterProvider {
    pub fn new(client: Client, api_key: &str, model: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenRouterProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(&self.api_key)
            .header("X-Title", "site-cloner")
            .json(&body)
            .send()
            .await?;

        let json = json_body(response).await?;
        if let Some(message) = json["error"]["message"].as_str() {
            let status = json["error"]["code"].as_u64().and_then(|c| u16::try_from(c).ok());
            return Err(LlmError {
                status,
                message: message.to_string(),
            });
        }

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| LlmError::new("Invalid response format from OpenRouter"))
    }

    fn name(&self) -> &'static str {
        "openrouter"
    }
}
