use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{json_body, LlmError, TextGenerator};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Generative Language `generateContent` endpoint.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(client: Client, api_key: &str, model: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            model: model.trim_start_matches("models/").to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let json = json_body(response).await?;
        let text = candidate_text(&json);
        if text.is_empty() {
            let reason = json["promptFeedback"]["blockReason"]
                .as_str()
                .or_else(|| json["candidates"][0]["finishReason"].as_str())
                .unwrap_or("no candidates returned");
            return Err(LlmError::new(format!("Gemini returned no text: {}", reason)));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

fn candidate_text(json: &serde_json::Value) -> String {
    json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default()
}
