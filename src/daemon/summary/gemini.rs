use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

/// Opaque text-generation collaborator. The summary service only ever sees
/// this seam, so tests swap in a mock and offline runs skip it entirely.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync + 'static {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-pro";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    /// Picks up the key from the environment. No key means no client, and
    /// the summary service falls back to its local generator.
    pub fn from_env() -> Option<Self> {
        std::env::var(GEMINI_API_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::new(&key, DEFAULT_MODEL))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{
                    "text": prompt
                }]
            }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error: {}", error_text);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        // Text lives at: candidates[0].content.parts[0].text
        json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .context("Failed to extract text from Gemini response")
    }
}
