use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::GenerationConfig;
use crate::generate::Generator;
use crate::{Error, Result};

/// Generator for any OpenAI-compatible `/chat/completions` endpoint.
///
/// The prompt is sent as a single user message.
pub struct OpenAiGenerator {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiGenerator {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Generation(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.2,
            max_tokens: 512,
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        Ok(Self::new(
            config.api_base.as_str(),
            config.api_key.clone().unwrap_or_default(),
            config.model.as_str(),
            config.timeout(),
        )?
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens))
    }

    /// Sampling temperature, lower is more deterministic
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Generator for OpenAiGenerator {
    fn generate(&mut self, prompt: &str) -> Result<String> {
        // checked per call so a session can start before a key is provided
        if self.api_key.trim().is_empty() {
            return Err(Error::Generation(
                "no API key for generation (set HOOPSRAG_API_KEY or OPENAI_API_KEY)".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "user", "content": prompt },
            ],
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Generation(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(Error::Generation(format!("{} API error {status}: {text}", self.model)));
        }

        let json: Value = resp
            .json()
            .map_err(|e| Error::Generation(format!("malformed completion response: {e}")))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| Error::Generation("no choices in response".to_string()))?;

        debug!(
            model = %self.model,
            finish_reason = choice["finish_reason"].as_str().unwrap_or("unknown"),
            total_tokens = json["usage"]["total_tokens"].as_u64().unwrap_or(0),
            "completion received"
        );

        choice["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::Generation("completion has no text content".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
