use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::EmbeddingConfig;
use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Inputs sent per request
const BATCH_SIZE: usize = 64;

/// Remote embedder for any OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    /// Known up front for OpenAI models, otherwise learned from the first response
    dimension: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Embedding,
    #[serde(default)]
    index: usize,
}

impl OpenAiEmbedder {
    /// Create a remote embedder.
    ///
    /// Fails with [`Error::Embedding`] when the key is empty, since every
    /// later call would be rejected anyway.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::Embedding(
                "no API key for remote embeddings (set HOOPSRAG_API_KEY or OPENAI_API_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;
        let model = model.into();

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            dimension: known_dimension(&model),
            model,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(
            config.api_base.as_str(),
            config.api_key.clone().unwrap_or_default(),
            config.remote_model(),
            config.timeout(),
        )
    }

    fn request(&mut self, inputs: &[&str]) -> Result<Vec<Embedding>> {
        let url = format!("{}/embeddings", self.api_base);
        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| Error::Embedding(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(Error::Embedding(format!("embeddings API error {status}: {text}")));
        }

        let mut parsed: EmbeddingResponse = resp
            .json()
            .map_err(|e| Error::Embedding(format!("malformed embeddings response: {e}")))?;

        if parsed.data.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|d| d.index);
        let embeddings: Vec<Embedding> = parsed.data.into_iter().map(|d| d.embedding).collect();

        if let Some(first) = embeddings.first() {
            self.dimension = first.len();
        }
        Ok(embeddings)
    }
}

impl Embedder for OpenAiEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            debug!(batch = i, size = batch.len(), model = %self.model, "embedding batch");
            embeddings.extend(self.request(batch)?);
        }
        Ok(embeddings)
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        self.request(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("API returned no embeddings".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn known_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
        "text-embedding-3-large" => 3072,
        _ => 0,
    }
}
