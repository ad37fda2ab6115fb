//! Configuration
//!
//! Loaded from a TOML file where every field is optional, then overridden by
//! environment variables:
//!
//! | Variable | Overrides |
//! |---|---|
//! | `HOOPSRAG_DATA` | `data_path` |
//! | `HOOPSRAG_API_KEY`, `OPENAI_API_KEY` | `embedding.api_key`, `generation.api_key` (when unset) |
//! | `HOOPSRAG_MODEL` | `generation.model` |
//! | `HOOPSRAG_CACHE_DIR` | `cache.dir` |
//!
//! ```toml
//! data_path = "nba_fantasy_dataset.csv"
//! language = "tr"
//! top_k = 3
//!
//! [embedding]
//! backend = "local"
//!
//! [generation]
//! model = "gpt-4o-mini"
//! temperature = 0.2
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::Language;
use crate::{Error, Result};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "hoopsrag.toml";

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_REMOTE_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Statistics file to index
    pub data_path: PathBuf,
    /// Field delimiter of the statistics file
    pub delimiter: char,
    /// Language of documents, prompts and answers
    pub language: Language,
    /// Number of documents retrieved per question
    pub top_k: usize,
    /// Attach structured metadata to every document
    pub include_metadata: bool,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("nba_fantasy_dataset.csv"),
            delimiter: ';',
            language: Language::Turkish,
            top_k: 3,
            include_metadata: true,
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// fastembed ONNX model on this machine
    #[default]
    Local,
    /// OpenAI-compatible embeddings API
    Remote,
    /// Feature hashing, no model
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// Model name; empty selects the backend's default
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Vector width of the hashing backend
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Local,
            model: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout_secs: 30,
            dimensions: crate::embed::DEFAULT_HASHING_DIMENSIONS,
        }
    }
}

impl EmbeddingConfig {
    /// Model name for the remote backend
    #[must_use]
    pub fn remote_model(&self) -> &str {
        if self.model.trim().is_empty() {
            DEFAULT_REMOTE_EMBEDDING_MODEL
        } else {
            self.model.trim()
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_base: String,
    pub model: String,
    /// Sampling temperature, lower is more deterministic
    pub temperature: f32,
    pub max_tokens: u32,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            max_tokens: 512,
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Reuse a saved index when file and embedding model are unchanged
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from(".hoopsrag-cache"),
        }
    }
}

impl Config {
    /// Load configuration and apply environment overrides.
    ///
    /// With no explicit path, `hoopsrag.toml` in the working directory is
    /// used when present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("HOOPSRAG_DATA") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(model) = var("HOOPSRAG_MODEL") {
            self.generation.model = model;
        }
        if let Some(dir) = var("HOOPSRAG_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }

        if let Some(key) = var("HOOPSRAG_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            if self.embedding.api_key.is_none() {
                self.embedding.api_key = Some(key.clone());
            }
            if self.generation.api_key.is_none() {
                self.generation.api_key = Some(key);
            }
        }
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.delimiter_byte()?;
        if self.top_k == 0 {
            return Err(Error::Config("top_k must be at least 1".to_string()));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(format!(
                "generation.temperature must be within [0, 2], got {}",
                self.generation.temperature
            )));
        }
        Ok(())
    }

    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| Error::Config(format!("delimiter must be ASCII, got {:?}", self.delimiter)))
    }
}
