//! Text embedding backends
//!
//! Three backends share the [`Embedder`] trait:
//!
//! - [`FastEmbedder`]: local ONNX models via the fastembed crate
//! - [`OpenAiEmbedder`]: a remote OpenAI-compatible `/embeddings` API
//! - [`HashingEmbedder`]: deterministic feature hashing, no model at all
//!
//! An index must be built and queried with the same backend and model;
//! distances between vectors from different models are meaningless.
//!
//! # Usage
//!
//! ```ignore
//! use hoopsrag_lib::embed::{Embedder, FastEmbedder, LocalModel};
//!
//! let mut embedder = FastEmbedder::new(LocalModel::MultilingualMiniLm)?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Jayson Tatum (BOS) ..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("Jayson Tatum kaç sayı attı?")?;
//! ```

use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Returns exactly one vector per input text, in input order.
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    ///
    /// Note: Some models (like BGE and E5) use different prompts for queries
    /// vs documents. This method handles that distinction.
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        (**self).embed_documents(texts)
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        (**self).embed_query(text)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Build the embedder described by `config`.
pub fn from_config(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let embedder: Box<dyn Embedder> = match config.backend {
        EmbeddingBackend::Local => Box::new(FastEmbedder::new(config.model.parse()?)?),
        EmbeddingBackend::Remote => Box::new(OpenAiEmbedder::from_config(config)?),
        EmbeddingBackend::Hashing => Box::new(HashingEmbedder::new(config.dimensions)),
    };
    Ok(embedder)
}

mod hashing;
mod local;
mod openai;

pub use hashing::*;
pub use local::*;
pub use openai::*;
