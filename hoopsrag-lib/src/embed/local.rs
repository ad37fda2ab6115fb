use std::str::FromStr;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::embed::{Embedder, Embedding};
use crate::{Error, Result};

/// Local models supported by [`FastEmbedder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalModel {
    /// sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2
    MultilingualMiniLm,
    /// intfloat/multilingual-e5-small
    MultilingualE5Small,
    /// BAAI/bge-small-en-v1.5
    BgeSmallEn,
    /// BAAI/bge-large-en-v1.5
    BgeLargeEn,
}

impl LocalModel {
    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            LocalModel::MultilingualMiniLm => EmbeddingModel::ParaphraseMLMiniLML12V2,
            LocalModel::MultilingualE5Small => EmbeddingModel::MultilingualE5Small,
            LocalModel::BgeSmallEn => EmbeddingModel::BGESmallENV15,
            LocalModel::BgeLargeEn => EmbeddingModel::BGELargeENV15,
        }
    }

    /// Model identifier on the Hugging Face hub
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            LocalModel::MultilingualMiniLm => "sentence-transformers/paraphrase-multilingual-MiniLM-L12-v2",
            LocalModel::MultilingualE5Small => "intfloat/multilingual-e5-small",
            LocalModel::BgeSmallEn => "BAAI/bge-small-en-v1.5",
            LocalModel::BgeLargeEn => "BAAI/bge-large-en-v1.5",
        }
    }

    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            LocalModel::BgeLargeEn => 1024,
            _ => 384,
        }
    }

    fn document_prefix(self) -> &'static str {
        match self {
            LocalModel::MultilingualE5Small => "passage: ",
            _ => "",
        }
    }

    fn query_prefix(self) -> &'static str {
        match self {
            LocalModel::MultilingualE5Small => "query: ",
            LocalModel::BgeSmallEn | LocalModel::BgeLargeEn => {
                "Represent this sentence for searching relevant passages: "
            }
            LocalModel::MultilingualMiniLm => "",
        }
    }
}

impl FromStr for LocalModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let name = name.rsplit('/').next().unwrap_or(&name);
        match name {
            "" | "paraphrase-multilingual-minilm-l12-v2" => Ok(LocalModel::MultilingualMiniLm),
            "multilingual-e5-small" => Ok(LocalModel::MultilingualE5Small),
            "bge-small-en-v1.5" => Ok(LocalModel::BgeSmallEn),
            "bge-large-en-v1.5" => Ok(LocalModel::BgeLargeEn),
            other => Err(Error::Config(format!("unsupported local embedding model: {other}"))),
        }
    }
}

/// Local embedder using fastembed for ONNX-based inference.
///
/// The default model is multilingual so Turkish questions land near Turkish
/// documents.
pub struct FastEmbedder {
    model: TextEmbedding,
    kind: LocalModel,
}

impl FastEmbedder {
    /// Create a new local embedder.
    ///
    /// Downloads the model on first use.
    pub fn new(kind: LocalModel) -> Result<Self> {
        let opts = InitOptions::new(kind.fastembed_model()).with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self { model, kind })
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

impl Embedder for FastEmbedder {
    fn model_name(&self) -> &str {
        self.kind.id()
    }

    fn dimension(&self) -> usize {
        self.kind.dimension()
    }

    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let prefix = self.kind.document_prefix();
        let texts: Vec<String> = texts.iter().map(|t| format!("{prefix}{t}")).collect();

        self.model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        let query_text = format!("{}{text}", self.kind.query_prefix());

        self.model
            .embed(vec![query_text], None)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }
}
