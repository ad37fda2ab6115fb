use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::normalize::NormalizedDocument;
use crate::store::{SearchResult, VectorStore};
use crate::{Error, Result};

/// One stored document with its vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub document: NormalizedDocument,
    pub embedding: Embedding,
}

/// In-memory vector index.
///
/// Uses brute-force cosine similarity search, which is plenty for a season
/// of box scores. Entries keep insertion order.
///
/// Deserializing goes through [`MemoryIndex::new`], so a stored index with
/// ragged vectors is rejected rather than loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "StoredIndex")]
pub struct MemoryIndex {
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

#[derive(Deserialize)]
struct StoredIndex {
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl TryFrom<StoredIndex> for MemoryIndex {
    type Error = Error;

    fn try_from(stored: StoredIndex) -> Result<Self> {
        let (documents, embeddings): (Vec<_>, Vec<_>) = stored
            .entries
            .into_iter()
            .map(|entry| (entry.document, entry.embedding))
            .unzip();

        let index = MemoryIndex::new(stored.model, documents, embeddings)?;
        if !index.entries.is_empty() && index.dimension != stored.dimension {
            return Err(Error::Embedding(format!(
                "stored dimension {} does not match vectors of dimension {}",
                stored.dimension, index.dimension
            )));
        }
        Ok(index)
    }
}

impl MemoryIndex {
    /// Pair documents with their embeddings.
    ///
    /// Fails with [`Error::Embedding`] when the counts differ or the vectors
    /// do not all share one dimension.
    pub fn new(
        model: impl Into<String>,
        documents: Vec<NormalizedDocument>,
        embeddings: Vec<Embedding>,
    ) -> Result<Self> {
        if documents.len() != embeddings.len() {
            return Err(Error::Embedding(format!(
                "got {} embeddings for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(bad) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(Error::Embedding(format!(
                "embedding {bad} has dimension {}, expected {dimension}",
                embeddings[bad].len()
            )));
        }

        let entries = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| IndexEntry { document, embedding })
            .collect();

        Ok(Self {
            model: model.into(),
            dimension,
            entries,
        })
    }

    /// An index with no documents
    #[must_use]
    pub fn empty(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            dimension: 0,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stored entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

impl VectorStore for MemoryIndex {
    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::InvalidInput(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|entry| SearchResult {
                document: entry.document.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        // stable sort keeps insertion order among equal scores
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);

        Ok(results)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
