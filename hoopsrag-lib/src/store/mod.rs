//! Vector storage
//!
//! # Storage Model
//!
//! Each stored item consists of:
//! - NormalizedDocument: the generated text and optional metadata
//! - Embedding: the vector representation
//!
//! An index is built once from a full document set and is read-only from
//! then on; when the data or the embedding model changes a new index is
//! built. [`IndexCache`] persists built indexes across runs.
//!
//! # Usage
//!
//! ```ignore
//! use hoopsrag_lib::store::{MemoryIndex, VectorStore};
//!
//! let index = MemoryIndex::new("hashing-1024", documents, embeddings)?;
//!
//! // Search by vector similarity
//! let results = index.search(&query_embedding, 5)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::normalize::NormalizedDocument;
use crate::Result;

/// A search result with similarity score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The matched document
    pub document: NormalizedDocument,
    /// Similarity score (higher is more similar)
    /// For cosine similarity: -1.0 to 1.0
    pub score: f32,
}

/// Trait for read-only vector indexes
pub trait VectorStore: Send + Sync {
    /// Search for similar documents
    ///
    /// # Arguments
    /// * `query_embedding` - The query vector
    /// * `k` - Number of results to return
    ///
    /// # Returns
    /// Top-k results sorted by similarity (highest first), ties in
    /// insertion order
    fn search(&self, query_embedding: &Embedding, k: usize) -> Result<Vec<SearchResult>>;

    /// Name of the embedding model the stored vectors came from
    fn model_name(&self) -> &str;

    /// Get total number of stored documents
    fn len(&self) -> usize;

    /// Check if store is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

mod cache;
mod memory;

pub use cache::*;
pub use memory::*;
