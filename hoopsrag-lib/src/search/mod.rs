//! Building indexes and retrieving documents
//!
//! [`Retriever`] owns the one embedder used both to build an index and to
//! embed queries against it, so documents and queries always share an
//! embedding space.
//!
//! # Usage
//!
//! ```ignore
//! use hoopsrag_lib::search::Retriever;
//!
//! let mut retriever = Retriever::new(embedder);
//! let index = retriever.build(&documents)?;
//! let results = retriever.search(&index, "Jayson Tatum kaç sayı attı?", 3)?;
//! ```

use tracing::{debug, warn};

use crate::embed::Embedder;
use crate::normalize::NormalizedDocument;
use crate::store::{MemoryIndex, SearchResult, VectorStore};
use crate::Result;

/// Embeds documents into an index and queries against it.
pub struct Retriever<E: Embedder> {
    embedder: E,
}

impl<E: Embedder> Retriever<E> {
    #[must_use]
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    /// Build an index over `documents`.
    ///
    /// Every document is embedded with this retriever's embedder. Any backend
    /// failure aborts the build; no partial index is returned. An empty
    /// document list gives an empty index without touching the backend.
    pub fn build(&mut self, documents: &[NormalizedDocument]) -> Result<MemoryIndex> {
        let model = self.embedder.model_name().to_string();
        if documents.is_empty() {
            return Ok(MemoryIndex::empty(model));
        }

        debug!(documents = documents.len(), %model, "embedding documents");
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;

        MemoryIndex::new(model, documents.to_vec(), embeddings)
    }

    /// Find the `k` documents nearest to `query`.
    ///
    /// Returns an empty list, without embedding anything, when the index is
    /// empty, the query is blank or `k` is zero.
    pub fn search<S: VectorStore>(&mut self, index: &S, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if index.is_empty() || query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if index.model_name() != self.embedder.model_name() {
            warn!(
                index_model = index.model_name(),
                query_model = self.embedder.model_name(),
                "query and index use different embedding models, results will be meaningless"
            );
        }

        let query_embedding = self.embedder.embed_query(query)?;
        let results = index.search(&query_embedding, k)?;
        debug!(k, hits = results.len(), "retrieved documents");
        Ok(results)
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}
