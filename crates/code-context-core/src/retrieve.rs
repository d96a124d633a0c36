//! Chunk retrieval from a [`VectorStore`].
//!
//! [`ChunkRetriever`] never fails: a missing store or a store error yields
//! an empty list flagged with a
//! [`RetrievalUnavailable`](PipelineError::RetrievalUnavailable)
//! degradation, which the controller turns into its "no context" reply.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::{Outcome, PipelineError};
use crate::models::Chunk;
use crate::store::VectorStore;

/// Default number of chunks fetched by [`ChunkRetriever::retrieve_chunks`].
pub const DEFAULT_CHUNK_LIMIT: usize = 20;

pub struct ChunkRetriever {
    store: Option<Arc<dyn VectorStore>>,
}

impl ChunkRetriever {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A retriever with no backing store; every call returns empty.
    pub fn unavailable() -> Self {
        Self { store: None }
    }

    fn store(&self) -> Result<&Arc<dyn VectorStore>, PipelineError> {
        self.store.as_ref().ok_or_else(|| {
            PipelineError::RetrievalUnavailable("vector store not initialized".to_string())
        })
    }

    /// Fetch up to `k` chunks for `project_id`.
    ///
    /// With a non-blank `query` this is a similarity search; otherwise it
    /// lists chunks unconditionally.
    pub async fn get_chunks(
        &self,
        query: Option<&str>,
        project_id: &str,
        k: usize,
    ) -> Outcome<Vec<Chunk>> {
        let store = match self.store() {
            Ok(s) => s,
            Err(e) => {
                warn!("vector store not initialized");
                return Outcome::degraded(Vec::new(), e);
            }
        };

        let result = match query.filter(|q| !q.trim().is_empty()) {
            Some(q) => store.find_similar_code(q, project_id, k).await,
            None => store.get_all_chunks(project_id, k).await,
        };

        match result {
            Ok(chunks) => {
                info!(project_id, chunks = chunks.len(), "retrieved chunks");
                Outcome::clean(chunks)
            }
            Err(e) => {
                error!(project_id, error = %e, "error retrieving chunks");
                Outcome::degraded(
                    Vec::new(),
                    PipelineError::RetrievalUnavailable(e.to_string()),
                )
            }
        }
    }

    /// Similarity search for a prompt, bounded by `top_k`.
    pub async fn retrieve_chunks(
        &self,
        prompt: &str,
        project_id: &str,
        top_k: usize,
    ) -> Outcome<Vec<Chunk>> {
        let preview: String = prompt.chars().take(50).collect();
        info!(project_id, prompt = %preview, "[CTX] retrieving chunks");
        let out = self.get_chunks(Some(prompt), project_id, top_k).await;
        if out.value.is_empty() {
            warn!(project_id, "[CTX] no chunks found");
        }
        out
    }

    pub async fn get_chunk_by_id(&self, chunk_id: &str) -> Outcome<Option<Chunk>> {
        let store = match self.store() {
            Ok(s) => s,
            Err(e) => return Outcome::degraded(None, e),
        };
        match store.get_chunk_by_id(chunk_id).await {
            Ok(c) => Outcome::clean(c),
            Err(e) => {
                error!(chunk_id, error = %e, "error retrieving chunk");
                Outcome::degraded(None, PipelineError::RetrievalUnavailable(e.to_string()))
            }
        }
    }
}
