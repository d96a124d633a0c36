//! Vector-store abstraction.
//!
//! The [`VectorStore`] trait is the read side of whatever index holds the
//! project's code chunks (OpenSearch, pgvector, or the in-memory store used
//! in tests and by the CLI). Chunks are produced and persisted elsewhere;
//! this pipeline only reads them.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Chunk;

/// Read-only access to a project's indexed code chunks.
///
/// Returned chunks must carry `file_path`, a category (`ast_type` or
/// `chunk_type`), and `content`. Embeddings may be absent.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_similar_code`](VectorStore::find_similar_code) | Top-`k` chunks matching a text query |
/// | [`get_all_chunks`](VectorStore::get_all_chunks) | Up to `limit` chunks, unconditionally |
/// | [`get_chunk_by_id`](VectorStore::get_chunk_by_id) | A single chunk by ID |
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn find_similar_code(&self, query: &str, project_id: &str, k: usize)
        -> Result<Vec<Chunk>>;

    async fn get_all_chunks(&self, project_id: &str, limit: usize) -> Result<Vec<Chunk>>;

    async fn get_chunk_by_id(&self, chunk_id: &str) -> Result<Option<Chunk>>;
}
