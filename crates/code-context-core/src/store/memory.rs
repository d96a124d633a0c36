//! In-memory [`VectorStore`] implementation for testing and the CLI.
//!
//! Holds chunks in insertion order behind `std::sync::RwLock`.
//! `find_similar_code` ranks by query-term overlap against content, file
//! path, and symbol name; an empty project ID matches every project.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::Chunk;

use super::VectorStore;

/// In-memory chunk store.
#[derive(Debug)]
pub struct InMemoryVectorStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Build a store from chunks, filling in derived IDs where missing.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        let store = Self::new();
        for c in chunks {
            // A fresh lock cannot be poisoned.
            let _ = store.insert(c);
        }
        store
    }

    /// Insert a chunk, replacing any existing chunk with the same ID.
    pub fn insert(&self, mut chunk: Chunk) -> Result<()> {
        if chunk.id.is_empty() {
            chunk.id = chunk.derived_id();
        }
        let mut chunks = self.chunks.write().map_err(|_| anyhow!("chunk store lock poisoned"))?;
        match chunks.iter_mut().find(|c| c.id == chunk.id) {
            Some(existing) => *existing = chunk,
            None => chunks.push(chunk),
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn in_project(chunk: &Chunk, project_id: &str) -> bool {
    project_id.is_empty() || chunk.project_id.is_empty() || chunk.project_id == project_id
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn find_similar_code(
        &self,
        query: &str,
        project_id: &str,
        k: usize,
    ) -> Result<Vec<Chunk>> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| t.len() > 1)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = self.chunks.read().map_err(|_| anyhow!("chunk store lock poisoned"))?;
        let mut candidates: Vec<(usize, &Chunk)> = chunks
            .iter()
            .filter(|c| in_project(c, project_id))
            .filter_map(|c| {
                let haystack = format!(
                    "{} {} {}",
                    c.content.to_lowercase(),
                    c.file_path.to_lowercase(),
                    c.name.as_deref().unwrap_or("").to_lowercase()
                );
                let matches = terms.iter().filter(|t| haystack.contains(*t)).count();
                (matches > 0).then_some((matches, c))
            })
            .collect();

        // Stable: ties keep insertion order.
        candidates.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(candidates
            .into_iter()
            .take(k)
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn get_all_chunks(&self, project_id: &str, limit: usize) -> Result<Vec<Chunk>> {
        let chunks = self.chunks.read().map_err(|_| anyhow!("chunk store lock poisoned"))?;
        Ok(chunks
            .iter()
            .filter(|c| in_project(c, project_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_chunk_by_id(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        let chunks = self.chunks.read().map_err(|_| anyhow!("chunk store lock poisoned"))?;
        Ok(chunks.iter().find(|c| c.id == chunk_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryVectorStore {
        InMemoryVectorStore::from_chunks(vec![
            Chunk::new("1", "app/controllers/user_controller.py", "function", "def get_user(user_id): return db.query(User)")
                .with_project("p1"),
            Chunk::new("2", "app/services/user_service.py", "class", "class UserService: pass")
                .with_project("p1"),
            Chunk::new("3", "web/App.jsx", "component", "export const App = () => null")
                .with_project("p2"),
        ])
    }

    #[tokio::test]
    async fn test_find_similar_ranks_by_term_overlap() {
        let s = store();
        let hits = s.find_similar_code("get user from db", "p1", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "1");
    }

    #[tokio::test]
    async fn test_find_similar_respects_project_and_k() {
        let s = store();
        let hits = s.find_similar_code("user", "p2", 10).await.unwrap();
        assert!(hits.is_empty());
        let hits = s.find_similar_code("user", "p1", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_get_all_and_by_id() {
        let s = store();
        assert_eq!(s.get_all_chunks("", 10).await.unwrap().len(), 3);
        assert_eq!(s.get_all_chunks("p1", 1).await.unwrap().len(), 1);
        let c = s.get_chunk_by_id("3").await.unwrap().unwrap();
        assert_eq!(c.file_path, "web/App.jsx");
        assert!(s.get_chunk_by_id("missing").await.unwrap().is_none());
    }

    #[test]
    fn test_insert_derives_missing_ids_and_replaces() {
        let s = InMemoryVectorStore::new();
        s.insert(Chunk::new("", "a.py", "function", "x")).unwrap();
        s.insert(Chunk::new("", "a.py", "function", "x")).unwrap();
        assert_eq!(s.len(), 1);
    }
}
