//! Chunk relevance scoring.
//!
//! Each chunk's final score is its embedding similarity to the query plus
//! two categorical biases:
//!
//! ```text
//! score = cosine(query, chunk) + ast_boost(ast_type) + file_boost(extension)
//! ```
//!
//! | AST type | Boost |   | Extension | Boost |
//! |----------|-------|---|-----------|-------|
//! | function, class, method | +0.15 | | .py .js .ts .jsx .tsx | +0.10 |
//! | variable, constant, property | +0.05 | | .json .yaml .yml | +0.05 |
//! | import, comment | −0.10 | | .md .txt | −0.05 |
//! | anything else | 0.0 | | anything else | 0.0 |
//!
//! Results are sorted by score, descending, with a stable sort: equal
//! scores keep their input order.
//!
//! Chunks without a precomputed embedding are embedded on demand through
//! the [`Embedder`]'s bounded worker pool. A malformed chunk (an embedding
//! whose length differs from the query's, or containing non-finite values)
//! aborts scoring; the scorer then returns the input chunks unscored and in
//! their original order, flagged with a
//! [`ScoringFailure`](PipelineError::ScoringFailure).

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::embedding::{cosine_similarity, Embedder};
use crate::error::{Outcome, PipelineError};
use crate::models::{AstType, Chunk, ScoredChunk};

/// Additive bias for a chunk's syntactic category (exact, case-sensitive match).
pub fn ast_boost(ast_type: &str) -> f64 {
    match AstType::parse(ast_type) {
        AstType::Function | AstType::Class | AstType::Method => 0.15,
        AstType::Variable | AstType::Constant | AstType::Property => 0.05,
        AstType::Import | AstType::Comment => -0.10,
        _ => 0.0,
    }
}

/// Additive bias for a chunk's file extension (compared lower-cased).
pub fn file_boost(file_path: &str) -> f64 {
    let ext = Path::new(file_path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());

    match ext.as_deref() {
        Some("py" | "js" | "ts" | "jsx" | "tsx") => 0.10,
        Some("json" | "yaml" | "yml") => 0.05,
        Some("md" | "txt") => -0.05,
        _ => 0.0,
    }
}

/// Scores chunks against a query using embeddings plus categorical boosts.
pub struct ChunkRelevanceScorer {
    embedder: Arc<dyn Embedder>,
}

impl ChunkRelevanceScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        info!(
            model = embedder.model_name(),
            dims = embedder.dims(),
            "initialized relevance scorer"
        );
        Self { embedder }
    }

    /// Score and sort `chunks` by relevance to `query`.
    ///
    /// Never fails. On an internal error the chunks come back unscored in
    /// input order with a [`ScoringFailure`](PipelineError::ScoringFailure)
    /// degradation attached.
    pub async fn score(&self, query: &str, chunks: Vec<Chunk>) -> Outcome<Vec<ScoredChunk>> {
        if chunks.is_empty() {
            warn!("no chunks provided for scoring");
            return Outcome::clean(Vec::new());
        }

        match self.try_score(query, &chunks).await {
            Ok(scored) => scored,
            Err(e) => {
                error!(error = %e, chunks = chunks.len(), "error scoring chunks, returning input order");
                Outcome::degraded(chunks.into_iter().map(ScoredChunk::unscored).collect(), e)
            }
        }
    }

    async fn try_score(
        &self,
        query: &str,
        chunks: &[Chunk],
    ) -> Result<Outcome<Vec<ScoredChunk>>, PipelineError> {
        let mut out = Outcome::clean(Vec::with_capacity(chunks.len()));
        let query_vec = out.absorb(self.embedder.embed(query).await);

        // Lazily embed everything that arrived without a vector.
        let missing: Vec<usize> = chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.embedding.is_none())
            .map(|(i, _)| i)
            .collect();
        let texts: Vec<String> = missing.iter().map(|&i| chunks[i].content.clone()).collect();
        let computed = if texts.is_empty() {
            Vec::new()
        } else {
            out.absorb(self.embedder.embed_batch(&texts).await)
        };
        let mut computed = missing.into_iter().zip(computed).peekable();

        for (i, chunk) in chunks.iter().enumerate() {
            let mut chunk = chunk.clone();
            if computed.peek().map(|(idx, _)| *idx) == Some(i) {
                if let Some((_, v)) = computed.next() {
                    chunk.embedding = Some(v);
                }
            }

            let similarity = match chunk.embedding.as_deref() {
                Some(v) => {
                    validate_embedding(&chunk, v, query_vec.len())?;
                    cosine_similarity(&query_vec, v) as f64
                }
                None => 0.0,
            };

            let ast = ast_boost(chunk.effective_type());
            let file = file_boost(&chunk.file_path);

            out.value.push(ScoredChunk {
                score: similarity + ast + file,
                similarity,
                ast_boost: ast,
                file_boost: file,
                chunk,
            });
        }

        // `sort_by` is stable, so ties keep input order.
        out.value
            .sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        info!(
            chunks = out.value.len(),
            top_score = out.value.first().map(|c| c.score).unwrap_or_default(),
            "scored chunks"
        );
        Ok(out)
    }
}

fn validate_embedding(chunk: &Chunk, v: &[f32], expected: usize) -> Result<(), PipelineError> {
    if v.len() != expected {
        return Err(PipelineError::ScoringFailure(format!(
            "chunk {} has embedding of length {}, expected {}",
            chunk.id,
            v.len(),
            expected
        )));
    }
    if v.iter().any(|x| !x.is_finite()) {
        return Err(PipelineError::ScoringFailure(format!(
            "chunk {} has non-finite embedding values",
            chunk.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::zero_fallback;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Looks texts up in a fixed table; unknown texts embed to the zero vector.
    struct TableEmbedder {
        table: HashMap<String, Vec<f32>>,
        fail_on: Option<String>,
    }

    impl TableEmbedder {
        fn new(entries: &[(&str, [f32; 3])]) -> Self {
            Self {
                table: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_vec()))
                    .collect(),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl Embedder for TableEmbedder {
        fn model_name(&self) -> &str {
            "table"
        }
        fn dims(&self) -> usize {
            3
        }
        async fn embed(&self, text: &str) -> Outcome<Vec<f32>> {
            if self.fail_on.as_deref() == Some(text) {
                return zero_fallback(3, "status 500");
            }
            Outcome::clean(self.table.get(text).cloned().unwrap_or_else(|| vec![0.0; 3]))
        }
    }

    fn scorer(e: TableEmbedder) -> ChunkRelevanceScorer {
        ChunkRelevanceScorer::new(Arc::new(e))
    }

    #[test]
    fn test_ast_boost_table() {
        assert_eq!(ast_boost("function"), 0.15);
        assert_eq!(ast_boost("class"), 0.15);
        assert_eq!(ast_boost("method"), 0.15);
        assert_eq!(ast_boost("constant"), 0.05);
        assert_eq!(ast_boost("import"), -0.10);
        assert_eq!(ast_boost("comment"), -0.10);
        assert_eq!(ast_boost("docstring"), 0.0);
        assert_eq!(ast_boost("component"), 0.0);
        assert_eq!(ast_boost("mystery"), 0.0);
    }

    #[test]
    fn test_ast_boost_is_case_sensitive() {
        assert_eq!(ast_boost("Function"), 0.0);
        assert_eq!(ast_boost("IMPORT"), 0.0);
    }

    #[test]
    fn test_file_boost_table() {
        assert_eq!(file_boost("app/main.py"), 0.10);
        assert_eq!(file_boost("web/App.TSX"), 0.10);
        assert_eq!(file_boost("deploy/values.yml"), 0.05);
        assert_eq!(file_boost("README.md"), -0.05);
        assert_eq!(file_boost("Dockerfile"), 0.0);
        assert_eq!(file_boost("src/lib.rs"), 0.0);
        assert_eq!(file_boost(""), 0.0);
    }

    #[tokio::test]
    async fn test_scores_sorted_descending() {
        let s = scorer(TableEmbedder::new(&[("q", [1.0, 0.0, 0.0])]));
        let chunks = vec![
            Chunk::new("a", "notes.md", "comment", "a").with_embedding(vec![0.0, 1.0, 0.0]),
            Chunk::new("b", "svc.py", "function", "b").with_embedding(vec![1.0, 0.0, 0.0]),
            Chunk::new("c", "cfg.json", "constant", "c").with_embedding(vec![1.0, 1.0, 0.0]),
        ];
        let out = s.score("q", chunks).await;
        assert!(!out.is_degraded());
        let ids: Vec<&str> = out.value.iter().map(|c| c.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        for w in out.value.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
        let b = &out.value[0];
        assert!((b.similarity - 1.0).abs() < 1e-6);
        assert!((b.score - 1.25).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_equal_scores_keep_input_order() {
        let s = scorer(TableEmbedder::new(&[("q", [1.0, 0.0, 0.0])]));
        let chunks: Vec<Chunk> = ["z", "m", "a", "k"]
            .iter()
            .map(|id| Chunk::new(*id, "x.py", "function", "same").with_embedding(vec![0.5, 0.5, 0.0]))
            .collect();
        let out = s.score("q", chunks).await;
        let ids: Vec<&str> = out.value.iter().map(|c| c.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "m", "a", "k"]);
    }

    #[tokio::test]
    async fn test_function_beats_import_by_quarter() {
        let s = scorer(TableEmbedder::new(&[("q", [1.0, 2.0, 0.0])]));
        let emb = vec![1.0, 1.0, 1.0];
        let chunks = vec![
            Chunk::new("imp", "m.py", "import", "same").with_embedding(emb.clone()),
            Chunk::new("fun", "m.py", "function", "same").with_embedding(emb),
        ];
        let out = s.score("q", chunks).await;
        assert_eq!(out.value[0].chunk.id, "fun");
        let gap = out.value[0].score - out.value[1].score;
        assert!((gap - 0.25).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_missing_embeddings_are_computed_and_cached() {
        let s = scorer(TableEmbedder::new(&[
            ("q", [0.0, 0.0, 1.0]),
            ("def handler(): pass", [0.0, 0.0, 2.0]),
        ]));
        let chunks = vec![
            Chunk::new("x", "a.rs", "function", "something else"),
            Chunk::new("y", "b.rs", "function", "def handler(): pass"),
        ];
        let out = s.score("q", chunks).await;
        assert_eq!(out.value[0].chunk.id, "y");
        assert!((out.value[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(out.value[0].chunk.embedding, Some(vec![0.0, 0.0, 2.0]));
        assert_eq!(out.value[1].similarity, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_chunk_returns_input_unsorted() {
        let s = scorer(TableEmbedder::new(&[("q", [1.0, 0.0, 0.0])]));
        let chunks = vec![
            Chunk::new("low", "a.md", "comment", "a").with_embedding(vec![0.0, 1.0, 0.0]),
            Chunk::new("bad", "b.py", "function", "b").with_embedding(vec![1.0, 0.0]),
            Chunk::new("high", "c.py", "function", "c").with_embedding(vec![1.0, 0.0, 0.0]),
        ];
        let out = s.score("q", chunks).await;
        assert!(out.is_degraded());
        assert!(matches!(
            out.degradations[0],
            PipelineError::ScoringFailure(_)
        ));
        let ids: Vec<&str> = out.value.iter().map(|c| c.chunk.id.as_str()).collect();
        assert_eq!(ids, vec!["low", "bad", "high"]);
        assert!(out.value.iter().all(|c| c.score == 0.0));
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_but_still_scores() {
        let mut e = TableEmbedder::new(&[("q", [1.0, 0.0, 0.0])]);
        e.fail_on = Some("flaky".into());
        let s = scorer(e);
        let chunks = vec![
            Chunk::new("f", "a.py", "function", "flaky"),
            Chunk::new("g", "b.md", "comment", "other").with_embedding(vec![1.0, 0.0, 0.0]),
        ];
        let out = s.score("q", chunks).await;
        assert!(out.is_degraded());
        assert!(matches!(
            out.degradations[0],
            PipelineError::EmbeddingFailure(_)
        ));
        // g: 1.0 - 0.10 - 0.05 = 0.85; f: 0.0 + 0.15 + 0.10 = 0.25
        assert_eq!(out.value[0].chunk.id, "g");
        assert_eq!(out.value[1].similarity, 0.0);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let s = scorer(TableEmbedder::new(&[]));
        let out = s.score("q", Vec::new()).await;
        assert!(out.value.is_empty());
        assert!(!out.is_degraded());
    }
}
