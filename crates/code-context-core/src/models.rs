//! Data models that flow through the context pipeline.
//!
//! A [`Chunk`] is produced by the vector store for a single request. The
//! scorer never mutates the chunks it is handed; it wraps each one in a
//! [`ScoredChunk`] carrying the score breakdown. [`ChunkSummary`] is the
//! trimmed shape returned to API callers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Maximum number of characters of chunk content returned in a [`ChunkSummary`].
pub const SUMMARY_CONTENT_CHARS: usize = 500;

/// A retrievable unit of code with location and category metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub file_path: String,
    /// Syntactic category (`function`, `class`, `import`, ...).
    #[serde(default)]
    pub ast_type: String,
    /// Older stores label the category `chunk_type`; used when `ast_type` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(default)]
    pub project_id: String,
    /// Precomputed vector. Computed lazily by the scorer when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Convenience constructor used by stores and tests.
    pub fn new(
        id: impl Into<String>,
        file_path: impl Into<String>,
        ast_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            file_path: file_path.into(),
            ast_type: ast_type.into(),
            chunk_type: None,
            name: None,
            start_line: None,
            end_line: None,
            project_id: String::new(),
            embedding: None,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// The category used for boosting: `ast_type`, then `chunk_type`, then `"default"`.
    pub fn effective_type(&self) -> &str {
        if !self.ast_type.is_empty() {
            return &self.ast_type;
        }
        match self.chunk_type.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "default",
        }
    }

    /// Stable identifier derived from the chunk's location and content.
    ///
    /// Used when a store hands back chunks without an `id`.
    pub fn derived_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.project_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.file_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.content.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }
}

/// Syntactic chunk category.
///
/// Names match exactly as stored (lower-case); anything else, including
/// `"Function"`, maps to [`AstType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstType {
    Function,
    Class,
    Method,
    Variable,
    Constant,
    Property,
    Import,
    Comment,
    Docstring,
    Component,
    Config,
    Default,
    Other,
}

impl AstType {
    pub fn parse(s: &str) -> Self {
        match s {
            "function" => Self::Function,
            "class" => Self::Class,
            "method" => Self::Method,
            "variable" => Self::Variable,
            "constant" => Self::Constant,
            "property" => Self::Property,
            "import" => Self::Import,
            "comment" => Self::Comment,
            "docstring" => Self::Docstring,
            "component" => Self::Component,
            "config" => Self::Config,
            "default" | "" => Self::Default,
            _ => Self::Other,
        }
    }
}

/// A chunk paired with its computed relevance breakdown.
///
/// `score = similarity + ast_boost + file_boost`. The score is an additive
/// bias and is not clamped to any range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f64,
    pub similarity: f64,
    pub ast_boost: f64,
    pub file_boost: f64,
}

impl ScoredChunk {
    /// Wrap a chunk with an all-zero score breakdown.
    pub fn unscored(chunk: Chunk) -> Self {
        Self {
            chunk,
            score: 0.0,
            similarity: 0.0,
            ast_boost: 0.0,
            file_boost: 0.0,
        }
    }
}

/// Trimmed chunk shape returned to API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub id: String,
    pub file_path: String,
    pub ast_type: String,
    pub chunk_type: String,
    pub name: String,
    pub score: f64,
    pub content: String,
}

impl From<&ScoredChunk> for ChunkSummary {
    fn from(sc: &ScoredChunk) -> Self {
        let c = &sc.chunk;
        Self {
            id: c.id.clone(),
            file_path: c.file_path.clone(),
            ast_type: c.ast_type.clone(),
            chunk_type: c.chunk_type.clone().unwrap_or_default(),
            name: c.name.clone().unwrap_or_default(),
            score: sc.score,
            content: truncate_content(&c.content, SUMMARY_CONTENT_CHARS),
        }
    }
}

/// Keep the first `max_chars` characters, appending `...` when trimmed.
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &content[..byte_idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_type_falls_back_to_chunk_type() {
        let mut c = Chunk::new("1", "a.py", "", "x");
        assert_eq!(c.effective_type(), "default");
        c.chunk_type = Some("method".into());
        assert_eq!(c.effective_type(), "method");
        c.ast_type = "class".into();
        assert_eq!(c.effective_type(), "class");
    }

    #[test]
    fn test_ast_type_parse() {
        assert_eq!(AstType::parse("function"), AstType::Function);
        assert_eq!(AstType::parse("Function"), AstType::Other);
        assert_eq!(AstType::parse(" class"), AstType::Other);
        assert_eq!(AstType::parse("lambda"), AstType::Other);
        assert_eq!(AstType::parse(""), AstType::Default);
    }

    #[test]
    fn test_summary_truncates_long_content() {
        let long = "é".repeat(600);
        let sc = ScoredChunk::unscored(Chunk::new("1", "a.py", "function", long));
        let summary = ChunkSummary::from(&sc);
        assert_eq!(summary.content.chars().count(), SUMMARY_CONTENT_CHARS + 3);
        assert!(summary.content.ends_with("..."));
    }

    #[test]
    fn test_summary_keeps_short_content() {
        let sc = ScoredChunk::unscored(Chunk::new("1", "a.py", "function", "def f(): pass"));
        assert_eq!(ChunkSummary::from(&sc).content, "def f(): pass");
    }

    #[test]
    fn test_derived_id_is_stable() {
        let a = Chunk::new("", "src/a.py", "function", "def a(): pass");
        let b = Chunk::new("", "src/a.py", "function", "def a(): pass");
        let c = Chunk::new("", "src/b.py", "function", "def a(): pass");
        assert_eq!(a.derived_id(), b.derived_id());
        assert_ne!(a.derived_id(), c.derived_id());
        assert_eq!(a.derived_id().len(), 16);
    }

    #[test]
    fn test_chunk_deserializes_with_missing_fields() {
        let c: Chunk = serde_json::from_str(
            r#"{"content": "x = 1", "file_path": "a.py", "chunk_type": "variable"}"#,
        )
        .unwrap();
        assert!(c.id.is_empty());
        assert!(c.embedding.is_none());
        assert_eq!(c.effective_type(), "variable");
    }
}
