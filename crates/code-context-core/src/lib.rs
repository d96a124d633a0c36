//! # Code Context Core
//!
//! Request-time retrieval, scoring, role filtering, and context assembly
//! for code-aware prompts.
//!
//! This crate contains no HTTP client, tokio runtime, or filesystem I/O.
//! Network backends (embedding, vector store, generation) are reached
//! through the [`embedding::Embedder`] and [`store::VectorStore`] traits,
//! which the `code-context` app crate implements.
//!
//! ## Pipeline
//!
//! ```text
//! ChunkRetriever ──▶ RoleRegistry filter ──▶ ChunkRelevanceScorer ──▶ truncate
//!                                                                      │
//!                                  ContextFormatter::build_prompt ◀────┘
//! ```

pub mod embedding;
pub mod error;
pub mod format;
pub mod inject;
pub mod models;
pub mod retrieve;
pub mod role;
pub mod score;
pub mod store;
