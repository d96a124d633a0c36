//! Embedding trait and vector utilities.
//!
//! Defines the [`Embedder`] trait that all embedding backends implement,
//! plus the pure helpers the scorer relies on: dimension normalization and
//! cosine similarity.
//!
//! Concrete backends (Ollama over HTTP) live in the `code-context` app crate.
//!
//! # Contract
//!
//! [`Embedder::embed`] never fails. Empty input and backend errors both
//! produce a zero vector of [`Embedder::dims`] length; backend errors are
//! reported as an [`EmbeddingFailure`](PipelineError::EmbeddingFailure)
//! degradation on the returned [`Outcome`].

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::error::{Outcome, PipelineError};

/// Trait for embedding backends.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"nomic-embed-text"`).
    fn model_name(&self) -> &str;

    /// Returns the configured vector dimensionality `D`.
    fn dims(&self) -> usize;

    /// Maximum number of embedding calls issued concurrently by [`embed_batch`](Embedder::embed_batch).
    fn concurrency(&self) -> usize {
        4
    }

    /// Embed one text into a vector of exactly [`dims`](Embedder::dims) length.
    async fn embed(&self, text: &str) -> Outcome<Vec<f32>>;

    /// Embed many texts, preserving input order.
    ///
    /// Calls are independent and issued through a bounded worker pool of
    /// [`concurrency`](Embedder::concurrency) in-flight requests.
    async fn embed_batch(&self, texts: &[String]) -> Outcome<Vec<Vec<f32>>> {
        let pending: Vec<_> = texts.iter().map(|t| self.embed(t)).collect();
        let results: Vec<Outcome<Vec<f32>>> = stream::iter(pending)
            .buffered(self.concurrency().max(1))
            .collect()
            .await;

        let mut out = Outcome::clean(Vec::with_capacity(results.len()));
        for r in results {
            let v = out.absorb(r);
            out.value.push(v);
        }
        out
    }
}

/// An all-zero vector of `dims` length.
pub fn zero_vector(dims: usize) -> Vec<f32> {
    vec![0.0; dims]
}

/// Force a backend vector to exactly `dims` elements.
///
/// Shorter vectors are right-padded with zeros; longer vectors keep their
/// first `dims` elements.
pub fn normalize_dims(mut vec: Vec<f32>, dims: usize) -> Vec<f32> {
    vec.resize(dims, 0.0);
    vec
}

/// Build the degraded zero-vector outcome used when a backend call fails.
pub fn zero_fallback(dims: usize, reason: impl Into<String>) -> Outcome<Vec<f32>> {
    Outcome::degraded(
        zero_vector(dims),
        PipelineError::EmbeddingFailure(reason.into()),
    )
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, and
/// zero-norm vectors. Never returns NaN or infinity.
///
/// # Formula
///
/// ```text
///            a · b
/// cos(θ) = ─────────
///          ‖a‖ × ‖b‖
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    let sim = dot / denom;
    if sim.is_finite() {
        sim
    } else {
        0.0
    }
}
