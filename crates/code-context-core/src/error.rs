//! Failure taxonomy and the degraded-result channel.
//!
//! Most pipeline stages have a sane fallback value when a backend
//! misbehaves (empty retrieval, zero vector, unsorted chunks). Rather than
//! hiding those fallbacks in logs, stages return an [`Outcome`] carrying
//! both the value and the [`PipelineError`]s that forced a fallback, so a
//! caller can tell a clean success from a degraded one.

use thiserror::Error;

/// Every way a pipeline stage can fail or degrade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The vector store is missing, unreachable, or returned an error.
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The embedding backend failed; a zero vector was substituted.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// Score computation failed; chunks were returned unscored in input order.
    #[error("scoring failed: {0}")]
    ScoringFailure(String),

    /// The generation backend returned a non-success status or was unreachable.
    #[error("generation failed: {message}")]
    GenerationFailure {
        status: Option<u16>,
        message: String,
    },

    #[error("request cancelled")]
    Cancelled,

    #[error("request timed out")]
    DeadlineExceeded,

    #[error("internal error: {0}")]
    Internal(String),
}

/// A value plus the failures that degraded it.
///
/// An outcome with no degradations is a clean success.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub degradations: Vec<PipelineError>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            degradations: Vec::new(),
        }
    }

    pub fn degraded(value: T, err: PipelineError) -> Self {
        Self {
            value,
            degradations: vec![err],
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    /// Take the value out of `other`, keeping its degradations on `self`.
    pub fn absorb<U>(&mut self, other: Outcome<U>) -> U {
        self.degradations.extend(other.degradations);
        other.value
    }

    pub fn into_parts(self) -> (T, Vec<PipelineError>) {
        (self.value, self.degradations)
    }
}
