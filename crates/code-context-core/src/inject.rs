//! Role-aware context injection.
//!
//! [`RoleAwareContextInjector::inject`] runs a fixed, linear sequence:
//!
//! 1. **Retrieve** up to [`SUPERSET_SIZE`] candidates for the prompt.
//!    Nothing retrieved → empty result.
//! 2. **Filter** the candidates through the role's [`RoleFilter`](crate::role::RoleFilter).
//! 3. **Fall back** to the full candidate set if the filter kept nothing.
//! 4. **Score** the survivors with the [`ChunkRelevanceScorer`].
//! 5. **Truncate** to `max_chunks`.
//!
//! Steps 2–5 are also exposed as [`rank`](RoleAwareContextInjector::rank)
//! for callers that already hold the candidate set.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::Outcome;
use crate::models::{Chunk, ScoredChunk};
use crate::retrieve::ChunkRetriever;
use crate::role::{RoleRegistry, DEFAULT_ROLE};
use crate::score::ChunkRelevanceScorer;

/// Number of candidates fetched before role filtering.
pub const SUPERSET_SIZE: usize = 50;

/// Default number of chunks kept after scoring.
pub const DEFAULT_MAX_CHUNKS: usize = 10;

pub struct RoleAwareContextInjector {
    role: String,
    retriever: Arc<ChunkRetriever>,
    scorer: Arc<ChunkRelevanceScorer>,
    roles: Arc<RoleRegistry>,
    superset_size: usize,
}

impl RoleAwareContextInjector {
    pub fn new(
        role: &str,
        retriever: Arc<ChunkRetriever>,
        scorer: Arc<ChunkRelevanceScorer>,
        roles: Arc<RoleRegistry>,
    ) -> Self {
        let role = match role.trim() {
            "" => DEFAULT_ROLE.to_string(),
            r => r.to_lowercase(),
        };
        info!(role = %role, "initialized role-aware context injector");
        Self {
            role,
            retriever,
            scorer,
            roles,
            superset_size: SUPERSET_SIZE,
        }
    }

    /// Override the number of candidates fetched before filtering.
    pub fn with_superset_size(mut self, superset_size: usize) -> Self {
        self.superset_size = superset_size.max(1);
        self
    }

    /// Retrieve, filter, score, and truncate chunks for `prompt`.
    ///
    /// `session_id` is used only for tracing.
    pub async fn inject(
        &self,
        prompt: &str,
        project_id: &str,
        session_id: Option<&str>,
        max_chunks: usize,
    ) -> Outcome<Vec<ScoredChunk>> {
        let mut out = Outcome::clean(Vec::new());
        let candidates = out.absorb(
            self.retriever
                .get_chunks(Some(prompt), project_id, self.superset_size)
                .await,
        );

        if candidates.is_empty() {
            warn!(project_id, session_id, "no chunks found for project");
            return out;
        }

        let ranked = out.absorb(self.rank(prompt, candidates, max_chunks).await);
        out.value = ranked;
        out
    }

    /// Filter, score, and truncate an already-retrieved candidate set.
    pub async fn rank(
        &self,
        prompt: &str,
        candidates: Vec<Chunk>,
        max_chunks: usize,
    ) -> Outcome<Vec<ScoredChunk>> {
        if candidates.is_empty() {
            return Outcome::clean(Vec::new());
        }

        let before = candidates.len();
        let mut filtered = self.roles.filter_for(&self.role).apply(&candidates);
        if filtered.is_empty() {
            warn!(role = %self.role, "no chunks matched role, using all chunks");
            filtered = candidates;
        }
        debug!(
            role = %self.role,
            before,
            after = filtered.len(),
            "[CTX] filtered chunks by role"
        );

        let mut scored = self.scorer.score(prompt, filtered).await;
        scored.value.truncate(max_chunks);

        for sc in &scored.value {
            debug!(
                id = %sc.chunk.id,
                file_path = %sc.chunk.file_path,
                ast_type = %sc.chunk.effective_type(),
                score = format_args!("{:.4}", sc.score),
                "[CTX] included chunk"
            );
        }
        let files: Vec<&str> = scored
            .value
            .iter()
            .map(|sc| sc.chunk.file_path.rsplit('/').next().unwrap_or(""))
            .collect();
        info!(
            role = %self.role,
            chunks = scored.value.len(),
            files = %files.join(", "),
            "injected chunks"
        );

        scored
    }
}
