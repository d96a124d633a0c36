//! Context formatting under a token budget.
//!
//! Ranked chunks are rendered, in order, as delimited blocks:
//!
//! ```text
//! --- File: app/services/user_service.py | Type: class | Relevance: 0.87 ---
//! class UserService:
//!     ...
//! ```
//!
//! A chunk's token cost is its whitespace-separated word count. Walking
//! stops at the first chunk that would push the running total past
//! `max_tokens`; that chunk and everything after it are left out whole.
//! Included chunks are never trimmed.

use tracing::{info, warn};

use crate::models::ScoredChunk;

/// Default context token budget.
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 8000;

/// The rendered context plus what went into it.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedContext {
    /// Number of leading chunks that fit the budget.
    pub included: usize,
    /// Rendered text body (empty when nothing fit).
    pub text: String,
    /// Approximate token count of the included chunks.
    pub token_count: usize,
}

/// Renders ranked chunks into a prompt context block.
#[derive(Debug, Clone)]
pub struct ContextFormatter {
    max_tokens: usize,
    include_metadata: bool,
}

impl Default for ContextFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTEXT_TOKENS)
    }
}

/// Approximate token cost of a text: its whitespace-split word count.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

impl ContextFormatter {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            include_metadata: true,
        }
    }

    /// Set whether [`build_prompt`](Self::build_prompt) renders metadata headers.
    pub fn with_metadata(mut self, include_metadata: bool) -> Self {
        self.include_metadata = include_metadata;
        self
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Walk `chunks` in order, rendering as many as fit the budget.
    pub fn assemble(&self, chunks: &[ScoredChunk], include_metadata: bool) -> RankedContext {
        let mut blocks = Vec::new();
        let mut total = 0usize;

        for sc in chunks {
            let cost = estimate_tokens(&sc.chunk.content);
            if total + cost > self.max_tokens {
                info!(
                    included = blocks.len(),
                    tokens = total,
                    "reached context token limit"
                );
                break;
            }
            blocks.push(render_block(sc, include_metadata));
            total += cost;
        }

        RankedContext {
            included: blocks.len(),
            text: blocks.join("\n"),
            token_count: total,
        }
    }

    /// Render `chunks` into a single text body.
    pub fn format(&self, chunks: &[ScoredChunk], include_metadata: bool) -> String {
        if chunks.is_empty() {
            warn!("no chunks provided for formatting");
            return String::new();
        }
        let ctx = self.assemble(chunks, include_metadata);
        info!(
            chunks = ctx.included,
            tokens = ctx.token_count,
            "formatted context"
        );
        ctx.text
    }

    /// Merge the rendered context with the user's prompt.
    ///
    /// Returns `prompt` unchanged when no chunk fits.
    pub fn build_prompt(&self, prompt: &str, chunks: &[ScoredChunk]) -> String {
        self.render_prompt(prompt, chunks).0
    }

    /// Like [`build_prompt`](Self::build_prompt), also returning how many
    /// leading `chunks` made it into the prompt.
    pub fn render_prompt(&self, prompt: &str, chunks: &[ScoredChunk]) -> (String, usize) {
        if chunks.is_empty() {
            warn!("no chunks provided for formatting");
            return (prompt.to_string(), 0);
        }
        let ctx = self.assemble(chunks, self.include_metadata);
        info!(
            chunks = ctx.included,
            tokens = ctx.token_count,
            "formatted context"
        );
        if ctx.text.is_empty() {
            warn!("no context to add to prompt");
            return (prompt.to_string(), 0);
        }

        let context = ctx.text;
        let merged = format!(
            "\nI'll help you with your request. Here's some relevant code from the project:\n\n\
             {context}\n\n\
             Now, regarding your request:\n\n\
             {prompt}\n"
        );
        info!(
            prompt_chars = prompt.chars().count(),
            merged_chars = merged.chars().count(),
            "created prompt with context"
        );
        (merged, ctx.included)
    }
}

fn render_block(sc: &ScoredChunk, include_metadata: bool) -> String {
    let c = &sc.chunk;
    let path = if c.file_path.is_empty() {
        "unknown"
    } else {
        c.file_path.as_str()
    };
    if include_metadata {
        let ast_type = if c.ast_type.is_empty() {
            c.chunk_type.as_deref().filter(|t| !t.is_empty()).unwrap_or("unknown")
        } else {
            c.ast_type.as_str()
        };
        format!(
            "--- File: {} | Type: {} | Relevance: {:.2} ---\n{}\n",
            path, ast_type, sc.score, c.content
        )
    } else {
        format!("--- {} ---\n{}\n", path, c.content)
    }
}
