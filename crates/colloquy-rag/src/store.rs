//! Chunk storage seam.
//!
//! A store holds [`RagChunk`]s and answers similarity queries over them.
//! Insertion is keyed by [`DedupKey`]: the existence check and the insert
//! happen as one atomic step, so concurrent uploads of the same file to the
//! same conversation store exactly one chunk set.

pub mod index;
pub mod memory;

use async_trait::async_trait;

use colloquy_core::models::chunk::{DedupKey, RagChunk};

use crate::error::StoreError;

pub use index::TantivyStore;
pub use memory::MemoryStore;

/// A similarity query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub top_k: usize,
    /// Restrict results to one conversation's chunks.
    pub conversation_id: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, top_k: usize) -> Self {
        Self {
            text: text.into(),
            top_k,
            conversation_id: None,
        }
    }

    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// A search hit, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: RagChunk,
    pub score: f32,
}

#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store `chunks` unless any chunk for `key` already exists.
    ///
    /// Returns `true` when the chunks were inserted, `false` when the key was
    /// already present (nothing is written in that case).
    async fn insert_if_absent(&self, key: &DedupKey, chunks: Vec<RagChunk>) -> Result<bool, StoreError>;

    /// Chunks ranked by similarity to the query, at most `top_k`.
    async fn similarity_search(&self, query: &SearchQuery) -> Result<Vec<ScoredChunk>, StoreError>;

    /// Number of stored chunks.
    async fn len(&self) -> Result<usize, StoreError>;

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }
}

/// Lowercased alphanumeric terms of a query, deduplicated, in order.
pub(crate) fn query_terms(text: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
    {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}
