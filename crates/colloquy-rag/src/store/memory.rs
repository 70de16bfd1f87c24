use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::info;

use colloquy_core::models::chunk::{DedupKey, RagChunk};

use super::{ChunkStore, ScoredChunk, SearchQuery, query_terms};
use crate::error::StoreError;

/// Process-local chunk store: an append-only list scanned linearly.
///
/// Used when no index is configured, and by tests. Ranking is lexical:
/// chunks containing the whole query (case-insensitive) rank first, then by
/// the fraction of query terms they contain.
#[derive(Default)]
pub struct MemoryStore {
    chunks: Mutex<Vec<RagChunk>>,
    inserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert operations that actually wrote chunks.
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored chunks, in insertion order.
    pub fn chunks(&self) -> Result<Vec<RagChunk>, StoreError> {
        Ok(self.chunks.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn insert_if_absent(&self, key: &DedupKey, chunks: Vec<RagChunk>) -> Result<bool, StoreError> {
        let mut stored = self.chunks.lock().map_err(|_| StoreError::Poisoned)?;

        if stored.iter().any(|c| key.matches(c)) {
            return Ok(false);
        }

        let count = chunks.len();
        stored.extend(chunks);
        self.inserts.fetch_add(1, Ordering::SeqCst);

        info!(
            file_name = %key.file_name,
            conversation_id = %key.conversation_id,
            count,
            total = stored.len(),
            "stored chunks in memory"
        );
        Ok(true)
    }

    async fn similarity_search(&self, query: &SearchQuery) -> Result<Vec<ScoredChunk>, StoreError> {
        let phrase = query.text.trim().to_lowercase();
        let terms = query_terms(&query.text);
        if phrase.is_empty() || terms.is_empty() || query.top_k == 0 {
            return Ok(Vec::new());
        }

        let stored = self.chunks.lock().map_err(|_| StoreError::Poisoned)?;

        let mut hits: Vec<ScoredChunk> = stored
            .iter()
            .filter(|c| {
                query
                    .conversation_id
                    .as_deref()
                    .is_none_or(|conv| c.conversation_id == conv)
            })
            .filter_map(|c| {
                let text = c.text.to_lowercase();
                let matched = terms.iter().filter(|t| text.contains(t.as_str())).count();
                if matched == 0 {
                    return None;
                }
                let mut score = matched as f32 / terms.len() as f32;
                if text.contains(&phrase) {
                    score += 1.0;
                }
                Some(ScoredChunk {
                    chunk: c.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps insertion order among equal scores.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.top_k);
        Ok(hits)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.chunks.lock().map_err(|_| StoreError::Poisoned)?.len())
    }
}
