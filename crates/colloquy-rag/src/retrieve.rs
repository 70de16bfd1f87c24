use tracing::{info, warn};

use crate::store::{ChunkStore, SearchQuery};

/// Placed between retrieved chunks in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Build a context block for `query` from the store.
///
/// Never fails: a store error or an empty result both yield `""`, and the
/// caller proceeds without augmentation.
pub async fn retrieve_context(store: &dyn ChunkStore, query: &SearchQuery) -> String {
    let hits = match store.similarity_search(query).await {
        Ok(hits) => hits,
        Err(e) => {
            warn!(error = %e, "retrieval failed; continuing without context");
            return String::new();
        }
    };

    if hits.is_empty() {
        warn!(query = %query.text, "no relevant chunks found");
        return String::new();
    }

    info!(count = hits.len(), "retrieved context chunks");

    hits.iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
