use std::sync::Arc;

use colloquy_bedrock::provider::CompletionProvider;
use colloquy_rag::error::StoreError;
use colloquy_rag::store::{ChunkStore, MemoryStore, TantivyStore};

use crate::config::StoreKind;
use crate::service::{ChatService, ServiceSettings};

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ChatService>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        store: Arc<dyn ChunkStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            chat: Arc::new(ChatService::new(provider, store, settings)),
        }
    }
}

/// Open the chunk store selected by configuration.
pub fn build_store(kind: &StoreKind) -> Result<Arc<dyn ChunkStore>, StoreError> {
    let store: Arc<dyn ChunkStore> = match kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Tantivy {
            index_dir: Some(dir),
        } => Arc::new(TantivyStore::open_or_create(dir)?),
        StoreKind::Tantivy { index_dir: None } => Arc::new(TantivyStore::in_memory()?),
    };
    Ok(store)
}
