use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    #[error("failed to open index directory: {0}")]
    OpenDirectory(String),

    #[error("query parse error: {0}")]
    QueryParse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store task failed: {0}")]
    Task(String),

    #[error("corrupt chunk {id}: {reason}")]
    CorruptChunk { id: String, reason: String },
}
