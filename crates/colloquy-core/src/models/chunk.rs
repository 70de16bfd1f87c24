use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Metadata keys attached to every stored chunk.
pub mod meta {
    pub const FILE_NAME: &str = "fileName";
    pub const CONVERSATION_ID: &str = "conversationId";
    pub const USER_ID: &str = "userId";
    pub const TIMESTAMP: &str = "timestamp";
    pub const CHUNK_INDEX: &str = "chunkIndex";
    pub const MIME_TYPE: &str = "mimeType";
}

/// One segment of an ingested file, as held by a chunk store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RagChunk {
    pub id: Uuid,
    pub text: String,
    pub source_file_name: String,
    pub conversation_id: String,
    pub user_id: Option<String>,
    #[ts(type = "number")]
    pub created_at_ms: i64,
    pub metadata: BTreeMap<String, String>,
}

/// `(file name, conversation id)`: a file is embedded at most once per
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub file_name: String,
    pub conversation_id: String,
}

impl DedupKey {
    pub fn new(file_name: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            conversation_id: conversation_id.into(),
        }
    }

    pub fn matches(&self, chunk: &RagChunk) -> bool {
        chunk.source_file_name == self.file_name && chunk.conversation_id == self.conversation_id
    }
}
