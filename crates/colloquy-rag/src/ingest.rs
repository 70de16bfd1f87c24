//! Upload ingestion: validate, extract, chunk, store once per conversation.

use std::collections::BTreeMap;

use tracing::info;
use uuid::Uuid;

use colloquy_core::error::AiError;
use colloquy_core::models::chunk::{DedupKey, RagChunk, meta};
use colloquy_core::models::upload::{FileUpload, MAX_FILE_SIZE};

use crate::chunker::{self, ChunkerConfig};
use crate::extract::extract_text;
use crate::store::ChunkStore;

/// What an ingestion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// `false` when the file was already stored for this conversation and
    /// the existing chunks were reused.
    pub newly_stored: bool,
    /// Chunks written by this call.
    pub chunk_count: usize,
}

/// Reject empty, oversized, or unsupported uploads before anything is read.
pub fn validate_upload(upload: &FileUpload) -> Result<(), AiError> {
    if upload.bytes.is_empty() {
        return Err(AiError::file_processing("File is empty or null"));
    }

    if upload.size() > MAX_FILE_SIZE {
        return Err(
            AiError::file_processing("File size exceeds maximum allowed size of 10MB")
                .details(format!("{} bytes", upload.size())),
        );
    }

    if !FileUpload::is_allowed_mime(upload.mime_type.as_deref()) {
        return Err(
            AiError::file_processing("File type not supported. Allowed types: PDF, TXT, JSON, XML")
                .details(upload.mime_type.clone().unwrap_or_else(|| "unknown".to_string())),
        );
    }

    Ok(())
}

/// Ingest an upload into `store` under `conversation_id`.
///
/// A `(file name, conversation)` pair is stored once; later calls return
/// `newly_stored: false` without writing.
pub async fn ingest_file(
    store: &dyn ChunkStore,
    upload: &FileUpload,
    conversation_id: &str,
    config: &ChunkerConfig,
) -> Result<IngestOutcome, AiError> {
    validate_upload(upload)?;

    info!(
        file_name = %upload.file_name,
        conversation_id,
        bytes = upload.size(),
        "ingesting file"
    );

    let text = extract_text(&upload.bytes, upload.mime_type.as_deref(), &upload.file_name)?;
    let pieces = chunker::split(&text, config);
    if pieces.is_empty() {
        return Err(AiError::file_processing("File is empty or could not be read"));
    }

    let key = DedupKey::new(&upload.file_name, conversation_id);
    let chunks = build_chunks(pieces, upload, conversation_id, jiff::Timestamp::now().as_millisecond());
    let chunk_count = chunks.len();

    let newly_stored = store.insert_if_absent(&key, chunks).await.map_err(|e| {
        AiError::rag(format!("Failed to store content in vector database: {e}")).details(e.to_string())
    })?;

    if newly_stored {
        info!(file_name = %key.file_name, conversation_id, chunk_count, "stored new file content");
        Ok(IngestOutcome {
            newly_stored: true,
            chunk_count,
        })
    } else {
        info!(
            file_name = %key.file_name,
            conversation_id,
            "file already stored for conversation; reusing existing embeddings"
        );
        Ok(IngestOutcome {
            newly_stored: false,
            chunk_count: 0,
        })
    }
}

fn build_chunks(
    pieces: Vec<String>,
    upload: &FileUpload,
    conversation_id: &str,
    ingested_at_ms: i64,
) -> Vec<RagChunk> {
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            let mut metadata = BTreeMap::new();
            metadata.insert(meta::FILE_NAME.to_string(), upload.file_name.clone());
            metadata.insert(meta::CONVERSATION_ID.to_string(), conversation_id.to_string());
            metadata.insert(meta::TIMESTAMP.to_string(), ingested_at_ms.to_string());
            metadata.insert(meta::CHUNK_INDEX.to_string(), index.to_string());
            if let Some(user_id) = &upload.prompt.user_id {
                metadata.insert(meta::USER_ID.to_string(), user_id.clone());
            }
            if let Some(mime) = &upload.mime_type {
                metadata.insert(meta::MIME_TYPE.to_string(), mime.clone());
            }

            RagChunk {
                id: Uuid::new_v4(),
                text,
                source_file_name: upload.file_name.clone(),
                conversation_id: conversation_id.to_string(),
                user_id: upload.prompt.user_id.clone(),
                created_at_ms: ingested_at_ms,
                metadata,
            }
        })
        .collect()
}
