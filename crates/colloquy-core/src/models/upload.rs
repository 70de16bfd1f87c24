use super::prompt::PromptRequest;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Mime types accepted for RAG ingestion.
///
/// PDF is accepted but its bytes are decoded as text; no PDF parsing is done.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "application/pdf",
    "text/plain",
    "application/json",
    "application/xml",
    "text/xml",
];

/// A prompt with an attached file, assembled from a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub prompt: PromptRequest,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_allowed_mime(mime_type: Option<&str>) -> bool {
        mime_type.is_some_and(|mime| ALLOWED_MIME_TYPES.contains(&mime))
    }
}
