//! Text extraction from uploaded bytes.
//!
//! Every accepted mime type is decoded as UTF-8 text (invalid sequences are
//! replaced). PDF uploads are accepted but not parsed: their raw bytes go
//! through the same decode.

use tracing::{info, warn};

use colloquy_core::error::AiError;

const UTF8_BOM: &str = "\u{feff}";

/// Decode an upload into text.
pub fn extract_text(bytes: &[u8], mime_type: Option<&str>, file_name: &str) -> Result<String, AiError> {
    if mime_type == Some("application/pdf") {
        warn!(file_name, "PDF parsing is not implemented; decoding raw bytes as text");
    }

    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix(UTF8_BOM).unwrap_or(&decoded);

    if text.trim().is_empty() {
        return Err(AiError::file_processing("File is empty or could not be read"));
    }

    info!(file_name, chars = text.chars().count(), "extracted text from file");
    Ok(text.to_string())
}
