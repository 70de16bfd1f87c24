//! Token-bounded text splitter.
//!
//! Tokens are whitespace-separated words. Each chunk holds at most
//! `chunk_size_tokens` tokens and is cut back to its last sentence boundary
//! when that boundary lies past `min_chunk_chars`, so chunks tend to end on
//! complete sentences without becoming tiny.

/// Splitter limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size_tokens: usize,
    pub min_chunk_chars: usize,
    /// Chunks this short (in characters, after trimming) are dropped.
    pub min_chunk_len_to_embed: usize,
    pub max_num_chunks: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size_tokens: 800,
            min_chunk_chars: 350,
            min_chunk_len_to_embed: 5,
            max_num_chunks: 10_000,
        }
    }
}

/// Split `text` into ordered chunks.
pub fn split(text: &str, config: &ChunkerConfig) -> Vec<String> {
    let spans = token_spans(text);
    let window = config.chunk_size_tokens.max(1);

    let mut chunks = Vec::new();
    let mut next = 0;

    while next < spans.len() && chunks.len() < config.max_num_chunks {
        let last = (next + window).min(spans.len()) - 1;
        let start = spans[next].0;
        let mut end = spans[last].1;
        let mut consumed = last - next + 1;

        // Only trim back to a sentence boundary when more text follows.
        if last + 1 < spans.len()
            && let Some(cut) = sentence_cut(&text[start..end], config.min_chunk_chars)
        {
            let cut_end = start + cut;
            let tokens_before_cut = spans[next..=last]
                .iter()
                .take_while(|(_, token_end)| *token_end <= cut_end)
                .count();
            if tokens_before_cut > 0 {
                end = cut_end;
                consumed = tokens_before_cut;
            }
        }

        let chunk = text[start..end].trim();
        if chunk.chars().count() > config.min_chunk_len_to_embed {
            chunks.push(chunk.to_string());
        }

        next += consumed;
    }

    chunks
}

/// Byte ranges of whitespace-separated tokens.
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}

/// Byte offset just past the last sentence boundary, if it lies beyond
/// `min_chars` characters into `window`.
fn sentence_cut(window: &str, min_chars: usize) -> Option<usize> {
    let (idx, c) = window
        .char_indices()
        .rev()
        .find(|(_, c)| matches!(c, '.' | '!' | '?' | '\n'))?;

    if window[..idx].chars().count() > min_chars {
        Some(idx + c.len_utf8())
    } else {
        None
    }
}
