//! Splits extracted document text into overlapping fixed-size windows for embedding.
//!
//! Windows are measured in characters (Unicode scalar values), never bytes, so a
//! multi-byte character is never cut in half. No whitespace or token awareness.

use serde::{Deserialize, Serialize};

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default number of characters shared by consecutive windows.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// A window of a document's text, with character offsets into that text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Offset of the first character (inclusive).
    pub start: usize,
    /// Offset one past the last character.
    pub end: usize,
}

/// Window size and overlap used when splitting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Overlap must be strictly smaller than the size, otherwise the window never advances.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::InvalidWindow {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Split `text` into windows of `chunk_size` characters, each starting
/// `chunk_size - chunk_overlap` characters after the previous one.
pub fn chunk_text(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<String>, ChunkError> {
    let config = ChunkConfig::new(chunk_size, chunk_overlap)?;
    Ok(chunk_spans(text, &config)
        .into_iter()
        .map(|c| c.text)
        .collect())
}

/// Like [`chunk_text`] but keeps the character offsets of every window.
/// The config is expected to be validated; an invalid one yields no windows.
pub fn chunk_spans(text: &str, config: &ChunkConfig) -> Vec<Chunk> {
    if text.is_empty() || config.validate().is_err() {
        return Vec::new();
    }
    // Byte offset of every char, plus the end of the string, so windows can be
    // sliced in place without re-walking the text.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < char_len {
        let end = start.saturating_add(config.chunk_size).min(char_len);
        chunks.push(Chunk {
            text: text[boundaries[start]..boundaries[end]].to_string(),
            start,
            end,
        });
        start = start.saturating_add(config.step());
    }
    chunks
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidWindow { size: usize, overlap: usize },
}
