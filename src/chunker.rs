//! Fixed-window text chunker with overlap.
//!
//! Text is cut into windows of `chunk_size` characters. Each window starts
//! `chunk_size - overlap` characters (the stride) after the previous one, and
//! slicing continues while the window start is still inside the text. Lengths
//! are counted in Unicode scalar values (`char`), and `char_count` on a
//! [`Chunk`] uses the same unit.
//!
//! Because the loop only stops once the start passes the end of the text, a
//! text whose length lies in `stride + 1 ..= chunk_size` produces a trailing
//! chunk holding its last `len - stride` characters. Text of exactly
//! `chunk_size` characters therefore yields two chunks. Downstream consumers
//! and persisted `total_chunks` values depend on this, so keep it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// One window of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: usize,
    pub text: String,
    pub char_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Fails with [`ChunkError::InvalidArgument`] unless `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidArgument(
                "chunk_size must be greater than 0".into(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ChunkError::InvalidArgument(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split `text` into ordered windows. Empty text gives no windows.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, including the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;

        let mut windows = Vec::with_capacity(len / self.stride() + 1);
        let mut start = 0;
        while start < len {
            let end = (start + self.chunk_size).min(len);
            windows.push(&text[bounds[start]..bounds[end]]);
            start += self.stride();
        }
        windows
    }

    /// Split `text` and annotate each window with its ordinal and length.
    pub fn chunks(&self, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, window)| Chunk {
                chunk_id,
                text: window.to_string(),
                char_count: window.chars().count(),
            })
            .collect()
    }

    /// Rebuild the source text from the output of [`Chunker::split`]:
    /// the first `stride` chars of every chunk but the last, then the last chunk whole.
    pub fn reassemble<S: AsRef<str>>(&self, chunks: &[S]) -> String {
        let mut out = String::new();
        if let Some((last, rest)) = chunks.split_last() {
            for chunk in rest {
                out.extend(chunk.as_ref().chars().take(self.stride()));
            }
            out.push_str(last.as_ref());
        }
        out
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Free-function form of [`Chunker::split`] returning owned strings.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    let chunker = Chunker::new(chunk_size, overlap)?;
    Ok(chunker.split(text).into_iter().map(str::to_string).collect())
}
