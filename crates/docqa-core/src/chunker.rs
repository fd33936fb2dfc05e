use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkMetadata, PageText};

/// Window size and overlap, both measured in chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 500, overlap: 100 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if self.overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Fixed-size, overlapping window chunker over the concatenated page text.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Splits the pages into windows of `chunk_size` chars starting every
    /// `chunk_size - overlap` chars. Produces `ceil(L / step)` chunks for a
    /// flattened text of `L` chars; the last one may be shorter.
    pub fn chunk(&self, pages: &[PageText]) -> (Vec<Chunk>, Vec<ChunkMetadata>) {
        let total_pages = pages.len();
        if total_pages == 0 {
            return (Vec::new(), Vec::new());
        }
        let text: Vec<char> = pages.iter().flat_map(|p| p.text.chars()).collect();
        let len = text.len();
        let step = self.config.step();
        let avg = average_page_len(len, total_pages);

        let capacity = len.div_ceil(step);
        let mut chunks = Vec::with_capacity(capacity);
        let mut metadata = Vec::with_capacity(capacity);
        for (id, start) in (0..len).step_by(step).enumerate() {
            let end = (start + self.config.chunk_size).min(len);
            chunks.push(Chunk { id, text: text[start..end].iter().collect(), start_offset: start });
            metadata.push(ChunkMetadata {
                id,
                start_offset: start,
                estimated_page: estimate_page(start, avg, total_pages),
            });
        }
        tracing::debug!(chars = len, pages = total_pages, chunks = chunks.len(), "chunked document");
        (chunks, metadata)
    }
}

/// Mean page length in chars, floored and never below 1.
pub fn average_page_len(total_chars: usize, total_pages: usize) -> usize {
    if total_pages == 0 {
        return 1;
    }
    (total_chars / total_pages).max(1)
}

/// Proportional page estimate: `min(start / avg + 1, total_pages)`.
///
/// This assumes every page holds the same amount of text. It does not know
/// where page boundaries actually fall, so documents with very uneven page
/// lengths get skewed estimates.
pub fn estimate_page(start_offset: usize, avg_page_len: usize, total_pages: usize) -> usize {
    (start_offset / avg_page_len.max(1) + 1).min(total_pages.max(1))
}
