//! Domain types shared by the chunker, the index, the store and the composer.

use serde::{Deserialize, Serialize};

/// Position of a chunk in ingestion order. Also the position of its vector
/// in the index.
pub type ChunkId = usize;

/// One page of extracted document text, as handed over by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub text: String,
    pub page_number: usize,
}

impl PageText {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        Self { text: text.into(), page_number }
    }
}

/// A contiguous slice of the flattened document text.
///
/// - `id`: position in ingestion order, the link to its vector
/// - `text`: the window content
/// - `start_offset`: char offset of the window in the flattened text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub start_offset: usize,
}

/// Page estimate for a chunk. `1 <= estimated_page <= total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub id: ChunkId,
    pub start_offset: usize,
    pub estimated_page: usize,
}

/// One cited passage in an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub page: usize,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// A nearest-neighbour hit. Lower `distance` is closer (squared L2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: ChunkId,
    pub distance: f32,
}

/// Summary of a completed ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub pages: usize,
    pub chunks: usize,
    pub dimension: usize,
}
