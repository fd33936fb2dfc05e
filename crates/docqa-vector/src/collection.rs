use docqa_core::types::{Chunk, ChunkId, ChunkMetadata, SearchHit};
use docqa_core::{Error, Result};

use crate::index::FlatL2Index;

/// The ingest unit: chunks, their page metadata and their vectors, aligned by
/// position. Only constructed through [`Collection::new`], which rejects any
/// partial or misaligned triple.
#[derive(Debug, Clone)]
pub struct Collection {
    chunks: Vec<Chunk>,
    metadata: Vec<ChunkMetadata>,
    index: FlatL2Index,
    embed_model: String,
    total_pages: usize,
}

impl Collection {
    pub fn new(
        chunks: Vec<Chunk>,
        metadata: Vec<ChunkMetadata>,
        index: FlatL2Index,
        embed_model: impl Into<String>,
        total_pages: usize,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::CorruptState("collection has no chunks".to_string()));
        }
        if chunks.len() != metadata.len() || chunks.len() != index.len() {
            return Err(Error::CorruptState(format!(
                "misaligned collection: {} chunks, {} metadata entries, {} vectors",
                chunks.len(),
                metadata.len(),
                index.len()
            )));
        }
        for (pos, (chunk, meta)) in chunks.iter().zip(&metadata).enumerate() {
            if chunk.id != pos || meta.id != pos {
                return Err(Error::CorruptState(format!(
                    "entry {} carries chunk id {} and metadata id {}",
                    pos, chunk.id, meta.id
                )));
            }
            if chunk.start_offset != meta.start_offset {
                return Err(Error::CorruptState(format!(
                    "chunk {} starts at offset {} but its metadata says {}",
                    pos, chunk.start_offset, meta.start_offset
                )));
            }
            if meta.estimated_page == 0 || meta.estimated_page > total_pages {
                return Err(Error::CorruptState(format!(
                    "chunk {} estimated on page {} of {}",
                    pos, meta.estimated_page, total_pages
                )));
            }
        }
        Ok(Self { chunks, metadata, index, embed_model: embed_model.into(), total_pages })
    }

    pub fn chunks(&self) -> &[Chunk] { &self.chunks }
    pub fn metadata(&self) -> &[ChunkMetadata] { &self.metadata }
    pub fn index(&self) -> &FlatL2Index { &self.index }
    pub fn embed_model(&self) -> &str { &self.embed_model }
    pub fn total_pages(&self) -> usize { self.total_pages }
    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
    pub fn dimension(&self) -> usize { self.index.dimension() }

    pub fn chunk(&self, id: ChunkId) -> Option<(&Chunk, &ChunkMetadata)> {
        Some((self.chunks.get(id)?, self.metadata.get(id)?))
    }

    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        self.index.search(query, k)
    }
}
