use docqa_core::progress::{ProgressObserver, QueryStage};
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, ChunkId};
use docqa_core::{Error, Result};
use docqa_vector::Collection;

/// A chunk selected for the context, with its page estimate and distance.
#[derive(Debug, Clone, Copy)]
pub struct RetrievedChunk<'a> {
    pub id: ChunkId,
    pub chunk: &'a Chunk,
    pub page: usize,
    pub distance: f32,
}

pub struct Retriever<'a> {
    collection: &'a Collection,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    pub fn new(collection: &'a Collection, embedder: &'a dyn Embedder) -> Self {
        Self { collection, embedder }
    }

    /// Embeds the question and returns the `top_k` closest chunks, nearest first.
    pub async fn retrieve(
        &self,
        question: &str,
        top_k: usize,
        observer: Option<&dyn ProgressObserver>,
    ) -> Result<Vec<RetrievedChunk<'a>>> {
        let query = self.embedder.embed(question).await?;
        if let Some(o) = observer { o.on_stage(QueryStage::Searching); }
        let hits = self.collection.search(&query, top_k)?;
        tracing::debug!(top_k, hits = hits.len(), best = ?hits.first().map(|h| h.distance), "searched index");
        hits.into_iter()
            .map(|hit| {
                let (chunk, meta) = self.collection.chunk(hit.id).ok_or_else(|| {
                    Error::CorruptState(format!("index returned unknown chunk id {}", hit.id))
                })?;
                Ok(RetrievedChunk { id: hit.id, chunk, page: meta.estimated_page, distance: hit.distance })
            })
            .collect()
    }
}
