use async_trait::async_trait;

use crate::error::Result;

/// Turns text into a fixed-dimension vector via some embedding provider.
///
/// Implementations must fail with `Error::EmbeddingProvider` rather than
/// return a placeholder vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the embedding model (e.g. `nomic-embed-text`).
    fn model_id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Sequential, order-preserving batch. `docqa_embed::BatchEmbedder`
    /// adds bounded concurrency and progress on top of `embed`.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Turns a prompt into free text via some generation provider.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model_id(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Converts raw document bytes into ordered page texts.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<crate::types::PageText>>;
}
