//! Embedding adapters: the Ollama HTTP provider, a deterministic fake, and the
//! order-preserving batch driver used during ingest.

use std::sync::Arc;

use docqa_core::config::OllamaSettings;
use docqa_core::traits::Embedder;
use docqa_core::Result;

pub mod batch;
pub mod fake;
pub mod ollama;
pub mod transport;

pub use batch::BatchEmbedder;
pub use fake::FakeEmbedder;
pub use ollama::OllamaEmbedder;
pub use transport::{AttemptError, OllamaTransport, RetryPolicy};

/// Dimension of the fake embedder, matching `nomic-embed-text`.
pub const FAKE_EMBEDDING_DIM: usize = 768;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// The configured Ollama embedder, or the [`FakeEmbedder`] when
/// `APP_USE_FAKE_EMBEDDINGS=1`.
pub fn get_default_embedder(settings: &OllamaSettings) -> Result<Arc<dyn Embedder>> {
    if use_fake_embeddings() {
        tracing::info!(dim = FAKE_EMBEDDING_DIM, "using FakeEmbedder");
        return Ok(Arc::new(FakeEmbedder::new(FAKE_EMBEDDING_DIM)));
    }
    tracing::info!(model = %settings.embed_model, base_url = %settings.base_url, "using Ollama embedder");
    Ok(Arc::new(OllamaEmbedder::from_settings(settings)?))
}
